use hciport_transport::{HciDevice, HciOpener, SystemHci};
use tracing::debug;

use crate::cmd::DevicesArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_devices, DeviceOutput, OutputFormat};

pub fn run(args: DevicesArgs) -> CliResult<i32> {
    let format = args.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let devices = list(&SystemHci).map_err(|err| transport_error("list devices", err))?;
    print_devices(&devices, format);
    Ok(SUCCESS)
}

fn list<O: HciOpener>(opener: &O) -> hciport_transport::Result<Vec<DeviceOutput>> {
    let socket = opener.open()?;
    let mut devices = Vec::new();
    for status in socket.device_list()? {
        match socket.device_info(status.dev_id) {
            Ok(info) => devices.push(DeviceOutput::from(&info)),
            Err(err) => debug!(dev_id = status.dev_id, error = %err, "device vanished"),
        }
    }
    Ok(devices)
}
