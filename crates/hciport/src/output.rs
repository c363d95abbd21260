use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use hciport_transport::DeviceInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DeviceOutput {
    pub dev_id: u16,
    pub name: String,
    pub address: String,
    pub up: bool,
}

impl From<&DeviceInfo> for DeviceOutput {
    fn from(info: &DeviceInfo) -> Self {
        Self {
            dev_id: info.dev_id,
            name: info.name.clone(),
            address: info.address.to_string(),
            up: info.is_up(),
        }
    }
}

pub fn print_devices(devices: &[DeviceOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(devices).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => println!("{}", device_table(devices)),
    }
}

fn device_table(devices: &[DeviceOutput]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "NAME", "ADDRESS", "STATE"]);
    for device in devices {
        table.add_row(vec![
            device.dev_id.to_string(),
            device.name.clone(),
            device.address.clone(),
            if device.up { "up" } else { "down" }.to_string(),
        ]);
    }
    table
}
