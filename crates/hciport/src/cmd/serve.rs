use hciport_router::{Router, RouterConfig, Shutdown};
use hciport_transport::{ControlChannel, SystemHci};
use tracing::info;

use crate::cmd::ServeArgs;
use crate::exit::{router_error, transport_error, CliResult, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let (input, output) = ControlChannel::stdio()
        .map_err(|err| transport_error("control channel", err))?
        .into_split();

    let config = RouterConfig {
        max_events: usize::from(args.max_events),
        ..RouterConfig::default()
    };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        max_events = config.max_events,
        "hciport serving on stdio"
    );

    let router =
        Router::new(input, output, SystemHci, config).map_err(|err| router_error("setup", err))?;
    match router.run().map_err(|err| router_error("router", err))? {
        Shutdown::EndOfInput => Ok(SUCCESS),
    }
}
