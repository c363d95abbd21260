use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod devices;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the port on stdin/stdout (default).
    Serve(ServeArgs),
    /// List HCI controllers.
    Devices(DevicesArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Devices(args) => devices::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Most ready descriptors handled per wait.
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u16).range(1..))]
    pub max_events: u16,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self { max_events: 8 }
    }
}

#[derive(Args, Debug)]
pub struct DevicesArgs {
    /// Output format. Defaults to a table on a terminal, JSON otherwise.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
