mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::{Command, ServeArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "hciport", version, about = "Bluetooth HCI port process")]
struct Cli {
    /// Log output format.
    #[arg(
        long,
        value_name = "FORMAT",
        env = "HCIPORT_LOG_FORMAT",
        default_value = "text",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level.
    #[arg(
        long,
        value_name = "LEVEL",
        env = "HCIPORT_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    /// Append logs to this file instead of stderr.
    #[arg(long, value_name = "PATH", env = "HCIPORT_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Defaults to `serve`.
    #[command(subcommand)]
    command: Option<Command>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit::USAGE
            } else {
                exit::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    let result = init_logging(cli.log_format, cli.log_level, cli.log_file.as_deref()).and_then(
        |()| {
            let command = cli
                .command
                .unwrap_or_else(|| Command::Serve(ServeArgs::default()));
            cmd::run(command)
        },
    );

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
