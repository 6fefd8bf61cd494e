// src/cli.rs

//! Command-line parsing for the relay binary.

use std::path::PathBuf;

/// Log level used until the configuration has been loaded.
pub const BOOTSTRAP_LOG_LEVEL: &str = "info";

/// Parsed command-line flags. Anything not given is `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub version: bool,
    pub config: Option<String>,
    pub port: Option<u16>,
    pub config_dir: Option<PathBuf>,
}

/// Parses `args` (including the program name at index 0).
///
/// A value-taking flag given without a value is an error, as is a port that
/// is not in `1..=65535`. Unknown arguments are ignored.
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs {
        version: args.iter().any(|arg| arg == "--version"),
        ..CliArgs::default()
    };

    if let Some(path) = flag_value(args, "--config")? {
        cli.config = Some(path.to_string());
    }
    if let Some(port_str) = flag_value(args, "--port")? {
        cli.port = Some(parse_port(port_str)?);
    }
    if let Some(dir) = flag_value(args, "--config-dir")? {
        cli.config_dir = Some(PathBuf::from(dir));
    }
    Ok(cli)
}

/// Returns the argument following `flag`, if the flag is present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>, String> {
    let Some(i) = args.iter().position(|arg| arg == flag) else {
        return Ok(None);
    };
    match args.get(i + 1) {
        Some(value) if !value.starts_with("--") => Ok(Some(value.as_str())),
        _ => Err(format!("{flag} flag requires a value")),
    }
}

pub fn parse_port(port_str: &str) -> Result<u16, String> {
    match port_str.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(format!("Invalid port number: {port_str}")),
    }
}

/// `RUST_LOG` wins over the configured level.
pub fn log_level(rust_log: Option<String>, configured: &str) -> String {
    rust_log.unwrap_or_else(|| configured.to_string())
}
