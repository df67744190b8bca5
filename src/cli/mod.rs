//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the dispenser.

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::AppConfig;

/// Taxinomos - hand out domains to measure and collect the results.
#[derive(Parser, Debug)]
#[command(name = "taxinomos-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: ~/.taxinomos/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// File that contains the domains to hand out.
    #[arg(short = 'd', long = "domainfile", global = true)]
    pub domain_file: Option<PathBuf>,

    /// File to write the last domain position to.
    #[arg(short = 'i', long = "idfile", global = true)]
    pub cursor_file: Option<PathBuf>,

    /// File to write the measurements to.
    #[arg(short = 'm', long = "measurementfile", global = true)]
    pub measurement_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hand out the next domain and advance the cursor.
    Fetch,

    /// Show the next domain without advancing the cursor.
    Peek,

    /// Advance past the next domain without handing it out.
    Skip,

    /// Append a measurement to the log.
    Submit {
        /// Measurement payload, stored verbatim. When omitted the payload is
        /// read from stdin, which is the only way to submit non-UTF-8 bytes;
        /// one trailing newline from stdin is dropped.
        payload: Option<String>,
    },

    /// Show cursor progress and log size.
    Status {
        /// Print the status as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration file if it does not exist.
    InitConfig,
}

impl Cli {
    /// Apply file overrides from the command line on top of a loaded config.
    #[must_use]
    pub fn apply_overrides(&self, mut config: AppConfig) -> AppConfig {
        if let Some(path) = &self.domain_file {
            config.files.domain_file.clone_from(path);
        }
        if let Some(path) = &self.cursor_file {
            config.files.cursor_file.clone_from(path);
        }
        if let Some(path) = &self.measurement_file {
            config.files.measurement_file.clone_from(path);
        }
        config
    }
}

/// Read a measurement payload from a stream.
///
/// The bytes are kept as-is apart from one trailing `\n`, which a shell pipe
/// or heredoc adds after the payload.
///
/// # Errors
/// Returns the I/O error if the stream cannot be read.
pub fn read_payload(mut reader: impl Read) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_files() {
        let cli = Cli::parse_from(["taxinomos-server", "-i", "/tmp/id.txt", "fetch"]);

        let config = cli.apply_overrides(AppConfig::default());

        assert_eq!(config.files.cursor_file, PathBuf::from("/tmp/id.txt"));
        assert_eq!(config.files.domain_file, PathBuf::from("domains.txt"));
        assert!(matches!(cli.command, Commands::Fetch));
    }

    #[test]
    fn test_submit_payload_is_optional() {
        let cli = Cli::parse_from(["taxinomos-server", "submit"]);
        assert!(matches!(cli.command, Commands::Submit { payload: None }));

        let cli = Cli::parse_from(["taxinomos-server", "-v", "-v", "submit", "{}"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Submit { payload: Some(ref p) } if p == "{}"
        ));
    }

    #[test]
    fn test_status_json_flag() {
        let cli = Cli::parse_from(["taxinomos-server", "status"]);
        assert!(matches!(cli.command, Commands::Status { json: false }));

        let cli = Cli::parse_from(["taxinomos-server", "status", "--json"]);
        assert!(matches!(cli.command, Commands::Status { json: true }));
    }

    #[test]
    fn test_read_payload_drops_one_trailing_newline() {
        assert_eq!(read_payload(&b"{}\n"[..]).unwrap(), b"{}");
        assert_eq!(read_payload(&b"a\n\n"[..]).unwrap(), b"a\n");
        assert_eq!(read_payload(&b"abc\r\n"[..]).unwrap(), b"abc\r");
        assert_eq!(read_payload(&b"no newline"[..]).unwrap(), b"no newline");
        assert!(read_payload(&b""[..]).unwrap().is_empty());
    }

    #[test]
    fn test_read_payload_keeps_non_utf8_bytes() {
        let raw = [0xff, 0xfe, b'x', 0x00, b'\n'];

        assert_eq!(read_payload(&raw[..]).unwrap(), vec![0xff, 0xfe, b'x', 0x00]);
    }
}
