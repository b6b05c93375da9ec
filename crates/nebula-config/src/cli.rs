//! Command-line argument parsing.

use std::num::ParseIntError;
use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Command-line arguments shared by the engine binaries.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "nebula", about = "Nebula LOD scheduler")]
pub struct CliArgs {
    /// Log level (error, warn, info, debug, trace) or a full filter string.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Scheduler layout mask, decimal or `0x`-prefixed hex.
    #[arg(long, value_parser = parse_layout_mask)]
    pub layout_mask: Option<u32>,

    /// Start with the per-frame scheduler update disabled.
    #[arg(long)]
    pub scheduler_disabled: bool,

    /// HTTP request timeout in seconds.
    #[arg(long)]
    pub http_timeout: Option<u32>,

    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_layout_mask(value: &str) -> Result<u32, ParseIntError> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(mask) = args.layout_mask {
            self.scheduler.layout_mask = mask;
        }
        if args.scheduler_disabled {
            self.scheduler.enabled = false;
        }
        if let Some(timeout) = args.http_timeout {
            self.http.timeout_seconds = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs::parse_from(["nebula", "--layout-mask", "0x3", "--scheduler-disabled"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config.scheduler.layout_mask, 3);
        assert!(!config.scheduler.enabled);
        // Non-overridden fields retain defaults
        assert_eq!(config.debug.log_level, "info");
        assert_eq!(config.http.timeout_seconds, 30);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        let args = CliArgs::parse_from(["nebula"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config, original);
    }

    #[test]
    fn test_layout_mask_parsing() {
        assert_eq!(parse_layout_mask("0xff"), Ok(255));
        assert_eq!(parse_layout_mask("12"), Ok(12));
        assert!(parse_layout_mask("0xzz").is_err());
    }
}
