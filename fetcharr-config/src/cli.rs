//! §6 "CLI / service surface": flags shared by every `fetcharr-server`
//! subcommand. The subcommand enum itself lives in `fetcharr-server`
//! (it dispatches to core, which this crate does not depend on); this is
//! only the global, config-adjacent argument surface.

use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Path to an on-disk TOML config file. Defaults to `./fetcharr.toml`
    /// or `./config/fetcharr.toml` if present.
    #[arg(long, env = "FETCHARR_CONFIG_PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Override `database.url` without editing the config file.
    #[arg(long, env = "FETCHARR_DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Increase log verbosity; repeat for more (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl GlobalArgs {
    pub fn tracing_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
