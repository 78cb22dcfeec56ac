use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fetcharr", about = "Job queue runner, webhook intake, and operator CLI for fetcharr")]
pub struct Cli {
    /// Path to a TOML config file; falls back to `fetcharr.toml` /
    /// `config/fetcharr.toml` if present, then env/defaults.
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the webhook HTTP server plus the queue workers, scheduler, and
    /// update-queue processor in-process.
    Serve,

    /// Inspect or act on queued jobs.
    Job {
        #[command(subcommand)]
        action: JobAction,
    },

    /// Enqueue a `library-scan` job for one library.
    Scan { library_id: uuid::Uuid },

    /// Enqueue an `enrich-metadata` job for one media item.
    Enrich { media_item_id: uuid::Uuid },

    /// Enqueue a `publish` job for one media item.
    Publish { media_item_id: uuid::Uuid },

    /// Run a one-off search against a configured metadata provider.
    TestProvider {
        /// `tmdb` or `fanart.tv`.
        provider_id: String,
        query: String,
        #[arg(long)]
        year: Option<i32>,
    },

    /// Probe a configured player's current playback state.
    TestPlayer { player_id: uuid::Uuid },
}

#[derive(Subcommand, Debug)]
pub enum JobAction {
    /// List the most recent jobs by status.
    List {
        #[arg(long, default_value = "pending")]
        status: String,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Reset a failed job back to `pending` with its retry count cleared.
    Retry { job_id: uuid::Uuid },
    /// Mark a job `cancelled`.
    Cancel { job_id: uuid::Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_requires_a_library_id() {
        let err = Cli::try_parse_from(["fetcharr", "scan"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn job_list_defaults_to_pending_with_limit_20() {
        let cli = Cli::try_parse_from(["fetcharr", "job", "list"]).unwrap();
        match cli.command {
            Command::Job { action: JobAction::List { status, limit } } => {
                assert_eq!(status, "pending");
                assert_eq!(limit, 20);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_provider_accepts_an_optional_year() {
        let cli = Cli::try_parse_from(["fetcharr", "test-provider", "tmdb", "Example", "--year", "2020"]).unwrap();
        match cli.command {
            Command::TestProvider { provider_id, query, year } => {
                assert_eq!(provider_id, "tmdb");
                assert_eq!(query, "Example");
                assert_eq!(year, Some(2020));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
