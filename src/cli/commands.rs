//! CLI commands and argument parsing

use crate::types::Method;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Parallel paginated HTTP fetching
#[derive(Parser, Debug)]
#[command(name = "pagereq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter: `RUST_LOG` when set and valid, otherwise INFO (DEBUG with `--verbose`)
    pub fn log_filter(&self) -> EnvFilter {
        let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        log_filter(env.as_deref(), self.verbose)
    }
}

fn log_filter(env: Option<&str>, verbose: bool) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str()))
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every page of a paginated endpoint
    Fetch {
        /// Endpoint URL (joined to the configured base URL when relative)
        #[arg(long)]
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "POST")]
        method: Method,

        /// First page to fetch
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(long, default_value = "20")]
        limit: u32,

        /// Pages fetched at once (0 = first page only)
        #[arg(long, default_value = "0")]
        parallel: usize,

        /// Extra form fields as a JSON object
        #[arg(long)]
        form: Option<String>,

        /// Send the form as query parameters instead of a JSON body
        #[arg(long)]
        query: bool,

        /// Abort in-flight pages when one page fails
        #[arg(long)]
        cancel_on_error: bool,
    },

    /// Print the curl command for a request
    Curl {
        /// Request URL
        #[arg(long)]
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: Method,

        /// Header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one item per line)
    Json,
    /// Indented JSON
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::parse_from([
            "pagereq",
            "fetch",
            "--url",
            "http://localhost/posts",
            "--page",
            "4",
            "--limit",
            "13",
            "--parallel",
            "10",
            "--query",
        ]);

        match cli.command {
            Commands::Fetch {
                url,
                method,
                page,
                limit,
                parallel,
                form,
                query,
                cancel_on_error,
            } => {
                assert_eq!(url, "http://localhost/posts");
                assert_eq!(method, Method::POST);
                assert_eq!((page, limit, parallel), (4, 13, 10));
                assert!(form.is_none());
                assert!(query);
                assert!(!cancel_on_error);
            }
            Commands::Curl { .. } => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_parse_curl_with_globals() {
        let cli = Cli::parse_from([
            "pagereq",
            "curl",
            "--url",
            "http://localhost/x",
            "-X",
            "put",
            "-H",
            "A: 1",
            "-H",
            "B: 2",
            "--verbose",
            "-C",
            "client.yaml",
        ]);

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("client.yaml")));
        match cli.command {
            Commands::Curl {
                method, headers, ..
            } => {
                assert_eq!(method, Method::PUT);
                assert_eq!(headers, vec!["A: 1", "B: 2"]);
            }
            Commands::Fetch { .. } => panic!("expected curl"),
        }
    }

    #[test]
    fn test_log_filter_prefers_rust_log() {
        use tracing::level_filters::LevelFilter;

        assert_eq!(log_filter(None, false).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(None, true).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            log_filter(Some("pagereq=trace"), false).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(
            log_filter(Some("warn"), true).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_unknown_method_rejected() {
        let result = Cli::try_parse_from(["pagereq", "curl", "--url", "x", "-X", "BREW"]);
        assert!(result.is_err());
    }
}
