mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use solvekit_common::config::AppConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "solvekit")]
#[command(about = "Solvekit - run competitive-programming solutions against stored test cases", long_about = None)]
struct Cli {
    /// Show engine diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fixture storage root (overrides SOLVEKIT_CACHE_DIR)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile and run a solution against its test cases
    Test {
        /// Solution source file
        source: PathBuf,

        /// Run only the test case with this index
        #[arg(short, long)]
        index: Option<u32>,

        /// Sample directory used to fetch tests when none are stored
        #[arg(long)]
        samples: Option<PathBuf>,

        /// Runner settings file (default: nearest runner-settings.json)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Per-test timeout in milliseconds, 0 disables it
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Language id, when the extension is not enough
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Store the samples of a problem as test cases
    Fetch {
        source: PathBuf,

        /// Directory holding <name>.in / <name>.out pairs
        #[arg(long)]
        samples: PathBuf,

        /// Replace existing test cases
        #[arg(long, default_value = "false")]
        force: bool,
    },

    /// Write a new test case in the editor
    AddTest { source: PathBuf },

    /// Edit an existing test case in the editor
    EditTest { source: PathBuf, index: u32 },

    /// Print every stored test case
    ViewTests { source: PathBuf },

    /// Remove one test case
    ClearTest { source: PathBuf, index: u32 },

    /// Remove every test case of a solution
    ClearTests { source: PathBuf },

    /// Remove the test cases of every problem
    ClearCache,

    /// Show the effective configuration
    Config,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Test {
            source,
            index,
            samples,
            settings,
            timeout_ms,
            lang,
        } => {
            let args = commands::TestArgs {
                source,
                index,
                samples,
                settings,
                timeout_ms,
                lang,
            };
            commands::run_tests(config, args).await?;
        }
        Commands::Fetch { source, samples, force } => {
            commands::fetch(config, &source, &samples, force).await?;
        }
        Commands::AddTest { source } => {
            commands::add_test(config, &source).await?;
        }
        Commands::EditTest { source, index } => {
            commands::edit_test(config, &source, index).await?;
        }
        Commands::ViewTests { source } => {
            commands::view_tests(config, &source).await?;
        }
        Commands::ClearTest { source, index } => {
            commands::clear_test(config, &source, index).await?;
        }
        Commands::ClearTests { source } => {
            commands::clear_tests(config, &source).await?;
        }
        Commands::ClearCache => {
            commands::clear_cache(config).await?;
        }
        Commands::Config => {
            commands::show_config(config)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::from_env();
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }

    if let Err(e) = dispatch(cli.command, &config).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_test_command() {
        let cli = Cli::try_parse_from([
            "solvekit",
            "test",
            "dp/1000.cpp",
            "--index",
            "2",
            "--timeout-ms",
            "0",
            "--samples",
            "samples/1000",
        ])
        .unwrap();
        match cli.command {
            Commands::Test {
                source,
                index,
                samples,
                timeout_ms,
                settings,
                lang,
            } => {
                assert_eq!(source, PathBuf::from("dp/1000.cpp"));
                assert_eq!(index, Some(2));
                assert_eq!(timeout_ms, Some(0));
                assert_eq!(samples, Some(PathBuf::from("samples/1000")));
                assert!(settings.is_none());
                assert!(lang.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["solvekit", "clear-cache", "--cache-dir", "/tmp/fixtures", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/fixtures")));
        assert!(matches!(cli.command, Commands::ClearCache));
    }

    #[test]
    fn test_index_arguments_are_positional() {
        let cli = Cli::try_parse_from(["solvekit", "clear-test", "a.py", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::ClearTest { index: 3, .. }));
        assert!(Cli::try_parse_from(["solvekit", "edit-test", "a.py", "x"]).is_err());
    }

    #[test]
    fn test_fetch_requires_samples() {
        assert!(Cli::try_parse_from(["solvekit", "fetch", "a.py"]).is_err());
        let cli = Cli::try_parse_from(["solvekit", "fetch", "a.py", "--samples", "s", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Fetch { force: true, .. }));
    }
}
