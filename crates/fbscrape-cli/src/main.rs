//! fbscrape: entry point.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "fbscrape",
    about = "Scrape friends, profiles, posts, likes and presence from the mobile basic site as JSON",
    version
)]
struct Cli {
    /// Response cache: `off`, `forever`, or a lifetime in seconds.
    /// Also reads FBSCRAPE_CACHE.
    #[arg(long, global = true)]
    cache: Option<String>,

    /// Cache directory (default ~/.fbscrape/cache). Also reads FBSCRAPE_CACHE_DIR.
    #[arg(long, global = true)]
    cache_dir: Option<String>,

    /// Value of the `c_user` session cookie. Also reads FBSCRAPE_C_USER.
    #[arg(long, global = true)]
    c_user: Option<String>,

    /// Value of the `xs` session cookie. Also reads FBSCRAPE_XS.
    #[arg(long, global = true)]
    xs: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Print JSON on a single line.
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the account's friends as `{id: {name}}`.
    Friends,

    /// Fetch about-page details for each entity.
    ///
    /// Without ids, reads a JSON object or array of keys from stdin, e.g.
    ///   fbscrape friends | fbscrape details --mutual
    Details {
        /// Entity ids or usernames.
        ids: Vec<String>,

        /// Also list mutual friends.
        #[arg(long)]
        mutual: bool,
    },

    /// List posts from an entity's timeline.
    Timeline {
        /// Entity id or username.
        id: String,
    },

    /// List who liked posts on an entity's timeline, grouped by liker.
    Likes {
        /// Entity id or username.
        id: String,
    },

    /// Poll presence and record when friends were last active.
    Active {
        /// Snapshot file, read at start and rewritten after each change.
        #[arg(long)]
        snapshot: PathBuf,

        /// Seconds between polls.
        #[arg(long, default_value_t = 60)]
        interval: u64,

        /// Stop after this many polls (default: until Ctrl-C).
        #[arg(long)]
        iterations: Option<u64>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   fbscrape completions bash > ~/.local/share/bash-completion/completions/fbscrape
    ///   fbscrape completions zsh > ~/.zfunc/_fbscrape
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "fbscrape",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let config = fbscrape::ScraperConfig::resolve(
        cli.c_user.as_deref(),
        cli.xs.as_deref(),
        cli.cache.as_deref(),
        cli.cache_dir.as_deref(),
    )?;
    tracing::debug!(cache = %config.cache, "resolved config");

    match cli.command {
        Commands::Friends => commands::friends(config, cli.compact).await,
        Commands::Details { ids, mutual } => {
            commands::details(config, ids, mutual, cli.compact).await
        }
        Commands::Timeline { id } => commands::timeline(config, &id, cli.compact).await,
        Commands::Likes { id } => commands::likes(config, &id, cli.compact).await,
        Commands::Active {
            snapshot,
            interval,
            iterations,
        } => commands::active(config, &snapshot, interval, iterations, cli.compact).await,
        Commands::Completions { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fbscrape", "details", "u1", "u2", "--mutual", "--compact", "--cache", "off",
        ])
        .unwrap();
        assert!(cli.compact);
        assert_eq!(cli.cache.as_deref(), Some("off"));
        match cli.command {
            Commands::Details { ids, mutual } => {
                assert_eq!(ids, vec!["u1", "u2"]);
                assert!(mutual);
            }
            _ => panic!("expected details"),
        }
    }

    #[test]
    fn test_active_requires_snapshot() {
        assert!(Cli::try_parse_from(["fbscrape", "active"]).is_err());
        let cli = Cli::try_parse_from([
            "fbscrape", "active", "--snapshot", "a.json", "--iterations", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Active {
                interval,
                iterations,
                ..
            } => {
                assert_eq!(interval, 60);
                assert_eq!(iterations, Some(2));
            }
            _ => panic!("expected active"),
        }
    }
}
