//! Sideline CLI - load the app's paginated lists from the terminal.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::feed::FeedArgs;

#[derive(Parser)]
#[command(name = "sideline")]
#[command(version)]
#[command(about = "Load and page through Sideline lists")]
#[command(
    long_about = "Sideline drives the same feed engine the app uses: it loads a list \
page by page, de-duplicating items across pages and treating each list's \
\"no more data\" answers as the end of the list."
)]
#[command(after_long_help = r#"EXAMPLES
    Show the first page of the events feed:
        $ sideline feed events

    Load three pages of open matches as JSON:
        $ sideline feed matches --pages 3 --output json

    List pending requests for a group:
        $ sideline feed requests --group 42

    Generate shell completions:
        $ sideline completions bash > ~/.local/share/bash-completion/completions/sideline

CONFIGURATION
    Sideline reads configuration from:
      1. ~/.config/sideline/config.toml (or $XDG_CONFIG_HOME/sideline/config.toml)
      2. ./sideline.toml
      3. Environment variables (SIDELINE_* prefix, e.g., SIDELINE_API__TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    SIDELINE_API__BASE_URL            API base URL (default: http://localhost:3000/api)
    SIDELINE_API__TOKEN               Bearer token for authenticated lists
    SIDELINE_FEED__PAGE_SIZE          Items per page (default: 20)
    SIDELINE_FEED__EMPTY_STATUSES     Comma-separated "no more data" statuses
    RUST_LOG                          Log filter (default: sideline=info,sideline_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a list and print its items
    Feed(FeedArgs),
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so table/JSON output on stdout stays clean
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("sideline=info,sideline_cli=info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut stdout = std::io::stdout().lock();
            write_completions(shell, &mut stdout);
            stdout.flush()?;
        }
        Commands::Man { output: Some(dir) } => {
            let pages = write_man_pages(&dir)?;
            eprintln!("Wrote {} man page(s) to {}", pages, dir.display());
        }
        Commands::Man { output: None } => {
            clap_mangen::Man::new(Cli::command()).render(&mut std::io::stdout().lock())?;
        }
        Commands::Feed(args) => {
            // Load configuration (config file -> env vars -> defaults)
            let config = config::Config::load();
            commands::feed::handle_feed(args, &config).await?;
        }
    }

    Ok(())
}

fn write_completions(shell: clap_complete::Shell, out: &mut dyn Write) {
    clap_complete::generate(shell, &mut Cli::command(), "sideline", out);
}

/// Write `sideline.1` plus one page per subcommand (`sideline-feed.1`, ...)
/// into `dir`, returning how many pages were written.
fn write_man_pages(dir: &Path) -> std::io::Result<usize> {
    std::fs::create_dir_all(dir)?;
    let cmd = Cli::command();
    let pages = 1 + cmd.get_subcommands().filter(|sub| !sub.is_hide_set()).count();
    clap_mangen::generate_to(cmd, dir)?;
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::feed::{FeedKind, OutputFormat};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_feed_command_with_defaults() {
        let cli = Cli::try_parse_from(["sideline", "feed", "events"]).unwrap();
        let Commands::Feed(args) = cli.command else {
            panic!("expected feed command");
        };
        assert_eq!(args.kind, FeedKind::Events);
        assert_eq!(args.pages, 1);
        assert!(args.page_size.is_none());
        assert!(args.group.is_none());
        assert_eq!(args.output, OutputFormat::Table);
    }

    #[test]
    fn parses_feed_command_with_all_flags() {
        let cli = Cli::try_parse_from([
            "sideline",
            "feed",
            "requests",
            "--group",
            "g9",
            "--pages",
            "3",
            "-s",
            "50",
            "-o",
            "json",
        ])
        .unwrap();
        let Commands::Feed(args) = cli.command else {
            panic!("expected feed command");
        };
        assert_eq!(args.kind, FeedKind::Requests);
        assert_eq!(args.group.as_deref(), Some("g9"));
        assert_eq!(args.pages, 3);
        assert_eq!(args.page_size, Some(50));
        assert_eq!(args.output, OutputFormat::Json);
    }

    #[test]
    fn rejects_unknown_list() {
        assert!(Cli::try_parse_from(["sideline", "feed", "friends"]).is_err());
    }

    #[test]
    fn completions_offer_feed_lists_and_flags() {
        let mut out = Vec::new();
        write_completions(clap_complete::Shell::Bash, &mut out);
        let script = String::from_utf8(out).expect("completion script is UTF-8");

        for list in ["events", "matches", "my-posts", "my-matches", "groups", "requests"] {
            assert!(script.contains(list), "missing list {list}");
        }
        assert!(script.contains("--page-size"));
        assert!(script.contains("--group"));
        assert!(script.contains("table json"));
    }

    #[test]
    fn feed_man_page_documents_lists() {
        let feed = Cli::command()
            .find_subcommand("feed")
            .cloned()
            .expect("feed subcommand");
        let mut out = Vec::new();
        clap_mangen::Man::new(feed)
            .render(&mut out)
            .expect("render feed page");
        let page = String::from_utf8(out).expect("man page is UTF-8");

        assert!(page.contains("Load a list and print its items"));
        assert!(page.contains("groups"));
        assert!(page.contains("Pending membership requests"));
    }

    #[test]
    fn man_pages_include_one_per_subcommand() {
        let dir = std::env::temp_dir().join(format!("sideline-man-{}", std::process::id()));

        let written = write_man_pages(&dir).expect("write man pages");
        assert_eq!(written, 4);
        for page in ["sideline.1", "sideline-feed.1", "sideline-completions.1", "sideline-man.1"] {
            assert!(dir.join(page).exists(), "missing {page}");
        }

        std::fs::remove_dir_all(&dir).expect("remove man dir");
    }
}
