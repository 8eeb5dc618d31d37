use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use url::Url;

use sideline::{
    ApiRecord, EmptyPageConditions, FeedOptions, FeedState, FeedSynchronizer, HttpPageFetcher,
    ListEndpoint, RateLimitedFetcher, ReqwestTransport,
};

use crate::config::{Config, FeedConfig};
use crate::progress::LoggingReporter;
use crate::shutdown;

/// Longest summary shown in the table view.
const MAX_SUMMARY_CHARS: usize = 60;

/// Output format for feed listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// The lists the `feed` command can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum FeedKind {
    /// Social feed of event posts
    Events,
    /// Open match listings
    Matches,
    /// Your own posts
    MyPosts,
    /// Matches you created or joined
    MyMatches,
    /// Groups you belong to
    Groups,
    /// Pending membership requests for a group (needs --group)
    Requests,
}

impl FeedKind {
    pub(crate) fn endpoint(
        self,
        group: Option<&str>,
    ) -> Result<ListEndpoint, Box<dyn std::error::Error>> {
        Ok(match self {
            FeedKind::Events => ListEndpoint::EventsFeed,
            FeedKind::Matches => ListEndpoint::MatchFeed,
            FeedKind::MyPosts => ListEndpoint::MyPosts,
            FeedKind::MyMatches => ListEndpoint::MyMatches,
            FeedKind::Groups => ListEndpoint::Groups,
            FeedKind::Requests => {
                let group_id = group
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .ok_or("The requests list needs a group: pass --group <ID>")?;
                ListEndpoint::PendingRequests {
                    group_id: group_id.to_string(),
                }
            }
        })
    }
}

/// Arguments for `sideline feed`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct FeedArgs {
    /// Which list to load
    #[arg(value_enum)]
    pub kind: FeedKind,

    /// Group id for the requests list
    #[arg(short, long)]
    pub group: Option<String>,

    /// Number of pages to load
    #[arg(short, long, default_value_t = 1)]
    pub pages: u32,

    /// Items per page (default from config or 20)
    #[arg(short = 's', long)]
    pub page_size: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Build the engine options for one list from CLI flags and config.
pub(crate) fn feed_options(
    endpoint: &ListEndpoint,
    page_size: Option<u32>,
    config: &FeedConfig,
) -> FeedOptions {
    let empty_page_conditions = match &config.empty_statuses {
        Some(statuses) => EmptyPageConditions::statuses(statuses.iter().copied()),
        None => endpoint.default_empty_conditions(),
    };

    FeedOptions::new(endpoint.label())
        .with_page_size(page_size.unwrap_or(config.page_size))
        .with_empty_page_conditions(empty_page_conditions)
}

/// Handle `sideline feed`.
pub(crate) async fn handle_feed(
    args: FeedArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = args.kind.endpoint(args.group.as_deref())?;
    let base_url = Url::parse(&config.api.base_url)
        .map_err(|e| format!("Invalid API base URL '{}': {}", config.api.base_url, e))?;

    let transport = ReqwestTransport::with_timeout(config.timeout())?;
    let mut fetcher =
        HttpPageFetcher::<ApiRecord>::new(Arc::new(transport), base_url, endpoint.clone());
    if let Some(token) = config.api_token() {
        fetcher = fetcher.with_token(token);
    } else {
        tracing::debug!(feed = %endpoint, "No API token configured, sending anonymous requests");
    }
    let fetcher: RateLimitedFetcher<_, ApiRecord> =
        RateLimitedFetcher::new(fetcher, config.feed.requests_per_second);

    let options = feed_options(&endpoint, args.page_size, &config.feed);
    let feed: Arc<FeedSynchronizer<ApiRecord, _>> = Arc::new(
        FeedSynchronizer::new(fetcher, options)
            .with_event_callback(LoggingReporter::new().into_callback()),
    );

    {
        let feed = Arc::clone(&feed);
        shutdown::setup_shutdown_handler(move || feed.dispose());
    }

    feed.load_initial().await;
    let mut loaded = 1;
    while loaded < args.pages && !shutdown::is_shutdown_requested() {
        let before = feed.snapshot();
        if !before.has_next_page() || before.error().is_some() {
            break;
        }

        feed.load_next_page().await;
        if feed.snapshot().page() == before.page() {
            break;
        }
        loaded += 1;
    }

    let state = feed.snapshot();
    if let Some(err) = state.error() {
        if state.is_empty() {
            return Err(format!("Failed to load {}: {}", endpoint, err).into());
        }
        tracing::warn!(feed = %endpoint, error = %err, "Showing partial results");
    }

    println!("{}", render(endpoint.label(), &state, args.output)?);
    Ok(())
}

/// One row of the table view.
#[derive(Debug, Clone, tabled::Tabled)]
pub(crate) struct FeedRow {
    #[tabled(rename = "#")]
    pub position: usize,
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Summary")]
    pub summary: String,
}

impl FeedRow {
    fn from_record(position: usize, record: &ApiRecord) -> Self {
        Self {
            position,
            id: record.id.clone(),
            summary: truncate(&record.summary(), MAX_SUMMARY_CHARS),
        }
    }
}

/// The JSON view of a loaded feed.
#[derive(Debug, Serialize)]
struct FeedListing<'a> {
    feed: &'a str,
    page: u32,
    has_next_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    loaded_at: Option<DateTime<Utc>>,
    items: &'a [ApiRecord],
}

/// Render a feed snapshot for display.
pub(crate) fn render(
    label: &str,
    state: &FeedState<ApiRecord>,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<FeedRow> = state
                .items()
                .iter()
                .enumerate()
                .map(|(i, record)| FeedRow::from_record(i + 1, record))
                .collect();

            let mut table = tabled::Table::new(rows);
            table.with(tabled::settings::Style::rounded());

            let more = if state.has_next_page() {
                ", more available"
            } else {
                ""
            };
            Ok(format!(
                "{}\n{} item(s) from {} page(s) of {}{}",
                table,
                state.len(),
                state.page(),
                label,
                more
            ))
        }
        OutputFormat::Json => serde_json::to_string_pretty(&FeedListing {
            feed: label,
            page: state.page(),
            has_next_page: state.has_next_page(),
            total_count: state.total_count(),
            loaded_at: state.last_loaded_at(),
            items: state.items(),
        }),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
