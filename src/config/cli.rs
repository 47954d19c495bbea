use crate::app::requests::{
    ListFormat, SearchByUrlRequest, SearchListRequest, SqlPreviewRequest, WindowRequest,
};
use crate::config::settings::Settings;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "repost-lens")]
#[command(about = "SEO content analysis over Google Search Console data", version)]
pub struct Cli {
    #[arg(long, global = true, env = "REPOSTLENS_CONFIG", help = "Path to repostlens.toml")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the JSON API server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Analyze every page listed in a CSV file
    Batch {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<String>,
        #[arg(long)]
        concurrency: Option<usize>,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long, help = "Scrape each page and include its text in the prompt")]
        fetch_article: bool,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Print the generated SQL without running it
    Sql {
        #[command(subcommand)]
        query: SqlCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum SqlCommand {
    /// Site-wide page list with best query per page
    List {
        #[arg(long)]
        site: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        min_clicks: Option<u64>,
        #[arg(long)]
        prefix: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Per-query rows for one page
    Page {
        #[arg(long)]
        page: String,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct WindowArgs {
    #[arg(long, help = "First day of the current period (YYYY-MM-DD)")]
    pub start: Option<NaiveDate>,
    #[arg(long, help = "Last day of the current period (YYYY-MM-DD)")]
    pub end: Option<NaiveDate>,
    #[arg(long, help = "Period length in days")]
    pub days: Option<u32>,
}

impl From<WindowArgs> for WindowRequest {
    fn from(args: WindowArgs) -> Self {
        WindowRequest {
            start_date: args.start,
            end_date: args.end,
            days: args.days,
        }
    }
}

impl Command {
    /// Command-line flags win over file and environment settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        match self {
            Command::Serve { host, port } => {
                if let Some(host) = host {
                    settings.server.host = host.clone();
                }
                if let Some(port) = port {
                    settings.server.port = *port;
                }
            }
            Command::Batch {
                output,
                concurrency,
                provider,
                ..
            } => {
                if let Some(output) = output {
                    settings.batch.output_path = output.clone();
                }
                if let Some(concurrency) = concurrency {
                    settings.batch.concurrency = *concurrency;
                }
                if let Some(provider) = provider {
                    settings.llm.provider = provider.to_lowercase();
                }
            }
            Command::Sql { .. } => {}
        }
    }
}

impl SqlCommand {
    pub fn to_request(&self) -> SqlPreviewRequest {
        match self.clone() {
            SqlCommand::List {
                site,
                limit,
                min_clicks,
                prefix,
                window,
            } => SqlPreviewRequest::List(SearchListRequest {
                site,
                format: ListFormat::Json,
                window: window.into(),
                limit,
                min_clicks,
                page_prefix: prefix,
            }),
            SqlCommand::Page {
                page,
                site,
                limit,
                window,
            } => SqlPreviewRequest::ByUrl(SearchByUrlRequest {
                page,
                site,
                window: window.into(),
                limit,
            }),
        }
    }
}
