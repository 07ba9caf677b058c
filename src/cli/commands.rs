use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::Value;

use crate::config::Config;
use crate::filters::HistoryFilter;
use crate::logging::init_logging;
use crate::profile::{InstallRoots, Resolution};
use crate::tools::{ToolRequest, ToolSession};
use crate::utils::{default_config_path, profile_path_override};

#[derive(Parser)]
#[command(name = "chromium-sync")]
#[command(version)]
#[command(about = "Query history, synced tabs and bookmarks of a local Chromium profile", long_about = None)]
pub struct Cli {
    /// Profile directory to read (overrides CHROMIUM_PROFILE_PATH and saved preferences)
    #[arg(long, global = true, value_name = "DIR")]
    pub profile: Option<PathBuf>,

    /// Browser to read: brave, chrome or chromium
    #[arg(long, global = true)]
    pub browser: Option<String>,

    /// Preference file (overrides CHROMIUM_SYNC_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Query a private copy of History when the browser keeps it locked
    #[arg(long, global = true)]
    pub snapshot_on_lock: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search browsing history, newest first
    History(HistoryArgs),
    /// Open tabs of every synced device
    Tabs,
    /// Open tabs of the local browser
    LocalTabs,
    /// List bookmarks, or the direct children of one folder
    Bookmarks {
        /// Folder id to list
        #[arg(long)]
        folder: Option<String>,
    },
    /// Search URL bookmarks by title or URL
    SearchBookmarks { query: String },
    /// List every detected browser profile
    Profiles,
    /// Select a browser
    Select {
        browser: String,
        /// Save as the default for later runs
        #[arg(long)]
        save: bool,
    },
    /// Select a profile directory
    SetProfile {
        path: PathBuf,
        /// Save as the default for later runs
        #[arg(long)]
        save: bool,
    },
    /// Answer line-delimited JSON tool requests on stdin
    Serve,
}

#[derive(Args, Debug, Default)]
pub struct HistoryArgs {
    /// Case-insensitive substring of URL or title
    #[arg(short, long)]
    pub query: Option<String>,

    /// Regular expression matched against URL or title
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Only visits at or after this date (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS, UTC)
    #[arg(long)]
    pub after: Option<String>,

    /// Only visits before this date
    #[arg(long)]
    pub before: Option<String>,

    /// Only visits from the last N days
    #[arg(short, long)]
    pub days_back: Option<u32>,

    /// Maximum number of results (default 100)
    #[arg(short, long)]
    pub limit: Option<usize>,
}

impl From<HistoryArgs> for HistoryFilter {
    fn from(args: HistoryArgs) -> Self {
        HistoryFilter {
            query: args.query,
            pattern: args.pattern,
            after: args.after,
            before: args.before,
            days_back: args.days_back,
            limit: args.limit,
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.clone().or_else(default_config_path);
    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.snapshot_on_lock {
        config.read.snapshot_on_lock = true;
    }

    let serving = matches!(cli.command, Commands::Serve);
    // One-shot commands cannot ask back, so they take the first detected browser.
    let resolution = if serving { Resolution::Unique } else { Resolution::FirstMatch };
    let mut session = ToolSession::new(config, config_path, InstallRoots::from_system())
        .with_override(cli.profile.clone().or_else(profile_path_override))
        .with_resolution(resolution);

    if let Some(browser) = cli.browser {
        session
            .call(ToolRequest::SelectBrowser { browser, save_default: false })
            .context("Failed to select browser")?;
    }

    let request = match cli.command {
        Commands::History(args) => ToolRequest::GetHistory(args.into()),
        Commands::Tabs => ToolRequest::GetTabsAllDevices {},
        Commands::LocalTabs => ToolRequest::GetTabsLocal {},
        Commands::Bookmarks { folder } => ToolRequest::GetBookmarks { folder },
        Commands::SearchBookmarks { query } => ToolRequest::SearchBookmarks { query },
        Commands::Profiles => ToolRequest::ListProfiles {},
        Commands::Select { browser, save } => ToolRequest::SelectBrowser { browser, save_default: save },
        Commands::SetProfile { path, save } => ToolRequest::SetProfilePath { path, save_default: save },
        Commands::Serve => return serve(&mut session),
    };

    let name = request.name();
    let result = session.call(request).with_context(|| format!("{name} failed"))?;
    print_json(&result)
}

fn print_json(value: &Value) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write result")?;
    writeln!(stdout)?;
    Ok(())
}

/// One request per input line, one compact JSON response per output line
fn serve(session: &mut ToolSession) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = session.handle_line(&line);
        serde_json::to_writer(&mut stdout, &response).context("Failed to write response")?;
        writeln!(stdout)?;
        stdout.flush()?;
    }

    Ok(())
}
