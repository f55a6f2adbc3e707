use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "repopulse")]
#[command(about = "RepoPulse - GitHub activity tracking and digests", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file, without extension
    #[arg(long, env = "REPOPULSE_CONFIG", default_value = repopulse_core::config::DEFAULT_SETTINGS_FILE)]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start tracking a repository
    Track {
        /// Repository as owner/name
        repo: String,
    },

    /// Stop tracking a repository
    Untrack {
        /// Repository as owner/name
        repo: String,
    },

    /// List tracked repositories with their latest activity
    Tracked {
        /// Lookback in days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Fetch fresh activity for tracked repositories
    Refresh {
        /// Only this repository
        #[arg(long)]
        repo: Option<String>,

        /// Lookback in days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Show trending repositories
    Trending {
        /// Save the result as a trending capture
        #[arg(long)]
        save: bool,

        /// Append a model-written overview
        #[arg(long)]
        summary: bool,
    },

    /// Search repositories
    Search {
        /// Search query
        query: String,

        /// Maximum results
        #[arg(long, default_value_t = repopulse_engine::DEFAULT_SEARCH_LIMIT)]
        limit: u8,
    },

    /// Show recent activity of one repository from its latest snapshot
    Show {
        /// Repository as owner/name
        repo: String,

        /// Lookback in days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Manage notification tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Start the API server with the scheduler
    Serve {
        /// Port to listen on; defaults to the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the scheduler and trending capture without the API
    Daemon,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task
    Add(TaskArgs),

    /// Replace a task's settings
    Update {
        /// Task ID
        id: String,

        #[command(flatten)]
        args: TaskArgs,
    },

    /// Delete a task
    Remove {
        /// Task ID
        id: String,
    },

    /// List tasks
    List,

    /// Run a task now
    Run {
        /// Task ID
        id: String,
    },
}

#[derive(Args)]
pub struct TaskArgs {
    /// Recipient address
    #[arg(long)]
    pub email: String,

    /// Repositories as owner/name; repeat or separate with commas
    #[arg(long = "repo", required = true, value_delimiter = ',')]
    pub repositories: Vec<String>,

    /// immediate, daily, weekly or monthly
    #[arg(long, default_value = "daily")]
    pub frequency: String,

    /// Weekday for weekly tasks: 0-7 (0 and 7 are Sunday) or a name
    #[arg(long)]
    pub weekday: Option<String>,

    /// Day of month for monthly tasks, 1-31
    #[arg(long)]
    pub month_day: Option<String>,

    /// Delivery time, HH:MM
    #[arg(long)]
    pub time: Option<String>,
}
