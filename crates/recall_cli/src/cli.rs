use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "recall", version, about = "Spaced review and tag mind maps for notes")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "RECALL_DB", default_value = "recall.sqlite3", global = true)]
    pub db: PathBuf,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "RECALL_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "RECALL_LOG_DIR", global = true)]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a note
    Add(AddArgs),
    /// Change a note's title, content or tags; review state is kept
    Edit(EditArgs),
    /// Delete a note permanently
    Delete {
        id: Uuid,
    },
    /// List notes due for review, most overdue first
    Due,
    /// Mark a note as reviewed and advance its level
    Review {
        id: Uuid,
    },
    /// Put a note back at level 0, due in one hour
    Reset {
        id: Uuid,
    },
    /// Archive a note, or restore it with --restore
    Archive {
        id: Uuid,
        #[arg(long)]
        restore: bool,
    },
    /// Show tag clusters over active notes
    Tags {
        /// Only list notes carrying this tag (exact, case-sensitive)
        #[arg(long)]
        tag: Option<String>,
    },
    /// Print the positioned tag mind map as JSON
    MindMap(MindMapArgs),
    /// Poll the due set until interrupted
    Watch {
        /// Seconds between scans
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Note title
    #[arg(long)]
    pub title: String,

    /// Note body
    #[arg(long, default_value = "")]
    pub content: String,

    /// Tags (can be specified multiple times)
    #[arg(long, short, action = clap::ArgAction::Append)]
    pub tag: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    pub id: Uuid,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New body
    #[arg(long)]
    pub content: Option<String>,

    /// Replacement tags (can be specified multiple times)
    #[arg(long, short, action = clap::ArgAction::Append, conflicts_with = "clear_tags")]
    pub tag: Vec<String>,

    /// Remove every tag
    #[arg(long)]
    pub clear_tags: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MindMapArgs {
    /// Minimum notes per tag for a node
    #[arg(long, default_value_t = 2)]
    pub min_tag_size: i64,

    #[arg(long, default_value_t = 800.0)]
    pub width: f64,

    #[arg(long, default_value_t = 600.0)]
    pub height: f64,
}
