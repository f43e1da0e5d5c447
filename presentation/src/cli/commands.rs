//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for storytime
#[derive(Parser, Debug)]
#[command(name = "storytime")]
#[command(author, version, about = "Research-backed stories written and graded by LLM agents")]
#[command(long_about = r#"
Storytime drives two tool-calling agents:

1. Authoring: researches a topic on the web and writes a segmented story
2. Evaluation: fact-checks the story and scores accuracy and citations

Configuration files are loaded from (in priority order):
1. STORYTIME_<SECTION>__<KEY>             Environment variables
2. --config <path>                        Explicit config file
3. ./storytime.toml                       Project-level config
4. ~/.config/storytime/config.toml        Global config

Example:
  storytime generate "The printing press in Mainz"
  storytime evaluate stories/json_storage/the-printing-press-in-mainz-v1.json
  storytime simulate -n 3 --keep
  storytime stories list
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write one story, on the given topic or one of the model's choosing
    Generate {
        /// Story topic
        topic: Option<String>,

        /// Override the authoring model
        #[arg(short, long, value_name = "MODEL")]
        model: Option<String>,
    },

    /// Fact-check a saved story and write an evaluation report
    Evaluate {
        /// Path to a saved story JSON file
        story: PathBuf,

        /// Report name (default: "<story>-evaluation")
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Override the evaluation model
        #[arg(short, long, value_name = "MODEL")]
        model: Option<String>,
    },

    /// Run repeated write-then-evaluate cycles
    Simulate {
        /// Number of cycles
        #[arg(short = 'n', long, value_name = "N")]
        cycles: Option<usize>,

        /// Keep the stories written by each cycle
        #[arg(long)]
        keep: bool,

        /// Stop at the first failed cycle
        #[arg(long)]
        abort_on_failure: bool,
    },

    /// Browse the story library
    Stories {
        #[command(subcommand)]
        action: StoriesCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum StoriesCommand {
    /// List saved stories, newest first
    List,
    /// Print one saved story
    Show {
        /// File name inside the story directory
        filename: String,
    },
}
