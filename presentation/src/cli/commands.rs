//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for talkback
#[derive(Parser, Debug)]
#[command(name = "talkback")]
#[command(author, version, about = "Terminal chat client with streamed replies")]
#[command(long_about = r#"
talkback keeps a list of chats on disk and streams assistant replies from a
Coze-style chat API as they are generated.

Configuration is merged from (highest priority first):
1. TALKBACK_* environment variables (e.g. TALKBACK_API__API_KEY)
2. --config <path>                       Explicit config file
3. ./talkback.toml                       Project-level config
4. ~/.config/talkback/config.toml        Global config

Example:
  talkback                               Interactive chat
  talkback "Summarize the Rust ownership rules"
  talkback --mock                        Try it without an API account
"#)]
pub struct Cli {
    /// Send one message in a new chat, print the reply and exit
    pub message: Option<String>,

    /// Use the built-in mock reply instead of the API
    #[arg(long)]
    pub mock: bool,

    /// Directory for chats and settings (overrides [storage] dir)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep chats in memory only
    #[arg(long, conflicts_with = "data_dir")]
    pub ephemeral: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
