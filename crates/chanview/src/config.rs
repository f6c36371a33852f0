use std::path::PathBuf;
use std::time::Duration;

use chanview_core::OverscrollPolicy;
use clap::Parser;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://2ch.hk";

#[derive(Clone, Debug, Parser)]
#[command(
    name = "chanview",
    version,
    about = "Browse imageboard boards and threads in the terminal"
)]
pub struct Cli {
    /// Imageboard origin. Relative links in posts are resolved against it.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// Read `boards.json`, `board_index.json` and `full_thread.json` from this directory
    /// instead of the network.
    #[arg(long, value_name = "DIR")]
    pub offline: Option<PathBuf>,

    /// Open this board's thread list on startup.
    #[arg(long, value_name = "ID")]
    pub board: Option<String>,

    /// Log file. Defaults to `chanview.log` in the system temp directory.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Allow scrolling past the last page of a thread.
    #[arg(long)]
    pub overscroll: bool,
}

impl Cli {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("chanview.log"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn overscroll_policy(&self) -> OverscrollPolicy {
        if self.overscroll {
            OverscrollPolicy::Allow
        } else {
            OverscrollPolicy::Clamp
        }
    }
}
