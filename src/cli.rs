use crate::config::{ClientConfig, DEFAULT_API_URL, DEFAULT_API_VERSION, DEFAULT_TIMEOUT_SECS};
use crate::models::{ExportFormat, ScanType};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// SecureCheck 命令行客户端
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the SecureCheck API
    #[arg(long, env = "SECURECHECK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// API version segment (`/api/<version>`)
    #[arg(long, env = "SECURECHECK_API_VERSION", default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Directory for the persisted session and settings
    #[arg(long, env = "SECURECHECK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Use the built-in demo data instead of the API
    #[arg(long)]
    pub offline: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    Register {
        email: String,
        #[arg(long, env = "SECURECHECK_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        full_name: String,
    },
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long, env = "SECURECHECK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Resolve a client route (e.g. /dashboard, /scans/3)
    Open { path: String },
    /// List scans with summary counters
    Dashboard {
        /// all, pending, running, completed or failed
        #[arg(long, default_value = "all")]
        status: String,
        /// Case-insensitive filter on the target URL
        #[arg(long)]
        search: Option<String>,
    },
    /// Manage scans
    #[command(subcommand)]
    Scan(ScanCommand),
    /// Show account-wide scan statistics
    Stats,
    /// Theme and language preferences
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand, Debug)]
pub enum ScanCommand {
    /// Start a new scan
    New {
        target_url: String,
        /// basic, headers, ssl or full
        #[arg(long = "type", default_value = "full")]
        scan_type: ScanType,
    },
    /// Show scan details
    Show {
        id: i64,
        /// Keep refreshing until the scan finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// Delete a scan
    Delete { id: i64 },
    /// Run a scan again
    Restart { id: i64 },
    /// Show the generated report
    Report { id: i64 },
    /// Download the report as json or csv
    Export {
        id: i64,
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print current preferences
    Show,
    /// light, dark or system
    Theme { value: String },
    /// es or en
    Language { value: String },
}

impl Args {
    pub fn client_config(&self) -> Result<ClientConfig> {
        let data_dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => ClientConfig::default_data_dir()?,
        };

        let mut config = ClientConfig::new(self.api_url.clone(), data_dir);
        config.api_version = self.api_version.clone();
        config.timeout = Duration::from_secs(self.timeout.max(1));
        Ok(config)
    }
}
