use clap::Parser;
use lottery_common::{
    config::VERSION,
    crypto::Hash,
    get_cli_styles,
    network::Network,
    prompt::{default_logs_datetime_format, LogLevel, ModuleConfig},
};
use serde::{Deserialize, Serialize};

use crate::tickets::DEFAULT_TICKETS_PATH;

fn default_log_filename() -> String {
    String::from("lottery-cli.log")
}

fn default_logs_path() -> String {
    String::from("logs/")
}

fn default_tickets_path() -> String {
    DEFAULT_TICKETS_PATH.to_owned()
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct LogConfig {
    /// Set log level
    #[clap(long, value_enum, default_value_t = LogLevel::Info)]
    #[serde(default)]
    pub log_level: LogLevel,
    /// Set file log level
    /// By default, it will be the same as log level
    #[clap(long, value_enum)]
    pub file_log_level: Option<LogLevel>,
    /// Disable the log file
    #[clap(long)]
    #[serde(default)]
    pub disable_file_logging: bool,
    /// Disable the log filename date based
    /// If disabled, the log file will be named lottery-cli.log instead of YYYY-MM-DD.lottery-cli.log
    #[clap(long)]
    #[serde(default)]
    pub disable_file_log_date_based: bool,
    /// Disable the usage of colors in log
    #[clap(long)]
    #[serde(default)]
    pub disable_log_color: bool,
    /// Disable terminal interactive mode
    /// Only useful together with --exec
    #[clap(long)]
    #[serde(default)]
    pub disable_interactive_mode: bool,
    /// Log filename
    ///
    /// File will be stored in logs directory, this is only the filename, not the full path.
    #[clap(long, default_value_t = default_log_filename())]
    #[serde(default = "default_log_filename")]
    pub filename_log: String,
    /// Logs directory
    ///
    /// It must end with a / to be a valid folder.
    #[clap(long, default_value_t = default_logs_path())]
    #[serde(default = "default_logs_path")]
    pub logs_path: String,
    /// Module configuration for logs, written as module=level
    #[clap(long)]
    #[serde(default)]
    pub logs_modules: Vec<ModuleConfig>,
    /// Disable the ascii art at startup
    #[clap(long)]
    #[serde(default)]
    pub disable_ascii_art: bool,
    /// Change the datetime format used by the logger
    #[clap(long, default_value_t = default_logs_datetime_format())]
    #[serde(default = "default_logs_datetime_format")]
    pub datetime_format: String,
}

#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[clap(
    version = VERSION,
    about = "Deploy, join and play lottery contracts from the command line",
    styles = get_cli_styles()
)]
#[command(name = "Lottery CLI")]
pub struct Config {
    #[clap(flatten)]
    pub log: LogConfig,
    /// Network profile to connect to
    #[clap(long, value_enum, default_value_t = Network::Standalone)]
    #[serde(default)]
    pub network: Network,
    /// Node JSON-RPC address, overrides the one of the network profile
    #[clap(long)]
    pub node_address: Option<String>,
    /// Restore the wallet from this hex seed instead of asking
    #[clap(long)]
    pub seed: Option<String>,
    /// Join this contract directly once the wallet is ready
    #[clap(long)]
    pub contract_address: Option<Hash>,
    /// Directory where owned ticket IDs are kept
    #[clap(long, default_value_t = default_tickets_path())]
    #[serde(default = "default_tickets_path")]
    pub tickets_path: String,
    /// JSON File to load the configuration from
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub config_file: Option<String>,
    /// Generate the template at the `config_file` path
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub generate_config_template: bool,
    /// Execute a command and exit
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub exec: Option<String>,
}

impl Config {
    pub fn is_exec_mode(&self) -> bool {
        self.exec.is_some()
    }

    pub fn get_exec_command(&self) -> Option<&String> {
        self.exec.as_ref()
    }

    // Node URL from the flag or the network profile
    pub fn get_node_address(&self) -> String {
        self.node_address
            .clone()
            .unwrap_or_else(|| self.network.endpoints().node.to_owned())
    }
}
