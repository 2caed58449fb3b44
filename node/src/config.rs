use clap::Parser;
use lottery_common::{
    config::DEFAULT_RPC_BIND_ADDRESS,
    get_cli_styles,
    network::Network,
    prompt::{default_logs_datetime_format, LogLevel, ModuleConfig},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RPC_THREADS: usize = 2;

fn default_rpc_bind_address() -> String {
    DEFAULT_RPC_BIND_ADDRESS.to_owned()
}

fn default_rpc_threads() -> usize {
    DEFAULT_RPC_THREADS
}

fn default_logs_path() -> String {
    "logs/".to_owned()
}

fn default_filename_log() -> String {
    "lottery-node.log".to_owned()
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct RPCConfig {
    /// RPC bind address to listen for HTTP requests
    #[clap(long, default_value_t = default_rpc_bind_address())]
    #[serde(default = "default_rpc_bind_address")]
    pub rpc_bind_address: String,
    /// Number of HTTP workers
    #[clap(long, default_value_t = default_rpc_threads())]
    #[serde(default = "default_rpc_threads")]
    pub rpc_threads: usize,
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
    /// If disabled, the log file will be named lottery-node.log instead of YYYY-MM-DD.lottery-node.log
    #[clap(long)]
    #[serde(default)]
    pub disable_file_log_date_based: bool,
    /// Disable the usage of colors in log
    #[clap(long)]
    #[serde(default)]
    pub disable_log_color: bool,
    /// Disable terminal interactive mode
    /// You will not be able to write CLI commands in it or to have an updated prompt
    #[clap(long)]
    #[serde(default)]
    pub disable_interactive_mode: bool,
    /// Log filename
    #[clap(long, default_value_t = default_filename_log())]
    #[serde(default = "default_filename_log")]
    pub filename_log: String,
    /// Logs directory
    /// By default it will be logs/ of the current directory.
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
    version = lottery_common::config::VERSION,
    about = "Development node hosting lottery contracts",
    styles = get_cli_styles()
)]
#[command(name = "Lottery Node")]
pub struct Config {
    #[clap(flatten)]
    pub rpc: RPCConfig,
    #[clap(flatten)]
    pub log: LogConfig,
    /// Network profile reported to clients
    #[clap(long, value_enum, default_value_t = Network::Standalone)]
    #[serde(default)]
    pub network: Network,
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
}
