pub mod argument;
pub mod command;

use std::{
    fmt::{self, Display, Formatter},
    fs,
    future::Future,
    io::Write,
    path::Path,
    pin::Pin,
    str::FromStr,
    sync::Arc,
};

use crossterm::style::Stylize;
use fern::colors::ColoredLevelConfig;
use log::{info, Level, LevelFilter};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::Mutex,
};

use crate::{config::VERSION, crypto::Hash};
use self::command::{CommandError, CommandManager};

pub use crossterm::style::Color;

pub type ShareablePrompt = Arc<Prompt>;

// Builds the text shown before each input line
pub type PromptMessageBuilder = for<'a> fn(
    &'a Prompt,
    Option<&'a CommandManager>,
) -> Pin<Box<dyn Future<Output = Result<String, PromptError>> + 'a>>;

pub fn default_logs_datetime_format() -> String {
    "[%Y-%m-%d] (%H:%M:%S%.3f)".to_owned()
}

const ASCII_ART: &str = r"
  _           _   _
 | |    ___  | |_| |_ ___ _ __ _   _
 | |   / _ \ | __| __/ _ \ '__| | | |
 | |__| (_) || |_| ||  __/ |  | |_| |
 |_____\___/  \__|\__\___|_|   \__, |
                               |___/
";

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("End of stream")]
    EndOfStream,
    #[error("Prompt is not interactive")]
    NotInteractive,
    #[error("Invalid value: {}", _0)]
    ParseInputError(String),
    #[error(transparent)]
    FernError(#[from] fern::InitError),
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    LoggerError(#[from] log::SetLoggerError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "off" => Self::Off,
            "error" => Self::Error,
            "warn" => Self::Warn,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => return Err(format!("Invalid log level '{s}'")),
        })
    }
}

// Log level override for a single module, written as `module=level`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub module: String,
    pub level: LogLevel,
}

impl FromStr for ModuleConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, level) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected module=level, got '{s}'"))?;
        if module.is_empty() {
            return Err("Module name is empty".to_owned());
        }

        Ok(Self {
            module: module.to_owned(),
            level: level.parse()?,
        })
    }
}

pub struct Prompt {
    input: Mutex<Option<Lines<BufReader<Stdin>>>>,
    interactive: bool,
    disable_colors: bool,
}

impl Prompt {
    /// Create the prompt and install it as the global logger
    ///
    /// Console output goes to stdout at `level`. Unless disabled, a copy
    /// is written under `dir_path` at `file_level`, rotated daily when
    /// `disable_file_log_date_based` is false. The file never gets more
    /// than the current console level, which `set_log_level` changes.
    pub fn new(
        level: LogLevel,
        dir_path: &str,
        filename_log: &str,
        disable_file_logging: bool,
        disable_file_log_date_based: bool,
        disable_colors: bool,
        interactive: bool,
        module_logs: Vec<ModuleConfig>,
        file_level: LogLevel,
        show_ascii: bool,
        datetime_format: String,
    ) -> Result<ShareablePrompt, PromptError> {
        let prompt = Self::without_logger(interactive, disable_colors);
        prompt.setup_logger(
            level,
            dir_path,
            filename_log,
            disable_file_logging,
            disable_file_log_date_based,
            module_logs,
            file_level,
            datetime_format,
        )?;

        log_panics::init();

        if show_ascii {
            prompt.print_ascii_art();
        }

        Ok(prompt)
    }

    // Prompt that relies on whatever logger is already installed
    pub fn without_logger(interactive: bool, disable_colors: bool) -> ShareablePrompt {
        Arc::new(Self {
            input: Mutex::new(None),
            interactive,
            disable_colors,
        })
    }

    fn setup_logger(
        &self,
        level: LogLevel,
        dir_path: &str,
        filename_log: &str,
        disable_file_logging: bool,
        disable_file_log_date_based: bool,
        module_logs: Vec<ModuleConfig>,
        file_level: LogLevel,
        datetime_format: String,
    ) -> Result<(), PromptError> {
        let colors = ColoredLevelConfig::new()
            .debug(fern::colors::Color::Green)
            .info(fern::colors::Color::Cyan)
            .warn(fern::colors::Color::Yellow)
            .error(fern::colors::Color::Red)
            .trace(fern::colors::Color::Magenta);

        let disable_colors = self.disable_colors;
        let stdout_format = datetime_format.clone();
        let stdout_log = fern::Dispatch::new()
            .format(move |out, message, record| {
                let now = chrono::Local::now().format(&stdout_format);
                let target = record.target();
                // keep messages aligned regardless of the level width
                let pad = if record.level() == Level::Info || record.level() == Level::Warn {
                    " "
                } else {
                    ""
                };
                if disable_colors {
                    out.finish(format_args!(
                        "\r{} [{}]{} [{}] {}",
                        now,
                        record.level(),
                        pad,
                        target,
                        message
                    ))
                } else {
                    out.finish(format_args!(
                        "\r\x1b[2K\x1b[90m{}\x1b[0m [{}]{} \x1b[90m[{}]\x1b[0m {}",
                        now,
                        colors.color(record.level()),
                        pad,
                        target,
                        message
                    ))
                }
            })
            .level(LevelFilter::Trace)
            .chain(std::io::stdout());

        let mut base = fern::Dispatch::new()
            .level_for("actix_server", LevelFilter::Warn)
            .level_for("actix_web", LevelFilter::Warn)
            .level_for("hyper", LevelFilter::Warn)
            .level_for("hyper_util", LevelFilter::Warn)
            .level_for("reqwest", LevelFilter::Warn)
            .level_for("mio", LevelFilter::Warn)
            .level_for("rustls", LevelFilter::Warn);

        for module in module_logs {
            base = base.level_for(module.module, module.level.into());
        }

        base = base.chain(stdout_log);

        if !disable_file_logging {
            let path = Path::new(dir_path);
            if !path.exists() {
                fs::create_dir_all(path)?;
            }

            let file_format = datetime_format;
            let file_log = fern::Dispatch::new()
                .format(move |out, message, record| {
                    out.finish(format_args!(
                        "{} [{}] [{}] {}",
                        chrono::Local::now().format(&file_format),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .level(file_level.into());

            let file_log = if disable_file_log_date_based {
                file_log.chain(fern::log_file(path.join(filename_log))?)
            } else {
                // DateBased concatenates prefix and suffix as plain strings
                let prefix = if dir_path.ends_with('/') {
                    dir_path.to_owned()
                } else {
                    format!("{dir_path}/")
                };
                file_log.chain(fern::DateBased::new(
                    prefix,
                    format!("%Y-%m-%d.{filename_log}"),
                ))
            };

            base = base.chain(file_log);
        }

        base.apply()?;
        // fern sets the max level from its dispatches, the console level
        // is enforced here so set_log_level can raise it later
        log::set_max_level(level.into());
        Ok(())
    }

    fn print_ascii_art(&self) {
        if self.disable_colors {
            println!("{ASCII_ART}");
        } else {
            println!("{}", ASCII_ART.with(Color::Green));
        }
        info!("Lottery v{}", VERSION);
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn colorize_string(&self, color: Color, value: &str) -> String {
        if self.disable_colors {
            value.to_owned()
        } else {
            format!("{}", value.with(color))
        }
    }

    /// Show `message` and wait for the next line typed by the user
    pub async fn read_input<S: Display>(&self, message: S) -> Result<String, PromptError> {
        if !self.interactive {
            return Err(PromptError::NotInteractive);
        }

        {
            let mut stdout = std::io::stdout();
            write!(stdout, "\r{}", message)?;
            stdout.flush()?;
        }

        let mut input = self.input.lock().await;
        let lines = input.get_or_insert_with(|| BufReader::new(tokio::io::stdin()).lines());
        match lines.next_line().await? {
            Some(line) => Ok(line.trim().to_owned()),
            None => Err(PromptError::EndOfStream),
        }
    }

    pub async fn read_hash<S: Display>(&self, message: S) -> Result<Hash, PromptError> {
        let value = self.read_input(message).await?;
        value
            .parse()
            .map_err(|e: &str| PromptError::ParseInputError(e.to_owned()))
    }

    pub async fn read_number<S: Display>(&self, message: S) -> Result<u64, PromptError> {
        let value = self.read_input(message).await?;
        value
            .parse()
            .map_err(|_| PromptError::ParseInputError(format!("'{value}' is not a number")))
    }

    /// Read commands until `exit` or the end of input
    ///
    /// Command failures are logged and the loop keeps going.
    pub async fn start(
        &self,
        message_builder: PromptMessageBuilder,
        command_manager: Option<&CommandManager>,
    ) -> Result<(), PromptError> {
        loop {
            let message = message_builder(self, command_manager).await?;
            let input = match self.read_input(message).await {
                Ok(input) => input,
                Err(PromptError::EndOfStream) => {
                    info!("End of input, stopping...");
                    break;
                }
                Err(e) => return Err(e),
            };

            if input.is_empty() {
                continue;
            }

            match command_manager {
                Some(manager) => match manager.handle_command(input).await {
                    Ok(()) => {}
                    Err(CommandError::Exit) => break,
                    Err(e) => manager.error(format!("Error while executing command: {:#}", e)),
                },
                None => info!("You said '{}'", input),
            }
        }

        Ok(())
    }
}
