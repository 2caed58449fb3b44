use std::{
    collections::HashMap,
    fmt::Display,
    future::Future,
    pin::Pin,
    rc::Rc,
    str::FromStr,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::{async_handler, config::VERSION, context::Context};

use super::{argument::*, LogLevel, PromptError, ShareablePrompt};
use anyhow::Error;
use log::{error, info, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Expected a command name")]
    ExpectedCommandName,
    #[error("Command was not found")]
    CommandNotFound,
    #[error("Expected required argument {}", _0)]
    ExpectedRequiredArg(String), // arg name
    #[error("Too many arguments")]
    TooManyArguments,
    #[error(transparent)]
    ArgError(#[from] ArgError),
    #[error("Invalid argument: {}", _0)]
    InvalidArgument(String),
    #[error("Exit command was called")]
    Exit,
    #[error(transparent)]
    PromptError(#[from] PromptError),
    #[error(transparent)]
    Any(#[from] Error),
    #[error("Poison Error: {}", _0)]
    PoisonError(String),
    #[error("Missing required argument '{}' in exec mode", _0)]
    MissingArgument(String),
}

impl<T> From<PoisonError<T>> for CommandError {
    fn from(err: PoisonError<T>) -> Self {
        Self::PoisonError(format!("{}", err))
    }
}

pub type SyncCommandCallback = fn(&CommandManager, ArgumentManager) -> Result<(), CommandError>;
pub type AsyncCommandCallback = fn(
    &'_ CommandManager,
    ArgumentManager,
) -> Pin<Box<dyn Future<Output = Result<(), CommandError>> + '_>>;

pub enum CommandHandler {
    Sync(SyncCommandCallback),
    Async(AsyncCommandCallback),
}

pub struct Command {
    name: String,
    description: String,
    required_args: Vec<Arg>,
    optional_args: Vec<Arg>,
    callback: CommandHandler,
}

impl Command {
    pub fn new(name: &str, description: &str, callback: CommandHandler) -> Self {
        Self::with_arguments(name, description, Vec::new(), Vec::new(), callback)
    }

    pub fn with_optional_arguments(
        name: &str,
        description: &str,
        optional_args: Vec<Arg>,
        callback: CommandHandler,
    ) -> Self {
        Self::with_arguments(name, description, Vec::new(), optional_args, callback)
    }

    pub fn with_required_arguments(
        name: &str,
        description: &str,
        required_args: Vec<Arg>,
        callback: CommandHandler,
    ) -> Self {
        Self::with_arguments(name, description, required_args, Vec::new(), callback)
    }

    pub fn with_arguments(
        name: &str,
        description: &str,
        required_args: Vec<Arg>,
        optional_args: Vec<Arg>,
        callback: CommandHandler,
    ) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            required_args,
            optional_args,
            callback,
        }
    }

    pub async fn execute(
        &self,
        manager: &CommandManager,
        values: ArgumentManager,
    ) -> Result<(), CommandError> {
        match &self.callback {
            CommandHandler::Sync(handler) => handler(manager, values),
            CommandHandler::Async(handler) => handler(manager, values).await,
        }
    }

    pub fn get_name(&self) -> &String {
        &self.name
    }

    pub fn get_description(&self) -> &String {
        &self.description
    }

    pub fn get_required_args(&self) -> &Vec<Arg> {
        &self.required_args
    }

    pub fn get_optional_args(&self) -> &Vec<Arg> {
        &self.optional_args
    }

    pub fn get_usage(&self) -> String {
        let mut parts = vec![self.get_name().clone()];
        parts.extend(
            self.get_required_args()
                .iter()
                .map(|arg| format!("<{}>", arg.get_name())),
        );
        parts.extend(
            self.get_optional_args()
                .iter()
                .map(|arg| format!("[{}]", arg.get_name())),
        );
        parts.join(" ")
    }
}

// We use Mutex from std instead of tokio so we can use it in sync code too
pub struct CommandManager {
    commands: Mutex<Vec<Rc<Command>>>,
    context: Mutex<Context>,
    prompt: ShareablePrompt,
    running_since: Instant,
    batch_mode: bool,
}

impl CommandManager {
    pub fn with_context(context: Context, prompt: ShareablePrompt) -> Self {
        Self::with_batch_mode(context, prompt, false)
    }

    pub fn new(prompt: ShareablePrompt) -> Self {
        Self::with_context(Context::new(), prompt)
    }

    pub fn with_batch_mode(context: Context, prompt: ShareablePrompt, exec_mode: bool) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            context: Mutex::new(context),
            prompt,
            running_since: Instant::now(),
            batch_mode: exec_mode,
        }
    }

    pub fn new_with_batch_mode(prompt: ShareablePrompt, exec_mode: bool) -> Self {
        Self::with_batch_mode(Context::new(), prompt, exec_mode)
    }

    // In batch mode the user can't be asked for missing values
    pub fn is_batch_mode(&self) -> bool {
        self.batch_mode
    }

    // Register default commands:
    // - help
    // - version
    // - exit
    // - set_log_level
    pub fn register_default_commands(&self) -> Result<(), CommandError> {
        self.add_command(Command::with_optional_arguments(
            "help",
            "Show this help",
            vec![Arg::new("command", ArgType::String, "Command to describe")],
            CommandHandler::Async(async_handler!(help)),
        ))?;
        self.add_command(Command::new(
            "version",
            "Show the current version",
            CommandHandler::Sync(version),
        ))?;
        self.add_command(Command::new(
            "exit",
            "Shutdown the application",
            CommandHandler::Sync(exit),
        ))?;
        self.add_command(Command::with_required_arguments(
            "set_log_level",
            "Set the log level",
            vec![Arg::new(
                "level",
                ArgType::String,
                "off, error, warn, info, debug or trace",
            )],
            CommandHandler::Sync(set_log_level),
        ))?;

        Ok(())
    }

    pub fn store_in_context<T: Send + Sync + 'static>(&self, data: T) -> Result<(), CommandError> {
        let mut context = self.context.lock()?;
        context.store(data);
        Ok(())
    }

    pub fn remove_from_context<T: Send + Sync + 'static>(&self) -> Result<Option<T>, CommandError> {
        let mut context = self.context.lock()?;
        Ok(context.remove::<T>())
    }

    pub fn get_context(&self) -> &Mutex<Context> {
        &self.context
    }

    pub fn get_prompt(&self) -> &ShareablePrompt {
        &self.prompt
    }

    pub fn add_command(&self, command: Command) -> Result<(), CommandError> {
        let mut commands = self.commands.lock()?;
        commands.push(Rc::new(command));
        Ok(())
    }

    pub fn remove_all_commands(&self) -> Result<(), CommandError> {
        let mut commands = self.commands.lock()?;
        commands.clear();
        Ok(())
    }

    pub fn remove_command(&self, command_name: &str) -> Result<bool, CommandError> {
        let mut commands = self.commands.lock()?;
        if let Some(index) = commands
            .iter()
            .position(|cmd| cmd.get_name() == command_name)
        {
            commands.remove(index);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn get_commands(&self) -> &Mutex<Vec<Rc<Command>>> {
        &self.commands
    }

    // Resolve a command by name or by its 1-based position in the menu
    fn find_command(&self, name_or_index: &str) -> Result<Rc<Command>, CommandError> {
        let commands = self.commands.lock()?;
        let command = match name_or_index.parse::<usize>() {
            Ok(index) if index >= 1 => commands.get(index - 1),
            Ok(_) => None,
            Err(_) => commands
                .iter()
                .find(|command| *command.get_name() == *name_or_index),
        };
        command.cloned().ok_or(CommandError::CommandNotFound)
    }

    pub async fn handle_command(&self, value: String) -> Result<(), CommandError> {
        let mut command_split = value.split_whitespace();
        let command_name = command_split
            .next()
            .ok_or(CommandError::ExpectedCommandName)?;
        let command = self.find_command(command_name)?;

        let mut arguments: HashMap<String, ArgValue> = HashMap::new();
        for arg in command.get_required_args() {
            let arg_value = command_split
                .next()
                .ok_or_else(|| CommandError::ExpectedRequiredArg(arg.get_name().to_owned()))?;
            arguments.insert(arg.get_name().clone(), arg.parse(arg_value)?);
        }

        // include all options args available
        for optional_arg in command.get_optional_args() {
            if let Some(arg_value) = command_split.next() {
                arguments.insert(optional_arg.get_name().clone(), optional_arg.parse(arg_value)?);
            } else {
                break;
            }
        }

        if command_split.next().is_some() {
            return Err(CommandError::TooManyArguments);
        }

        command.execute(self, ArgumentManager::new(arguments)).await
    }

    pub fn display_commands(&self) -> Result<(), CommandError> {
        let commands = self.commands.lock()?;
        self.message("Available commands:");
        for (i, cmd) in commands.iter().enumerate() {
            self.message(format!(
                "[{}] {}: {}",
                i + 1,
                cmd.get_name(),
                cmd.get_description()
            ));
        }
        Ok(())
    }

    pub fn message<D: Display>(&self, message: D) {
        info!("{}", message);
    }

    pub fn warn<D: Display>(&self, message: D) {
        warn!("{}", message);
    }

    pub fn error<D: Display>(&self, message: D) {
        error!("{}", message);
    }

    pub fn running_since(&self) -> Duration {
        self.running_since.elapsed()
    }
}

async fn help(manager: &CommandManager, mut args: ArgumentManager) -> Result<(), CommandError> {
    if args.has_argument("command") {
        let arg_value = args.get_value("command")?.to_string_value()?;
        let cmd = manager.find_command(&arg_value)?;
        manager.message(format!("Usage: {}", cmd.get_usage()));
        for arg in cmd.get_required_args().iter().chain(cmd.get_optional_args()) {
            manager.message(format!("  {}: {}", arg.get_name(), arg.get_description()));
        }
    } else {
        manager.display_commands()?;
        manager.message("Type the command name or its number, see usage with help <command>");
    }
    Ok(())
}

fn exit(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    manager.message("Stopping...");
    Err(CommandError::Exit)
}

fn version(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    manager.message(format!("Version: {}", VERSION));
    Ok(())
}

fn set_log_level(manager: &CommandManager, mut args: ArgumentManager) -> Result<(), CommandError> {
    let arg_value = args.get_value("level")?.to_string_value()?;
    let level = LogLevel::from_str(&arg_value).map_err(CommandError::InvalidArgument)?;
    log::set_max_level(level.into());
    manager.message(format!("Log level set to {}", level));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Prompt;

    #[derive(Default)]
    struct Calls(Vec<String>);

    fn record(manager: &CommandManager, mut args: ArgumentManager) -> Result<(), CommandError> {
        let ticket = if args.has_argument("ticket") {
            args.get_value("ticket")?.to_number()?.to_string()
        } else {
            "none".to_owned()
        };
        let context = manager.get_context().lock()?;
        let calls = context.get_optional::<Mutex<Calls>>().ok_or(CommandError::CommandNotFound)?;
        calls.lock()?.0.push(ticket);
        Ok(())
    }

    fn manager() -> CommandManager {
        let manager = CommandManager::new(Prompt::without_logger(false, true));
        manager.store_in_context(Mutex::new(Calls::default())).unwrap();
        manager
            .add_command(Command::with_optional_arguments(
                "draw",
                "Draw a ticket",
                vec![Arg::new("ticket", ArgType::Number, "Winning ticket")],
                CommandHandler::Sync(record),
            ))
            .unwrap();
        manager.register_default_commands().unwrap();
        manager
    }

    fn calls(manager: &CommandManager) -> Vec<String> {
        let context = manager.get_context().lock().unwrap();
        let calls = context.get::<Mutex<Calls>>().unwrap();
        let calls = calls.lock().unwrap();
        calls.0.clone()
    }

    #[tokio::test]
    async fn test_select_by_name_and_number() {
        let manager = manager();
        manager.handle_command("draw 4".to_owned()).await.unwrap();
        manager.handle_command("1".to_owned()).await.unwrap();
        assert_eq!(calls(&manager), vec!["4".to_owned(), "none".to_owned()]);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let manager = manager();
        assert!(matches!(
            manager.handle_command("nope".to_owned()).await,
            Err(CommandError::CommandNotFound)
        ));
        assert!(matches!(
            manager.handle_command("0".to_owned()).await,
            Err(CommandError::CommandNotFound)
        ));
        assert!(matches!(
            manager.handle_command("99".to_owned()).await,
            Err(CommandError::CommandNotFound)
        ));
    }

    #[tokio::test]
    async fn test_argument_errors() {
        let manager = manager();
        assert!(matches!(
            manager.handle_command("draw abc".to_owned()).await,
            Err(CommandError::ArgError(_))
        ));
        assert!(matches!(
            manager.handle_command("draw 1 2".to_owned()).await,
            Err(CommandError::TooManyArguments)
        ));
        assert!(matches!(
            manager.handle_command("set_log_level".to_owned()).await,
            Err(CommandError::ExpectedRequiredArg(_))
        ));
        assert!(matches!(
            manager.handle_command("   ".to_owned()).await,
            Err(CommandError::ExpectedCommandName)
        ));
    }

    #[tokio::test]
    async fn test_exit_and_phase_switch() {
        let manager = manager();
        assert!(matches!(
            manager.handle_command("exit".to_owned()).await,
            Err(CommandError::Exit)
        ));

        assert!(manager.remove_command("draw").unwrap());
        assert!(!manager.remove_command("draw").unwrap());
        manager.remove_all_commands().unwrap();
        assert!(manager.get_commands().lock().unwrap().is_empty());
    }

    #[test]
    fn test_usage() {
        let command = Command::with_arguments(
            "claim_ticket",
            "Claim",
            vec![Arg::new("ticket", ArgType::Number, "")],
            vec![Arg::new("confirm", ArgType::Bool, "")],
            CommandHandler::Sync(exit),
        );
        assert_eq!(command.get_usage(), "claim_ticket <ticket> [confirm]");
    }
}
