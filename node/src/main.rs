use std::{fs::File, io::Write, path::Path, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use lottery_common::{
    async_handler,
    prompt::{
        argument::ArgumentManager,
        command::{Command, CommandError, CommandHandler, CommandManager},
        Color, Prompt, PromptError,
    },
};
use lottery_node::{
    config::Config,
    core::blockchain::Blockchain,
    rpc::NodeRpcServer,
};

#[tokio::main]
async fn main() -> Result<()> {
    let mut config: Config = Config::parse();
    if let Some(path) = config.config_file.as_ref() {
        if config.generate_config_template {
            if Path::new(path).exists() {
                eprintln!("Config file already exists at {}", path);
                return Ok(());
            }

            let mut file = File::create(path).context("Error while creating config file")?;
            let json = serde_json::to_string_pretty(&config)
                .context("Error while serializing config file")?;
            file.write_all(json.as_bytes())
                .context("Error while writing config file")?;
            println!("Config file template generated at {}", path);
            return Ok(());
        }

        let file = File::open(path).context("Error while opening config file")?;
        config = serde_json::from_reader(file).context("Error while reading config file")?;
    } else if config.generate_config_template {
        eprintln!(
            "Provided config file path is required to generate the template with --config-file"
        );
        return Ok(());
    }

    let log_config = &config.log;
    let prompt = Prompt::new(
        log_config.log_level,
        &log_config.logs_path,
        &log_config.filename_log,
        log_config.disable_file_logging,
        log_config.disable_file_log_date_based,
        log_config.disable_log_color,
        !log_config.disable_interactive_mode,
        log_config.logs_modules.clone(),
        log_config.file_log_level.unwrap_or(log_config.log_level),
        !log_config.disable_ascii_art,
        log_config.datetime_format.clone(),
    )?;

    let blockchain = Blockchain::new(config.network);
    let server = NodeRpcServer::new(Arc::clone(&blockchain), config.rpc.clone()).await?;
    if log::log_enabled!(log::Level::Info) {
        for address in server.get_bound_addresses().await {
            info!("JSON-RPC available at http://{}/json_rpc", address);
        }
    }

    if prompt.is_interactive() {
        let command_manager = CommandManager::new(prompt.clone());
        command_manager.store_in_context(Arc::clone(&blockchain))?;
        register_commands(&command_manager)?;

        if let Err(e) = prompt
            .start(async_handler!(prompt_message_builder), Some(&command_manager))
            .await
        {
            error!("Error while running prompt: {:#}", e);
        }
    } else {
        info!("Interactive mode disabled, press Ctrl+C to stop");
        tokio::signal::ctrl_c()
            .await
            .context("Error while waiting for Ctrl+C")?;
    }

    server.stop().await;
    Ok(())
}

fn register_commands(manager: &CommandManager) -> Result<(), CommandError> {
    manager.add_command(Command::new(
        "status",
        "Show the node height and hosted contracts count",
        CommandHandler::Async(async_handler!(status)),
    ))?;
    manager.add_command(Command::new(
        "contracts",
        "List deployed contracts with their ledger",
        CommandHandler::Async(async_handler!(contracts)),
    ))?;
    manager.register_default_commands()
}

fn get_blockchain(manager: &CommandManager) -> Result<Arc<Blockchain>, CommandError> {
    let context = manager.get_context().lock()?;
    Ok(Arc::clone(context.get::<Arc<Blockchain>>()?))
}

async fn prompt_message_builder(
    prompt: &Prompt,
    command_manager: Option<&CommandManager>,
) -> Result<String, PromptError> {
    let height = match command_manager {
        Some(manager) => get_blockchain(manager)
            .map_err(|e| PromptError::Any(e.into()))?
            .get_height()
            .await
            .to_string(),
        None => "?".to_owned(),
    };

    Ok(format!(
        "{} | {} {} >> ",
        prompt.colorize_string(Color::Green, "Lottery Node"),
        prompt.colorize_string(Color::Yellow, "Height:"),
        prompt.colorize_string(Color::Green, &height)
    ))
}

async fn status(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    let blockchain = get_blockchain(manager)?;
    manager.message(format!("Network: {}", blockchain.get_network()));
    manager.message(format!("Height: {}", blockchain.get_height().await));
    manager.message(format!("Contracts: {}", blockchain.count_contracts().await));
    manager.message(format!("Uptime: {}s", manager.running_since().as_secs()));
    Ok(())
}

async fn contracts(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    let blockchain = get_blockchain(manager)?;
    let contracts = blockchain.get_contracts().await;
    if contracts.is_empty() {
        manager.message("No contract deployed yet");
        return Ok(());
    }

    for (address, ledger) in contracts {
        manager.message(format!("- {}: {}", address, ledger));
    }
    Ok(())
}
