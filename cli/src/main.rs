use std::{fs::File, io::Write, path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use lottery_cli::{
    api::{LotteryApi, SharedLotteryApi},
    config::Config,
    providers::{LotteryProviders, NodeClient},
    wallet::Wallet,
};
use lottery_common::{
    async_handler,
    config::{NODE_HEALTH_POLL_INTERVAL_SECS, NODE_HEALTH_TIMEOUT_SECS, STATE_REFRESH_INTERVAL_SECS},
    crypto::Hash,
    prompt::{
        argument::{Arg, ArgType, ArgumentManager},
        command::{Command, CommandError, CommandHandler, CommandManager},
        Color, Prompt, PromptError,
    },
};
use tokio::task::JoinHandle;

// Background refresh of the session ledger, aborted when the session ends
struct StateRefreshTask(JoinHandle<()>);

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

        let exec = config.exec.take();
        let file = File::open(path).context("Error while opening config file")?;
        config = serde_json::from_reader(file).context("Error while reading config file")?;
        config.exec = exec;
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
        !log_config.disable_ascii_art && !config.is_exec_mode(),
        log_config.datetime_format.clone(),
    )?;

    let node = Arc::new(NodeClient::new(&config.get_node_address())?);
    if config.network.is_standalone() {
        node.wait_for_health(
            Duration::from_secs(NODE_HEALTH_TIMEOUT_SECS),
            Duration::from_secs(NODE_HEALTH_POLL_INTERVAL_SECS),
        )
        .await
        .with_context(|| format!("Local node at {} is not reachable", node.get_address()))?;
    }

    let command_manager = CommandManager::new_with_batch_mode(prompt.clone(), config.is_exec_mode());
    command_manager.store_in_context(config.clone())?;
    command_manager.store_in_context(Arc::clone(&node))?;

    let wallet = if let Some(seed) = config.seed.as_ref() {
        Some(Wallet::from_seed_hex(seed, config.network).context("Invalid --seed value")?)
    } else if config.network.is_standalone() {
        info!("Standalone network, using the genesis wallet");
        Some(Wallet::genesis(config.network))
    } else {
        None
    };

    match wallet {
        Some(wallet) => {
            open_wallet(&command_manager, wallet).await?;
            if let Some(address) = config.contract_address.clone() {
                join_contract(&command_manager, address).await?;
            }
        }
        None => setup_wallet_commands(&command_manager)?,
    }

    if let Some(cmd) = config.get_exec_command() {
        if log::log_enabled!(log::Level::Info) {
            info!("Executing command: {}", cmd);
        }
        let result = command_manager.handle_command(cmd.clone()).await;
        stop_session(&command_manager);
        match result {
            Ok(()) | Err(CommandError::Exit) => info!("Command executed successfully"),
            Err(e) => {
                error!("Error while executing command: {:#}", e);
                return Err(e.into());
            }
        }
    } else {
        if let Err(e) = prompt
            .start(async_handler!(prompt_message_builder), Some(&command_manager))
            .await
        {
            error!("Error while running prompt: {:#}", e);
        }
        stop_session(&command_manager);
    }

    Ok(())
}

fn get_from_context<T: Clone + Send + Sync + 'static>(
    manager: &CommandManager,
) -> Result<T, CommandError> {
    let context = manager.get_context().lock()?;
    Ok(context.get::<T>()?.clone())
}

fn stop_session(manager: &CommandManager) {
    match manager.remove_from_context::<StateRefreshTask>() {
        Ok(Some(StateRefreshTask(handle))) => handle.abort(),
        Ok(None) => {}
        Err(e) => warn!("Error while stopping state refresh: {}", e),
    }
}

async fn prompt_message_builder(
    prompt: &Prompt,
    command_manager: Option<&CommandManager>,
) -> Result<String, PromptError> {
    let mut message = prompt.colorize_string(Color::Green, "Lottery");
    let (wallet, api) = match command_manager {
        Some(manager) => {
            let context = manager
                .get_context()
                .lock()
                .map_err(|e| PromptError::Any(anyhow::anyhow!("{}", e)))?;
            (
                context.get_optional::<Arc<Wallet>>().cloned(),
                context.get_optional::<SharedLotteryApi>().cloned(),
            )
        }
        None => (None, None),
    };

    if let Some(wallet) = wallet {
        message.push_str(&format!(
            " | {}",
            prompt.colorize_string(Color::Yellow, &wallet.get_identity().short())
        ));
    }

    if let Some(api) = api {
        if let Some(state) = api.get_cached_state().await {
            let winner = if state.has_winner() {
                state.winning_ticket.to_string()
            } else {
                "-".to_owned()
            };
            message.push_str(&format!(
                " | {} {} | {} {} | {} {}",
                prompt.colorize_string(Color::Yellow, "Round:"),
                prompt.colorize_string(Color::Green, &state.round.to_string()),
                prompt.colorize_string(Color::Yellow, "Tickets:"),
                prompt.colorize_string(Color::Green, &state.total_tickets.to_string()),
                prompt.colorize_string(Color::Yellow, "Winner:"),
                prompt.colorize_string(Color::Green, &winner)
            ));
        }
    }

    message.push_str(" >> ");
    Ok(message)
}

fn setup_wallet_commands(manager: &CommandManager) -> Result<(), CommandError> {
    manager.remove_all_commands()?;
    manager.add_command(Command::new(
        "create_wallet",
        "Create a new wallet from a random seed",
        CommandHandler::Async(async_handler!(create_wallet)),
    ))?;
    manager.add_command(Command::with_optional_arguments(
        "restore_wallet",
        "Restore a wallet from its hex seed",
        vec![Arg::new("seed", ArgType::String, "64 hexadecimal characters")],
        CommandHandler::Async(async_handler!(restore_wallet)),
    ))?;
    manager.register_default_commands()?;
    manager.display_commands()
}

fn setup_contract_commands(manager: &CommandManager) -> Result<(), CommandError> {
    manager.remove_all_commands()?;
    manager.add_command(Command::new(
        "deploy",
        "Deploy a new lottery contract",
        CommandHandler::Async(async_handler!(deploy)),
    ))?;
    manager.add_command(Command::with_optional_arguments(
        "join",
        "Join an existing lottery contract",
        vec![Arg::new("address", ArgType::Hash, "Contract address")],
        CommandHandler::Async(async_handler!(join)),
    ))?;
    manager.add_command(Command::new(
        "node_status",
        "Show the node and network profile",
        CommandHandler::Async(async_handler!(node_status)),
    ))?;
    manager.register_default_commands()?;
    manager.display_commands()
}

fn setup_lottery_commands(manager: &CommandManager) -> Result<(), CommandError> {
    manager.remove_all_commands()?;
    manager.add_command(Command::new(
        "buy_ticket",
        "Buy the next ticket",
        CommandHandler::Async(async_handler!(buy_ticket)),
    ))?;
    manager.add_command(Command::with_optional_arguments(
        "draw_winner",
        "Close the round with the given winning ticket",
        vec![Arg::new("ticket", ArgType::Number, "Winning ticket ID")],
        CommandHandler::Async(async_handler!(draw_winner)),
    ))?;
    manager.add_command(Command::new(
        "claim_prize",
        "Claim the prize with your winning ticket",
        CommandHandler::Async(async_handler!(claim_prize)),
    ))?;
    manager.add_command(Command::with_required_arguments(
        "claim_ticket",
        "Claim the prize with a chosen ticket",
        vec![Arg::new("ticket", ArgType::Number, "Ticket ID")],
        CommandHandler::Async(async_handler!(claim_ticket)),
    ))?;
    manager.add_command(Command::new(
        "state",
        "Show the public ledger of the contract",
        CommandHandler::Async(async_handler!(state)),
    ))?;
    manager.add_command(Command::new(
        "my_tickets",
        "List the tickets you bought",
        CommandHandler::Async(async_handler!(my_tickets)),
    ))?;
    manager.register_default_commands()?;
    manager.display_commands()
}

// Sync the wallet with the node and move to the contract menu
async fn open_wallet(manager: &CommandManager, wallet: Wallet) -> Result<(), CommandError> {
    let node: Arc<NodeClient> = get_from_context(manager)?;
    let info = wallet
        .wait_for_sync(&node)
        .await
        .context("Error while syncing wallet")?;

    manager.message(format!("Network: {}", wallet.get_network()));
    manager.message(format!("Identity: {}", wallet.get_identity()));
    manager.message(format!("Node height: {}", info.height));

    let wallet = Arc::new(wallet);
    manager.store_in_context(LotteryProviders::new(node, Arc::clone(&wallet)))?;
    manager.store_in_context(wallet)?;
    setup_contract_commands(manager)
}

fn start_session(manager: &CommandManager, api: SharedLotteryApi) -> Result<(), CommandError> {
    stop_session(manager);
    let task = api.spawn_state_refresh(Duration::from_secs(STATE_REFRESH_INTERVAL_SECS));
    manager.store_in_context(StateRefreshTask(task))?;
    manager.store_in_context(api)?;
    setup_lottery_commands(manager)
}

async fn join_contract(manager: &CommandManager, address: Hash) -> Result<(), CommandError> {
    let providers: LotteryProviders = get_from_context(manager)?;
    let config: Config = get_from_context(manager)?;
    let api = LotteryApi::join(providers, address.clone(), &config.tickets_path)
        .await
        .with_context(|| format!("Error while joining contract {}", address))?;

    if let Some(state) = api.get_cached_state().await {
        manager.message(format!("Joined contract {}: {}", address, state));
    }
    start_session(manager, api)
}

async fn create_wallet(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    let config: Config = get_from_context(manager)?;
    let wallet = Wallet::create(config.network);
    manager.message(format!("Seed: {}", wallet.get_seed_hex()));
    manager.warn("Save this seed, it is the only way to restore this wallet");
    open_wallet(manager, wallet).await
}

async fn restore_wallet(manager: &CommandManager, mut args: ArgumentManager) -> Result<(), CommandError> {
    let config: Config = get_from_context(manager)?;
    let seed = if args.has_argument("seed") {
        args.get_value("seed")?.to_string_value()?
    } else if manager.is_batch_mode() {
        return Err(CommandError::MissingArgument("seed".to_owned()));
    } else {
        manager
            .get_prompt()
            .read_input("Seed: ")
            .await
            .context("Error while reading seed")?
    };

    let wallet = Wallet::from_seed_hex(&seed, config.network).context("Error while restoring wallet")?;
    open_wallet(manager, wallet).await
}

async fn deploy(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    let providers: LotteryProviders = get_from_context(manager)?;
    let config: Config = get_from_context(manager)?;
    manager.message("Deploying lottery contract...");
    let (api, receipt) = LotteryApi::deploy(providers, &config.tickets_path)
        .await
        .context("Error while deploying contract")?;

    manager.message(format!(
        "Contract deployed at {} (block {})",
        receipt.contract_address, receipt.block_height
    ));
    start_session(manager, api)
}

async fn join(manager: &CommandManager, mut args: ArgumentManager) -> Result<(), CommandError> {
    let address = if args.has_argument("address") {
        args.get_value("address")?.to_hash()?
    } else if manager.is_batch_mode() {
        return Err(CommandError::MissingArgument("address".to_owned()));
    } else {
        manager
            .get_prompt()
            .read_hash("Contract address: ")
            .await
            .context("Error while reading contract address")?
    };

    join_contract(manager, address).await
}

async fn node_status(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    let node: Arc<NodeClient> = get_from_context(manager)?;
    let config: Config = get_from_context(manager)?;
    let info = node.get_info().await.context("Error while fetching node info")?;
    let endpoints = config.network.endpoints();

    manager.message(format!("Node: {} (version {})", node.get_address(), info.version));
    manager.message(format!("Network: {}", info.network));
    manager.message(format!("Height: {}", info.height));
    manager.message(format!("Contracts: {}", info.contracts));
    manager.message(format!("Indexer: {}", endpoints.indexer));
    manager.message(format!("Proof server: {}", endpoints.proof_server));
    Ok(())
}

async fn buy_ticket(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    let api: SharedLotteryApi = get_from_context(manager)?;
    let purchase = api.buy_ticket().await.context("Error while buying ticket")?;
    manager.message(format!(
        "Ticket #{} bought (block {}, tx {})",
        purchase.ticket_id, purchase.receipt.block_height, purchase.receipt.tx_hash
    ));
    Ok(())
}

async fn draw_winner(manager: &CommandManager, mut args: ArgumentManager) -> Result<(), CommandError> {
    let api: SharedLotteryApi = get_from_context(manager)?;
    let ticket = if args.has_argument("ticket") {
        args.get_value("ticket")?.to_number()?
    } else if manager.is_batch_mode() {
        return Err(CommandError::MissingArgument("ticket".to_owned()));
    } else {
        manager
            .get_prompt()
            .read_number("Winning ticket: ")
            .await
            .context("Error while reading winning ticket")?
    };

    let receipt = api
        .draw_winner(ticket)
        .await
        .context("Error while drawing winner")?;
    manager.message(format!(
        "Ticket #{} drawn as winner (block {})",
        ticket, receipt.block_height
    ));
    Ok(())
}

async fn claim_prize(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    let api: SharedLotteryApi = get_from_context(manager)?;
    let (ticket, receipt) = api.claim_prize().await.context("Error while claiming prize")?;
    manager.message(format!(
        "Prize claimed with ticket #{} (block {})",
        ticket, receipt.block_height
    ));
    Ok(())
}

async fn claim_ticket(manager: &CommandManager, mut args: ArgumentManager) -> Result<(), CommandError> {
    let api: SharedLotteryApi = get_from_context(manager)?;
    let ticket = args.get_value("ticket")?.to_number()?;
    let receipt = api
        .claim_ticket(ticket)
        .await
        .with_context(|| format!("Error while claiming with ticket #{}", ticket))?;
    manager.message(format!(
        "Prize claimed with ticket #{} (block {})",
        ticket, receipt.block_height
    ));
    Ok(())
}

async fn state(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    let api: SharedLotteryApi = get_from_context(manager)?;
    let state = api
        .get_ledger_state()
        .await
        .context("Error while fetching ledger state")?;

    manager.message(format!("Contract: {}", api.get_contract_address()));
    manager.message(format!("Round: {}", state.round));
    manager.message(format!("Tickets sold: {}", state.total_tickets));
    if state.has_winner() {
        manager.message(format!("Winning ticket: {}", state.winning_ticket));
    } else {
        manager.message("Winning ticket: not drawn yet");
    }
    Ok(())
}

async fn my_tickets(manager: &CommandManager, _: ArgumentManager) -> Result<(), CommandError> {
    let api: SharedLotteryApi = get_from_context(manager)?;
    let tickets = api.get_owned_tickets().await;
    if tickets.is_empty() {
        manager.message("You don't own any ticket yet");
        return Ok(());
    }

    let list: Vec<String> = tickets.iter().map(|id| format!("#{}", id)).collect();
    manager.message(format!("Owned tickets: {}", list.join(", ")));
    Ok(())
}
