use std::{ffi::OsString, fs::File, path::PathBuf};
use tracing::{error, info, info_span, level_filters::LevelFilter, warn};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use poise::{serenity_prelude as serenity, CreateReply};

use crate::{
    config::{credentials::load_token, Config},
    countdown::Countdowns,
    log::discord_log_error,
};

/// All the commands that the bots can run.
///
/// Additionally, it contains the `CommandsContainer` trait that groups the commands by bot
/// as well as checks used by various commands.
mod commands;
/// Configuration file and credentials.
mod config;
/// Registration countdowns that keep tournament announcements up to date.
mod countdown;
/// Connection, member and component events.
mod event_handler;
/// Contains functions for logging to a Discord channel.
mod log;
/// Private registration channels opened from the join button.
mod tickets;
/// Tournament formats, text announcements and form announcements.
mod tournament;

mod utils;

/// Stores data used by the bot.
///
/// Accessible by all bot commands through Context.
#[derive(Debug, Clone)]
pub struct Data {
    pub config: Config,
    /// Every running registration countdown.
    pub countdowns: Countdowns,
}

/// Convenience type for the bot's data.
pub type BotData = Data;

/// A thread-safe Error type used by the bot.
pub type BotError = anyhow::Error;

/// A context that gives the bot information about the action that invoked it.
///
/// It also includes the bot's configuration and running countdowns.
/// You can access the data in commands by using ``ctx.data()``.
pub type BotContext<'a> = poise::Context<'a, BotData, BotError>;

/// Context of a slash command, which can answer with a form.
pub type BotAppContext<'a> = poise::ApplicationContext<'a, BotData, BotError>;

#[tokio::main]
async fn main() {
    if let Err(e) = setup_tracing() {
        panic!("Error trying to setup tracing: {}", e);
    }

    if let Err(e) = run().await {
        panic!("Error trying to run the bot: {}", e);
    }
}

/// The main function that runs the bot.
async fn run() -> Result<(), BotError> {
    let setup_span = info_span!("bot_setup");
    let setup_guard = setup_span.enter();
    // Load the .env file only in the development environment (bypassed with the --release flag)
    #[cfg(debug_assertions)]
    dotenv::dotenv().ok();

    let config_path = Config::path_from_env();
    let config = Config::load(&config_path)?;
    info!("Successfully loaded configuration from {}", config_path.display());

    let discord_token = load_token(&config.token_file)?;
    info!("Successfully loaded Discord Token");

    let commands = commands::enabled_commands(&config);
    commands.iter().for_each(|c| info!("Command: {}", c.name));

    let intents = config.intents();
    let countdowns = Countdowns::default();
    let setup_config = config.clone();
    let setup_countdowns = countdowns.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Ready as {}", ready.user.name);
                Ok(Data {
                    config: setup_config,
                    countdowns: setup_countdowns,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(discord_token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    let http = client.http.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for the shutdown signal: {}", e);
            return;
        }
        info!("Shutting down");
        event_handler::announce_offline(&http, &config).await;
        countdowns.shutdown().await;
        shard_manager.shutdown_all().await;
    });

    drop(setup_guard);
    client.start().await?;

    Ok(())
}

/// Reports command failures to the user and to the log channel.
async fn on_error(error: poise::FrameworkError<'_, BotData, BotError>) {
    let error_msg;
    match error {
        poise::FrameworkError::NotAnOwner { .. } => return,
        poise::FrameworkError::GuildOnly { .. } => return,
        poise::FrameworkError::DmOnly { .. } => return,
        poise::FrameworkError::NsfwOnly { .. } => return,
        poise::FrameworkError::CommandCheckFailed { ref error, .. } => match error {
            Some(error) => error_msg = format!("{}", error),
            None => return,
        },
        poise::FrameworkError::UnknownCommand { .. } => return,
        poise::FrameworkError::Setup { ref error, .. } => {
            error!("Error setting up the bot: {:?}", error);
            return;
        }
        poise::FrameworkError::EventHandler { ref error, .. } => {
            error!("Error handling an event: {:?}", error);
            return;
        }
        poise::FrameworkError::Command { ref error, .. } => error_msg = format!("{}", error),
        poise::FrameworkError::ArgumentParse { ref error, .. } => {
            error_msg = format!("{}", error)
        }
        poise::FrameworkError::DynamicPrefix { ref error, .. } => {
            error_msg = format!("{}", error)
        }
        _ => error_msg = "No cause available for this error type.".to_string(),
    }
    error!("Error in command: {:?}", error);
    let Some(ctx) = error.ctx() else {
        error!("No context in this error");
        return;
    };

    let reply = CreateReply::default()
        .content(format!("❌ An error occurred: {}", error_msg))
        .ephemeral(true);
    if let Err(e) = ctx.send(reply).await {
        error!("Error sending error message to user: {}", e);
    }

    let config = &ctx.data().config;
    if config.log.is_none() {
        warn!("No log channel configured. Cannot send error message to log channel.");
        return;
    }
    let user_field = format!("<@{}>", ctx.author().id);
    let command_field = format!("`{}`", ctx.command().qualified_name);
    let fields = vec![
        ("Cause", error_msg.as_str(), false),
        ("User", user_field.as_str(), false),
        ("Command", command_field.as_str(), false),
    ];
    discord_log_error(ctx, config, &error.to_string(), fields)
        .await
        .unwrap_or_else(|e| error!("Error sending error message to log channel: {:?}", e));
}

/// Log file of release builds, `debug.log` by default.
const LOG_FILE_ENV: &str = "CROUSTY_LOG_FILE";
/// Most verbose level written by release builds, `error` by default.
const LOG_LEVEL_ENV: &str = "CROUSTY_LOG_LEVEL";

/// Where and how verbosely release builds log, from the raw environment values.
fn release_log_settings(
    file: Option<OsString>,
    level: Option<String>,
) -> Result<(PathBuf, LevelFilter), BotError> {
    let path = file
        .filter(|file| !file.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("debug.log"));
    let level = match level.as_deref().map(str::trim) {
        None | Some("") => LevelFilter::ERROR,
        Some(level) => level.parse()?,
    };
    Ok((path, level))
}

/// Sets up the tracing subscriber for the bot.
fn setup_tracing() -> Result<(), BotError> {
    if cfg!(debug_assertions) {
        let filter = EnvFilter::from_default_env()
            .add_directive("none".parse()?)
            .add_directive("crousty_bot=info".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::NONE)
            .pretty()
            .init();

        return Ok(());
    }

    let (log_path, level) = release_log_settings(
        std::env::var_os(LOG_FILE_ENV),
        std::env::var(LOG_LEVEL_ENV).ok(),
    )?;
    let log_file = File::create(&log_path)?;

    // Production only logs errors unless CROUSTY_LOG_LEVEL says otherwise
    tracing_subscriber::fmt::fmt()
        .with_span_events(FmtSpan::NONE)
        .with_max_level(level)
        .with_writer(log_file)
        .pretty()
        .init();

    Ok(())
}
