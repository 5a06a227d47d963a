use std::{convert::Infallible, sync::Arc};

use chrono::TimeDelta;
use teloxide::{dptree::deps, prelude::*};

use crate::{
    broadcast::BroadcastSessions,
    config::Config,
    database::Database,
    error::Error,
    gate::AccessGate,
    handlers::{self, commands::Command, App},
    health,
    shortener::Shortener,
};

pub async fn entry() {
    log::info!("ASYNC WOOOO");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Could not load the configuration: {e}");
            return;
        }
    };

    let key = match config.bot_token() {
        Ok(key) => key,
        Err(e) => {
            log::error!("Could not load the bot token: {e}");
            return;
        }
    };

    let bot = Bot::new(key);

    let database = match Database::new(&config.database_url).await {
        Ok(database) => database,
        Err(e) => {
            log::error!("Could not init the database: {e}");
            return;
        }
    };

    let shortener = match Shortener::from_config(&config) {
        Ok(shortener) => shortener,
        Err(e) => {
            log::error!("Could not set up the link shortener: {e}");
            return;
        }
    };

    let lifetime = TimeDelta::try_seconds(config.broadcast_timeout_secs.try_into().unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::MAX);

    let app = Arc::new(App {
        gate: AccessGate::from_config(&config),
        broadcasts: BroadcastSessions::new(lifetime),
        shortener,
        database,
        config,
    });

    tokio::spawn(health::serve(app.config.port));

    if let Err(e) = bot.set_my_commands(Command::generate_bot_commands()).await {
        log::warn!("Failed to set bot commands: {e}");
    }

    log::info!("Creating the handler...");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .endpoint(|| async { Ok::<(), Error>(()) }); // bye lol

    log::info!("Dispatching the dispatcher!");

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(deps![app])
        .enable_ctrlc_handler()
        // One update at a time, in the order they came.
        .distribution_function(|_| None::<Infallible>)
        .build()
        .dispatch()
        .await;

    log::info!("it appears we have been bonked.");
}
