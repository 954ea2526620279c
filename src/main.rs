mod commands;
mod config;
mod db;
mod error;
mod event;
mod greet;
mod message;
mod sign;
mod util;
use dotenv::dotenv;
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::env;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::db::SettingsStore;
use crate::error::BotError;
use crate::event::Event;
use crate::util::NapcatClient;

fn ws_url(config: &config::NapcatConfig) -> String {
    let Some(token) = &config.access_token else {
        return config.ws_url.clone();
    };
    let separator = if config.ws_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}access_token={}",
        config.ws_url,
        separator,
        urlencoding::encode(token)
    )
}

async fn handle_event(
    config: &config::AppConfig,
    store: &SettingsStore,
    client: &NapcatClient,
    raw: &Value,
) {
    let event = Event::from_value(raw);
    if event.is_from_self(event::self_id(raw)) {
        return;
    }
    match event {
        Event::MemberJoined { group_id, user_id } => {
            greet::member_joined(&config.greet, store, client, group_id, user_id).await
        }
        Event::MemberLeft { group_id, user_id } => {
            greet::member_left(&config.greet, client, group_id, user_id).await
        }
        Event::GroupMessage(msg) => {
            if let Err(e) = commands::command_handler(config, store, client, &msg).await {
                warn!("command reply to group {} failed: {}", msg.group_id, e);
            }
        }
        Event::Other => {}
    }
}

async fn receive_events(
    config: &config::AppConfig,
    store: &SettingsStore,
    client: &NapcatClient,
) -> error::Result<()> {
    let (mut ws, _) = connect_async(ws_url(&config.napcat)).await?;
    info!("connected to {}", config.napcat.ws_url);

    // one frame at a time so settings writes never interleave
    while let Some(frame) = ws.next().await {
        match frame? {
            Message::Text(text) => match serde_json::from_str::<Value>(&text) {
                Ok(raw) => handle_event(config, store, client, &raw).await,
                Err(e) => debug!("ignoring non-json frame: {}", e),
            },
            Message::Close(reason) => {
                return Err(BotError::Disconnected(format!("closed by gateway: {:?}", reason)));
            }
            _ => {}
        }
    }
    Err(BotError::Disconnected("stream ended".to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::try_init().ok();
    info!("start");

    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yml".to_string());
    let config = config::AppConfig::load(&config_path)?;
    let client = NapcatClient::new(&config.napcat)?;
    let store = SettingsStore::new(&config.bot.data_path);

    let sign_task = if config.sign.enabled && !config.sign.groups.is_empty() {
        Some(tokio::spawn(sign::run_daily(
            config.sign.clone(),
            client.clone(),
        )))
    } else {
        None
    };

    let result = tokio::select! {
        result = receive_events(&config, &store, &client) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    };

    if let Some(task) = sign_task {
        task.abort();
    }
    if let Err(e) = &result {
        error!("event loop stopped: {}", e);
    }
    result?;
    Ok(())
}
