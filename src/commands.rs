use log::{info, warn};
use regex::Regex;
use std::sync::OnceLock;

use crate::config;
use crate::db::SettingsStore;
use crate::error::{BotError, Result};
use crate::event::GroupMessage;
use crate::util::Gateway;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetWelcomeText(String),
    SetWelcomeImg(String),
    ClearWelcome,
    ShowWelcome,
}

impl Command {
    fn admin_only(&self) -> bool {
        !matches!(self, Command::ShowWelcome)
    }
}

// keyword must stand alone or be followed by whitespace
fn argument<'a>(message: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = message.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

pub fn parse(message: &str) -> Option<Command> {
    let message = message.trim();
    let message = message.strip_prefix('/').unwrap_or(message);

    if let Some(rest) = argument(message, "设置欢迎语") {
        return Some(Command::SetWelcomeText(rest.to_string()));
    }
    if let Some(rest) = argument(message, "设置欢迎图") {
        return Some(Command::SetWelcomeImg(rest.to_string()));
    }
    match message {
        "清除欢迎语" => Some(Command::ClearWelcome),
        "查看欢迎语" => Some(Command::ShowWelcome),
        _ => None,
    }
}

fn image_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^https?://\S+$").unwrap())
}

pub fn validate_image_url(url: &str) -> Result<()> {
    if image_url_pattern().is_match(url) {
        Ok(())
    } else {
        Err(BotError::InvalidImageUrl(url.to_string()))
    }
}

/// Runs a command and returns the reply text.
pub fn execute(
    config: &config::AppConfig,
    store: &SettingsStore,
    msg: &GroupMessage,
    command: &Command,
) -> String {
    let is_admin = msg.sender_is_group_admin() || config.is_bot_admin(msg.user_id);
    if command.admin_only() && !is_admin {
        return "只有群主或管理员才能修改欢迎设置。".to_string();
    }

    match run(config, store, msg.group_id, command) {
        Ok(reply) => reply,
        Err(BotError::InvalidImageUrl(url)) => {
            format!("图片地址无效: {}，请提供 http(s) 链接。", url)
        }
        Err(e) => {
            warn!("command {:?} failed in group {}: {}", command, msg.group_id, e);
            "操作失败，请稍后再试。".to_string()
        }
    }
}

fn run(
    config: &config::AppConfig,
    store: &SettingsStore,
    group_id: i64,
    command: &Command,
) -> Result<String> {
    match command {
        Command::SetWelcomeText(text) => {
            if text.is_empty() {
                return Ok("用法: 设置欢迎语 <内容>".to_string());
            }
            store.set_welcome_text(group_id, text)?;
            info!("group {} welcome text set", group_id);
            Ok("欢迎语已更新。".to_string())
        }
        Command::SetWelcomeImg(url) => {
            if url.is_empty() {
                return Ok("用法: 设置欢迎图 <图片链接>".to_string());
            }
            validate_image_url(url)?;
            store.set_welcome_img(group_id, url)?;
            info!("group {} welcome image set", group_id);
            Ok("欢迎图已更新。".to_string())
        }
        Command::ClearWelcome => {
            if store.clear_welcome(group_id)? {
                Ok("已恢复默认欢迎设置。".to_string())
            } else {
                Ok("本群没有自定义欢迎设置。".to_string())
            }
        }
        Command::ShowWelcome => {
            let welcome = store.welcome(group_id)?;
            let text = welcome
                .text
                .unwrap_or_else(|| format!("{}（默认）", config.greet.default_welcome_text));
            let img = match welcome.img {
                Some(img) => img,
                None if config.greet.welcome_images.is_empty() => "无".to_string(),
                None => "随机默认图片".to_string(),
            };
            Ok(format!("当前欢迎语: {}\n当前欢迎图: {}", text, img))
        }
    }
}

pub async fn command_handler<G: Gateway>(
    config: &config::AppConfig,
    store: &SettingsStore,
    client: &G,
    msg: &GroupMessage,
) -> Result<bool> {
    let Some(command) = parse(&msg.text) else {
        return Ok(false);
    };
    info!("group {} user {}: {:?}", msg.group_id, msg.user_id, command);
    let reply = execute(config, store, msg, &command);
    client.send_group_text(msg.group_id, &reply).await?;
    Ok(true)
}
