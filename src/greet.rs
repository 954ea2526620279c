use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::GreetConfig;
use crate::db::{SettingsStore, WelcomeOverride};
use crate::message::MessageChain;
use crate::util::{self, Gateway};

pub fn compose_welcome<R: Rng + ?Sized>(
    greet: &GreetConfig,
    welcome: &WelcomeOverride,
    group_id: i64,
    user_id: i64,
    rng: &mut R,
) -> MessageChain {
    let template = welcome
        .text
        .as_deref()
        .unwrap_or(&greet.default_welcome_text);
    let user = user_id.to_string();
    let group = group_id.to_string();
    let text = util::render(
        template,
        &[("user_id", user.as_str()), ("group_id", group.as_str())],
    );
    let image = welcome
        .img
        .clone()
        .or_else(|| greet.welcome_images.choose(rng).cloned());

    let chain = MessageChain::new().at(user_id).text(format!(" {}", text));
    match image {
        Some(url) => chain.image(url),
        None => chain,
    }
}

pub fn compose_farewell(
    greet: &GreetConfig,
    group_id: i64,
    user_id: i64,
    nickname: &str,
) -> String {
    let user = user_id.to_string();
    let group = group_id.to_string();
    util::render(
        &greet.bye_template,
        &[
            ("nickname", nickname),
            ("user_id", user.as_str()),
            ("group_id", group.as_str()),
        ],
    )
}

pub async fn member_joined<G: Gateway>(
    greet: &GreetConfig,
    store: &SettingsStore,
    client: &G,
    group_id: i64,
    user_id: i64,
) {
    if !greet.welcome_enabled || !greet.group_allowed(group_id) {
        return;
    }
    info!("group {} new member {}", group_id, user_id);

    let welcome = match store.welcome(group_id) {
        Ok(welcome) => welcome,
        Err(e) => {
            warn!("failed to read welcome settings for group {}: {}", group_id, e);
            WelcomeOverride::default()
        }
    };
    let chain = compose_welcome(greet, &welcome, group_id, user_id, &mut rand::thread_rng());

    if let Err(e) = client.send_group_msg(group_id, &chain).await {
        if !chain.has_image() {
            warn!("failed to send welcome to group {}: {}", group_id, e);
            return;
        }
        warn!(
            "failed to send welcome with image to group {}: {}, retrying as text",
            group_id, e
        );
        if let Err(e) = client.send_group_msg(group_id, &chain.without_images()).await {
            warn!("failed to send welcome to group {}: {}", group_id, e);
        }
    }
}

pub async fn member_left<G: Gateway>(
    greet: &GreetConfig,
    client: &G,
    group_id: i64,
    user_id: i64,
) {
    if !greet.bye_enabled || !greet.group_allowed(group_id) {
        return;
    }
    info!("group {} member {} left", group_id, user_id);

    let nickname = match client.get_stranger_info(user_id).await {
        Ok(name) => name,
        Err(e) => {
            warn!("failed to fetch nickname of {}: {}", user_id, e);
            user_id.to_string()
        }
    };
    let text = compose_farewell(greet, group_id, user_id, &nickname);
    if let Err(e) = client.send_group_text(group_id, &text).await {
        warn!("failed to send farewell to group {}: {}", group_id, e);
    }
}
