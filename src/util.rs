use log::debug;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::{self, SignMethod};
use crate::error::{BotError, Result};
use crate::message::MessageChain;

#[derive(Debug, Deserialize)]
struct ActionResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    retcode: i64,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    message: String,
}

/// HTTP side of the NapCat gateway.
#[derive(Clone)]
pub struct NapcatClient {
    http: reqwest::Client,
    host: String,
    access_token: Option<String>,
}

impl NapcatClient {
    pub fn new(config: &config::NapcatConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            host: config.host.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn action_url(&self, action: &str) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}/{}", self.host, action)
        } else {
            format!("http://{}/{}", self.host, action)
        }
    }

    async fn call(&self, action: &str, method: SignMethod, body: Value) -> Result<Value> {
        let url = self.action_url(action);
        let request = match method {
            SignMethod::Get => self.http.get(&url),
            SignMethod::Post => self.http.post(&url),
        };
        let request = match &self.access_token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        };
        let response = request.json(&body).send().await?.error_for_status()?;
        let text = response.text().await?;
        debug!("{} -> {}", action, text);
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let parsed: ActionResponse = serde_json::from_str(&text)?;
        check_response(action, parsed)
    }
}

/// Gateway actions the handlers need.
pub trait Gateway {
    async fn send_group_msg(&self, group_id: i64, chain: &MessageChain) -> Result<()>;

    async fn get_stranger_info(&self, user_id: i64) -> Result<String>;

    async fn send_group_sign(&self, group_id: i64, method: SignMethod) -> Result<()>;

    async fn send_group_text(&self, group_id: i64, text: &str) -> Result<()> {
        self.send_group_msg(group_id, &MessageChain::new().text(text))
            .await
    }
}

impl Gateway for NapcatClient {
    async fn send_group_msg(&self, group_id: i64, chain: &MessageChain) -> Result<()> {
        self.call(
            "send_group_msg",
            SignMethod::Post,
            json!({ "group_id": group_id, "message": chain }),
        )
        .await?;
        Ok(())
    }

    async fn get_stranger_info(&self, user_id: i64) -> Result<String> {
        let data = self
            .call(
                "get_stranger_info",
                SignMethod::Post,
                json!({ "user_id": user_id }),
            )
            .await?;
        data.get("nickname")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| BotError::Api {
                action: "get_stranger_info".to_string(),
                message: "no nickname in response".to_string(),
            })
    }

    async fn send_group_sign(&self, group_id: i64, method: SignMethod) -> Result<()> {
        self.call("send_group_sign", method, json!({ "group_id": group_id }))
            .await?;
        Ok(())
    }
}

fn check_response(action: &str, response: ActionResponse) -> Result<Value> {
    if response.status == "ok" || (response.status.is_empty() && response.retcode == 0) {
        Ok(response.data)
    } else {
        Err(BotError::Api {
            action: action.to_string(),
            message: format!(
                "status={} retcode={} {}",
                response.status, response.retcode, response.message
            ),
        })
    }
}

/// Replaces `{key}` placeholders in `template`.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every call; fails the ones it is told to.
    #[derive(Default)]
    pub struct RecordingGateway {
        pub fail_images: bool,
        pub nickname: Option<String>,
        pub failing_sign_groups: Vec<i64>,
        pub sent: Mutex<Vec<(i64, MessageChain)>>,
        pub signed: Mutex<Vec<i64>>,
    }

    impl RecordingGateway {
        pub fn sent(&self) -> Vec<(i64, MessageChain)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn signed(&self) -> Vec<i64> {
            self.signed.lock().unwrap().clone()
        }
    }

    fn refused(action: &str) -> BotError {
        BotError::Api {
            action: action.to_string(),
            message: "refused".to_string(),
        }
    }

    impl Gateway for RecordingGateway {
        async fn send_group_msg(&self, group_id: i64, chain: &MessageChain) -> Result<()> {
            self.sent.lock().unwrap().push((group_id, chain.clone()));
            if self.fail_images && chain.has_image() {
                return Err(refused("send_group_msg"));
            }
            Ok(())
        }

        async fn get_stranger_info(&self, _user_id: i64) -> Result<String> {
            self.nickname
                .clone()
                .ok_or_else(|| refused("get_stranger_info"))
        }

        async fn send_group_sign(&self, group_id: i64, _method: SignMethod) -> Result<()> {
            self.signed.lock().unwrap().push(group_id);
            if self.failing_sign_groups.contains(&group_id) {
                return Err(refused("send_group_sign"));
            }
            Ok(())
        }
    }
}
