use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NapcatConfig {
    /// `host:port` of the HTTP API, without scheme.
    pub host: String,
    pub ws_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub admin_ids: Vec<i64>,
    #[serde(default = "default_data_path")]
    pub data_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetConfig {
    #[serde(default = "default_true")]
    pub welcome_enabled: bool,
    #[serde(default = "default_true")]
    pub bye_enabled: bool,
    #[serde(default)]
    pub group_blacklist: Vec<i64>,
    #[serde(default)]
    pub group_whitelist: Vec<i64>,
    #[serde(default = "default_welcome_text")]
    pub default_welcome_text: String,
    #[serde(default)]
    pub welcome_images: Vec<String>,
    #[serde(default = "default_bye_template")]
    pub bye_template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignMethod {
    Get,
    #[default]
    Post,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub groups: Vec<i64>,
    #[serde(default)]
    pub method: SignMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub napcat: NapcatConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub greet: GreetConfig,
    #[serde(default)]
    pub sign: SignConfig,
}

fn default_true() -> bool {
    true
}

fn default_data_path() -> String {
    "data/hello-bye/data.json".to_string()
}

fn default_welcome_text() -> String {
    "✨✨✨ 欢迎新成员: {user_id} 进群！".to_string()
}

fn default_bye_template() -> String {
    "成员 {nickname}({user_id}) 离开了我们！".to_string()
}

impl Default for GreetConfig {
    fn default() -> Self {
        Self {
            welcome_enabled: true,
            bye_enabled: true,
            group_blacklist: vec![],
            group_whitelist: vec![],
            default_welcome_text: default_welcome_text(),
            welcome_images: vec![],
            bye_template: default_bye_template(),
        }
    }
}

impl GreetConfig {
    // whitelist wins over blacklist when both are set
    pub fn group_allowed(&self, group_id: i64) -> bool {
        if !self.group_whitelist.is_empty() {
            return self.group_whitelist.contains(&group_id);
        }
        !self.group_blacklist.contains(&group_id)
    }
}

impl AppConfig {
    pub fn load(path: &str) -> Result<AppConfig> {
        let file = File::open(path)?;
        let mut config: AppConfig = serde_yaml::from_reader(file)?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(host) = env::var("NAPCAT_HOST") {
            self.napcat.host = host;
        }
        if let Ok(url) = env::var("ONEBOT_WS_URL") {
            self.napcat.ws_url = url;
        }
        if let Ok(token) = env::var("NAPCAT_TOKEN") {
            if !token.is_empty() {
                self.napcat.access_token = Some(token);
            }
        }
    }

    pub fn is_bot_admin(&self, user_id: i64) -> bool {
        self.bot.admin_ids.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
napcat:
  host: 127.0.0.1:3000
  ws_url: ws://127.0.0.1:3001
"#;

    #[test]
    fn minimal_config_takes_defaults() {
        let config: AppConfig = serde_yaml::from_str(MINIMAL).unwrap();
        assert!(config.greet.welcome_enabled);
        assert!(config.greet.bye_enabled);
        assert_eq!(config.bot.data_path, "data/hello-bye/data.json");
        assert_eq!(config.sign.method, SignMethod::Post);
        assert!(!config.sign.enabled);
        assert!(config.napcat.access_token.is_none());
    }

    #[test]
    fn full_config_parses() {
        let yaml = r#"
napcat:
  host: 10.0.0.2:3000
  ws_url: ws://10.0.0.2:3001
  access_token: secret
bot:
  admin_ids: [10001]
greet:
  welcome_enabled: false
  group_whitelist: [123]
  welcome_images:
    - https://example.com/a.png
  bye_template: "bye {nickname}"
sign:
  enabled: true
  groups: [123, 456]
  method: get
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.greet.welcome_enabled);
        assert!(config.is_bot_admin(10001));
        assert!(!config.is_bot_admin(10002));
        assert_eq!(config.greet.welcome_images.len(), 1);
        assert_eq!(config.sign.groups, vec![123, 456]);
        assert_eq!(config.sign.method, SignMethod::Get);
        assert_eq!(config.napcat.access_token.as_deref(), Some("secret"));
    }

    #[test]
    fn whitelist_takes_precedence() {
        let greet = GreetConfig {
            group_whitelist: vec![1],
            group_blacklist: vec![1, 2],
            ..Default::default()
        };
        assert!(greet.group_allowed(1));
        assert!(!greet.group_allowed(2));
        assert!(!greet.group_allowed(3));
    }

    #[test]
    fn blacklist_applies_without_whitelist() {
        let greet = GreetConfig {
            group_blacklist: vec![2],
            ..Default::default()
        };
        assert!(greet.group_allowed(1));
        assert!(!greet.group_allowed(2));
    }
}
