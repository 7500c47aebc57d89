// src/wikidot/mod.rs

//! Access to the wiki's undocumented ajax module connector.
//!
//! Almost everything the live backend does is a form POST to
//! `/ajax-module-connector.php` naming a module and its parameters. The
//! answer is JSON with a `status` and an HTML `body`.

pub mod pager;
pub mod parse;

use async_trait::async_trait;
use reqwest::header::SET_COOKIE;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::utils::http::Transport;

pub use pager::walk;

/// Any six digits work as long as the form and the cookie agree.
const TOKEN: &str = "123456";

const LOGIN_URL: &str = "https://www.wikidot.com/default--flow/login__LoginPopupScreen";

/// Ordered form parameters of a module call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a parameter.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }
}

/// JSON answer of the module connector.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleResponse {
    pub status: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub message: Option<String>,
    /// Module-specific fields such as edit lock secrets
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ModuleResponse {
    /// A module-specific field rendered as a string.
    pub fn field(&self, key: &str) -> Option<String> {
        match self.extra.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Something that can invoke a named module.
#[async_trait]
pub trait ModuleConnector: Send + Sync {
    /// Invoke `module` with `params` and return its answer.
    async fn call(&self, module: &str, params: &Params) -> Result<ModuleResponse>;
}

/// Module connector that can also fetch ordinary pages of its wiki.
#[async_trait]
pub trait WikiConnector: ModuleConnector {
    /// Base URL of the wiki.
    fn site(&self) -> &str;

    /// Body of a page or file as text.
    async fn get_text(&self, url: &str) -> Result<String>;

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Module connector for one wiki, over the retrying transport.
#[derive(Debug)]
pub struct Connector {
    site: String,
    transport: Transport,
    session: RwLock<Option<String>>,
}

impl Connector {
    pub fn new(site: impl Into<String>, transport: Transport, session: Option<String>) -> Self {
        Self {
            site: site.into(),
            transport,
            session: RwLock::new(session),
        }
    }

    async fn cookie(&self) -> String {
        match self.session.read().await.as_deref() {
            Some(session) => format!("wikidot_token7={TOKEN}; WIKIDOT_SESSION_ID={session}"),
            None => format!("wikidot_token7={TOKEN}"),
        }
    }

    /// Log in and keep the session cookie for later calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let form = Params::new()
            .with("login", username)
            .with("password", password)
            .with("action", "Login2Action")
            .with("event", "login");
        let response = self
            .transport
            .post_form(LOGIN_URL, form.as_slice(), None)
            .await?;

        let session = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|cookie| cookie.split(';').next())
            .find_map(|pair| pair.trim().strip_prefix("WIKIDOT_SESSION_ID="))
            .map(str::to_string)
            .ok_or_else(|| AppError::Module {
                module: "login".into(),
                status: "no_session".into(),
                message: format!("login as {username} returned no session cookie"),
            })?;

        log::info!("Logged in as {username}");
        *self.session.write().await = Some(session);
        Ok(())
    }
}

#[async_trait]
impl WikiConnector for Connector {
    fn site(&self) -> &str {
        &self.site
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        self.transport.get_text(url).await
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.transport.get_bytes(url).await
    }
}

#[async_trait]
impl ModuleConnector for Connector {
    async fn call(&self, module: &str, params: &Params) -> Result<ModuleResponse> {
        let mut form = Params::new()
            .with("moduleName", module)
            .with("wikidot_token7", TOKEN);
        if let Some(page_id) = params.get("page_id") {
            form.set("pageId", page_id);
        }
        for (key, value) in params.as_slice() {
            form.set(key, value);
        }

        let url = format!("{}/ajax-module-connector.php", self.site);
        let cookie = self.cookie().await;
        let text = self
            .transport
            .post_form(&url, form.as_slice(), Some(&cookie))
            .await?
            .text()
            .await?;
        let response: ModuleResponse = serde_json::from_str(&text)?;

        if response.status != "ok" {
            log::error!("Module {module} answered {}: {:?}", response.status, response.message);
            return Err(AppError::Module {
                module: module.to_string(),
                status: response.status.clone(),
                message: response.message.clone().unwrap_or_default(),
            });
        }
        Ok(response)
    }
}
