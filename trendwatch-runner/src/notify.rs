//! Message delivery.

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Http(String),

    #[error("rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sink for composed messages.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Bot token and destination chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub token: String,
    pub chat_id: String,
}

impl TelegramCredentials {
    /// Both values present and non-blank, else `None`.
    pub fn from_parts(token: Option<String>, chat_id: Option<String>) -> Option<Self> {
        match (token, chat_id) {
            (Some(token), Some(chat_id)) if !token.trim().is_empty() && !chat_id.trim().is_empty() => {
                Some(Self { token, chat_id })
            }
            _ => None,
        }
    }
}

/// Telegram Bot API `sendMessage`.
///
/// Without credentials every send is skipped with a warning and succeeds.
pub struct TelegramNotifier {
    client: reqwest::blocking::Client,
    credentials: Option<TelegramCredentials>,
}

impl TelegramNotifier {
    pub fn new(credentials: Option<TelegramCredentials>) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;
        Ok(Self {
            client,
            credentials,
        })
    }
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    fn send(&self, text: &str) -> Result<(), NotifyError> {
        let Some(credentials) = &self.credentials else {
            warn!("Telegram credentials not set, message skipped");
            return Ok(());
        };

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            credentials.token
        );
        let resp = self
            .client
            .post(url)
            .form(&[("chat_id", credentials.chat_id.as_str()), ("text", text)])
            .send()
            .map_err(|e| NotifyError::Http(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(chars = text.chars().count(), "telegram message sent");
        Ok(())
    }
}

/// Prints each message to stdout, separated by a blank line.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn name(&self) -> &str {
        "stdout"
    }

    fn send(&self, text: &str) -> Result<(), NotifyError> {
        println!("{text}\n");
        Ok(())
    }
}
