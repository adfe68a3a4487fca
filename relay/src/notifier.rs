use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

const PARSE_MODE: &str = "Markdown";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Delivers messages to a single Telegram chat through the Bot API.
pub(crate) struct Notifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl Notifier {
    pub(crate) fn new(api_url: &str, token: &str, chat_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/bot{token}/sendMessage", api_url.trim_end_matches('/')),
            chat_id: chat_id.to_string(),
        }
    }

    pub(crate) async fn notify(&self, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: PARSE_MODE,
        };

        let res = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = res.status();
        let raw = res.text().await?;

        let reply = serde_json::from_str::<ApiResponse>(&raw).ok();
        if !status.is_success() || !reply.as_ref().is_some_and(|r| r.ok) {
            let reason = reply.and_then(|r| r.description).unwrap_or(raw);
            bail!("Telegram API error {status}: {reason}");
        }

        Ok(())
    }
}
