use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use base64::{engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD}, Engine as _};
use log::{debug, error, info, warn};
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenResponse, TokenUrl};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use crate::config;
use crate::models::email::{EmailDetail, MailHeader};
use crate::models::session_state::Provider;
use crate::services::mail_backend::{MailBackend, MailError};

#[derive(Serialize, Deserialize)]
pub struct TokenCache {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: InstalledConfig,
}

#[derive(Deserialize)]
struct InstalledConfig {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
}

/// Constructs the OAuth2 client from the downloaded Google client secret file.
pub fn build_oauth_client(secret_path: &str) -> anyhow::Result<BasicClient> {
    let secret_str = fs::read_to_string(secret_path)
        .with_context(|| format!("Unable to read client secret file {}", secret_path))?;
    let secret: ClientSecretFile =
        serde_json::from_str(&secret_str).context("Invalid JSON in client secret file")?;
    let installed = secret.installed;

    Ok(BasicClient::new(
        ClientId::new(installed.client_id),
        Some(ClientSecret::new(installed.client_secret)),
        AuthUrl::new(installed.auth_uri).context("Invalid authorization endpoint URL")?,
        Some(TokenUrl::new(installed.token_uri).context("Invalid token endpoint URL")?),
    )
    .set_redirect_uri(
        RedirectUrl::new(config::gmail_redirect_url()).context("Invalid redirect URL")?,
    ))
}

/// Reads the access token from the cache file.
pub fn read_access_token(token_cache: &str) -> Result<String, MailError> {
    if !Path::new(token_cache).exists() {
        return Err(MailError::NotAuthenticated);
    }
    let file_content = fs::read_to_string(token_cache)?;
    let cache: TokenCache = serde_json::from_str(&file_content)?;
    Ok(cache.access_token)
}

/// Exchanges the cached refresh token for a new access token and rewrites the
/// cache, keeping the old refresh token when Google does not send a new one.
pub async fn refresh_token(oauth_client: &BasicClient, token_cache: &str) -> anyhow::Result<String> {
    let file_content = fs::read_to_string(token_cache)?;
    let cache: TokenCache = serde_json::from_str(&file_content)?;

    let current_refresh_token = cache
        .refresh_token
        .ok_or_else(|| anyhow!("No refresh token available. Please re-authenticate."))?;

    let new_token = oauth_client
        .exchange_refresh_token(&oauth2::RefreshToken::new(current_refresh_token.clone()))
        .request_async(oauth2::reqwest::async_http_client)
        .await
        .map_err(|e| anyhow!("Token refresh failed: {}", e))?;

    let refreshed = TokenCache {
        access_token: new_token.access_token().secret().to_string(),
        token_type: Some("Bearer".to_string()),
        expires_in: new_token.expires_in().map(|d| d.as_secs()),
        refresh_token: new_token
            .refresh_token()
            .map(|t| t.secret().to_string())
            .or(Some(current_refresh_token)),
        scope: cache.scope,
    };
    fs::write(token_cache, serde_json::to_string(&refreshed)?)?;
    info!("Gmail token successfully refreshed.");
    Ok(refreshed.access_token)
}

/// Gmail REST backend. Tokens come from the cache file the OAuth callback writes.
pub struct GmailService {
    http: reqwest::Client,
    token_cache: String,
    oauth: Option<BasicClient>,
}

impl GmailService {
    pub fn new(token_cache: impl Into<String>, oauth: Option<BasicClient>) -> Result<Self, MailError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(GmailService {
            http,
            token_cache: token_cache.into(),
            oauth,
        })
    }

    /// Builds the service from configuration; a missing client secret only
    /// disables token refresh.
    pub fn from_config() -> Result<Self, MailError> {
        let oauth = match build_oauth_client(&config::gmail_client_secret_path()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Gmail OAuth client unavailable, token refresh disabled: {:#}", e);
                None
            }
        };
        Self::new(config::gmail_token_cache(), oauth)
    }

    /// Sends a request built with the current token, refreshing once on 401.
    async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response, MailError>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder + Send + Sync,
    {
        let token = read_access_token(&self.token_cache)?;
        let response = build(&self.http, &token).send().await?;
        if response.status().as_u16() != 401 {
            return check_status(response).await;
        }

        let Some(oauth) = &self.oauth else {
            return check_status(response).await;
        };
        info!("Gmail access token appears expired, attempting refresh...");
        let refreshed = refresh_token(oauth, &self.token_cache).await;
        match refreshed {
            Ok(new_token) => {
                let retry = build(&self.http, &new_token).send().await?;
                check_status(retry).await
            }
            Err(e) => {
                warn!("Gmail token refresh failed: {:#}", e);
                check_status(response).await
            }
        }
    }

    async fn fetch_header(&self, id: &str) -> Result<MailHeader, MailError> {
        let url = format!("{}/messages/{}", config::GMAIL_API_BASE, id);
        let response = self
            .send_authorized(|http, token| {
                http.get(&url)
                    .bearer_auth(token)
                    .query(&[
                        ("format", "metadata"),
                        ("metadataHeaders", "Subject"),
                        ("metadataHeaders", "From"),
                    ])
            })
            .await?;
        let message: Value = response.json().await?;
        Ok(header_from_message(id, &message))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MailError::from_status(status.as_u16(), body))
}

#[async_trait]
impl MailBackend for GmailService {
    fn provider(&self) -> Provider {
        Provider::Gmail
    }

    fn is_authenticated(&self) -> bool {
        Path::new(&self.token_cache).exists()
    }

    // The browser consent flow runs outside this process.
    fn auth_in_progress(&self) -> bool {
        false
    }

    async fn begin_authentication(&self) -> Result<Option<String>, MailError> {
        if self.is_authenticated() {
            return Ok(None);
        }
        Ok(Some(format!(
            "Please sign in to Gmail by opening http://localhost:{}/oauth/login in your browser.",
            config::server_port()
        )))
    }

    async fn list_unread(&self, max_results: u32) -> Result<Vec<MailHeader>, MailError> {
        info!("Fetching up to {} unread Gmail messages", max_results);
        let url = format!("{}/messages", config::GMAIL_API_BASE);
        let max_results = max_results.to_string();
        let response = self
            .send_authorized(|http, token| {
                http.get(&url)
                    .bearer_auth(token)
                    .query(&[("q", "is:unread"), ("maxResults", max_results.as_str())])
            })
            .await?;
        let listing: Value = response.json().await?;
        let ids = message_ids(&listing);

        let mut headers = Vec::with_capacity(ids.len());
        for id in ids {
            match self.fetch_header(&id).await {
                Ok(header) => headers.push(header),
                Err(e) => {
                    error!("Error fetching details for message ID {}: {}", id, e);
                    headers.push(MailHeader {
                        id,
                        subject: "Error fetching subject".to_string(),
                        sender: "Unknown".to_string(),
                    });
                }
            }
        }
        Ok(headers)
    }

    async fn read(&self, id: &str) -> Result<Option<EmailDetail>, MailError> {
        let url = format!("{}/messages/{}", config::GMAIL_API_BASE, id);
        let response = self
            .send_authorized(|http, token| {
                http.get(&url).bearer_auth(token).query(&[("format", "full")])
            })
            .await?;
        let message: Value = response.json().await?;
        if message.get("payload").is_none() {
            warn!("Gmail message {} has no payload", id);
            return Ok(None);
        }
        Ok(Some(detail_from_message(id, &message)))
    }

    async fn reply(&self, id: &str, text: &str) -> Result<bool, MailError> {
        let url = format!("{}/messages/{}", config::GMAIL_API_BASE, id);
        let response = self
            .send_authorized(|http, token| {
                http.get(&url).bearer_auth(token).query(&[
                    ("format", "metadata"),
                    ("metadataHeaders", "Subject"),
                    ("metadataHeaders", "From"),
                    ("metadataHeaders", "Message-ID"),
                    ("metadataHeaders", "References"),
                ])
            })
            .await?;
        let original: Value = response.json().await?;
        let body = json!({
            "raw": build_reply_raw(&original, text),
            "threadId": original.get("threadId").and_then(Value::as_str).unwrap_or_default(),
        });

        let send_url = format!("{}/messages/send", config::GMAIL_API_BASE);
        let sent = self
            .send_authorized(|http, token| http.post(&send_url).bearer_auth(token).json(&body))
            .await?;
        let sent: Value = sent.json().await?;
        let sent_id = sent.get("id").and_then(Value::as_str);
        info!("Reply sent. Message ID: {:?}", sent_id);
        Ok(sent_id.is_some())
    }

    async fn mark_read(&self, id: &str) -> Result<bool, MailError> {
        modify_labels(self, id, json!({ "removeLabelIds": ["UNREAD"] })).await
    }

    async fn mark_unread(&self, id: &str) -> Result<bool, MailError> {
        modify_labels(self, id, json!({ "addLabelIds": ["UNREAD"] })).await
    }
}

async fn modify_labels(service: &GmailService, id: &str, body: Value) -> Result<bool, MailError> {
    let url = format!("{}/messages/{}/modify", config::GMAIL_API_BASE, id);
    service
        .send_authorized(|http, token| http.post(&url).bearer_auth(token).json(&body))
        .await?;
    debug!("Labels updated on Gmail message {}", id);
    Ok(true)
}

fn message_ids(listing: &Value) -> Vec<String> {
    listing["messages"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|m| m.get("id").and_then(Value::as_str).map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn headers_of(message: &Value) -> &[Value] {
    message["payload"]["headers"]
        .as_array()
        .map(|arr| &arr[..])
        .unwrap_or(&[])
}

/// Helper: find a header value (case insensitive) from a slice of headers.
fn get_header(headers: &[Value], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| {
            h.get("name")
                .and_then(|n| n.as_str())
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .and_then(|h| h.get("value").and_then(|v| v.as_str()).map(String::from))
}

fn header_from_message(id: &str, message: &Value) -> MailHeader {
    let headers = headers_of(message);
    MailHeader {
        id: id.to_string(),
        subject: get_header(headers, "Subject").unwrap_or_else(|| "No Subject".to_string()),
        sender: get_header(headers, "From").unwrap_or_else(|| "Unknown Sender".to_string()),
    }
}

fn detail_from_message(id: &str, message: &Value) -> EmailDetail {
    let headers = headers_of(message);
    let mut body = String::new();
    collect_plain_text(&message["payload"], &mut body);
    EmailDetail {
        id: id.to_string(),
        subject: get_header(headers, "Subject").unwrap_or_else(|| "No Subject Found".to_string()),
        sender: get_header(headers, "From").unwrap_or_else(|| "No Sender Found".to_string()),
        body: body.trim().to_string(),
    }
}

fn decode_body(data: &str) -> Option<String> {
    let bytes = URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data.trim_end_matches('=')))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Appends every text/plain part of the payload, depth first. HTML parts are skipped.
fn collect_plain_text(payload: &Value, out: &mut String) {
    if let Some(parts) = payload.get("parts").and_then(Value::as_array) {
        for part in parts {
            collect_plain_text(part, out);
        }
        return;
    }
    let is_plain = payload
        .get("mimeType")
        .and_then(Value::as_str)
        .map(|m| m == "text/plain")
        .unwrap_or(true);
    if !is_plain {
        return;
    }
    if let Some(data) = payload["body"]["data"].as_str() {
        match decode_body(data) {
            Some(text) => out.push_str(&text),
            None => error!("Failed to decode base64 body part"),
        }
    }
}

/// RFC 822 reply to the original sender, base64url encoded for `messages.send`.
fn build_reply_raw(original: &Value, text: &str) -> String {
    let headers = headers_of(original);
    let subject = get_header(headers, "Subject").unwrap_or_default();
    let subject = if subject.to_lowercase().starts_with("re:") {
        subject
    } else {
        format!("Re: {}", subject)
    };
    let to = get_header(headers, "From").unwrap_or_default();
    let message_id = get_header(headers, "Message-ID").unwrap_or_default();
    let references = match get_header(headers, "References") {
        Some(refs) if !refs.is_empty() => format!("{} {}", refs, message_id),
        _ => message_id.clone(),
    };

    let mime = format!(
        "To: {}\r\nSubject: {}\r\nIn-Reply-To: {}\r\nReferences: {}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{}",
        to, subject, message_id, references, text
    );
    URL_SAFE.encode(mime.as_bytes())
}
