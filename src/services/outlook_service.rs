use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use async_trait::async_trait;
use log::{error, info, warn};
use oauth2::basic::BasicClient;
use oauth2::devicecode::StandardDeviceAuthorizationResponse;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthType, AuthUrl, ClientId, DeviceAuthorizationUrl, Scope, TokenResponse, TokenUrl};
use serde_json::{json, Value};
use crate::config;
use crate::models::email::{EmailDetail, MailHeader};
use crate::models::session_state::Provider;
use crate::services::mail_backend::{MailBackend, MailError};

/// Microsoft Graph backend signed in through the OAuth device-code flow.
/// The token lives in memory only.
pub struct OutlookService {
    http: reqwest::Client,
    oauth: BasicClient,
    access_token: Arc<RwLock<Option<String>>>,
    flow_running: Arc<AtomicBool>,
}

impl OutlookService {
    pub fn new(client_id: &str, tenant_id: &str) -> Result<Self, MailError> {
        let authority = format!("https://login.microsoftonline.com/{}/oauth2/v2.0", tenant_id);
        let invalid = |e: url::ParseError| MailError::Unexpected(format!("Invalid Outlook authority URL: {}", e));
        let oauth = BasicClient::new(
            ClientId::new(client_id.to_string()),
            None,
            AuthUrl::new(format!("{}/authorize", authority)).map_err(invalid)?,
            Some(TokenUrl::new(format!("{}/token", authority)).map_err(invalid)?),
        )
        .set_device_authorization_url(
            DeviceAuthorizationUrl::new(format!("{}/devicecode", authority)).map_err(invalid)?,
        )
        .set_auth_type(AuthType::RequestBody);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(OutlookService {
            http,
            oauth,
            access_token: Arc::new(RwLock::new(None)),
            flow_running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// `None` when OUTLOOK_CLIENT_ID or OUTLOOK_TENANT_ID is unset.
    pub fn from_config() -> Option<Result<Self, MailError>> {
        let client_id = config::outlook_client_id()?;
        let tenant_id = config::outlook_tenant_id()?;
        Some(Self::new(&client_id, &tenant_id))
    }

    fn token(&self) -> Result<String, MailError> {
        self.access_token
            .read()
            .map_err(|_| MailError::Unexpected("Outlook token lock poisoned".to_string()))?
            .clone()
            .ok_or(MailError::NotAuthenticated)
    }

    fn forget_token(&self) {
        if let Ok(mut token) = self.access_token.write() {
            *token = None;
        }
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, MailError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.as_u16() == 401 {
            warn!("Outlook token rejected; sign-in required again");
            self.forget_token();
        }
        let body = response.text().await.unwrap_or_default();
        Err(MailError::from_status(status.as_u16(), body))
    }

    async fn set_read_flag(&self, id: &str, is_read: bool) -> Result<bool, MailError> {
        let token = self.token()?;
        let response = self
            .http
            .patch(format!("{}/me/messages/{}", config::GRAPH_API_BASE, id))
            .bearer_auth(&token)
            .json(&json!({ "isRead": is_read }))
            .send()
            .await?;
        self.check(response).await?;
        info!("Outlook message {} isRead={}", id, is_read);
        Ok(true)
    }
}

fn spawn_token_poll(
    oauth: BasicClient,
    details: StandardDeviceAuthorizationResponse,
    access_token: Arc<RwLock<Option<String>>>,
    flow_running: Arc<AtomicBool>,
) {
    tokio::spawn(async move {
        let result = oauth
            .exchange_device_access_token(&details)
            .request_async(async_http_client, tokio::time::sleep, None)
            .await;
        match result {
            Ok(token) => {
                if let Ok(mut slot) = access_token.write() {
                    *slot = Some(token.access_token().secret().to_string());
                }
                info!("Outlook access token acquired successfully.");
            }
            Err(e) => error!("Outlook device-code sign-in failed: {}", e),
        }
        flow_running.store(false, Ordering::SeqCst);
    });
}

#[async_trait]
impl MailBackend for OutlookService {
    fn provider(&self) -> Provider {
        Provider::Outlook
    }

    fn is_authenticated(&self) -> bool {
        self.token().is_ok()
    }

    fn auth_in_progress(&self) -> bool {
        self.flow_running.load(Ordering::SeqCst)
    }

    /// Starts the device-code flow and polls for the token in the background,
    /// so the turn loop is not blocked while the user signs in.
    async fn begin_authentication(&self) -> Result<Option<String>, MailError> {
        if self.is_authenticated() {
            return Ok(None);
        }
        if self.flow_running.swap(true, Ordering::SeqCst) {
            return Ok(Some(
                "Outlook sign-in is already in progress. Please finish it in your browser.".to_string(),
            ));
        }

        let request = match self.oauth.exchange_device_code() {
            Ok(request) => request,
            Err(e) => {
                self.flow_running.store(false, Ordering::SeqCst);
                return Err(MailError::Auth(format!("Device flow not configured: {}", e)));
            }
        };
        let details: StandardDeviceAuthorizationResponse = match request
            .add_scopes(config::OUTLOOK_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .request_async(async_http_client)
            .await
        {
            Ok(details) => details,
            Err(e) => {
                self.flow_running.store(false, Ordering::SeqCst);
                return Err(MailError::Auth(format!("Failed to create device flow: {}", e)));
            }
        };

        let instructions = format!(
            "To sign in to Outlook, open {} and enter the code {}.",
            details.verification_uri().as_str(),
            details.user_code().secret()
        );
        info!("{}", instructions);
        spawn_token_poll(
            self.oauth.clone(),
            details,
            Arc::clone(&self.access_token),
            Arc::clone(&self.flow_running),
        );
        Ok(Some(instructions))
    }

    async fn list_unread(&self, max_results: u32) -> Result<Vec<MailHeader>, MailError> {
        let token = self.token()?;
        let top = max_results.to_string();
        let response = self
            .http
            .get(format!("{}/me/mailFolders/inbox/messages", config::GRAPH_API_BASE))
            .bearer_auth(&token)
            .query(&[
                ("$top", top.as_str()),
                ("$filter", "isRead eq false"),
                ("$select", "id,subject,sender,receivedDateTime"),
                ("$orderby", "receivedDateTime desc"),
            ])
            .send()
            .await?;
        let listing: Value = self.check(response).await?.json().await?;
        Ok(headers_from_listing(&listing))
    }

    async fn read(&self, id: &str) -> Result<Option<EmailDetail>, MailError> {
        let token = self.token()?;
        let response = self
            .http
            .get(format!("{}/me/messages/{}", config::GRAPH_API_BASE, id))
            .bearer_auth(&token)
            .send()
            .await?;
        let message: Value = self.check(response).await?.json().await?;
        Ok(detail_from_message(id, &message))
    }

    async fn reply(&self, id: &str, text: &str) -> Result<bool, MailError> {
        let token = self.token()?;
        let response = self
            .http
            .post(format!("{}/me/messages/{}/reply", config::GRAPH_API_BASE, id))
            .bearer_auth(&token)
            .json(&json!({ "comment": text }))
            .send()
            .await?;
        self.check(response).await?;
        info!("Reply action initiated for Outlook message {}", id);
        Ok(true)
    }

    async fn mark_read(&self, id: &str) -> Result<bool, MailError> {
        self.set_read_flag(id, true).await
    }

    async fn mark_unread(&self, id: &str) -> Result<bool, MailError> {
        self.set_read_flag(id, false).await
    }
}

fn sender_address(message: &Value) -> Option<String> {
    let address = &message["sender"]["emailAddress"];
    address["address"]
        .as_str()
        .or_else(|| address["name"].as_str())
        .map(String::from)
}

fn headers_from_listing(listing: &Value) -> Vec<MailHeader> {
    listing["value"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|m| {
                    let id = m["id"].as_str()?;
                    Some(MailHeader {
                        id: id.to_string(),
                        subject: m["subject"].as_str().unwrap_or("No Subject").to_string(),
                        sender: sender_address(m).unwrap_or_else(|| "N/A".to_string()),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn detail_from_message(id: &str, message: &Value) -> Option<EmailDetail> {
    if !message.is_object() {
        return None;
    }
    let content = message["body"]["content"].as_str().unwrap_or_default();
    let is_html = message["body"]["contentType"]
        .as_str()
        .map(|t| t.eq_ignore_ascii_case("html"))
        .unwrap_or(false);
    let body = if is_html {
        html2text::from_read(content.as_bytes(), 100)
    } else {
        content.to_string()
    };
    Some(EmailDetail {
        id: message["id"].as_str().unwrap_or(id).to_string(),
        subject: message["subject"].as_str().unwrap_or("No Subject").to_string(),
        sender: sender_address(message).unwrap_or_else(|| "N/A".to_string()),
        body: body.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_maps_graph_messages() {
        let listing = json!({ "value": [
            { "id": "o1", "subject": "Standup", "sender": { "emailAddress": { "name": "Dana", "address": "dana@contoso.com" } } },
            { "id": "o2", "sender": { "emailAddress": { "name": "Eve" } } },
            { "subject": "no id, skipped" }
        ]});
        let headers = headers_from_listing(&listing);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].sender, "dana@contoso.com");
        assert_eq!(headers[1].subject, "No Subject");
        assert_eq!(headers[1].sender, "Eve");
    }

    #[test]
    fn html_bodies_are_flattened() {
        let message = json!({
            "id": "o1",
            "subject": "Launch",
            "sender": { "emailAddress": { "address": "pm@contoso.com" } },
            "body": { "contentType": "html", "content": "<html><body><p>Ship it</p></body></html>" }
        });
        let detail = detail_from_message("o1", &message).unwrap();
        assert_eq!(detail.sender, "pm@contoso.com");
        assert!(detail.body.contains("Ship it"));
        assert!(!detail.body.contains("<p>"));
    }

    #[test]
    fn service_starts_signed_out() {
        let service = OutlookService::new("client", "tenant").unwrap();
        assert!(!service.is_authenticated());
        assert!(!service.auth_in_progress());
        assert_eq!(service.provider(), Provider::Outlook);
    }
}
