use std::fs;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info};
use oauth2::reqwest::async_http_client;
use oauth2::{AuthorizationCode, CsrfToken, Scope, TokenResponse};
use serde_json::json;
use crate::config;
use crate::models::session_state::Provider;
use crate::routes::app_state::AppState;
use crate::services::gmail_service::{build_oauth_client, TokenCache};

/// Redirects the browser to Google's consent page.
pub async fn oauth_login() -> HttpResponse {
    let oauth_client = match build_oauth_client(&config::gmail_client_secret_path()) {
        Ok(client) => client,
        Err(e) => {
            error!("Cannot start Gmail sign-in: {:#}", e);
            return HttpResponse::InternalServerError().body(format!("Gmail is not configured: {}", e));
        }
    };
    let (auth_url, _csrf_token) = oauth_client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new(config::GMAIL_SCOPE.to_string()))
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .url();

    HttpResponse::Found()
        .append_header(("Location", auth_url.to_string()))
        .finish()
}

/// Exchanges the authorization code, writes the token cache and returns to `/`.
pub async fn oauth_callback(req: HttpRequest) -> HttpResponse {
    let code = url::form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned());
    let Some(code) = code else {
        return HttpResponse::BadRequest().body("Missing code");
    };

    let oauth_client = match build_oauth_client(&config::gmail_client_secret_path()) {
        Ok(client) => client,
        Err(e) => {
            error!("Cannot finish Gmail sign-in: {:#}", e);
            return HttpResponse::InternalServerError().body(format!("Gmail is not configured: {}", e));
        }
    };

    let token = match oauth_client
        .exchange_code(AuthorizationCode::new(code))
        .request_async(async_http_client)
        .await
    {
        Ok(token) => token,
        Err(err) => {
            error!("Token exchange error: {:?}", err);
            return HttpResponse::InternalServerError().body(format!("Token exchange error: {}", err));
        }
    };

    let cache = TokenCache {
        access_token: token.access_token().secret().to_string(),
        token_type: Some("Bearer".to_string()),
        expires_in: token.expires_in().map(|d| d.as_secs()),
        refresh_token: token.refresh_token().map(|t| t.secret().to_string()),
        scope: Some(config::GMAIL_SCOPE.to_string()),
    };
    let written = serde_json::to_string(&cache)
        .map_err(anyhow::Error::from)
        .and_then(|json| fs::write(config::gmail_token_cache(), json).map_err(anyhow::Error::from));
    match written {
        Ok(()) => {
            info!("Token successfully obtained and cached.");
            HttpResponse::Found().append_header(("Location", "/")).finish()
        }
        Err(e) => {
            error!("Unable to write token cache: {:#}", e);
            HttpResponse::InternalServerError().body(format!("Unable to store token: {}", e))
        }
    }
}

/// Which backends are configured and currently hold a token.
pub async fn check_auth(data: web::Data<AppState>) -> HttpResponse {
    let status = |provider: Provider| {
        let backend = data.router.adapter().backend(provider);
        json!({
            "configured": backend.is_some(),
            "authenticated": backend.map(|b| b.is_authenticated()).unwrap_or(false),
        })
    };
    HttpResponse::Ok().json(json!({
        "gmail": status(Provider::Gmail),
        "outlook": status(Provider::Outlook),
    }))
}
