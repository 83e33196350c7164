use chrono::Utc;
use soonly::components::google_calendar::token::TOKEN_URL;
use soonly::components::google_calendar::{StoredToken, TokenManager};
use soonly::config::Config;
use soonly::error::{other_error, SoonlyResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

const REDIRECT_URI: &str = "http://localhost:8080";
const SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    run().await?;
    Ok(())
}

async fn run() -> SoonlyResult<()> {
    // Load configuration
    let config = Config::load()?;
    let client_id = config.google_client_id.clone();
    let client_secret = config.google_client_secret.clone();
    let token_file = config.token_file.clone();
    let token_manager = TokenManager::new(Arc::new(RwLock::new(config)));

    // Generate random state for security
    let state = uuid::Uuid::new_v4().to_string();

    let mut auth_url = Url::parse("https://accounts.google.com/o/oauth2/v2/auth")?;
    auth_url
        .query_pairs_mut()
        .append_pair("client_id", &client_id)
        .append_pair("redirect_uri", REDIRECT_URI)
        .append_pair("response_type", "code")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("scope", SCOPE)
        .append_pair("state", &state);

    // Open browser for authorization
    println!("Opening browser for Google Calendar authorization...");
    if webbrowser::open(auth_url.as_str()).is_err() {
        println!("Could not open a browser, visit this URL instead:\n{}", auth_url);
    }

    // Start local server to receive the callback
    let server = tiny_http::Server::http("127.0.0.1:8080")
        .map_err(|e| other_error(&format!("Failed to start callback server: {}", e)))?;
    println!("Waiting for authorization callback...");

    let request = server.recv()?;
    let callback = Url::parse(REDIRECT_URI)?.join(request.url())?;

    let param = |name: &str| {
        callback
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if param("state").as_deref() != Some(state.as_str()) {
        return Err(other_error("Authorization state mismatch"));
    }
    let code = param("code").ok_or_else(|| other_error("No authorization code found in callback"))?;

    // Exchange code for tokens
    let client = reqwest::Client::new();
    let response = client
        .post(TOKEN_URL)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", REDIRECT_URI.to_string()),
            ("grant_type", "authorization_code".to_string()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        return Err(other_error(&format!("Failed to get token: {}", error_text)));
    }

    let token_data: serde_json::Value = response.json().await?;
    let token = StoredToken::from_response(&token_data, None, Utc::now().timestamp())?;
    token_manager.set_token(&token).await?;

    // Send success response to browser
    let response =
        tiny_http::Response::from_string("Authorization successful! You can close this window.");
    request.respond(response)?;

    println!("Token successfully saved to {}", token_file.display());

    Ok(())
}
