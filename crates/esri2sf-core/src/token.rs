//! Token acquisition for secured services.
//!
//! The pipeline itself only takes a token string. These helpers obtain one
//! either from an ArcGIS Server / Portal `generateToken` endpoint with a
//! username and password, or from ArcGIS Online with OAuth client
//! credentials.

use esri_json::response::parse_response;
use log::info;
use serde::Deserialize;

use crate::error::{ConfigError, ProtocolError, Result};
use crate::transport::{Transport, form_fields};

/// OAuth 2.0 token endpoint of ArcGIS Online.
pub const OAUTH_TOKEN_URL: &str = "https://www.arcgis.com/sharing/rest/oauth2/token";

/// Options for [`generate_token`].
#[derive(Debug, Clone)]
pub struct TokenOptions {
    /// Token lifetime in minutes.
    pub expiration_minutes: u32,
    /// How the token is bound to the caller: `requestip` or `referer`.
    pub client: String,
    /// Referer URL, required when `client` is `referer`.
    pub referer: Option<String>,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            expiration_minutes: 5000,
            client: "requestip".to_string(),
            referer: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateTokenResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: Option<String>,
}

/// Generate a token from username and password against `token_url`, e.g.
/// `https://host/arcgis/tokens/generateToken` or
/// `https://host/portal/sharing/rest/generateToken`.
///
/// # Errors
///
/// Returns a configuration error for empty credentials or a `referer` client
/// without referer, a transport error if the request fails, and a protocol
/// error if the response carries no token.
pub async fn generate_token<T: Transport + ?Sized>(
    transport: &T,
    token_url: &str,
    username: &str,
    password: &str,
    options: &TokenOptions,
) -> Result<String> {
    if username.is_empty() || password.is_empty() {
        return Err(ConfigError::MissingRequired {
            option: "username and password".to_string(),
        }
        .into());
    }

    let expiration = options.expiration_minutes.to_string();
    let mut form = form_fields(&[
        ("username", username),
        ("password", password),
        ("client", options.client.as_str()),
        ("expiration", expiration.as_str()),
        ("f", "json"),
    ]);
    if options.client == "referer" {
        let referer = options
            .referer
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRequired {
                option: "referer".to_string(),
            })?;
        form.push(("referer".to_string(), referer.to_string()));
    }

    let body = transport.post(token_url, &form).await?;
    let response: GenerateTokenResponse = parse_response(&body, token_url)?;
    let token = non_empty_token(response.token, token_url, "token")?;
    info!("Generated token for '{username}' ({} minutes)", options.expiration_minutes);
    Ok(token)
}

/// Generate an application token with OAuth client credentials against
/// [`OAUTH_TOKEN_URL`].
///
/// # Errors
///
/// See [`generate_token`].
pub async fn generate_oauth_token<T: Transport + ?Sized>(
    transport: &T,
    client_id: &str,
    client_secret: &str,
    expiration_minutes: u32,
) -> Result<String> {
    generate_oauth_token_at(
        transport,
        OAUTH_TOKEN_URL,
        client_id,
        client_secret,
        expiration_minutes,
    )
    .await
}

/// [`generate_oauth_token`] against a custom endpoint, e.g. an on-premise
/// portal.
///
/// # Errors
///
/// See [`generate_token`].
pub async fn generate_oauth_token_at<T: Transport + ?Sized>(
    transport: &T,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    expiration_minutes: u32,
) -> Result<String> {
    if client_id.is_empty() || client_secret.is_empty() {
        return Err(ConfigError::MissingRequired {
            option: "client id and client secret".to_string(),
        }
        .into());
    }

    let expiration = expiration_minutes.to_string();
    let form = form_fields(&[
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("grant_type", "client_credentials"),
        ("expiration", expiration.as_str()),
        ("f", "json"),
    ]);

    let body = transport.post(token_url, &form).await?;
    let response: OAuthTokenResponse = parse_response(&body, token_url)?;
    let token = non_empty_token(response.access_token, token_url, "access_token")?;
    info!("Generated application token for client '{client_id}'");
    Ok(token)
}

fn non_empty_token(token: Option<String>, token_url: &str, member: &str) -> Result<String> {
    token.filter(|t| !t.is_empty()).ok_or_else(|| {
        ProtocolError::InvalidResponse {
            context: Some(token_url.to_string()),
            message: format!("response has no '{member}'"),
        }
        .into()
    })
}
