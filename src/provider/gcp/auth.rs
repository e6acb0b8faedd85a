//! Service account authentication
//!
//! Exchanges the organization service account JSON for an OAuth2 access token
//! using the JWT bearer grant (RFC 7523): a short-lived RS256 assertion signed
//! with the account's private key is posted to the token endpoint.

use crate::constants::GCP_CLOUD_PLATFORM_SCOPE;
use crate::provider::GatewayError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use zeroize::Zeroizing;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// Fields of a service account JSON file needed for the token exchange
#[derive(Deserialize)]
struct ServiceAccountFile {
    client_email: String,
    private_key: Zeroizing<String>,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Obtain a bearer token for `auth_json`
///
/// `token_uri_override` takes precedence over the `token_uri` recorded in the
/// credentials file.
///
/// # Errors
/// `Auth` if the credentials file or its private key is unusable, or the
/// token endpoint rejects the assertion; `Transport` if the endpoint cannot
/// be reached
pub async fn fetch_access_token(
    http_client: &Client,
    auth_json: &[u8],
    token_uri_override: Option<&str>,
) -> Result<String, GatewayError> {
    let account: ServiceAccountFile = serde_json::from_slice(auth_json)
        .map_err(|e| GatewayError::Auth(format!("invalid service account JSON: {e}")))?;

    let token_uri = token_uri_override
        .or(account.token_uri.as_deref())
        .unwrap_or(DEFAULT_TOKEN_URI)
        .to_string();

    let assertion = sign_assertion(&account, &token_uri)?;

    debug!(
        "Requesting access token for {} from {}",
        account.client_email, token_uri
    );
    let response = http_client
        .post(&token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::Auth(format!(
            "token endpoint returned HTTP {}: {}",
            status.as_u16(),
            body.trim()
        )));
    }

    let token: TokenResponse = response.json().await.map_err(|e| {
        GatewayError::Auth(format!("failed to parse token endpoint response: {e}"))
    })?;
    Ok(token.access_token)
}

fn sign_assertion(account: &ServiceAccountFile, audience: &str) -> Result<String, GatewayError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| GatewayError::Auth(format!("system clock before UNIX epoch: {e}")))?
        .as_secs();

    let claims = AssertionClaims {
        iss: &account.client_email,
        scope: GCP_CLOUD_PLATFORM_SCOPE,
        aud: audience,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
        .map_err(|e| GatewayError::Auth(format!("invalid service account private key: {e}")))?;

    let mut header = Header::new(Algorithm::RS256);
    header.kid.clone_from(&account.private_key_id);

    encode(&header, &claims, &key)
        .map_err(|e| GatewayError::Auth(format!("failed to sign JWT assertion: {e}")))
}
