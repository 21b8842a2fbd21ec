use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, Header, encode};
use serde::{Deserialize, Serialize};

use super::service_account::ServiceAccount;

pub const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL: u64 = 3600;

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Claims of the self-signed assertion exchanged for an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token assertion: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    #[error("token endpoint unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint rejected the assertion ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: Duration,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

pub fn sign_assertion(account: &ServiceAccount, issued_at: u64) -> Result<String, TokenError> {
    let claims = AssertionClaims {
        iss: account.client_email.clone(),
        scope: SCOPES.to_string(),
        aud: account.token_uri.clone(),
        iat: issued_at,
        exp: issued_at + ASSERTION_TTL,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = account.private_key_id.clone();

    Ok(encode(&header, &claims, &account.key)?)
}

/// OAuth2 JWT-bearer grant: trades a signed assertion for a bearer token.
pub async fn fetch_access_token(
    client: &reqwest::Client,
    account: &ServiceAccount,
) -> Result<AccessToken, TokenError> {
    let assertion = sign_assertion(account, now())?;

    let resp = client
        .post(&account.token_uri)
        .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TokenError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let token: TokenResponse = resp.json().await?;
    Ok(AccessToken {
        token: token.access_token,
        expires_in: Duration::from_secs(token.expires_in.unwrap_or(ASSERTION_TTL)),
    })
}
