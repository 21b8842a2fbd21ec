use std::fmt;
use std::fs::read_to_string;
use std::path::PathBuf;

use jsonwebtoken::EncodingKey;
use serde::Deserialize;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("service account credentials are not configured")]
    Missing,

    #[error("cannot read credentials file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credentials are not a valid service account JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("service account private key is not a valid RSA PEM: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

#[derive(Deserialize)]
struct ServiceAccountFile {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

/// Parsed service-account key, ready to sign token requests.
#[derive(Clone)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key_id: Option<String>,
    pub token_uri: String,
    pub(crate) key: EncodingKey,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    /// `source` is either the JSON document itself or a path to it, the
    /// two ways `GOOGLE_APPLICATION_CREDENTIALS` gets set in practice.
    pub fn from_source(source: &str) -> Result<Self, CredentialError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(CredentialError::Missing);
        }

        if source.starts_with('{') {
            return Self::from_json(source);
        }

        let path = PathBuf::from(source);
        let json = read_to_string(&path).map_err(|source| CredentialError::Unreadable {
            path: path.clone(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let file: ServiceAccountFile = serde_json::from_str(json)?;
        let key = EncodingKey::from_rsa_pem(file.private_key.as_bytes())?;

        Ok(Self {
            client_email: file.client_email,
            private_key_id: file.private_key_id,
            token_uri: file
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            key,
        })
    }
}
