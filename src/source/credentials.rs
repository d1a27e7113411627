//! Google service-account authentication
//!
//! Implements the OAuth2 JWT-bearer flow: sign an RS256 assertion with the
//! service-account key, exchange it at the token endpoint, and hold the
//! resulting access token until shortly before it expires.

use std::{
    fmt,
    path::PathBuf,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

use super::error::{SourceError, SourceResult};

pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Where the service-account key comes from
#[derive(Clone)]
pub enum CredentialSource {
    /// Key material passed directly through the environment
    Inline {
        client_email: String,
        private_key: String,
        project_id: Option<String>,
    },
    /// A service-account JSON key file
    KeyFile(PathBuf),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline {
                client_email,
                project_id,
                ..
            } => f
                .debug_struct("Inline")
                .field("client_email", client_email)
                .field("project_id", project_id)
                .finish_non_exhaustive(),
            Self::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
        }
    }
}

impl CredentialSource {
    pub async fn load(&self) -> SourceResult<ServiceAccountKey> {
        match self {
            Self::Inline {
                client_email,
                private_key,
                project_id,
            } => Ok(ServiceAccountKey {
                key_type: Some("service_account".to_string()),
                project_id: project_id.clone(),
                private_key_id: None,
                // Env files usually carry the PEM on one line with escaped newlines.
                private_key: private_key.replace("\\n", "\n"),
                client_email: client_email.clone(),
                token_uri: DEFAULT_TOKEN_URI.to_string(),
            }),
            Self::KeyFile(path) => {
                let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                    SourceError::Credentials(format!(
                        "failed to read key file {}: {e}",
                        path.display()
                    ))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    SourceError::Credentials(format!(
                        "failed to parse key file {}: {e}",
                        path.display()
                    ))
                })
            }
        }
    }
}

/// The fields of a service-account JSON key this crate uses
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign the JWT-bearer assertion for `key`, issued at `issued_at` (unix seconds)
pub fn sign_assertion(key: &ServiceAccountKey, issued_at: i64) -> SourceResult<String> {
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SourceError::Credentials(format!("invalid private key: {e}")))?;

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: ANALYTICS_READONLY_SCOPE.to_string(),
        aud: key.token_uri.clone(),
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };

    encode(&header, &claims, &encoding_key)
        .map_err(|e| SourceError::Credentials(format!("failed to sign assertion: {e}")))
}

/// Supplies bearer tokens for upstream calls
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> SourceResult<String>;
}

/// A freshly minted access token
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: Duration,
    obtained_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.obtained_at.elapsed() + EXPIRY_MARGIN < self.expires_in
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Service-account token source
///
/// The key is loaded on first use, so a missing or broken key surfaces as a
/// per-request error instead of stopping the server from starting.
pub struct ServiceAccountAuth {
    credentials: CredentialSource,
    client: Client,
    key: OnceCell<ServiceAccountKey>,
    current: RwLock<Option<AccessToken>>,
}

impl ServiceAccountAuth {
    pub fn new(credentials: CredentialSource) -> SourceResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("beacon-auth/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            credentials,
            client,
            key: OnceCell::new(),
            current: RwLock::new(None),
        })
    }

    pub async fn key(&self) -> SourceResult<&ServiceAccountKey> {
        self.key
            .get_or_try_init(|| async {
                let key = self.credentials.load().await?;
                info!(
                    client_email = %key.client_email,
                    project_id = key.project_id.as_deref().unwrap_or("-"),
                    "Loaded service account credentials"
                );
                Ok::<_, SourceError>(key)
            })
            .await
    }

    /// Exchange a new assertion for an access token, replacing any held one
    pub async fn refresh(&self) -> SourceResult<AccessToken> {
        let mut current = self.current.write().await;
        let token = self.exchange().await?;
        *current = Some(token.clone());
        Ok(token)
    }

    async fn exchange(&self) -> SourceResult<AccessToken> {
        let key = self.key().await?;
        let assertion = sign_assertion(key, Utc::now().timestamp())?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::Auth(format!("failed to reach token endpoint: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Auth(format!("failed to parse token response: {e}")))?;

        let token = AccessToken {
            token: parsed.access_token,
            expires_in: Duration::from_secs(
                parsed.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS as u64),
            ),
            obtained_at: Instant::now(),
        };
        debug!(expires_in = ?token.expires_in, "Obtained access token");

        Ok(token)
    }
}

#[async_trait]
impl TokenSource for ServiceAccountAuth {
    async fn access_token(&self) -> SourceResult<String> {
        {
            let current = self.current.read().await;
            if let Some(token) = current.as_ref().filter(|t| t.is_fresh()) {
                return Ok(token.token.clone());
            }
        }

        // Concurrent callers queue on the write lock; only the first exchanges.
        let mut current = self.current.write().await;
        if let Some(token) = current.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.token.clone());
        }

        let token = self.exchange().await?;
        *current = Some(token.clone());
        Ok(token.token)
    }
}
