//! Hydro Raindrop API client.
//!
//! Concrete [`IdentityClient`] over the Raindrop HTTP API. Authenticates
//! with OAuth client credentials and caches the bearer token until shortly
//! before it expires. Remote outcomes map onto [`IdentityError`] variants;
//! credential problems surface as `NotConfigured` so the gate fails closed
//! with a generic notice while the detail stays in the logs.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info_span, warn, Instrument};
use url::Url;

use crate::gate::identity::{IdentityClient, IdentityError};
use crate::APP_USER_AGENT;

const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(5 * 60);
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct RaindropConfig {
    api_base: Url,
    client_id: String,
    client_secret: SecretString,
    application_id: String,
}

impl RaindropConfig {
    #[must_use]
    pub fn new(
        api_base: Url,
        client_id: String,
        client_secret: SecretString,
        application_id: String,
    ) -> Self {
        Self {
            api_base,
            client_id,
            client_secret,
            application_id,
        }
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: i64,
}

pub struct RaindropClient {
    http: Client,
    config: RaindropConfig,
    token: Mutex<Option<CachedToken>>,
}

impl RaindropClient {
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(config: RaindropConfig) -> anyhow::Result<Self> {
        let http = Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.config
            .api_base
            .join(path)
            .map_err(|err| IdentityError::Transport(format!("invalid endpoint {path}: {err}")))
    }

    async fn access_token(&self) -> Result<String, IdentityError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let url = self.endpoint("oauth/token")?;
        let span = info_span!("raindrop.token", http.method = "POST", url = %url);
        let response = self
            .http
            .post(url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .instrument(span)
            .await
            .map_err(transport)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("Raindrop rejected the client credentials");
                return Err(IdentityError::NotConfigured);
            }
            status => {
                return Err(IdentityError::Transport(format!(
                    "token request returned {status}"
                )))
            }
        }

        let token: TokenResponse = response.json().await.map_err(transport)?;
        let ttl = token.expires_in.map_or(DEFAULT_TOKEN_TTL, Duration::from_secs);
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_MARGIN);
        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at,
        });
        Ok(value)
    }
}

fn transport(err: reqwest::Error) -> IdentityError {
    // Status and source only; the URL may carry identifying detail.
    IdentityError::Transport(err.without_url().to_string())
}

impl IdentityClient for RaindropClient {
    fn generate_challenge(&self) -> impl Future<Output = Result<i64, IdentityError>> + Send {
        async move {
            let token = self.access_token().await?;
            let url = self.endpoint("message")?;
            let span = info_span!("raindrop.message", http.method = "POST", url = %url);
            let response = self
                .http
                .post(url)
                .bearer_auth(token)
                .send()
                .instrument(span)
                .await
                .map_err(transport)?;
            if !response.status().is_success() {
                return Err(IdentityError::Transport(format!(
                    "message request returned {}",
                    response.status()
                )));
            }
            let body: MessageResponse = response.json().await.map_err(transport)?;
            debug!("minted Raindrop challenge message");
            Ok(body.message)
        }
    }

    fn verify_challenge(
        &self,
        hydro_id: &str,
        challenge: i64,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send {
        async move {
            let token = self.access_token().await?;
            let url = self.endpoint("verify")?;
            let span = info_span!("raindrop.verify", http.method = "POST", url = %url);
            let response = self
                .http
                .post(url)
                .bearer_auth(token)
                .json(&json!({
                    "username": hydro_id,
                    "message": challenge,
                    "application_id": self.config.application_id,
                }))
                .send()
                .instrument(span)
                .await
                .map_err(transport)?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            if status.is_client_error() {
                return Err(IdentityError::VerificationFailed);
            }
            Err(IdentityError::Transport(format!(
                "verify request returned {status}"
            )))
        }
    }

    fn register_identity(
        &self,
        hydro_id: &str,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send {
        async move {
            let token = self.access_token().await?;
            let url = self.endpoint("application/client")?;
            let span = info_span!("raindrop.register", http.method = "POST", url = %url);
            let response = self
                .http
                .post(url)
                .bearer_auth(token)
                .json(&json!({
                    "hydro_id": hydro_id,
                    "application_id": self.config.application_id,
                }))
                .send()
                .instrument(span)
                .await
                .map_err(transport)?;
            match response.status() {
                status if status.is_success() => Ok(()),
                StatusCode::CONFLICT => Err(IdentityError::AlreadyMapped),
                status => {
                    warn!("Raindrop registration returned {status}");
                    Err(IdentityError::RegistrationFailed)
                }
            }
        }
    }

    fn unregister_identity(
        &self,
        hydro_id: &str,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send {
        async move {
            let token = self.access_token().await?;
            let mut url = self.endpoint("application/client")?;
            url.query_pairs_mut()
                .append_pair("hydro_id", hydro_id)
                .append_pair("application_id", &self.config.application_id);
            let span = info_span!("raindrop.unregister", http.method = "DELETE", url = %url);
            let response = self
                .http
                .delete(url)
                .bearer_auth(token)
                .send()
                .instrument(span)
                .await
                .map_err(transport)?;
            if response.status().is_success() {
                Ok(())
            } else {
                warn!("Raindrop unregistration returned {}", response.status());
                Err(IdentityError::UnregistrationFailed)
            }
        }
    }
}
