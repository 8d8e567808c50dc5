//! Token-endpoint client for the CRM's OAuth server
//!
//! Form-encoded grant exchanges per RFC 6749. Invalid-grant-class
//! rejections are surfaced as `AuthenticationRequired` so the token manager
//! can deactivate the credential; transport failures leave it intact.

use async_trait::async_trait;
use casebridge_domain::{OAuthCredential, OAuthProviderConfig, Result, SyncError};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::traits::TokenEndpoint;

/// Token-endpoint success response (RFC 6749 §5.1).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[allow(dead_code)]
    token_type: Option<String>,
    expires_in: i64,
    scope: Option<String>,
}

/// Token-endpoint error response (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    error_description: Option<String>,
}

/// HTTP client for the CRM's `POST /oauth/token` endpoint.
pub struct OAuthTokenClient {
    config: OAuthProviderConfig,
    client: Client,
}

impl OAuthTokenClient {
    /// # Errors
    /// Returns `SyncError::Config` when the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: OAuthProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|err| SyncError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self { config, client })
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|err| SyncError::Fetch(format!("token endpoint request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_rejection(status, &body));
        }

        response
            .json()
            .await
            .map_err(|err| SyncError::Fetch(format!("failed to parse token response: {err}")))
    }

    fn credential_from(&self, token: TokenResponse, fallback_refresh: Option<&str>) -> Result<OAuthCredential> {
        // Some servers omit the refresh token on rotation; the one we
        // presented stays valid in that case.
        let refresh_token = match token.refresh_token {
            Some(refresh) => refresh,
            None => fallback_refresh
                .map(str::to_string)
                .ok_or_else(|| {
                    SyncError::Fetch("token response carried no refresh token".to_string())
                })?,
        };

        Ok(OAuthCredential::new(
            self.config.provider.clone(),
            token.access_token,
            refresh_token,
            token.expires_in,
            token.scope,
        ))
    }

    fn base_params<'a>(&'a self, grant_type: &'a str) -> Vec<(&'a str, &'a str)> {
        let mut params = vec![("grant_type", grant_type), ("client_id", self.config.client_id.as_str())];
        if let Some(secret) = self.config.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }
        params
    }
}

#[async_trait]
impl TokenEndpoint for OAuthTokenClient {
    async fn refresh(&self, refresh_token: &str) -> Result<OAuthCredential> {
        if refresh_token.is_empty() {
            return Err(SyncError::AuthenticationRequired(
                "credential has no refresh token".to_string(),
            ));
        }

        debug!(provider = %self.config.provider, "refreshing access token");
        let mut params = self.base_params("refresh_token");
        params.push(("refresh_token", refresh_token));

        let token = self.token_request(&params).await?;
        self.credential_from(token, Some(refresh_token))
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthCredential> {
        debug!(provider = %self.config.provider, "exchanging authorization code");
        let mut params = self.base_params("authorization_code");
        params.push(("code", code));

        let token = self.token_request(&params).await?;
        self.credential_from(token, None)
    }
}

/// Classify a non-2xx token-endpoint response. Invalid-grant-class errors
/// require human re-authorization; everything else is a plain fetch failure.
fn classify_rejection(status: reqwest::StatusCode, body: &str) -> SyncError {
    if let Ok(oauth_error) = serde_json::from_str::<OAuthErrorBody>(body) {
        let description = oauth_error.error_description.unwrap_or_default();
        if matches!(oauth_error.error.as_str(), "invalid_grant" | "invalid_client") {
            return SyncError::AuthenticationRequired(format!(
                "token exchange rejected ({}): {description}",
                oauth_error.error
            ));
        }
        return SyncError::Fetch(format!(
            "token endpoint returned {status}: {} {description}",
            oauth_error.error
        ));
    }
    SyncError::Fetch(format!("token endpoint returned {status}: {body}"))
}
