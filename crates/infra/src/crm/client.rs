//! Paginated CRM client with rate limiting, retry, and token refresh
//!
//! Request handling per page:
//! - waits for a rate-limit slot before every attempt
//! - 429 and 5xx responses (and transport failures) retry with exponential
//!   backoff until the retry budget is spent, then surface as
//!   `TransientFetch`
//! - a 401 forces one token rotation and one immediate retry; a second 401
//!   surfaces as `AuthenticationRequired`
//! - any other 4xx fails immediately as `Fetch` (malformed request class)
//!
//! The client is stateless between calls apart from the token manager
//! reference and the shared rate-limit budget.

use std::sync::Arc;

use async_trait::async_trait;
use casebridge_common::resilience::{ExponentialBackoff, TokenBucket};
use casebridge_core::{CrmDataSource, EntityPage, PageRequest};
use casebridge_domain::constants::CRM_MAX_PAGE_SIZE;
use casebridge_domain::{CrmConfig, CrmRecord, EntityType, Result, SyncError};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::errors::{fetch_error, is_transient_transport};
use crate::oauth::AccessTokenProvider;

use super::types::CrmPageEnvelope;

pub struct CrmClient {
    http: Client,
    base_url: String,
    auth: Arc<dyn AccessTokenProvider>,
    limiter: TokenBucket,
    backoff: ExponentialBackoff,
}

impl CrmClient {
    /// # Errors
    /// Returns `SyncError::Config` when the HTTP client, rate limiter, or
    /// backoff policy cannot be constructed from `config`.
    pub fn new(config: &CrmConfig, auth: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| SyncError::Config(format!("failed to build http client: {err}")))?;

        let limiter = TokenBucket::new(
            config.rate_limit_per_sec,
            config.rate_limit_per_sec,
            std::time::Duration::from_secs(1),
        )
        .map_err(SyncError::Config)?;

        let backoff =
            ExponentialBackoff::new(config.backoff_base(), config.backoff_max(), config.max_retries)
                .map_err(SyncError::Config)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
            limiter,
            backoff,
        })
    }

    /// Wait for a rate-limit slot, sleeping until the next refill tick when
    /// the budget is spent.
    async fn acquire_slot(&self) {
        while !self.limiter.try_acquire() {
            let wait = self.limiter.next_refill_in();
            debug!(wait_ms = wait.as_millis() as u64, "rate limit reached; waiting for refill");
            tokio::time::sleep(wait).await;
        }
    }

    /// Consume one retry from the budget or fail with `TransientFetch`.
    async fn backoff_or_fail(&self, retries: &mut u32, message: String) -> Result<()> {
        if *retries >= self.backoff.max_retries() {
            return Err(SyncError::TransientFetch { message, retries: *retries });
        }
        *retries += 1;
        let delay = self.backoff.delay_for(*retries);
        warn!(
            retry = *retries,
            delay_ms = delay.as_millis() as u64,
            %message,
            "transient CRM failure; backing off"
        );
        tokio::time::sleep(delay).await;
        Ok(())
    }

    fn query_params(request: &PageRequest) -> Vec<(&'static str, String)> {
        let per_page = request.per_page.clamp(1, CRM_MAX_PAGE_SIZE);
        let mut params = vec![
            ("page", request.page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(since) = request.modified_since {
            params.push(("modified_since", since.to_rfc3339()));
        }
        params
    }
}

#[async_trait]
impl CrmDataSource for CrmClient {
    async fn fetch_page(&self, entity: EntityType, request: PageRequest) -> Result<EntityPage> {
        let url = format!("{}/{}", self.base_url, entity.api_path());
        let params = Self::query_params(&request);

        let mut retries = 0u32;
        let mut refreshed = false;
        let mut token = self.auth.access_token().await?;

        loop {
            self.acquire_slot().await;
            debug!(entity = %entity, page = request.page, retries, "fetching CRM page");

            let outcome =
                self.http.get(&url).bearer_auth(&token).query(&params).send().await;

            let response = match outcome {
                Ok(response) => response,
                Err(err) if is_transient_transport(&err) => {
                    self.backoff_or_fail(&mut retries, format!("CRM request failed: {err}"))
                        .await?;
                    continue;
                }
                Err(err) => return Err(fetch_error("CRM request failed", &err)),
            };

            let status = response.status();
            if status.is_success() {
                let envelope: CrmPageEnvelope = response.json().await.map_err(|err| {
                    SyncError::Fetch(format!("failed to parse CRM page response: {err}"))
                })?;
                return Ok(EntityPage {
                    records: envelope.data.into_iter().map(CrmRecord).collect(),
                    next_page: envelope.has_more.then(|| request.page + 1),
                    total_count: envelope.total_count,
                });
            }

            if status == StatusCode::UNAUTHORIZED {
                if refreshed {
                    return Err(SyncError::AuthenticationRequired(format!(
                        "CRM rejected credentials for {entity} after token refresh"
                    )));
                }
                warn!(entity = %entity, "CRM returned 401; forcing one token refresh");
                token = self.auth.refresh_after_rejection(&token).await?;
                refreshed = true;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                self.backoff_or_fail(
                    &mut retries,
                    format!("CRM returned {status} for {entity} page {}", request.page),
                )
                .await?;
                continue;
            }

            // Remaining 4xx: the request itself is malformed; retrying
            // cannot help.
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Fetch(format!(
                "CRM returned {status} for {entity} page {}: {body}",
                request.page
            )));
        }
    }
}
