//! Plaid balances integration.
//!
//! API docs: https://plaid.com/docs/api/products/balance/
//! Endpoint: POST /accounts/balance/get
//! Auth: `client_id` + `secret` in the JSON body, scoped to one Item by
//! its `access_token`.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info};

use super::{AccountsResponse, BalanceSource};
use crate::config::BankingConfig;
use crate::retry::{RetryPolicy, TransientFailure};
use crate::secrets::SecretsProvider;
use crate::types::{BalanceSnapshot, NotifierError};

const SERVICE_NAME: &str = "plaid";
const BALANCE_PATH: &str = "/accounts/balance/get";

/// Credentials for one Plaid Item.
pub struct PlaidCredentials {
    pub client_id: SecretString,
    pub secret: SecretString,
    pub access_token: SecretString,
}

impl PlaidCredentials {
    /// Resolve all three credentials, failing on the first missing one.
    pub fn resolve(
        cfg: &BankingConfig,
        secrets: &dyn SecretsProvider,
    ) -> Result<Self, NotifierError> {
        Ok(Self {
            client_id: secrets.require(&cfg.client_id_env)?,
            secret: secrets.require(&cfg.secret_env)?,
            access_token: secrets.require(&cfg.access_token_env)?,
        })
    }
}

#[derive(Serialize)]
struct BalanceRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    access_token: &'a str,
}

pub struct PlaidClient {
    http: Client,
    url: String,
    credentials: PlaidCredentials,
    retry: RetryPolicy,
}

impl PlaidClient {
    pub fn new(
        http: Client,
        base_url: &str,
        credentials: PlaidCredentials,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            url: format!("{}{BALANCE_PATH}", base_url.trim_end_matches('/')),
            credentials,
            retry,
        }
    }

    /// Build from config, resolving credentials through `secrets`.
    pub fn from_config(
        http: Client,
        cfg: &BankingConfig,
        secrets: &dyn SecretsProvider,
        retry: RetryPolicy,
    ) -> Result<Self, NotifierError> {
        let credentials = PlaidCredentials::resolve(cfg, secrets)?;
        Ok(Self::new(http, &cfg.base_url, credentials, retry))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the balance request, retrying non-2xx responses.
    async fn get_account_balances(&self) -> Result<AccountsResponse, NotifierError> {
        let request = BalanceRequest {
            client_id: self.credentials.client_id.expose_secret(),
            secret: self.credentials.secret.expose_secret(),
            access_token: self.credentials.access_token.expose_secret(),
        };
        let http = &self.http;
        let url = self.url.as_str();
        let body = &request;

        debug!(url, "Fetching account balances");

        let (response, attempts) = self
            .retry
            .execute_counted(SERVICE_NAME, || async move {
                let resp = http
                    .post(url)
                    .json(body)
                    .send()
                    .await
                    .map_err(TransientFailure::transport)?;
                TransientFailure::check_status(resp).await
            })
            .await?;

        response
            .json::<AccountsResponse>()
            .await
            .map_err(|e| NotifierError::Upstream {
                service: SERVICE_NAME.to_string(),
                attempts,
                message: format!("Failed to parse balances response: {e}"),
            })
    }
}

#[async_trait]
impl BalanceSource for PlaidClient {
    async fn fetch(&self) -> Result<BalanceSnapshot, NotifierError> {
        let accounts = self.get_account_balances().await?;
        let snapshot = accounts.to_snapshot();

        info!(
            accounts = accounts.accounts.as_ref().map_or(0, Vec::len),
            depository = ?snapshot.depository_balance,
            credit = ?snapshot.credit_balance,
            "Balances fetched"
        );

        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
