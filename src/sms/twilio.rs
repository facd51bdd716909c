//! Twilio Programmable Messaging integration.
//!
//! API docs: https://www.twilio.com/docs/messaging/api/message-resource
//! Endpoint: POST /2010-04-01/Accounts/{AccountSid}/Messages.json
//! Auth: HTTP Basic with the account SID and auth token.
//! Body: form-encoded `Body`, `From`, `To`.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use super::NotificationSink;
use crate::config::SmsConfig;
use crate::retry::{RetryPolicy, TransientFailure};
use crate::secrets::SecretsProvider;
use crate::types::NotifierError;

const SERVICE_NAME: &str = "twilio";
const API_VERSION: &str = "2010-04-01";

/// Account credentials plus the fixed sender/recipient pair.
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub from_number: String,
    pub to_number: SecretString,
}

impl TwilioCredentials {
    pub fn resolve(cfg: &SmsConfig, secrets: &dyn SecretsProvider) -> Result<Self, NotifierError> {
        Ok(Self {
            account_sid: secrets.require(&cfg.account_sid_env)?.expose_secret().clone(),
            auth_token: secrets.require(&cfg.auth_token_env)?,
            from_number: secrets.require(&cfg.from_number_env)?.expose_secret().clone(),
            to_number: secrets.require(&cfg.to_number_env)?,
        })
    }
}

pub struct TwilioClient {
    http: Client,
    url: String,
    credentials: TwilioCredentials,
    retry: RetryPolicy,
}

impl TwilioClient {
    pub fn new(
        http: Client,
        base_url: &str,
        credentials: TwilioCredentials,
        retry: RetryPolicy,
    ) -> Self {
        let url = format!(
            "{}/{API_VERSION}/Accounts/{}/Messages.json",
            base_url.trim_end_matches('/'),
            credentials.account_sid,
        );
        Self {
            http,
            url,
            credentials,
            retry,
        }
    }

    /// Build from config, resolving credentials through `secrets`.
    pub fn from_config(
        http: Client,
        cfg: &SmsConfig,
        secrets: &dyn SecretsProvider,
        retry: RetryPolicy,
    ) -> Result<Self, NotifierError> {
        let credentials = TwilioCredentials::resolve(cfg, secrets)?;
        Ok(Self::new(http, &cfg.base_url, credentials, retry))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationSink for TwilioClient {
    async fn send(&self, body: &str) -> Result<(), NotifierError> {
        let form = [
            ("Body", body),
            ("From", self.credentials.from_number.as_str()),
            ("To", self.credentials.to_number.expose_secret().as_str()),
        ];
        let http = &self.http;
        let url = self.url.as_str();
        let account_sid = self.credentials.account_sid.as_str();
        let auth_token = self.credentials.auth_token.expose_secret().as_str();
        let form = &form;

        debug!(url, chars = body.len(), "Sending SMS");

        self.retry
            .execute(SERVICE_NAME, || async move {
                let resp = http
                    .post(url)
                    .basic_auth(account_sid, Some(auth_token))
                    .form(form)
                    .send()
                    .await
                    .map_err(TransientFailure::transport)?;
                TransientFailure::check_status(resp).await
            })
            .await?;

        info!(from = %self.credentials.from_number, "SMS sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
