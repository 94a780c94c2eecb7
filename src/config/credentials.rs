use super::ConfigError;
use super::defaults::{
    CHINA_AUTHORITY_ENDPOINT, CHINA_MANAGEMENT_HOST, DEFAULT_AUTHORITY_ENDPOINT,
    DEFAULT_MANAGEMENT_ENDPOINT, US_GOV_AUTHORITY_ENDPOINT, US_GOV_MANAGEMENT_HOST,
};
use super::schema::{FieldRule, Schema, ValueKind};
use serde::Deserialize;
use std::fmt;
use tracing::error;
use url::Url;

/// Service principal credentials for the control plane, parsed once at
/// startup from the CI-injected JSON blob. Held in process memory only and
/// never logged in clear text: the caller is expected to register every
/// identifier field with the log masker right after parsing.
#[derive(Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
    /// Overrides the resource manager endpoint, selecting the cloud variant
    /// (sovereign regions use a different management host and login authority).
    #[serde(default)]
    pub resource_manager_endpoint_url: Option<Url>,
}

static CREDENTIALS_SCHEMA: Schema = Schema {
    document: "credentials",
    required: &["clientId", "clientSecret", "subscriptionId", "tenantId"],
    fields: &[
        FieldRule::of("clientId", ValueKind::String).min_length(1),
        FieldRule::of("clientSecret", ValueKind::String).min_length(1),
        FieldRule::of("subscriptionId", ValueKind::String).min_length(1),
        FieldRule::of("tenantId", ValueKind::String).min_length(1),
    ],
};

impl Credentials {
    /// Parses and validates the credentials blob. Fails with a configuration
    /// error before any network call is attempted.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(|err| {
            error!(
                "The credentials secret does not hold the JSON output of the service principal creation"
            );
            ConfigError::CredentialsJson(err.to_string())
        })?;
        CREDENTIALS_SCHEMA.validate(&value)?;
        serde_json::from_value(value).map_err(|err| ConfigError::CredentialsDecode(err.to_string()))
    }

    /// The four identifier fields, in masking order.
    pub fn secret_values(&self) -> [&str; 4] {
        [
            &self.tenant_id,
            &self.client_id,
            &self.client_secret,
            &self.subscription_id,
        ]
    }

    /// Base URL of the resource manager the run operates against.
    pub fn management_endpoint(&self) -> String {
        self.resource_manager_endpoint_url
            .as_ref()
            .map(|url| url.as_str().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_MANAGEMENT_ENDPOINT.to_string())
    }

    /// Login authority matching the configured cloud variant.
    pub fn authority_endpoint(&self) -> String {
        let host = self
            .resource_manager_endpoint_url
            .as_ref()
            .and_then(|url| url.host_str());
        match host {
            Some(US_GOV_MANAGEMENT_HOST) => US_GOV_AUTHORITY_ENDPOINT.to_string(),
            Some(CHINA_MANAGEMENT_HOST) => CHINA_AUTHORITY_ENDPOINT.to_string(),
            _ => DEFAULT_AUTHORITY_ENDPOINT.to_string(),
        }
    }
}

// The secret must not leak through derived debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &"[REDACTED]")
            .field("client_id", &"[REDACTED]")
            .field("client_secret", &"[REDACTED]")
            .field("subscription_id", &"[REDACTED]")
            .field(
                "resource_manager_endpoint_url",
                &self.resource_manager_endpoint_url,
            )
            .finish()
    }
}
