use crate::config::credentials::Credentials;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Authentication failures keep their distinct kinds: the orchestrator logs
/// them and re-raises without wrapping so callers can tell the stages apart.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("could not retrieve user token: {0}")]
    TokenRetrieval(String),

    #[error("directory authentication failed: {0}")]
    DirectoryAuthentication(String),

    #[error("REST authentication failed: {0}")]
    RestAuthentication(String),

    #[error("workspace authorization failed: {0}")]
    Authorization(String),
}

/// Bearer token for the management plane.
#[derive(Clone, PartialEq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

// The token must not leak through derived debug output.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct DirectoryErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Client-credentials flow against the directory authority.
pub struct ServicePrincipalAuth {
    authority: Url,
    client: Client,
}

impl ServicePrincipalAuth {
    pub fn new(credentials: &Credentials, client: Client) -> Result<Self, AuthError> {
        let authority = Url::parse(&credentials.authority_endpoint())
            .map_err(|err| AuthError::DirectoryAuthentication(err.to_string()))?;
        Ok(Self { authority, client })
    }

    /// Authority override, used when the directory endpoint is not derived
    /// from the credentials (e.g. tests against a local server).
    pub fn with_authority(authority: Url, client: Client) -> Self {
        Self { authority, client }
    }

    /// Requests a token scoped to `resource` for the service principal.
    pub fn fetch_token(
        &self,
        credentials: &Credentials,
        resource: &str,
    ) -> Result<AccessToken, AuthError> {
        let token_url = format!(
            "{}/{}/oauth2/token",
            self.authority.as_str().trim_end_matches('/'),
            credentials.tenant_id
        );
        let response = self
            .client
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", &credentials.client_id),
                ("client_secret", &credentials.client_secret),
                ("resource", resource),
            ])
            .send()
            .map_err(|err| AuthError::TokenRetrieval(err.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            // The directory reports bad principals and consent problems as
            // structured errors on 4xx responses.
            let detail = response
                .json::<DirectoryErrorResponse>()
                .map(|err| format!("{}: {}", err.error, err.error_description))
                .unwrap_or_else(|err| err.to_string());
            return Err(AuthError::DirectoryAuthentication(detail));
        }
        if !status.is_success() {
            return Err(AuthError::TokenRetrieval(format!(
                "token endpoint returned {status}"
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .map_err(|err| AuthError::TokenRetrieval(err.to_string()))?;
        Ok(AccessToken(token.access_token))
    }
}

/// Maps a management-plane response status to the auth failure it signals,
/// if any. Used when loading the workspace right after authentication.
pub fn workspace_access_failure(status: StatusCode) -> Option<AuthError> {
    match status {
        StatusCode::UNAUTHORIZED => Some(AuthError::RestAuthentication(
            "the management plane rejected the service principal token".to_string(),
        )),
        StatusCode::FORBIDDEN => Some(AuthError::Authorization(
            "the service principal has no access to the workspace".to_string(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use httpmock::MockServer;
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials::from_json(
            r#"{"clientId": "c", "clientSecret": "s", "subscriptionId": "sub", "tenantId": "tenant"}"#,
        )
        .unwrap()
    }

    fn auth_against(server: &MockServer) -> ServicePrincipalAuth {
        ServicePrincipalAuth::with_authority(
            Url::parse(&server.base_url()).unwrap(),
            Client::new(),
        )
    }

    #[test]
    fn token_is_fetched_with_client_credentials() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/tenant/oauth2/token")
                .body_contains("grant_type=client_credentials");
            then.status(200)
                .json_body(json!({"access_token": "tok", "token_type": "Bearer"}));
        });

        let token = auth_against(&server)
            .fetch_token(&credentials(), "https://management.azure.com")
            .unwrap();
        mock.assert();
        assert_eq!(token.secret(), "tok");
    }

    #[test]
    fn directory_errors_keep_their_kind() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST);
            then.status(401).json_body(json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            }));
        });

        let err = auth_against(&server)
            .fetch_token(&credentials(), "resource")
            .unwrap_err();
        assert_matches!(err, AuthError::DirectoryAuthentication(detail) => {
            assert!(detail.contains("invalid_client"));
        });
    }

    #[test]
    fn unreachable_token_endpoint_is_a_token_retrieval_error() {
        let auth = ServicePrincipalAuth::with_authority(
            Url::parse("http://127.0.0.1:1").unwrap(),
            Client::new(),
        );
        let err = auth.fetch_token(&credentials(), "resource").unwrap_err();
        assert_matches!(err, AuthError::TokenRetrieval(_));
    }

    #[test]
    fn workspace_statuses_map_to_distinct_auth_failures() {
        assert_matches!(
            workspace_access_failure(StatusCode::UNAUTHORIZED),
            Some(AuthError::RestAuthentication(_))
        );
        assert_matches!(
            workspace_access_failure(StatusCode::FORBIDDEN),
            Some(AuthError::Authorization(_))
        );
        assert_matches!(workspace_access_failure(StatusCode::OK), None);
    }

    #[test]
    fn token_debug_output_is_redacted() {
        let token = AccessToken("very-secret".to_string());
        assert_eq!(format!("{token:?}"), "AccessToken([REDACTED])");
    }
}
