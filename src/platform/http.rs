use super::auth::{AccessToken, AuthError, workspace_access_failure};
use super::client::{MlPlatform, PlatformError};
use super::deployment::DeploymentSpec;
use super::packaging::PackagingRequest;
use super::types::{
    ComputeTarget, ComputeTargetKind, Model, Package, PackageState, RegistryCredentials,
    ResourceRecommendation, Service, ServiceState,
};
use crate::config::credentials::Credentials;
use crate::config::defaults::{COMPLETION_POLL_ATTEMPTS, COMPLETION_POLL_INTERVAL};
use crate::config::workspace::WorkspaceConfig;
use crate::utils::retry::retry;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const API_VERSION: &str = "2021-04-01";

#[derive(Error, Debug)]
pub enum ClientBuildError {
    #[error("could not build the http client: {0}")]
    Builder(String),
}

/// Builds the blocking client every control plane call goes through.
pub fn try_build_http_client(
    timeout: Duration,
    conn_timeout: Duration,
) -> Result<Client, ClientBuildError> {
    Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .connect_timeout(conn_timeout)
        .build()
        .map_err(|err| ClientBuildError::Builder(err.to_string()))
}

#[derive(Deserialize)]
struct ListResponse<T> {
    value: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputeResponse {
    name: String,
    properties: ComputeProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputeProperties {
    compute_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceResponse {
    name: String,
    properties: ServiceProperties,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ServiceProperties {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    scoring_uri: Option<Url>,
    #[serde(default)]
    swagger_uri: Option<Url>,
    #[serde(default)]
    primary_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageResponse {
    id: String,
    state: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Deserialize)]
struct LogsResponse {
    content: String,
}

/// Blocking REST implementation of [MlPlatform], addressed by
/// subscription, resource group and workspace.
#[derive(Debug)]
pub struct RestPlatform {
    client: Client,
    token: AccessToken,
    /// Workspace-scoped URL prefix, without a trailing slash.
    base: String,
    poll_interval: Duration,
    poll_attempts: usize,
}

impl RestPlatform {
    /// Builds the workspace-scoped client and verifies access by loading the
    /// workspace resource. Status 401 and 403 are mapped to the distinct
    /// authentication failure kinds they signal.
    pub fn connect(
        client: Client,
        token: AccessToken,
        credentials: &Credentials,
        workspace: &WorkspaceConfig,
    ) -> Result<Self, AuthError> {
        let subscription = workspace
            .subscription_id
            .clone()
            .unwrap_or_else(|| credentials.subscription_id.clone());
        let base = format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.MachineLearningServices/workspaces/{}",
            credentials.management_endpoint(),
            subscription,
            workspace.resource_group,
            workspace.workspace_name,
        );
        let platform = Self {
            client,
            token,
            base,
            poll_interval: COMPLETION_POLL_INTERVAL,
            poll_attempts: COMPLETION_POLL_ATTEMPTS,
        };
        platform.load_workspace()?;
        Ok(platform)
    }

    /// Overrides the completion polling cadence.
    pub fn with_polling(mut self, interval: Duration, attempts: usize) -> Self {
        self.poll_interval = interval;
        self.poll_attempts = attempts;
        self
    }

    fn load_workspace(&self) -> Result<(), AuthError> {
        let response = self
            .client
            .get(&self.base)
            .query(&[("api-version", API_VERSION)])
            .bearer_auth(self.token.secret())
            .send()
            .map_err(|err| AuthError::RestAuthentication(err.to_string()))?;
        if let Some(failure) = workspace_access_failure(response.status()) {
            return Err(failure);
        }
        if !response.status().is_success() {
            return Err(AuthError::Authorization(format!(
                "loading the workspace returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn request(
        &self,
        build: impl FnOnce(&Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<Response, PlatformError> {
        let response = build(&self.client)
            .query(&[("api-version", API_VERSION)])
            .bearer_auth(self.token.secret())
            .send()
            .map_err(|err| PlatformError::Transport(err.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PlatformError::NotFound(
                response.url().path().to_string(),
            ));
        }
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
        response
            .json::<T>()
            .map_err(|err| PlatformError::Payload(err.to_string()))
    }

    fn get_service(&self, name: &str) -> Result<Service, PlatformError> {
        let response = self.request(|c| c.get(format!("{}/services/{name}", self.base)))?;
        let service: ServiceResponse = Self::decode(response)?;
        Ok(Service {
            name: service.name,
            state: service
                .properties
                .state
                .as_deref()
                .map(ServiceState::parse)
                .unwrap_or(ServiceState::Creating),
            scoring_uri: service.properties.scoring_uri,
            swagger_uri: service.properties.swagger_uri,
            primary_key: service.properties.primary_key,
        })
    }

    fn get_package(&self, id: &str) -> Result<Package, PlatformError> {
        let response = self.request(|c| c.get(format!("{}/packages/{id}", self.base)))?;
        let package: PackageResponse = Self::decode(response)?;
        Ok(Package {
            id: package.id,
            state: PackageState::parse(&package.state),
            location: package.location,
        })
    }
}

impl MlPlatform for RestPlatform {
    fn resolve_model(&self, name: &str, version: Option<u64>) -> Result<Model, PlatformError> {
        let response = self.request(|c| {
            let mut request = c
                .get(format!("{}/models", self.base))
                .query(&[("name", name)]);
            if let Some(version) = version {
                request = request.query(&[("version", version.to_string())]);
            }
            request
        })?;
        let models: ListResponse<Model> = Self::decode(response)?;
        models
            .value
            .into_iter()
            .next()
            .ok_or_else(|| match version {
                Some(version) => PlatformError::NotFound(format!("model {name} version {version}")),
                None => PlatformError::NotFound(format!("model {name}")),
            })
    }

    fn find_compute_target(&self, name: &str) -> Result<Option<ComputeTarget>, PlatformError> {
        let response = match self.request(|c| c.get(format!("{}/computes/{name}", self.base))) {
            Ok(response) => response,
            Err(PlatformError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        let compute: ComputeResponse = Self::decode(response)?;
        Ok(Some(ComputeTarget {
            name: compute.name,
            kind: ComputeTargetKind::parse(&compute.properties.compute_type),
        }))
    }

    fn profile_model(
        &self,
        model: &Model,
        dataset: &str,
    ) -> Result<ResourceRecommendation, PlatformError> {
        let response = self.request(|c| {
            c.post(format!(
                "{}/models/{}/versions/{}/profile",
                self.base, model.name, model.version
            ))
            .json(&json!({ "dataset": dataset }))
        })?;
        let recommendation: Value = Self::decode(response)?;
        Ok(ResourceRecommendation(recommendation))
    }

    fn deploy(&self, spec: &DeploymentSpec) -> Result<Service, PlatformError> {
        let payload = json!({
            "name": spec.name,
            "computeType": spec.config.compute_type(),
            "computeTarget": spec.target.as_ref().map(|target| target.name.clone()),
            "models": [spec.model.id],
            "inferenceConfig": spec.inference_config,
            "deploymentConfig": spec.config,
            "overwrite": spec.overwrite,
        });
        self.request(|c| c.put(format!("{}/services/{}", self.base, spec.name)).json(&payload))?;
        // The service starts creating; its terminal state is observed by polling.
        Ok(Service {
            name: spec.name.clone(),
            state: ServiceState::Creating,
            scoring_uri: None,
            swagger_uri: None,
            primary_key: None,
        })
    }

    fn wait_for_service(&self, name: &str) -> Result<Service, PlatformError> {
        retry(self.poll_attempts, self.poll_interval, || {
            let service = self.get_service(name)?;
            if service.state.is_terminal() {
                Ok(service)
            } else {
                Err(PlatformError::Timeout(format!(
                    "service {name} to reach a terminal state"
                )))
            }
        })
    }

    fn service_logs(&self, name: &str) -> Result<String, PlatformError> {
        let response = self.request(|c| c.get(format!("{}/services/{name}/logs", self.base)))?;
        let logs: LogsResponse = Self::decode(response)?;
        Ok(logs.content)
    }

    fn delete_service(&self, name: &str) -> Result<(), PlatformError> {
        self.request(|c| c.delete(format!("{}/services/{name}", self.base)))?;
        Ok(())
    }

    fn create_package(
        &self,
        model: &Model,
        request: &PackagingRequest,
    ) -> Result<Package, PlatformError> {
        let response = self.request(|c| {
            c.post(format!(
                "{}/models/{}/versions/{}/package",
                self.base, model.name, model.version
            ))
            .json(request)
        })?;
        let package: PackageResponse = Self::decode(response)?;
        Ok(Package {
            id: package.id,
            state: PackageState::parse(&package.state),
            location: package.location,
        })
    }

    fn wait_for_package(&self, package: &Package) -> Result<Package, PlatformError> {
        retry(self.poll_attempts, self.poll_interval, || {
            let package = self.get_package(&package.id)?;
            if package.state.is_terminal() {
                Ok(package)
            } else {
                Err(PlatformError::Timeout(format!(
                    "package {} to reach a terminal state",
                    package.id
                )))
            }
        })
    }

    fn package_logs(&self, package: &Package) -> Result<String, PlatformError> {
        let response =
            self.request(|c| c.get(format!("{}/packages/{}/logs", self.base, package.id)))?;
        let logs: LogsResponse = Self::decode(response)?;
        Ok(logs.content)
    }

    fn registry_credentials(
        &self,
        package: &Package,
    ) -> Result<RegistryCredentials, PlatformError> {
        let response =
            self.request(|c| c.get(format!("{}/packages/{}/credentials", self.base, package.id)))?;
        Self::decode(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use httpmock::Method::{GET, PUT};
    use httpmock::MockServer;

    const WORKSPACE_PATH: &str = "/subscriptions/sub/resourceGroups/ml-rg/providers/Microsoft.MachineLearningServices/workspaces/ml-ws";

    fn credentials(server: &MockServer) -> Credentials {
        Credentials::from_json(&format!(
            r#"{{
                "clientId": "c", "clientSecret": "s",
                "subscriptionId": "sub", "tenantId": "t",
                "resourceManagerEndpointUrl": "{}"
            }}"#,
            server.base_url()
        ))
        .unwrap()
    }

    fn workspace() -> WorkspaceConfig {
        WorkspaceConfig {
            subscription_id: None,
            resource_group: "ml-rg".to_string(),
            workspace_name: "ml-ws".to_string(),
        }
    }

    fn connect(server: &MockServer) -> RestPlatform {
        server.mock(|when, then| {
            when.method(GET).path(WORKSPACE_PATH);
            then.status(200).json_body(serde_json::json!({"name": "ml-ws"}));
        });
        RestPlatform::connect(
            Client::new(),
            AccessToken::new("tok".to_string()),
            &credentials(server),
            &workspace(),
        )
        .unwrap()
        .with_polling(Duration::from_millis(5), 3)
    }

    #[test]
    fn connect_rejections_keep_their_auth_kind() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(WORKSPACE_PATH);
            then.status(401);
        });
        let err = RestPlatform::connect(
            Client::new(),
            AccessToken::new("tok".to_string()),
            &credentials(&server),
            &workspace(),
        )
        .unwrap_err();
        assert_matches!(err, AuthError::RestAuthentication(_));

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(WORKSPACE_PATH);
            then.status(403);
        });
        let err = RestPlatform::connect(
            Client::new(),
            AccessToken::new("tok".to_string()),
            &credentials(&server),
            &workspace(),
        )
        .unwrap_err();
        assert_matches!(err, AuthError::Authorization(_));
    }

    #[test]
    fn model_is_resolved_by_name_and_version() {
        let server = MockServer::start();
        let platform = connect(&server);
        server.mock(|when, then| {
            when.method(GET)
                .path(format!("{WORKSPACE_PATH}/models"))
                .query_param("name", "sentiment")
                .query_param("version", "3");
            then.status(200).json_body(serde_json::json!({
                "value": [{"id": "sentiment:3", "name": "sentiment", "version": 3}]
            }));
        });

        let model = platform.resolve_model("sentiment", Some(3)).unwrap();
        assert_eq!(model.id, "sentiment:3");
        assert_eq!(model.version, 3);
    }

    #[test]
    fn unknown_model_is_not_found() {
        let server = MockServer::start();
        let platform = connect(&server);
        server.mock(|when, then| {
            when.method(GET).path(format!("{WORKSPACE_PATH}/models"));
            then.status(200).json_body(serde_json::json!({"value": []}));
        });

        let err = platform.resolve_model("missing", None).unwrap_err();
        assert_matches!(err, PlatformError::NotFound(resource) => {
            assert_eq!(resource, "model missing");
        });
    }

    #[test]
    fn absent_compute_target_is_none() {
        let server = MockServer::start();
        let platform = connect(&server);
        server.mock(|when, then| {
            when.method(GET).path(format!("{WORKSPACE_PATH}/computes/gone"));
            then.status(404);
        });

        assert_eq!(platform.find_compute_target("gone").unwrap(), None);
    }

    #[test]
    fn kubernetes_compute_target_is_tagged() {
        let server = MockServer::start();
        let platform = connect(&server);
        server.mock(|when, then| {
            when.method(GET).path(format!("{WORKSPACE_PATH}/computes/aks-prod"));
            then.status(200).json_body(serde_json::json!({
                "name": "aks-prod",
                "properties": {"computeType": "AKS"}
            }));
        });

        let target = platform.find_compute_target("aks-prod").unwrap().unwrap();
        assert_eq!(target.kind, ComputeTargetKind::KubernetesCluster);
    }

    #[test]
    fn deploy_submits_and_polling_observes_the_terminal_state() {
        let server = MockServer::start();
        let platform = connect(&server);
        let deploy_mock = server.mock(|when, then| {
            when.method(PUT).path(format!("{WORKSPACE_PATH}/services/my-service"));
            then.status(201);
        });
        server.mock(|when, then| {
            when.method(GET).path(format!("{WORKSPACE_PATH}/services/my-service"));
            then.status(200).json_body(serde_json::json!({
                "name": "my-service",
                "properties": {
                    "state": "Healthy",
                    "scoringUri": "https://scoring.example/score",
                    "swaggerUri": "https://scoring.example/swagger.json"
                }
            }));
        });

        let spec = DeploymentSpec {
            name: "my-service".to_string(),
            model: Model {
                id: "sentiment:3".to_string(),
                name: "sentiment".to_string(),
                version: 3,
            },
            inference_config: None,
            target: None,
            config: crate::platform::deployment::DeploymentConfig::build(
                None,
                &Default::default(),
                &Default::default(),
                Default::default(),
            ),
            overwrite: true,
        };
        let service = platform.deploy(&spec).unwrap();
        deploy_mock.assert();
        assert_eq!(service.state, ServiceState::Creating);

        let service = platform.wait_for_service("my-service").unwrap();
        assert_eq!(service.state, ServiceState::Healthy);
        assert_eq!(
            service.scoring_uri.unwrap().as_str(),
            "https://scoring.example/score"
        );
    }

    #[test]
    fn waiting_times_out_when_the_service_keeps_creating() {
        let server = MockServer::start();
        let platform = connect(&server);
        server.mock(|when, then| {
            when.method(GET).path(format!("{WORKSPACE_PATH}/services/slow"));
            then.status(200).json_body(serde_json::json!({
                "name": "slow",
                "properties": {"state": "Creating"}
            }));
        });

        let err = platform.wait_for_service("slow").unwrap_err();
        assert_matches!(err, PlatformError::Timeout(_));
    }

    #[test]
    fn service_logs_are_retrieved_for_diagnostics() {
        let server = MockServer::start();
        let platform = connect(&server);
        server.mock(|when, then| {
            when.method(GET).path(format!("{WORKSPACE_PATH}/services/my-service/logs"));
            then.status(200)
                .json_body(serde_json::json!({"content": "replica crashed"}));
        });

        assert_eq!(platform.service_logs("my-service").unwrap(), "replica crashed");
    }

    #[test]
    fn registry_credentials_are_decoded() {
        let server = MockServer::start();
        let platform = connect(&server);
        server.mock(|when, then| {
            when.method(GET).path(format!("{WORKSPACE_PATH}/packages/pkg-1/credentials"));
            then.status(200).json_body(serde_json::json!({
                "address": "registry.example",
                "username": "builder",
                "password": "hunter2"
            }));
        });

        let package = Package {
            id: "pkg-1".to_string(),
            state: PackageState::Succeeded,
            location: None,
        };
        let credentials = platform.registry_credentials(&package).unwrap();
        assert_eq!(credentials.address, "registry.example");
        assert_eq!(credentials.password, "hunter2");
    }
}
