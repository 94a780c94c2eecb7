use super::error::{ActionError, ConfigurationError, DeploymentError};
use crate::config::ConfigError;
use crate::config::credentials::Credentials;
use crate::config::defaults::{
    DEFAULT_CONDA_FILE, DEFAULT_INFERENCE_ENTRY_SCRIPT, DEFAULT_INFERENCE_SOURCE_DIRECTORY,
    HTTP_CONN_TIMEOUT, HTTP_TIMEOUT,
};
use crate::config::inputs::ActionInputs;
use crate::config::parameters::DeployParameters;
use crate::config::workspace::WorkspaceConfig;
use crate::github::commands::{CommandEmitter, WorkflowCommands};
use crate::platform::auth::ServicePrincipalAuth;
use crate::platform::client::{MlPlatform, PlatformError};
use crate::platform::deployment::{DeploymentConfig, DeploymentSpec, ResolvedSizing};
use crate::platform::http::{RestPlatform, try_build_http_client};
use crate::platform::packaging::{PackagingMode, PackagingRequest};
use crate::platform::types::{
    ComputeTarget, InferenceConfig, Model, PackageState, RegistryCredentials,
    ResourceRecommendation, Service, ServiceState,
};
use crate::testscript::{SmokeTest, TestScriptError};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use url::Url;

/// Wires the full run: configuration, authentication, then the
/// orchestration sequence against the live control plane.
pub fn run(inputs: &ActionInputs) -> Result<(), ActionError> {
    let mut commands = WorkflowCommands::stdout();
    let credentials = load_credentials(&inputs.credentials_json, &mut commands)?;
    let parameters = DeployParameters::load(&inputs.parameters_path())?;
    let workspace = WorkspaceConfig::load(&inputs.workspace_root)?;

    let client = try_build_http_client(HTTP_TIMEOUT, HTTP_CONN_TIMEOUT)?;
    // Auth failures keep their four distinct kinds: each is logged here and
    // propagated unwrapped.
    let auth = ServicePrincipalAuth::new(&credentials, client.clone())
        .inspect_err(|err| error!("{err}"))?;
    let token = auth
        .fetch_token(&credentials, &credentials.management_endpoint())
        .inspect_err(|err| error!("{err}"))?;
    let platform = RestPlatform::connect(client, token, &credentials, &workspace)
        .inspect_err(|err| error!("{err}"))?;

    DeployAction::new(&platform, &mut commands, inputs, &parameters).execute()
}

/// Parses the credentials blob and registers every identifier field with the
/// log masker before anything else can log them.
pub fn load_credentials<C: CommandEmitter>(
    raw: &str,
    commands: &mut C,
) -> Result<Credentials, ConfigError> {
    let credentials = Credentials::from_json(raw)?;
    for secret in credentials.secret_values() {
        commands.add_mask(secret);
    }
    Ok(credentials)
}

/// One deployment run against an already authenticated control plane.
pub struct DeployAction<'a, P: MlPlatform, C: CommandEmitter> {
    platform: &'a P,
    commands: &'a mut C,
    inputs: &'a ActionInputs,
    parameters: &'a DeployParameters,
}

impl<'a, P: MlPlatform, C: CommandEmitter> DeployAction<'a, P, C> {
    pub fn new(
        platform: &'a P,
        commands: &'a mut C,
        inputs: &'a ActionInputs,
        parameters: &'a DeployParameters,
    ) -> Self {
        Self {
            platform,
            commands,
            inputs,
            parameters,
        }
    }

    pub fn execute(mut self) -> Result<(), ActionError> {
        let model = self.resolve_model()?;
        let inference_config = self.build_inference_config();
        let recommendation = self.profile(&model);
        let sizing = ResolvedSizing::resolve(self.parameters, recommendation.as_ref());
        let target = self.resolve_compute_target();

        if self.parameters.skip_deployment() {
            info!("Skipping service deployment");
        } else {
            self.deploy_service(&model, inference_config, target, sizing)?;
        }

        if let Some(mode) = self.parameters.create_image.clone() {
            self.package(&model, &mode)?;
        }
        Ok(())
    }

    fn resolve_model(&self) -> Result<Model, ActionError> {
        let name = self
            .inputs
            .model_name
            .as_deref()
            .ok_or(ConfigurationError::MissingModelName)?;
        match self.platform.resolve_model(name, self.inputs.model_version) {
            Ok(model) => {
                info!("Using model {} version {}", model.name, model.version);
                Ok(model)
            }
            Err(PlatformError::NotFound(_)) => {
                let version = match self.inputs.model_version {
                    Some(version) => format!("version {version}"),
                    None => "latest version".to_string(),
                };
                Err(ConfigurationError::ModelNotFound {
                    name: name.to_string(),
                    version,
                }
                .into())
            }
            Err(err) => Err(DeploymentError::Platform(err).into()),
        }
    }

    /// Builds the inference config from the conventional checkout layout.
    /// A missing entry script or conda file downgrades the run to a no-code
    /// deployment instead of failing it.
    fn build_inference_config(&self) -> Option<InferenceConfig> {
        let source_directory = self.inputs.workspace_root.join(
            self.parameters
                .inference_source_directory
                .as_deref()
                .unwrap_or(DEFAULT_INFERENCE_SOURCE_DIRECTORY),
        );
        let entry_script = self
            .parameters
            .inference_entry_script
            .as_deref()
            .unwrap_or(DEFAULT_INFERENCE_ENTRY_SCRIPT);
        let conda_file = self
            .parameters
            .conda_file
            .as_deref()
            .unwrap_or(DEFAULT_CONDA_FILE);

        if !source_directory.join(entry_script).is_file()
            || !source_directory.join(conda_file).is_file()
        {
            warn!(
                "Entry script or conda file not found under {}, deploying without an inference config",
                source_directory.display()
            );
            return None;
        }

        let base_image_registry = match (
            &self.inputs.registry_address,
            &self.inputs.registry_username,
            &self.inputs.registry_password,
        ) {
            (Some(address), Some(username), Some(password)) => Some(RegistryCredentials {
                address: address.clone(),
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        Some(InferenceConfig {
            entry_script: PathBuf::from(entry_script),
            source_directory: Some(source_directory),
            conda_file: Some(PathBuf::from(conda_file)),
            runtime: self.parameters.runtime.clone(),
            extra_docker_file_steps: self
                .parameters
                .extra_docker_file_steps
                .clone()
                .map(PathBuf::from),
            enable_gpu: self.parameters.enable_gpu,
            cuda_version: self.parameters.cuda_version.clone(),
            description: self.parameters.description.clone(),
            base_image: self.parameters.custom_base_image.clone(),
            base_image_registry,
        })
    }

    /// Profiling never blocks a run: any failure downgrades to the sizing
    /// already configured.
    fn profile(&self, model: &Model) -> Option<ResourceRecommendation> {
        if !self.parameters.profiling_enabled() {
            return None;
        }
        let Some(dataset) = self.parameters.profiling_dataset.as_deref() else {
            warn!("Profiling is enabled but no profiling_dataset is set, skipping profiling");
            return None;
        };
        match self.platform.profile_model(model, dataset) {
            Ok(recommendation) => {
                debug!("Model profiling produced a resource recommendation");
                Some(recommendation)
            }
            Err(err) => {
                warn!("Model profiling failed, continuing with the configured sizing: {err}");
                None
            }
        }
    }

    /// A named target that cannot be resolved falls back to the default
    /// serverless target instead of failing the run.
    fn resolve_compute_target(&self) -> Option<ComputeTarget> {
        let name = self.parameters.deployment_compute_target.as_deref()?;
        match self.platform.find_compute_target(name) {
            Ok(Some(target)) => {
                debug!("Deploying to compute target {}", target.name);
                Some(target)
            }
            Ok(None) => {
                warn!("Compute target '{name}' not found, deploying to the default serverless target");
                None
            }
            Err(err) => {
                warn!(
                    "Compute target lookup failed ({err}), deploying to the default serverless target"
                );
                None
            }
        }
    }

    fn deploy_service(
        &mut self,
        model: &Model,
        inference_config: Option<InferenceConfig>,
        target: Option<ComputeTarget>,
        sizing: ResolvedSizing,
    ) -> Result<(), ActionError> {
        let name = self
            .parameters
            .name
            .clone()
            .unwrap_or_else(|| self.inputs.default_service_name());
        let config = DeploymentConfig::build(target.as_ref(), self.parameters, self.inputs, sizing);
        let spec = DeploymentSpec {
            name: name.clone(),
            model: model.clone(),
            inference_config,
            target,
            config,
            overwrite: true,
        };

        info!("Deploying service {name}");
        if let Err(err) = self.platform.deploy(&spec) {
            return Err(DeploymentError::DeployFailed {
                err,
                logs: self.service_logs(&name),
            }
            .into());
        }
        let service = match self.platform.wait_for_service(&name) {
            Ok(service) => service,
            Err(err) => {
                return Err(DeploymentError::DeployFailed {
                    err,
                    logs: self.service_logs(&name),
                }
                .into());
            }
        };
        if service.state != ServiceState::Healthy {
            return Err(DeploymentError::Unhealthy {
                state: service.state,
                logs: self.service_logs(&name),
            }
            .into());
        }
        info!("Service {name} is healthy");

        if self.parameters.test_enabled() {
            self.run_smoke_test(&service)?;
        }

        if self.parameters.delete_service_after_deployment() {
            info!("Deleting service {name} after a successful deployment");
            self.platform
                .delete_service(&name)
                .map_err(|err| DeploymentError::ServiceDelete {
                    name: name.clone(),
                    err,
                })?;
        } else {
            self.commands.set_output(
                "service_scoring_uri",
                service.scoring_uri.as_ref().map(Url::as_str).unwrap_or_default(),
            );
            self.commands.set_output(
                "service_swagger_uri",
                service.swagger_uri.as_ref().map(Url::as_str).unwrap_or_default(),
            );
        }
        Ok(())
    }

    fn run_smoke_test(&self, service: &Service) -> Result<(), ActionError> {
        info!("Running the smoke test against {}", service.name);
        let test = SmokeTest::from_parameters(self.parameters, &self.inputs.workspace_root);
        match test.run(service) {
            Ok(()) => {
                info!("Smoke test passed");
                Ok(())
            }
            // A failed assertion indicts the deployed service, a missing or
            // unrunnable script indicts the run configuration.
            Err(err @ TestScriptError::Failed { .. }) => {
                Err(DeploymentError::TestFailed(err).into())
            }
            Err(err) => Err(ConfigurationError::TestScript(err).into()),
        }
    }

    fn package(&mut self, model: &Model, mode: &str) -> Result<(), ActionError> {
        let mode = PackagingMode::parse(mode)
            .ok_or_else(|| ConfigurationError::InvalidPackagingMode(mode.to_string()))?;
        let request = PackagingRequest {
            mode,
            input_path: mode
                .is_function()
                .then(|| self.inputs.function_input_path.clone())
                .flatten(),
            output_path: mode
                .is_function()
                .then(|| self.inputs.function_output_path.clone())
                .flatten(),
        };

        info!("Packaging model {}", model.name);
        let package = self
            .platform
            .create_package(model, &request)
            .map_err(|err| DeploymentError::PackagingFailed {
                err,
                logs: String::new(),
            })?;
        let package = match self.platform.wait_for_package(&package) {
            Ok(package) => package,
            Err(err) => {
                return Err(DeploymentError::PackagingFailed {
                    err,
                    logs: self.package_logs(&package),
                }
                .into());
            }
        };
        if package.state != PackageState::Succeeded {
            return Err(DeploymentError::PackageUnsuccessful {
                logs: self.package_logs(&package),
                state: package.state,
            }
            .into());
        }

        let credentials = self
            .platform
            .registry_credentials(&package)
            .map_err(DeploymentError::Platform)?;
        // Masked before any output or log line can carry them.
        self.commands.add_mask(&credentials.address);
        self.commands.add_mask(&credentials.username);
        self.commands.add_mask(&credentials.password);
        self.commands
            .set_output("package_location", package.location.as_deref().unwrap_or_default());
        self.commands.set_output("package_registry", &credentials.address);
        self.commands.set_output("package_username", &credentials.username);
        self.commands.set_output("package_password", &credentials.password);
        Ok(())
    }

    fn service_logs(&self, name: &str) -> String {
        self.platform
            .service_logs(name)
            .unwrap_or_else(|err| format!("service logs unavailable: {err}"))
    }

    fn package_logs(&self, package: &crate::platform::types::Package) -> String {
        self.platform
            .package_logs(package)
            .unwrap_or_else(|err| format!("build logs unavailable: {err}"))
    }
}
