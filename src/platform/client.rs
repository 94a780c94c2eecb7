use super::deployment::DeploymentSpec;
use super::packaging::PackagingRequest;
use super::types::{
    ComputeTarget, Model, Package, RegistryCredentials, ResourceRecommendation, Service,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("request to the control plane failed: {0}")]
    Transport(String),

    #[error("the control plane returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("unexpected response payload: {0}")]
    Payload(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),
}

/// Operations the orchestrator needs from the ML control plane. One
/// implementation speaks REST; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
pub trait MlPlatform {
    /// Looks up a registered model, the latest version when `version` is absent.
    fn resolve_model(&self, name: &str, version: Option<u64>) -> Result<Model, PlatformError>;

    /// Looks up a compute target by name. `Ok(None)` signals "use the
    /// default serverless target", it is not an error.
    fn find_compute_target(&self, name: &str) -> Result<Option<ComputeTarget>, PlatformError>;

    /// Runs model profiling against `dataset` and returns the recommended
    /// resource sizing.
    fn profile_model(
        &self,
        model: &Model,
        dataset: &str,
    ) -> Result<ResourceRecommendation, PlatformError>;

    /// Submits the deployment. The returned service is typically still creating.
    fn deploy(&self, spec: &DeploymentSpec) -> Result<Service, PlatformError>;

    /// Blocks until the service reaches a terminal state and returns it.
    fn wait_for_service(&self, name: &str) -> Result<Service, PlatformError>;

    /// Retrieves container logs of the service for diagnostics.
    fn service_logs(&self, name: &str) -> Result<String, PlatformError>;

    fn delete_service(&self, name: &str) -> Result<(), PlatformError>;

    /// Starts packaging the model into a deployable artifact.
    fn create_package(
        &self,
        model: &Model,
        request: &PackagingRequest,
    ) -> Result<Package, PlatformError>;

    /// Blocks until the packaging operation reaches a terminal state.
    fn wait_for_package(&self, package: &Package) -> Result<Package, PlatformError>;

    /// Retrieves build logs of the packaging operation for diagnostics.
    fn package_logs(&self, package: &Package) -> Result<String, PlatformError>;

    /// Credentials of the registry holding the packaged image. Callers must
    /// mask these before any further logging.
    fn registry_credentials(&self, package: &Package)
    -> Result<RegistryCredentials, PlatformError>;
}
