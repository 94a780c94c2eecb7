use crate::config::ConfigError;
use crate::platform::auth::AuthError;
use crate::platform::client::PlatformError;
use crate::platform::http::ClientBuildError;
use crate::platform::types::{PackageState, ServiceState};
use crate::testscript::TestScriptError;
use std::process::ExitCode;
use thiserror::Error;

/// The run inputs have to change before a retry can succeed. Raised before
/// the deployment is submitted wherever possible.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("a model name is required, set the model_name input")]
    MissingModelName,

    #[error("model '{name}' ({version}) is not registered in the workspace")]
    ModelNotFound { name: String, version: String },

    #[error("unsupported create_image value '{0}'")]
    InvalidPackagingMode(String),

    #[error(transparent)]
    TestScript(TestScriptError),
}

/// The platform failed to produce a healthy service or a finished package.
/// Carries retrieved logs so the CI run shows the platform-side diagnosis.
#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("deployment failed: {err}\nservice logs:\n{logs}")]
    DeployFailed { err: PlatformError, logs: String },

    #[error("service reached state {state} instead of Healthy\nservice logs:\n{logs}")]
    Unhealthy { state: ServiceState, logs: String },

    #[error(transparent)]
    TestFailed(TestScriptError),

    #[error("packaging failed: {err}\nbuild logs:\n{logs}")]
    PackagingFailed { err: PlatformError, logs: String },

    #[error("packaging finished in state {state}\nbuild logs:\n{logs}")]
    PackageUnsuccessful { state: PackageState, logs: String },

    #[error("could not delete service '{name}': {err}")]
    ServiceDelete { name: String, err: PlatformError },

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("deployment error: {0}")]
    Deployment(#[from] DeploymentError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    HttpClient(#[from] ClientBuildError),
}

impl From<ConfigError> for ActionError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(ConfigurationError::Config(err))
    }
}

impl ActionError {
    /// Maps the error to the BSD `sysexits` convention: 78 (`EX_CONFIG`) for
    /// caller-caused configuration problems, 77 (`EX_NOPERM`) for
    /// authentication and authorization failures, 1 for everything the
    /// platform got wrong.
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }

    fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 78,
            Self::Auth(_) => 77,
            Self::Deployment(_) | Self::HttpClient(_) => 1,
        }
    }
}
