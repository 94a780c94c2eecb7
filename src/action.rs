//! The orchestrator: one run sequences configuration loading,
//! authentication, model resolution, deployment, the optional smoke test
//! and the optional packaging branch, reporting results through the CI
//! log protocol.

pub mod error;
pub mod run;

pub use error::{ActionError, ConfigurationError, DeploymentError};
pub use run::{DeployAction, run};
