//! Declarative configuration for one action run.
//!
//! All environment access happens once at startup in [inputs::ActionInputs];
//! the resulting structs are passed by reference to the orchestrator so no
//! component performs ambient lookups.

pub mod credentials;
pub mod defaults;
pub mod inputs;
pub mod parameters;
pub mod schema;
pub mod workspace;

use schema::SchemaError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "credentials are not valid JSON, paste the service principal JSON output into the credentials secret: {0}"
    )]
    CredentialsJson(String),

    #[error("decoding credentials: {0}")]
    CredentialsDecode(String),

    #[error("could not read parameters file {path}: {err}")]
    ParametersRead { path: PathBuf, err: String },

    #[error("parameters file {path} is not valid JSON: {err}")]
    ParametersJson { path: PathBuf, err: String },

    #[error("decoding parameters: {0}")]
    ParametersDecode(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid model version '{value}', expected an integer: {err}")]
    ModelVersion { value: String, err: String },

    #[error("could not read workspace config {path}: {err}")]
    WorkspaceConfigRead { path: PathBuf, err: String },

    #[error("workspace config {path} is malformed: {err}")]
    WorkspaceConfigDecode { path: PathBuf, err: String },
}
