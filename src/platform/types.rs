use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::path::PathBuf;
use url::Url;

/// A registered model resolved from the workspace registry.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub version: u64,
}

/// Cluster type of a compute target. Drives which of the two deployment
/// config shapes is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeTargetKind {
    KubernetesCluster,
    Other(String),
}

impl ComputeTargetKind {
    pub fn parse(compute_type: &str) -> Self {
        match compute_type {
            "AKS" | "Kubernetes" => Self::KubernetesCluster,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A named, platform-managed execution cluster a service can be bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeTarget {
    pub name: String,
    pub kind: ComputeTargetKind,
}

/// How to serve the model: entry script, dependency spec and base image.
/// Absent entirely on the no-code deployment path.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    pub entry_script: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conda_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_docker_file_steps: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_gpu: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuda_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_image_registry: Option<RegistryCredentials>,
}

/// Resource sizing recommendation produced by a profiling run. The resolver
/// extracts individual settings from the serialized form, so the payload is
/// kept as the platform returned it.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ResourceRecommendation(pub Value);

impl ResourceRecommendation {
    pub fn serialized(&self) -> &Value {
        &self.0
    }
}

/// Lifecycle state reported by the control plane for a web service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceState {
    Creating,
    Transitioning,
    Healthy,
    Failed,
    Other(String),
}

impl ServiceState {
    pub fn parse(state: &str) -> Self {
        match state {
            "Creating" => Self::Creating,
            "Transitioning" => Self::Transitioning,
            "Healthy" => Self::Healthy,
            "Failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the control plane will not move the service further on its own.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Creating | Self::Transitioning)
    }
}

impl Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creating => write!(f, "Creating"),
            Self::Transitioning => write!(f, "Transitioning"),
            Self::Healthy => write!(f, "Healthy"),
            Self::Failed => write!(f, "Failed"),
            Self::Other(state) => write!(f, "{state}"),
        }
    }
}

/// Handle to the live endpoint produced by one run. Owned by the
/// orchestrator for the duration of the run, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub state: ServiceState,
    pub scoring_uri: Option<Url>,
    pub swagger_uri: Option<Url>,
    pub primary_key: Option<String>,
}

/// Completion state of a packaging operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PackageState {
    Creating,
    Succeeded,
    Failed,
    Other(String),
}

impl PackageState {
    pub fn parse(state: &str) -> Self {
        match state {
            "Creating" | "Running" => Self::Creating,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Creating)
    }
}

impl Display for PackageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creating => write!(f, "Creating"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Other(state) => write!(f, "{state}"),
        }
    }
}

/// Handle to a packaging operation and, once complete, its artifact location.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub id: String,
    pub state: PackageState,
    pub location: Option<String>,
}

/// Address and credentials of the container registry holding a packaged
/// image. These values must be masked before any further logging.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RegistryCredentials {
    pub address: String,
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::healthy("Healthy", ServiceState::Healthy, true)]
    #[case::failed("Failed", ServiceState::Failed, true)]
    #[case::creating("Creating", ServiceState::Creating, false)]
    #[case::transitioning("Transitioning", ServiceState::Transitioning, false)]
    #[case::unknown("Unschedulable", ServiceState::Other("Unschedulable".to_string()), true)]
    fn service_state_parsing_and_terminality(
        #[case] raw: &str,
        #[case] expected: ServiceState,
        #[case] terminal: bool,
    ) {
        let state = ServiceState::parse(raw);
        assert_eq!(state, expected);
        assert_eq!(state.is_terminal(), terminal);
    }

    #[rstest]
    #[case::aks("AKS", ComputeTargetKind::KubernetesCluster)]
    #[case::kubernetes("Kubernetes", ComputeTargetKind::KubernetesCluster)]
    #[case::aml("AmlCompute", ComputeTargetKind::Other("AmlCompute".to_string()))]
    fn compute_target_kind_parsing(#[case] raw: &str, #[case] expected: ComputeTargetKind) {
        assert_eq!(ComputeTargetKind::parse(raw), expected);
    }

    #[test]
    fn running_package_is_not_terminal() {
        assert!(!PackageState::parse("Running").is_terminal());
        assert!(PackageState::parse("Succeeded").is_terminal());
    }
}
