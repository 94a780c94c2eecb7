use super::types::{ComputeTarget, ComputeTargetKind, InferenceConfig, Model, ResourceRecommendation};
use crate::config::inputs::ActionInputs;
use crate::config::parameters::DeployParameters;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Resolves one sizing setting with override-wins precedence: an explicit
/// value from the parameters file beats the platform recommendation, which
/// beats absence. Absence means "unset", not a default.
pub fn resolve_setting(
    explicit: Option<f64>,
    recommendation: Option<&ResourceRecommendation>,
    field: &str,
) -> Option<f64> {
    explicit.or_else(|| {
        recommendation.and_then(|rec| rec.serialized().get(field).and_then(Value::as_f64))
    })
}

/// Resource sizing after merging explicit parameters with a profiling
/// recommendation, each field resolved independently.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedSizing {
    pub cpu_cores: Option<f64>,
    pub memory_gb: Option<f64>,
    pub gpu_cores: Option<f64>,
}

impl ResolvedSizing {
    pub fn resolve(
        parameters: &DeployParameters,
        recommendation: Option<&ResourceRecommendation>,
    ) -> Self {
        Self {
            cpu_cores: resolve_setting(parameters.cpu_cores, recommendation, "cpu"),
            memory_gb: resolve_setting(parameters.memory_gb, recommendation, "memoryInGB"),
            gpu_cores: resolve_setting(
                parameters.gpu_cores.map(|cores| cores as f64),
                recommendation,
                "gpu",
            ),
        }
    }
}

/// Settings for a service on a managed Kubernetes cluster.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesServiceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscale_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscale_min_replicas: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscale_max_replicas: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscale_refresh_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscale_target_utilization: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_replicas: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_gb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_cores: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_auth_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_model_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_app_insights: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_max_concurrent_requests: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_request_wait_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    // Liveness probe tuning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_delay_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_threshold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Settings for a service on the default serverless container target.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerlessServiceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_gb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_cert_pem_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_key_pem_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_cname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_model_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_app_insights: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_key: Option<String>,
    // Customer managed key encryption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmk_vault_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmk_key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmk_key_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The two mutually exclusive deployment config shapes, selected by the
/// resolved compute target's kind.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum DeploymentConfig {
    Kubernetes(KubernetesServiceConfig),
    Serverless(ServerlessServiceConfig),
}

impl DeploymentConfig {
    /// Builds the config matching the resolved target: managed Kubernetes
    /// clusters get the extended shape, every other target (including the
    /// default serverless one) gets the simpler shape.
    pub fn build(
        target: Option<&ComputeTarget>,
        parameters: &DeployParameters,
        inputs: &ActionInputs,
        sizing: ResolvedSizing,
    ) -> Self {
        match target {
            Some(target) if target.kind == ComputeTargetKind::KubernetesCluster => {
                Self::Kubernetes(KubernetesServiceConfig {
                    autoscale_enabled: parameters.autoscale_enabled,
                    autoscale_min_replicas: parameters.autoscale_min_replicas,
                    autoscale_max_replicas: parameters.autoscale_max_replicas,
                    autoscale_refresh_seconds: parameters.autoscale_refresh_seconds,
                    autoscale_target_utilization: parameters.autoscale_target_utilization,
                    num_replicas: parameters.num_replicas,
                    cpu_cores: sizing.cpu_cores,
                    memory_gb: sizing.memory_gb,
                    gpu_cores: sizing.gpu_cores,
                    auth_enabled: parameters.authentication_enabled,
                    token_auth_enabled: parameters.token_auth_enabled,
                    collect_model_data: parameters.model_data_collection_enabled,
                    enable_app_insights: parameters.app_insights_enabled,
                    scoring_timeout_ms: parameters.scoring_timeout_ms,
                    replica_max_concurrent_requests: parameters.replica_max_concurrent_requests,
                    max_request_wait_time: parameters.max_request_wait_time,
                    namespace: parameters.namespace.clone(),
                    period_seconds: parameters.period_seconds,
                    initial_delay_seconds: parameters.initial_delay_seconds,
                    timeout_seconds: parameters.timeout_seconds,
                    success_threshold: parameters.success_threshold,
                    failure_threshold: parameters.failure_threshold,
                    primary_key: inputs.primary_key.clone(),
                    secondary_key: inputs.secondary_key.clone(),
                    tags: parameters.tags.clone(),
                    properties: parameters.properties.clone(),
                    description: parameters.description.clone(),
                })
            }
            _ => Self::Serverless(ServerlessServiceConfig {
                cpu_cores: sizing.cpu_cores,
                memory_gb: sizing.memory_gb,
                location: parameters.location.clone(),
                auth_enabled: parameters.authentication_enabled,
                ssl_enabled: parameters.ssl_enabled,
                ssl_cert_pem_file: parameters.ssl_cert_pem_file.clone(),
                ssl_key_pem_file: parameters.ssl_key_pem_file.clone(),
                ssl_cname: parameters.ssl_cname.clone(),
                dns_name_label: parameters.dns_name_label.clone(),
                collect_model_data: parameters.model_data_collection_enabled,
                enable_app_insights: parameters.app_insights_enabled,
                primary_key: inputs.primary_key.clone(),
                secondary_key: inputs.secondary_key.clone(),
                cmk_vault_base_url: inputs.cmk_vault_base_url.clone(),
                cmk_key_name: inputs.cmk_key_name.clone(),
                cmk_key_version: inputs.cmk_key_version.clone(),
                tags: parameters.tags.clone(),
                properties: parameters.properties.clone(),
                description: parameters.description.clone(),
            }),
        }
    }

    /// Compute type tag the control plane expects for this shape.
    pub fn compute_type(&self) -> &'static str {
        match self {
            Self::Kubernetes(_) => "AKS",
            Self::Serverless(_) => "ACI",
        }
    }
}

/// Everything the deploy call needs: the service name, the resolved model,
/// the (optional) inference config and the target-shaped settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentSpec {
    pub name: String,
    pub model: Model,
    pub inference_config: Option<InferenceConfig>,
    pub target: Option<ComputeTarget>,
    pub config: DeploymentConfig,
    /// Replace an existing service with the same name instead of failing.
    pub overwrite: bool,
}
