use super::ConfigError;
use super::schema::{FieldRule, Schema, ValueKind};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Deployment parameters, an open-ended key/value document loaded from the
/// repository. Every field is optional; per-field defaults apply at the use
/// site. Unknown keys are tolerated for forward compatibility.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct DeployParameters {
    pub name: Option<String>,
    pub deployment_compute_target: Option<String>,

    // Inference config.
    pub inference_source_directory: Option<String>,
    pub inference_entry_script: Option<String>,
    pub conda_file: Option<String>,
    pub extra_docker_file_steps: Option<String>,
    pub runtime: Option<String>,
    pub custom_base_image: Option<String>,
    pub enable_gpu: Option<bool>,
    pub cuda_version: Option<String>,

    // Smoke test.
    pub test_enabled: Option<bool>,
    pub test_file_path: Option<String>,
    pub test_file_function_name: Option<String>,

    // Profiling.
    pub profiling_enabled: Option<bool>,
    pub profiling_dataset: Option<String>,

    // Resource sizing.
    pub cpu_cores: Option<f64>,
    pub memory_gb: Option<f64>,
    pub gpu_cores: Option<u64>,

    // Run behavior.
    pub delete_service_after_deployment: Option<bool>,
    pub skip_deployment: Option<bool>,
    pub create_image: Option<String>,

    // Common service settings.
    pub authentication_enabled: Option<bool>,
    pub token_auth_enabled: Option<bool>,
    pub model_data_collection_enabled: Option<bool>,
    pub app_insights_enabled: Option<bool>,
    pub tags: Option<HashMap<String, Value>>,
    pub properties: Option<HashMap<String, Value>>,
    pub description: Option<String>,

    // Serverless target settings.
    pub location: Option<String>,
    pub ssl_enabled: Option<bool>,
    pub ssl_cert_pem_file: Option<String>,
    pub ssl_key_pem_file: Option<String>,
    pub ssl_cname: Option<String>,
    pub dns_name_label: Option<String>,

    // Kubernetes target settings.
    pub namespace: Option<String>,
    pub num_replicas: Option<u64>,
    pub autoscale_enabled: Option<bool>,
    pub autoscale_min_replicas: Option<u64>,
    pub autoscale_max_replicas: Option<u64>,
    pub autoscale_refresh_seconds: Option<u64>,
    pub autoscale_target_utilization: Option<u64>,
    pub scoring_timeout_ms: Option<u64>,
    pub replica_max_concurrent_requests: Option<u64>,
    pub max_request_wait_time: Option<u64>,
    pub period_seconds: Option<u64>,
    pub initial_delay_seconds: Option<u64>,
    pub timeout_seconds: Option<u64>,
    pub success_threshold: Option<u64>,
    pub failure_threshold: Option<u64>,
}

static PARAMETERS_SCHEMA: Schema = Schema {
    document: "deploy parameters",
    required: &[],
    fields: &[
        FieldRule::of("name", ValueKind::String).length(3, 32),
        FieldRule::of("deployment_compute_target", ValueKind::String),
        FieldRule::of("inference_source_directory", ValueKind::String),
        FieldRule::of("inference_entry_script", ValueKind::String),
        FieldRule::of("conda_file", ValueKind::String),
        FieldRule::of("extra_docker_file_steps", ValueKind::String),
        FieldRule::of("runtime", ValueKind::String).pattern("^(python|spark-py)$"),
        FieldRule::of("custom_base_image", ValueKind::String),
        FieldRule::of("enable_gpu", ValueKind::Boolean),
        FieldRule::of("cuda_version", ValueKind::String),
        FieldRule::of("test_enabled", ValueKind::Boolean),
        FieldRule::of("test_file_path", ValueKind::String),
        FieldRule::of("test_file_function_name", ValueKind::String),
        FieldRule::of("profiling_enabled", ValueKind::Boolean),
        FieldRule::of("profiling_dataset", ValueKind::String),
        FieldRule::of("cpu_cores", ValueKind::Number).exclusive_minimum(0.0),
        FieldRule::of("memory_gb", ValueKind::Number).exclusive_minimum(0.0),
        FieldRule::of("gpu_cores", ValueKind::Integer).minimum(0.0),
        FieldRule::of("delete_service_after_deployment", ValueKind::Boolean),
        FieldRule::of("skip_deployment", ValueKind::Boolean),
        FieldRule::of("create_image", ValueKind::String)
            .pattern("^(docker|function_blob|function_http|function_service_bus_queue)$"),
        FieldRule::of("authentication_enabled", ValueKind::Boolean),
        FieldRule::of("token_auth_enabled", ValueKind::Boolean),
        FieldRule::of("model_data_collection_enabled", ValueKind::Boolean),
        FieldRule::of("app_insights_enabled", ValueKind::Boolean),
        FieldRule::of("tags", ValueKind::Object),
        FieldRule::of("properties", ValueKind::Object),
        FieldRule::of("description", ValueKind::String),
        FieldRule::of("location", ValueKind::String),
        FieldRule::of("ssl_enabled", ValueKind::Boolean),
        FieldRule::of("ssl_cert_pem_file", ValueKind::String),
        FieldRule::of("ssl_key_pem_file", ValueKind::String),
        FieldRule::of("ssl_cname", ValueKind::String),
        FieldRule::of("dns_name_label", ValueKind::String),
        FieldRule::of("namespace", ValueKind::String)
            .max_length(63)
            .pattern("^([a-z0-9-])+$"),
        FieldRule::of("num_replicas", ValueKind::Integer),
        FieldRule::of("autoscale_enabled", ValueKind::Boolean),
        FieldRule::of("autoscale_min_replicas", ValueKind::Integer).minimum(1.0),
        FieldRule::of("autoscale_max_replicas", ValueKind::Integer).minimum(1.0),
        FieldRule::of("autoscale_refresh_seconds", ValueKind::Integer).minimum(1.0),
        FieldRule::of("autoscale_target_utilization", ValueKind::Integer)
            .minimum(1.0)
            .maximum(100.0),
        FieldRule::of("scoring_timeout_ms", ValueKind::Integer).minimum(1.0),
        FieldRule::of("replica_max_concurrent_requests", ValueKind::Integer).minimum(1.0),
        FieldRule::of("max_request_wait_time", ValueKind::Integer).minimum(0.0),
        FieldRule::of("period_seconds", ValueKind::Integer).minimum(1.0),
        FieldRule::of("initial_delay_seconds", ValueKind::Integer).minimum(1.0),
        FieldRule::of("timeout_seconds", ValueKind::Integer).minimum(1.0),
        FieldRule::of("success_threshold", ValueKind::Integer).minimum(1.0),
        FieldRule::of("failure_threshold", ValueKind::Integer).minimum(1.0),
    ],
};

impl DeployParameters {
    /// Loads and validates the parameters file. A missing file yields the
    /// empty parameter set; an unreadable or malformed file is fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "No parameters file found in {}, using defaults for all deploy parameters",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ConfigError::ParametersRead {
                    path: path.to_path_buf(),
                    err: err.to_string(),
                });
            }
        };
        let value: Value =
            serde_json::from_str(&raw).map_err(|err| ConfigError::ParametersJson {
                path: path.to_path_buf(),
                err: err.to_string(),
            })?;
        Self::from_value(value)
    }

    /// Validates and decodes an already parsed parameters document.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        PARAMETERS_SCHEMA.validate(&value)?;
        serde_json::from_value(value).map_err(|err| ConfigError::ParametersDecode(err.to_string()))
    }

    pub fn test_enabled(&self) -> bool {
        self.test_enabled.unwrap_or(false)
    }

    pub fn profiling_enabled(&self) -> bool {
        self.profiling_enabled.unwrap_or(false)
    }

    pub fn skip_deployment(&self) -> bool {
        self.skip_deployment.unwrap_or(false)
    }

    pub fn delete_service_after_deployment(&self) -> bool {
        self.delete_service_after_deployment.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SchemaError;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_the_empty_parameter_set() {
        let dir = tempdir().unwrap();
        let parameters = DeployParameters::load(&dir.path().join("deploy.json")).unwrap();
        assert_eq!(parameters, DeployParameters::default());
        assert!(!parameters.test_enabled());
        assert!(!parameters.skip_deployment());
    }

    #[test]
    fn malformed_file_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deploy.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{{not json").unwrap();

        let err = DeployParameters::load(&path).unwrap_err();
        assert_matches!(err, ConfigError::ParametersJson { .. });
    }

    #[test]
    fn valid_file_is_decoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deploy.json");
        std::fs::write(
            &path,
            json!({
                "name": "sentiment",
                "deployment_compute_target": "aks-prod",
                "cpu_cores": 1.5,
                "autoscale_target_utilization": 70,
                "namespace": "ml-services",
                "test_enabled": true,
                "future_key": "ignored"
            })
            .to_string(),
        )
        .unwrap();

        let parameters = DeployParameters::load(&path).unwrap();
        assert_eq!(parameters.name.as_deref(), Some("sentiment"));
        assert_eq!(parameters.deployment_compute_target.as_deref(), Some("aks-prod"));
        assert_eq!(parameters.cpu_cores, Some(1.5));
        assert_eq!(parameters.autoscale_target_utilization, Some(70));
        assert!(parameters.test_enabled());
    }

    #[test]
    fn schema_violations_are_all_reported() {
        let value = json!({
            "autoscale_target_utilization": 150,
            "namespace": "Production",
            "cpu_cores": 0,
            "create_image": "tarball"
        });
        let err = DeployParameters::from_value(value).unwrap_err();
        assert_matches!(err, ConfigError::Schema(SchemaError::Violations { violations, .. }) => {
            assert_eq!(violations.len(), 4, "{violations:?}");
        });
    }

    #[test]
    fn short_service_name_is_rejected() {
        let err = DeployParameters::from_value(json!({"name": "ab"})).unwrap_err();
        assert_matches!(err, ConfigError::Schema(_));
    }
}
