use super::ConfigError;
use super::defaults::{
    CMK_KEY_NAME_ENV_VAR, CMK_KEY_VERSION_ENV_VAR, CMK_VAULT_BASE_URL_ENV_VAR, CREDENTIALS_ENV_VAR,
    DEFAULT_PARAMETERS_FILE, FUNCTION_INPUT_PATH_ENV_VAR, FUNCTION_OUTPUT_PATH_ENV_VAR,
    GIT_REF_ENV_VAR, MODEL_NAME_ENV_VAR, MODEL_VERSION_ENV_VAR, PARAMETERS_DIR,
    PARAMETERS_FILE_ENV_VAR, PRIMARY_KEY_ENV_VAR, REGISTRY_ADDRESS_ENV_VAR,
    REGISTRY_PASSWORD_ENV_VAR, REGISTRY_USERNAME_ENV_VAR, REPOSITORY_ENV_VAR,
    SECONDARY_KEY_ENV_VAR, SERVICE_NAME_MAX_LENGTH, WORKSPACE_ROOT_ENV_VAR,
};
use std::env;
use std::path::PathBuf;

/// Every CI-injected input, read from the environment exactly once at
/// startup. Components receive this struct by reference instead of
/// performing ambient environment lookups.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActionInputs {
    /// Raw credentials JSON blob; parsed and validated by
    /// [Credentials::from_json](super::credentials::Credentials::from_json).
    pub credentials_json: String,
    pub model_name: Option<String>,
    pub model_version: Option<u64>,
    pub parameters_file: String,
    /// Checkout root of the repository the action runs in.
    pub workspace_root: PathBuf,
    pub repository: Option<String>,
    pub git_ref: Option<String>,
    // Custom base image registry.
    pub registry_address: Option<String>,
    pub registry_username: Option<String>,
    pub registry_password: Option<String>,
    // Service auth keys.
    pub primary_key: Option<String>,
    pub secondary_key: Option<String>,
    // Customer managed key encryption.
    pub cmk_vault_base_url: Option<String>,
    pub cmk_key_name: Option<String>,
    pub cmk_key_version: Option<String>,
    // Function packaging triggers.
    pub function_input_path: Option<String>,
    pub function_output_path: Option<String>,
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.is_empty())
}

impl ActionInputs {
    pub fn from_env() -> Result<Self, ConfigError> {
        let model_version = non_empty(MODEL_VERSION_ENV_VAR)
            .map(|value| {
                value
                    .parse::<u64>()
                    .map_err(|err| ConfigError::ModelVersion {
                        value,
                        err: err.to_string(),
                    })
            })
            .transpose()?;

        Ok(Self {
            credentials_json: env::var(CREDENTIALS_ENV_VAR).unwrap_or_else(|_| "{}".to_string()),
            model_name: non_empty(MODEL_NAME_ENV_VAR),
            model_version,
            parameters_file: non_empty(PARAMETERS_FILE_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_PARAMETERS_FILE.to_string()),
            workspace_root: env::var(WORKSPACE_ROOT_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            repository: non_empty(REPOSITORY_ENV_VAR),
            git_ref: non_empty(GIT_REF_ENV_VAR),
            registry_address: non_empty(REGISTRY_ADDRESS_ENV_VAR),
            registry_username: non_empty(REGISTRY_USERNAME_ENV_VAR),
            registry_password: non_empty(REGISTRY_PASSWORD_ENV_VAR),
            primary_key: non_empty(PRIMARY_KEY_ENV_VAR),
            secondary_key: non_empty(SECONDARY_KEY_ENV_VAR),
            cmk_vault_base_url: non_empty(CMK_VAULT_BASE_URL_ENV_VAR),
            cmk_key_name: non_empty(CMK_KEY_NAME_ENV_VAR),
            cmk_key_version: non_empty(CMK_KEY_VERSION_ENV_VAR),
            function_input_path: non_empty(FUNCTION_INPUT_PATH_ENV_VAR),
            function_output_path: non_empty(FUNCTION_OUTPUT_PATH_ENV_VAR),
        })
    }

    /// Repository-relative path of the parameters file.
    pub fn parameters_path(&self) -> PathBuf {
        self.workspace_root
            .join(PARAMETERS_DIR)
            .join(&self.parameters_file)
    }

    /// Derives the default service name as `{repo}-{branch}`: the repository
    /// part after the owner, the last path segment of the git ref, lowercased,
    /// underscores mapped to hyphens and truncated to 32 characters so the
    /// name can compose DNS labels.
    pub fn default_service_name(&self) -> String {
        let repository = last_segment(self.repository.as_deref().unwrap_or("model"));
        let branch = last_segment(self.git_ref.as_deref().unwrap_or("service"));
        format!("{repository}-{branch}")
            .to_lowercase()
            .replace('_', "-")
            .chars()
            .take(SERVICE_NAME_MAX_LENGTH)
            .collect()
    }
}

fn last_segment(value: &str) -> &str {
    value.rsplit('/').next().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serial_test::serial;

    fn inputs_with(repository: &str, git_ref: &str) -> ActionInputs {
        ActionInputs {
            repository: Some(repository.to_string()),
            git_ref: Some(git_ref.to_string()),
            ..ActionInputs::default()
        }
    }

    #[test]
    fn default_service_name_is_repo_and_branch() {
        let inputs = inputs_with("octocat/My_Repo", "refs/heads/feature/x");
        assert_eq!(inputs.default_service_name(), "my-repo-x");
    }

    #[test]
    fn default_service_name_is_truncated_to_32_characters() {
        let inputs = inputs_with(
            "org/a-very-long-repository-name-indeed",
            "refs/heads/an-equally-long-branch-name",
        );
        let name = inputs.default_service_name();
        assert_eq!(name.chars().count(), 32);
        assert!(name.starts_with("a-very-long-repository-name-inde"));
    }

    #[test]
    fn default_service_name_without_ci_metadata() {
        assert_eq!(ActionInputs::default().default_service_name(), "model-service");
    }

    #[test]
    #[serial]
    fn from_env_reads_inputs_once() {
        std::env::set_var(MODEL_NAME_ENV_VAR, "sentiment");
        std::env::set_var(MODEL_VERSION_ENV_VAR, "3");
        std::env::set_var(PARAMETERS_FILE_ENV_VAR, "");
        let inputs = ActionInputs::from_env().unwrap();
        assert_eq!(inputs.model_name.as_deref(), Some("sentiment"));
        assert_eq!(inputs.model_version, Some(3));
        // Empty input values fall back to the default.
        assert_eq!(inputs.parameters_file, DEFAULT_PARAMETERS_FILE);
        assert_eq!(inputs.credentials_json, "{}");
        std::env::remove_var(MODEL_NAME_ENV_VAR);
        std::env::remove_var(MODEL_VERSION_ENV_VAR);
        std::env::remove_var(PARAMETERS_FILE_ENV_VAR);
    }

    #[test]
    #[serial]
    fn non_numeric_model_version_is_a_configuration_error() {
        std::env::set_var(MODEL_VERSION_ENV_VAR, "latest");
        let err = ActionInputs::from_env().unwrap_err();
        assert_matches!(err, ConfigError::ModelVersion { value, .. } => {
            assert_eq!(value, "latest");
        });
        std::env::remove_var(MODEL_VERSION_ENV_VAR);
    }

    #[test]
    fn parameters_path_is_relative_to_the_workspace() {
        let inputs = ActionInputs {
            workspace_root: PathBuf::from("/repo"),
            parameters_file: "deploy.json".to_string(),
            ..ActionInputs::default()
        };
        assert_eq!(
            inputs.parameters_path(),
            PathBuf::from("/repo/.cloud/.azure/deploy.json")
        );
    }
}
