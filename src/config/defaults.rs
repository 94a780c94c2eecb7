use std::time::Duration;

pub const ACTION_VERSION: &str = env!("CARGO_PKG_VERSION");

// Environment variables injected by the CI host.
pub const CREDENTIALS_ENV_VAR: &str = "INPUT_AZURE_CREDENTIALS";
pub const MODEL_NAME_ENV_VAR: &str = "INPUT_MODEL_NAME";
pub const MODEL_VERSION_ENV_VAR: &str = "INPUT_MODEL_VERSION";
pub const PARAMETERS_FILE_ENV_VAR: &str = "INPUT_PARAMETERS_FILE";
pub const WORKSPACE_ROOT_ENV_VAR: &str = "GITHUB_WORKSPACE";
pub const REPOSITORY_ENV_VAR: &str = "GITHUB_REPOSITORY";
pub const GIT_REF_ENV_VAR: &str = "GITHUB_REF";
pub const REGISTRY_ADDRESS_ENV_VAR: &str = "CONTAINER_REGISTRY_ADDRESS";
pub const REGISTRY_USERNAME_ENV_VAR: &str = "CONTAINER_REGISTRY_USERNAME";
pub const REGISTRY_PASSWORD_ENV_VAR: &str = "CONTAINER_REGISTRY_PASSWORD";
pub const PRIMARY_KEY_ENV_VAR: &str = "PRIMARY_KEY";
pub const SECONDARY_KEY_ENV_VAR: &str = "SECONDARY_KEY";
pub const CMK_VAULT_BASE_URL_ENV_VAR: &str = "CMK_VAULT_BASE_URL";
pub const CMK_KEY_NAME_ENV_VAR: &str = "CMK_KEY_NAME";
pub const CMK_KEY_VERSION_ENV_VAR: &str = "CMK_KEY_VERSION";
pub const FUNCTION_INPUT_PATH_ENV_VAR: &str = "FUNCTION_INPUT_PATH";
pub const FUNCTION_OUTPUT_PATH_ENV_VAR: &str = "FUNCTION_OUTPUT_PATH";

// Repository-relative configuration files.
pub const PARAMETERS_DIR: &str = ".cloud/.azure";
pub const DEFAULT_PARAMETERS_FILE: &str = "deploy.json";
pub const WORKSPACE_CONFIG_FILE: &str = "aml_arm_config.json";

// Conventional inference config locations inside the checkout.
pub const DEFAULT_INFERENCE_SOURCE_DIRECTORY: &str = "code/deploy";
pub const DEFAULT_INFERENCE_ENTRY_SCRIPT: &str = "score.py";
pub const DEFAULT_CONDA_FILE: &str = "environment.yml";

// Smoke test contract.
pub const DEFAULT_TEST_FILE: &str = "code/test/test";
pub const DEFAULT_TEST_FUNCTION: &str = "main";

// Service names must stay short enough to compose DNS labels.
pub const SERVICE_NAME_MAX_LENGTH: usize = 32;

// Control plane endpoints per cloud variant.
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_AUTHORITY_ENDPOINT: &str = "https://login.microsoftonline.com";
pub const US_GOV_MANAGEMENT_HOST: &str = "management.usgovcloudapi.net";
pub const US_GOV_AUTHORITY_ENDPOINT: &str = "https://login.microsoftonline.us";
pub const CHINA_MANAGEMENT_HOST: &str = "management.chinacloudapi.cn";
pub const CHINA_AUTHORITY_ENDPOINT: &str = "https://login.chinacloudapi.cn";

// Blocking HTTP behavior. Completion waits are long because image builds and
// cluster rollouts routinely take several minutes.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
pub const HTTP_CONN_TIMEOUT: Duration = Duration::from_secs(10);
pub const COMPLETION_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const COMPLETION_POLL_ATTEMPTS: usize = 180;
