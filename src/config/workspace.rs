use super::ConfigError;
use super::defaults::WORKSPACE_CONFIG_FILE;
use serde::Deserialize;
use std::path::Path;

/// Coordinates of the ML workspace the run operates against, written to the
/// repository by a prior workspace-provisioning step.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub subscription_id: Option<String>,
    pub resource_group: String,
    pub workspace_name: String,
}

impl WorkspaceConfig {
    /// Loads `aml_arm_config.json` from the repository root. A missing file
    /// is fatal: without workspace coordinates no control plane URL can be
    /// composed.
    pub fn load(workspace_root: &Path) -> Result<Self, ConfigError> {
        let path = workspace_root.join(WORKSPACE_CONFIG_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|err| ConfigError::WorkspaceConfigRead {
            path: path.clone(),
            err: err.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|err| ConfigError::WorkspaceConfigDecode {
            path,
            err: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn workspace_config_is_loaded_from_the_repo_root() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(WORKSPACE_CONFIG_FILE),
            json!({
                "subscription_id": "sub",
                "resource_group": "ml-rg",
                "workspace_name": "ml-ws"
            })
            .to_string(),
        )
        .unwrap();

        let config = WorkspaceConfig::load(dir.path()).unwrap();
        assert_eq!(config.resource_group, "ml-rg");
        assert_eq!(config.workspace_name, "ml-ws");
    }

    #[test]
    fn missing_workspace_config_is_fatal() {
        let dir = tempdir().unwrap();
        let err = WorkspaceConfig::load(dir.path()).unwrap_err();
        assert_matches!(err, ConfigError::WorkspaceConfigRead { .. });
    }

    #[test]
    fn malformed_workspace_config_is_fatal() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(WORKSPACE_CONFIG_FILE), "{}").unwrap();
        let err = WorkspaceConfig::load(dir.path()).unwrap_err();
        assert_matches!(err, ConfigError::WorkspaceConfigDecode { .. });
    }
}
