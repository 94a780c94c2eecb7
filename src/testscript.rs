//! Smoke-test extension point.
//!
//! Users extend the action with an executable checked into their
//! repository. The contract is process-level: the executable is invoked
//! with the configured function name as its single argument and reads
//! the live endpoint from the environment.

use crate::config::defaults::{DEFAULT_TEST_FILE, DEFAULT_TEST_FUNCTION};
use crate::config::parameters::DeployParameters;
use crate::platform::types::Service;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Environment variable carrying the scoring endpoint URL.
pub const SCORING_URI_ENV_VAR: &str = "SERVICE_SCORING_URI";
/// Environment variable carrying the service authentication key.
pub const SERVICE_KEY_ENV_VAR: &str = "SERVICE_KEY";

#[derive(Error, Debug)]
pub enum TestScriptError {
    /// The configured script is absent from the checkout. A harness
    /// misconfiguration, not a failure of the deployed service.
    #[error("test script not found at {0}")]
    ScriptNotFound(PathBuf),

    #[error("test script {path} could not be started: {err}")]
    Launch { path: PathBuf, err: String },

    /// The script ran and its assertions failed.
    #[error("test script exited with {status}")]
    Failed { status: String },
}

/// One run of the user-provided smoke test against a live service.
pub struct SmokeTest {
    script: PathBuf,
    function: String,
}

impl SmokeTest {
    /// Resolves the script location from the deployment parameters,
    /// relative to the repository checkout root.
    pub fn from_parameters(parameters: &DeployParameters, workspace_root: &Path) -> Self {
        let script = parameters
            .test_file_path
            .as_deref()
            .unwrap_or(DEFAULT_TEST_FILE);
        let function = parameters
            .test_file_function_name
            .clone()
            .unwrap_or_else(|| DEFAULT_TEST_FUNCTION.to_string());
        Self {
            script: workspace_root.join(script),
            function,
        }
    }

    /// Runs the script against the service endpoint and waits for it to
    /// finish. Endpoint details travel through the environment so the
    /// script never has to parse arguments beyond the function name.
    pub fn run(&self, service: &Service) -> Result<(), TestScriptError> {
        if !self.script.is_file() {
            return Err(TestScriptError::ScriptNotFound(self.script.clone()));
        }
        debug!(
            "running test script {} function {}",
            self.script.display(),
            self.function
        );

        let scoring_uri = service
            .scoring_uri
            .as_ref()
            .map(Url::as_str)
            .unwrap_or_default();
        let status = Command::new(&self.script)
            .arg(&self.function)
            .env(SCORING_URI_ENV_VAR, scoring_uri)
            .env(
                SERVICE_KEY_ENV_VAR,
                service.primary_key.as_deref().unwrap_or_default(),
            )
            .status()
            .map_err(|err| TestScriptError::Launch {
                path: self.script.clone(),
                err: err.to_string(),
            })?;

        if !status.success() {
            return Err(TestScriptError::Failed {
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::types::ServiceState;
    use assert_matches::assert_matches;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn service() -> Service {
        Service {
            name: "my-service".to_string(),
            state: ServiceState::Healthy,
            scoring_uri: Some(Url::parse("https://scoring.example/score").unwrap()),
            swagger_uri: None,
            primary_key: Some("key".to_string()),
        }
    }

    fn write_script(dir: &TempDir, relative: &str, body: &str) {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn parameters(script: &str) -> DeployParameters {
        DeployParameters {
            test_file_path: Some(script.to_string()),
            test_file_function_name: Some("check".to_string()),
            ..DeployParameters::default()
        }
    }

    #[test]
    fn passing_script_receives_endpoint_and_function_name() {
        let dir = TempDir::new().unwrap();
        write_script(
            &dir,
            "smoke.sh",
            "#!/bin/sh\n\
             [ \"$1\" = check ] || exit 1\n\
             [ \"$SERVICE_SCORING_URI\" = https://scoring.example/score ] || exit 1\n\
             [ \"$SERVICE_KEY\" = key ] || exit 1\n",
        );

        let test = SmokeTest::from_parameters(&parameters("smoke.sh"), dir.path());
        test.run(&service()).unwrap();
    }

    #[test]
    fn failing_script_reports_its_exit_status() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "smoke.sh", "#!/bin/sh\nexit 3\n");

        let test = SmokeTest::from_parameters(&parameters("smoke.sh"), dir.path());
        let err = test.run(&service()).unwrap_err();
        assert_matches!(err, TestScriptError::Failed { status } => {
            assert!(status.contains('3'));
        });
    }

    #[test]
    fn missing_script_is_reported_with_its_resolved_path() {
        let dir = TempDir::new().unwrap();
        let test = SmokeTest::from_parameters(&parameters("absent.sh"), dir.path());
        let err = test.run(&service()).unwrap_err();
        assert_matches!(err, TestScriptError::ScriptNotFound(path) => {
            assert_eq!(path, dir.path().join("absent.sh"));
        });
    }

    #[test]
    fn script_location_defaults_to_the_conventional_path() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "code/test/test", "#!/bin/sh\n[ \"$1\" = main ]\n");

        let test = SmokeTest::from_parameters(&DeployParameters::default(), dir.path());
        test.run(&service()).unwrap();
    }
}
