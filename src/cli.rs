//! Command line surface of the action binary. The real configuration comes
//! from the CI-injected environment; the CLI only offers debug switches.

use crate::config::ConfigError;
use crate::config::defaults::ACTION_VERSION;
use crate::config::inputs::ActionInputs;
use crate::github;
use clap::Parser;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    version = ACTION_VERSION,
    about = "Deploys a registered ML model as a hosted web service"
)]
pub struct Cli {
    /// Print the resolved action inputs (secrets redacted) and exit.
    #[arg(long)]
    print_inputs: bool,
}

/// What the binary should do after startup.
pub enum CliCommand {
    Run(ActionInputs),
    PrintInputs(ActionInputs),
}

impl Cli {
    /// Parses arguments, installs the workflow-command log format and reads
    /// the action inputs from the environment.
    pub fn init() -> Result<CliCommand, ConfigError> {
        let cli = Cli::parse();
        github::layer::init();
        info!("ML model deploy action version {ACTION_VERSION}");

        let inputs = ActionInputs::from_env()?;
        if cli.print_inputs {
            Ok(CliCommand::PrintInputs(inputs))
        } else {
            Ok(CliCommand::Run(inputs))
        }
    }
}

/// Debug view of the resolved inputs with every secret-bearing field blanked.
pub fn print_inputs(inputs: &ActionInputs) {
    let redacted = ActionInputs {
        credentials_json: "[REDACTED]".to_string(),
        registry_password: inputs.registry_password.as_ref().map(|_| "[REDACTED]".to_string()),
        primary_key: inputs.primary_key.as_ref().map(|_| "[REDACTED]".to_string()),
        secondary_key: inputs.secondary_key.as_ref().map(|_| "[REDACTED]".to_string()),
        ..inputs.clone()
    };
    println!("{redacted:#?}");
}
