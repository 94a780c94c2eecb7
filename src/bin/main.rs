use model_deploy_action::action::{self, ActionError};
use model_deploy_action::cli::{Cli, CliCommand, print_inputs};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    match _main() {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            err.to_exit_code()
        }
    }
}

fn _main() -> Result<ExitCode, ActionError> {
    match Cli::init()? {
        CliCommand::PrintInputs(inputs) => {
            print_inputs(&inputs);
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Run(inputs) => {
            action::run(&inputs)?;
            info!("Deployment run finished");
            Ok(ExitCode::SUCCESS)
        }
    }
}
