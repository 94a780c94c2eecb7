use std::io::{Stdout, Write, stdout};

/// Emitter for workflow commands that are directives rather than log lines.
///
/// Masking is order-dependent, not retroactive: a secret must be registered
/// with [CommandEmitter::add_mask] before the first call that may log it.
pub trait CommandEmitter {
    /// Instructs the CI log redactor to hide `value` in all subsequent output.
    fn add_mask(&mut self, value: &str);
    /// Publishes a key/value output consumed by downstream pipeline steps.
    fn set_output(&mut self, name: &str, value: &str);
}

/// [CommandEmitter] writing workflow commands to the provided sink.
pub struct WorkflowCommands<W: Write> {
    out: W,
}

impl WorkflowCommands<Stdout> {
    pub fn stdout() -> Self {
        Self { out: stdout() }
    }
}

impl<W: Write> WorkflowCommands<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> CommandEmitter for WorkflowCommands<W> {
    fn add_mask(&mut self, value: &str) {
        // A failed write would leave the secret unmasked in subsequent logs,
        // so there is nothing useful to do with the error here.
        let _ = writeln!(self.out, "::add-mask::{}", escape_data(value));
    }

    fn set_output(&mut self, name: &str, value: &str) {
        let _ = writeln!(self.out, "::set-output name={}::{}", name, escape_data(value));
    }
}

/// Escapes the data portion of a workflow command so that multi-line or
/// percent-containing values survive the runner's line-oriented parser.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
