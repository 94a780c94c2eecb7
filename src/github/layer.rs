use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Event format rendering tracing events as CI workflow commands.
///
/// Error and warning events become `::error::` and `::warning::` annotations,
/// debug and trace events become `::debug::` lines (hidden by the runner
/// unless step debugging is enabled) and info events are printed verbatim.
pub struct WorkflowFormat;

impl<S, N> FormatEvent<S, N> for WorkflowFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        write!(writer, "{}", command_prefix(*event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn command_prefix(level: Level) -> &'static str {
    match level {
        Level::ERROR => "::error::",
        Level::WARN => "::warning::",
        Level::INFO => "",
        _ => "::debug::",
    }
}

/// Installs the global subscriber writing workflow-command formatted events
/// to standard output. Verbosity can be overridden through `RUST_LOG`;
/// the default keeps the action's own debug lines visible since the runner
/// is responsible for hiding `::debug::` output.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("model_deploy_action=debug,info"));
    tracing_subscriber::fmt()
        .event_format(WorkflowFormat)
        .with_env_filter(filter)
        .init();
}
