use crate::cli::Command;
use std::env;

/// Execution contexts that influence how logging is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// An operator running the tool from a terminal.
    Interactive,
    /// CI pipelines and scripted deployments; the console stays quiet unless configured.
    Automation,
}

impl ExecutionContext {
    /// Returns `true` when console sinks should be disabled by default.
    pub fn disables_console(self) -> bool {
        matches!(self, ExecutionContext::Automation)
    }
}

/// Derive the active execution context from a parsed CLI command plus environment overrides.
pub fn detect_context(command: &Command) -> ExecutionContext {
    match command {
        Command::Migrate(_) => context_from_env(|key| env::var(key).ok()),
    }
}

pub(crate) fn context_from_env<F>(lookup: F) -> ExecutionContext
where
    F: Fn(&str) -> Option<String>,
{
    let enabled = |key: &str| {
        lookup(key)
            .map(|value| {
                let value = value.trim();
                !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
            })
            .unwrap_or(false)
    };
    if enabled("TWIN_MIGRATE_AUTOMATION") || enabled("CI") {
        ExecutionContext::Automation
    } else {
        ExecutionContext::Interactive
    }
}
