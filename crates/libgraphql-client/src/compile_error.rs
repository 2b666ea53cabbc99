use thiserror::Error;

/// Errors produced while registering fragments or compiling a template into
/// a document.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CompileError {
    #[error(
        "Fragments at paths '{path}' and '{existing_path}' both flatten to \
        '{flat_name}'"
    )]
    FlatNameCollision {
        existing_path: String,
        flat_name: String,
        path: String,
    },

    #[error("Fragment cycle detected: {}", format_cycle_path(.cycle_path))]
    FragmentCycleDetected { cycle_path: Vec<String> },

    #[error("Fragment not found: '{path}'")]
    FragmentNotFound { path: String },

    #[error(
        "Fragment '{path}' must have the form `on <Type> {{...}}`, found: \
        `{body}`"
    )]
    MalformedFragment {
        body: String,
        path: String,
    },

    #[error("Operation template has no balanced selection set: `{template}`")]
    UnbalancedTemplate { template: String },
}

fn format_cycle_path(cycle: &[String]) -> String {
    cycle.join(" → ")
}
