use crate::CompileError;
use crate::RequestError;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClientError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Nothing to commit for batch key '{batch_key}'")]
    EmptyCommit { batch_key: String },

    #[error(
        "Variable '${variable_name}' is referenced by merged entry '{alias}' \
        but no value was supplied"
    )]
    MissingVariable {
        alias: String,
        variable_name: String,
    },

    #[error("No URL configured for this client")]
    NoUrlConfigured,

    #[error("The batch holding this pending result was dropped before commit")]
    PendingResultDropped,

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(
        "Merged entry '{alias}' of batch '{batch_key}' uses a fragment at the \
        top level of its selection set; only fields can be merged"
    )]
    TopLevelFragment {
        alias: String,
        batch_key: String,
    },
}
