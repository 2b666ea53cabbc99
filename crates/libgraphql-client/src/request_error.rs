use crate::GraphQLError;
use thiserror::Error;

/// A failed network exchange, as reported by a
/// [`RequestExecutor`](crate::RequestExecutor).
///
/// Every variant owns plain data so that one failure can be cloned out to
/// every caller waiting on a merged commit.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("Failed to decode GraphQL response: {0}")]
    Decode(String),

    #[error("GraphQL server returned errors: {}", format_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    #[error("GraphQL server responded with HTTP {status}: {body}")]
    HttpStatus {
        body: String,
        status: u16,
    },

    #[error("Transport failure: {0}")]
    Transport(String),
}

fn format_errors(errors: &[GraphQLError]) -> String {
    errors.iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
