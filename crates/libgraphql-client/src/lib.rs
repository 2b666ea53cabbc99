//! A GraphQL query compiler and request batcher for building GraphQL clients.
//!
//! Hand-written operation bodies are compiled into complete documents:
//! namespaced fragment spreads (`...auth.user`) are resolved against a
//! [`FragmentRegistry`] and the required fragment definitions are appended,
//! and `(@autodeclare)` signatures are filled in from the runtime variables.
//!
//! Independent operations can be [merged](GraphQLClient::merge) under a shared
//! batch key and [committed](GraphQLClient::commit) as a single request. Each
//! merged caller receives its own slice of the combined response.
//!
//! ```no_run
//! use libgraphql_client::ClientOptions;
//! use libgraphql_client::GraphQLClient;
//! use libgraphql_client::ReqwestExecutor;
//! use libgraphql_client::Variables;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), libgraphql_client::ClientError> {
//! let mut client = GraphQLClient::new(
//!     Some("https://example.com/graphql".to_string()),
//!     ClientOptions::default(),
//!     ReqwestExecutor::new()?,
//! );
//!
//! let fetch_post = client.query("{ post(id: $id) { title } }");
//! let mut variables = Variables::new();
//! variables.insert("id".to_string(), json!(1));
//! let post = client.merge("page", &fetch_post, variables)?;
//! let aggregate = client.commit("page").await?;
//! println!("{aggregate:?} {:?}", post.await?);
//! # Ok(())
//! # }
//! ```

mod alias_generator;
mod batch_merger;
mod client;
mod client_error;
mod client_options;
mod compile_error;
mod fragment_registry;
mod operation_kind;
mod query_compiler;
mod query_template;
mod request_error;
mod request_executor;
#[cfg(feature = "http")]
mod reqwest_executor;
mod template_lexer;
mod variable_declaration;
mod variable_inference;

pub use alias_generator::AliasGenerator;
pub use alias_generator::RandomAliasGenerator;
pub use alias_generator::SequenceAliasGenerator;
pub use batch_merger::BatchMerger;
pub use batch_merger::MergeEntry;
pub use batch_merger::PendingResult;
pub use batch_merger::PreparedCommit;
pub use client::GraphQLClient;
pub use client_error::ClientError;
pub use client_options::ClientOptions;
pub use client_options::HttpMethod;
pub use compile_error::CompileError;
pub use fragment_registry::FragmentDefinition;
pub use fragment_registry::FragmentRegistry;
pub use fragment_registry::FragmentTree;
pub use fragment_registry::ResolvedSpreads;
pub use operation_kind::OperationKind;
pub use query_compiler::CompiledQuery;
pub use query_compiler::QueryCompiler;
pub use query_template::QueryTemplate;
pub use request_error::RequestError;
pub use request_executor::GraphQLError;
pub use request_executor::GraphQLRequest;
pub use request_executor::GraphQLResponse;
pub use request_executor::RequestExecutor;
#[cfg(feature = "http")]
pub use reqwest_executor::ReqwestExecutor;
pub use variable_declaration::VariableDeclaration;
pub use variable_inference::VariableSpec;
pub use variable_inference::infer_declarations;
pub use variable_inference::strip_modifiers;

/// Runtime variable values keyed by (possibly modifier-suffixed) name.
pub type Variables = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests;
