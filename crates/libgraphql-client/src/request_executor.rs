use crate::HttpMethod;
use crate::RequestError;
use crate::Variables;
use indexmap::IndexMap;
use std::future::Future;

/// Everything needed to perform one GraphQL exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphQLRequest {
    pub headers: IndexMap<String, String>,
    pub method: HttpMethod,
    pub operation_name: Option<String>,
    /// The compiled document.
    pub query: String,
    pub url: String,
    pub variables: Variables,
}

/// One entry of a GraphQL response's `errors` list.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct GraphQLError {
    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Map<String, serde_json::Value>>,
}

/// The body of a GraphQL response.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct GraphQLResponse {
    #[serde(default)]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}
impl GraphQLResponse {
    /// The `data` object, or [`RequestError::GraphQL`] if the server reported
    /// any errors. A response with neither yields an empty object.
    pub fn into_data(self) -> Result<serde_json::Map<String, serde_json::Value>, RequestError> {
        if !self.errors.is_empty() {
            return Err(RequestError::GraphQL(self.errors));
        }
        Ok(self.data.unwrap_or_default())
    }
}

/// Performs exactly one network exchange per request.
///
/// Implementations own transport concerns entirely: encoding, headers,
/// timeouts and cancellation. Nothing calling an executor retries.
pub trait RequestExecutor {
    fn execute(
        &self,
        request: GraphQLRequest,
    ) -> impl Future<Output = Result<serde_json::Map<String, serde_json::Value>, RequestError>> + Send;
}
