use crate::GraphQLRequest;
use crate::GraphQLResponse;
use crate::HttpMethod;
use crate::RequestError;
use crate::RequestExecutor;
use std::time::Duration;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PostBody<'req> {
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_name: Option<&'req str>,
    query: &'req str,
    variables: &'req crate::Variables,
}

/// A [`RequestExecutor`] that talks HTTP through [`reqwest`].
///
/// `GET` requests carry `query`, `variables` (JSON-encoded) and
/// `operationName` as URL parameters. `POST` requests send them as a JSON
/// body, or as a form-encoded body when built with
/// [`form_encoded()`](Self::form_encoded).
#[derive(Clone, Debug)]
pub struct ReqwestExecutor {
    as_json: bool,
    http_client: reqwest::Client,
}
impl ReqwestExecutor {
    /// Send `POST` bodies as `application/x-www-form-urlencoded` instead of
    /// JSON.
    pub fn form_encoded(mut self) -> Self {
        self.as_json = false;
        self
    }

    /// An executor with its own HTTP client, configured with a 5s TCP
    /// keepalive.
    ///
    /// Fails with [`RequestError::Transport`] if the HTTP client cannot be
    /// built (e.g. no TLS backend could be initialized).
    pub fn new() -> Result<Self, RequestError> {
        let http_client =
            reqwest::Client::builder()
                .tcp_keepalive(Some(Duration::from_secs(5)))
                .build()
                .map_err(|err| RequestError::Transport(format!(
                    "Failed to build HTTP client: {err}",
                )))?;
        Ok(Self::with_client(http_client))
    }

    /// Whether `POST` bodies are sent form-encoded rather than as JSON.
    pub fn is_form_encoded(&self) -> bool {
        !self.as_json
    }

    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self {
            as_json: true,
            http_client,
        }
    }
}

impl RequestExecutor for ReqwestExecutor {
    async fn execute(
        &self,
        request: GraphQLRequest,
    ) -> Result<serde_json::Map<String, serde_json::Value>, RequestError> {
        log::debug!("Making {} request to {}", request.method, request.url);

        let variables = serde_json::to_string(&request.variables)
            .map_err(|err| RequestError::Decode(err.to_string()))?;
        let mut params = vec![
            ("query", request.query.as_str()),
            ("variables", variables.as_str()),
        ];
        if let Some(operation_name) = request.operation_name.as_deref() {
            params.push(("operationName", operation_name));
        }

        let mut builder = match request.method {
            HttpMethod::Get => self.http_client.get(&request.url).query(&params),
            HttpMethod::Post if self.as_json => self.http_client.post(&request.url).json(&PostBody {
                operation_name: request.operation_name.as_deref(),
                query: request.query.as_str(),
                variables: &request.variables,
            }),
            HttpMethod::Post => self.http_client.post(&request.url).form(&params),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send()
            .await
            .map_err(|err| RequestError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response.bytes()
            .await
            .map_err(|err| RequestError::Transport(err.to_string()))?;
        log::trace!("Response from {}: HTTP {status}", request.url);

        if !status.is_success() {
            return Err(RequestError::HttpStatus {
                body: String::from_utf8_lossy(&body).into_owned(),
                status: status.as_u16(),
            });
        }

        serde_json::from_slice::<GraphQLResponse>(&body)
            .map_err(|err| RequestError::Decode(err.to_string()))?
            .into_data()
    }
}
