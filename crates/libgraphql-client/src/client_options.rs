use indexmap::IndexMap;
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `query` and `variables` are sent as URL parameters.
    Get,
    /// `query` and `variables` are sent in the request body.
    #[default]
    Post,
}
impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}
impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(format!("Unsupported HTTP method: `{other}`")),
        }
    }
}

/// Per-client request settings.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientOptions {
    /// Treat templates without a signature as `(@autodeclare)`.
    pub always_autodeclare: bool,
    /// Headers sent with every request.
    pub headers: IndexMap<String, String>,
    pub method: HttpMethod,
}
