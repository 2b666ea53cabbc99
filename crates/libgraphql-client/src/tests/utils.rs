//! Shared fixtures: a recording executor standing in for a GraphQL server,
//! and helpers for building variables and fragment trees from JSON.

use crate::FragmentTree;
use crate::GraphQLRequest;
use crate::RequestError;
use crate::RequestExecutor;
use crate::Variables;
use serde_json::Value;
use serde_json::json;
use std::sync::Arc;
use std::sync::Mutex;

pub type Data = serde_json::Map<String, Value>;

type Responder = Box<dyn Fn(&GraphQLRequest) -> Result<Data, RequestError> + Send + Sync>;

/// Records every request and answers it with a canned responder.
pub struct MockExecutor {
    requests: Arc<Mutex<Vec<GraphQLRequest>>>,
    responder: Responder,
}
impl MockExecutor {
    pub fn new(
        responder: impl Fn(&GraphQLRequest) -> Result<Data, RequestError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            requests: Arc::new(Mutex::new(vec![])),
            responder: Box::new(responder),
        }
    }

    pub fn requests(&self) -> Vec<GraphQLRequest> {
        self.requests.lock().unwrap().clone()
    }
}
impl RequestExecutor for MockExecutor {
    async fn execute(&self, request: GraphQLRequest) -> Result<Data, RequestError> {
        let outcome = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        outcome
    }
}

pub fn blog_post(id: &Value) -> Value {
    json!({"id": id, "title": "hi", "text": "hello"})
}

pub fn blog_comments() -> Value {
    json!([{"comment": "hi", "owner": {"name": "bob"}}])
}

/// Answers like a small blog server: merged requests get the aliased fields
/// they ask for, plain requests are routed by the variables they reference.
pub fn blog_server(request: &GraphQLRequest) -> Result<Data, RequestError> {
    let query = request.query.as_str();
    let variables = &request.variables;
    let mut data = Data::new();
    if query.contains("merge") {
        if query.contains("merge1234_post") {
            data.insert("merge1234_post".to_string(), blog_post(&variables["merge1234__id"]));
        }
        if query.contains("merge4321_commentsOfPost") {
            data.insert("merge4321_commentsOfPost".to_string(), blog_comments());
        }
    } else if query.contains("$id") {
        data.insert("post".to_string(), blog_post(&variables["id"]));
    } else if query.contains("$postId") {
        data.insert("commentsOfPost".to_string(), blog_comments());
    }
    Ok(data)
}

pub fn fragments(value: Value) -> FragmentTree {
    serde_json::from_value(value).unwrap()
}

pub fn vars(value: Value) -> Variables {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, found `{other}`"),
    }
}

pub const FETCH_POST: &str = "{
  post(id: $id) {
    id
    title
    text
  }
}";

pub const FETCH_COMMENTS: &str = "{
  commentsOfPost: comments(postId: $postId) {
    comment
    owner {
      name
    }
  }
}";
