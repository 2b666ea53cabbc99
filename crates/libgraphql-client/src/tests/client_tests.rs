use crate::ClientError;
use crate::ClientOptions;
use crate::GraphQLClient;
use crate::HttpMethod;
use crate::RequestError;
use crate::SequenceAliasGenerator;
use crate::tests::utils::FETCH_COMMENTS;
use crate::tests::utils::FETCH_POST;
use crate::tests::utils::MockExecutor;
use crate::tests::utils::blog_comments;
use crate::tests::utils::blog_post;
use crate::tests::utils::blog_server;
use crate::tests::utils::fragments;
use crate::tests::utils::vars;
use serde_json::json;

const URL: &str = "http://localhost:3030/graphql";

fn blog_client(options: ClientOptions) -> GraphQLClient<MockExecutor> {
    GraphQLClient::new(Some(URL.to_string()), options, MockExecutor::new(blog_server))
        .with_alias_generator(SequenceAliasGenerator::new([1234, 4321]))
}

#[tokio::test]
async fn run_sends_the_compiled_document() {
    let client = blog_client(ClientOptions::default());
    let template = client.query(FETCH_POST);

    let data = client.run(&template, vars(json!({"id": 123}))).await.unwrap();
    assert_eq!(data, vars(json!({"post": blog_post(&json!(123))})));

    let requests = client.executor().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].url, URL);
    assert_eq!(
        requests[0].query,
        "query {\n  post(id: $id) {\n    id\n    title\n    text\n  }\n} ",
    );
    assert_eq!(requests[0].variables, vars(json!({"id": 123})));
    assert_eq!(requests[0].operation_name, None);
}

#[tokio::test]
async fn run_honours_the_configured_method() {
    let options = ClientOptions {
        method: HttpMethod::Get,
        ..ClientOptions::default()
    };
    let client = blog_client(options);
    let template = client.query(FETCH_COMMENTS);

    let data = client.run(&template, vars(json!({"postId": 123}))).await.unwrap();
    assert_eq!(data, vars(json!({"commentsOfPost": blog_comments()})));
    assert_eq!(client.executor().requests()[0].method, HttpMethod::Get);
}

#[tokio::test]
async fn run_strips_type_modifiers_from_variables() {
    let client = blog_client(ClientOptions::default());
    let template = client.query("query Post(@autodeclare) { post(id: $id) { id } }");

    client.run(&template, vars(json!({"id!Int": 5}))).await.unwrap();

    let request = &client.executor().requests()[0];
    assert_eq!(request.query, "query Post($id: Int!) { post(id: $id) { id } }");
    assert_eq!(request.variables, vars(json!({"id": 5})));
    assert_eq!(request.operation_name.as_deref(), Some("Post"));
}

#[tokio::test]
async fn merge_defers_the_request_until_commit() {
    let mut client = blog_client(ClientOptions::default());
    let fetch_post = client.query(FETCH_POST);
    let fetch_comments = client.query(FETCH_COMMENTS);

    let post = client.merge("page", &fetch_post, vars(json!({"id": 123}))).unwrap();
    let comments = client.merge("page", &fetch_comments, vars(json!({"postId": 123}))).unwrap();
    assert!(client.executor().requests().is_empty());
    assert_eq!(client.pending_len("page"), 2);

    let aggregate = client.commit("page").await.unwrap();
    assert_eq!(
        aggregate,
        vars(json!({
            "post": [blog_post(&json!(123))],
            "commentsOfPost": [blog_comments()],
        })),
    );
    assert_eq!(post.await.unwrap(), vars(json!({"post": blog_post(&json!(123))})));
    assert_eq!(comments.await.unwrap(), vars(json!({"commentsOfPost": blog_comments()})));

    let requests = client.executor().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].variables,
        vars(json!({"merge1234__id": 123, "merge4321__postId": 123})),
    );
    assert_eq!(client.pending_len("page"), 0);
}

#[tokio::test]
async fn commit_without_url_rejects_pending_entries() {
    let mut client = GraphQLClient::new(
        None,
        ClientOptions::default(),
        MockExecutor::new(blog_server),
    );
    let template = client.query(FETCH_POST);
    let pending = client.merge("page", &template, vars(json!({"id": 1}))).unwrap();

    assert_eq!(client.commit("page").await.unwrap_err(), ClientError::NoUrlConfigured);
    assert_eq!(pending.await.unwrap_err(), ClientError::NoUrlConfigured);
    assert_eq!(client.pending_len("page"), 0);
    assert!(client.executor().requests().is_empty());

    client.set_url(URL);
    assert_eq!(client.url(), Some(URL));
}

#[tokio::test]
async fn server_errors_reach_every_caller() {
    let mut client = GraphQLClient::new(
        Some(URL.to_string()),
        ClientOptions::default(),
        MockExecutor::new(|_| Err(RequestError::HttpStatus {
            body: "boom".to_string(),
            status: 500,
        })),
    );
    let template = client.query(FETCH_POST);
    let pending = client.merge("page", &template, vars(json!({"id": 1}))).unwrap();

    let err = client.commit("page").await.unwrap_err();
    assert!(matches!(err, ClientError::Request(RequestError::HttpStatus { status: 500, .. })));
    assert_eq!(pending.await.unwrap_err(), err);
}

#[tokio::test]
async fn headers_are_sent_with_every_request() {
    let mut client = blog_client(ClientOptions::default());
    client.headers([("Authorization", "Bearer abc")]);
    let template = client.query(FETCH_POST);

    client.run(&template, vars(json!({"id": 1}))).await.unwrap();

    let request = &client.executor().requests()[0];
    assert_eq!(request.headers.get("Authorization").map(String::as_str), Some("Bearer abc"));
}

#[test]
fn fragments_are_registered_per_client() {
    let mut client = blog_client(ClientOptions::default());
    client.fragment(&fragments(json!({
        "auth": {
            "error": "on Error {messages}",
        },
    }))).unwrap();

    assert_eq!(
        client.fragment_definition("auth.error").unwrap(),
        "fragment auth_error on Error {messages}",
    );
    assert_eq!(
        client.fragments().get("auth_error").map(String::as_str),
        Some("\nfragment auth_error on Error {messages}"),
    );

    let other = blog_client(ClientOptions::default());
    assert!(other.fragments().is_empty());
}

#[test]
fn build_query_compiles_without_sending() {
    let mut client = blog_client(ClientOptions::default());
    client.fragment(&fragments(json!({"post": {"body": "on Post {text}"}}))).unwrap();

    let document = client.build_query(
        "query (@autodeclare) { post(id: $id) { ...post.body } }",
        &vars(json!({"id": 9})),
    ).unwrap();
    assert_eq!(
        document,
        "query ($id: ID!) { post(id: $id) { ... post_body } }\n\nfragment post_body on Post {text}",
    );
    assert!(client.executor().requests().is_empty());
}

#[test]
fn options_deserialize_from_camel_case() {
    let options: ClientOptions = serde_json::from_value(json!({
        "alwaysAutodeclare": true,
        "method": "GET",
        "headers": {"X-Trace": "1"},
    })).unwrap();

    assert!(options.always_autodeclare);
    assert_eq!(options.method, HttpMethod::Get);
    assert_eq!(options.headers.get("X-Trace").map(String::as_str), Some("1"));
    assert_eq!(blog_client(options.clone()).options(), &options);
}

#[tokio::test]
async fn merge_compiles_against_the_client_fragments() {
    let options = ClientOptions {
        always_autodeclare: true,
        ..ClientOptions::default()
    };
    let mut client = blog_client(options);
    client.fragment(&fragments(json!({"post": {"summary": "on Post {title}"}}))).unwrap();
    let template = client.query("{ post(id: $id) { ...post.summary } }");

    let pending = client.merge("page", &template, vars(json!({"id": 7}))).unwrap();
    client.commit("page").await.unwrap();

    assert_eq!(
        client.executor().requests()[0].query,
        "query ($merge1234__id: ID!) {\n\
merge1234_post:post(id: $merge1234__id) { ... post_summary } \n }\n\
\nfragment post_summary on Post {title}",
    );
    assert_eq!(pending.await.unwrap(), vars(json!({"post": blog_post(&json!(7))})));
}
