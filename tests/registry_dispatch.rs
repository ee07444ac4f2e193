//! Identifier resolution and JSON-argument invocation.

mod common;

use common::{capabilities, FOX};
use mockito::{Matcher, Server};
use multi_capabilities::Error;
use serde_json::json;

#[tokio::test]
async fn test_resolved_summarize_by_identifier() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/summarize")
        .match_body(Matcher::Json(json!({ "document": FOX })))
        .with_status(200)
        .with_body(r#"{"summary": "A fox."}"#)
        .expect(1)
        .create_async()
        .await;

    let caps = capabilities(&server.url());
    let resolution = caps.resolve("multi/summarize");
    assert!(resolution.is_found());

    let result = resolution
        .into_capability()
        .call_async(&json!({ "document": FOX }), None)
        .await
        .unwrap();

    assert_eq!(result["summary"], "A fox.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unknown_identifier_fails_only_on_invocation() {
    let server = Server::new_async().await;
    let caps = capabilities(&server.url());

    let capability = caps.resolve("multi/translate").into_capability();
    assert!(!capability.is_bound());

    match capability.call_async(&json!({"text": "hola"}), None).await {
        Err(Error::UnboundCapability { uri, valid }) => {
            assert_eq!(uri, "multi/translate");
            assert_eq!(valid.len(), 6);
            assert!(valid.contains(&"multi/web_content".to_string()));
        }
        other => panic!("expected UnboundCapability, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_argument_sends_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/documentqa")
        .expect(0)
        .create_async()
        .await;

    let caps = capabilities(&server.url());
    let capability = caps.resolve("multi/document_qa").into_capability();
    let err = capability
        .call_async(&json!({ "document": FOX }), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert_eq!(
        err.context().and_then(|c| c.field_path.as_deref()),
        Some("args.query")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_resolved_sql_takes_optional_dialect() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/sql")
        .match_body(Matcher::Json(json!({
            "query": "q",
            "sql_schema": "s",
            "sql_type": "vanilla"
        })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let caps = capabilities(&server.url());
    let sql = caps.resolve("multi/sql").into_result().unwrap();
    sql.call_async(&json!({"query": "q", "sql_schema": "s"}), None)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[test]
fn test_blocking_call_by_identifier() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/search")
        .match_body(Matcher::Json(json!({"query": "fox"})))
        .with_status(200)
        .with_body(r#"{"results": ["fox"]}"#)
        .create();

    let caps = capabilities(&server.url());
    let result = caps
        .resolve("multi/search")
        .into_capability()
        .call(&json!({"query": "fox"}))
        .unwrap();

    assert_eq!(result["results"][0], "fox");
    mock.assert();
}
