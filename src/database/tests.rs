use super::memory::MemoryDatabase;
use super::store::Store;
use super::*;
use httpmock::prelude::*;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Player {
    name: String,
    score: i64,
}

fn create_db(server: &MockServer) -> FirebaseDatabase {
    let client = ClientBuilder::new(Client::new()).build();
    FirebaseDatabase::new_with_client(client, &server.url("")).unwrap()
}

#[test]
fn test_node_url() {
    let client = ClientBuilder::new(Client::new()).build();
    let db = FirebaseDatabase::new_with_client(client, "https://demo.firebaseio.com/").unwrap();

    let root = db.node_url(&db.root().path).unwrap();
    assert_eq!(root.as_str(), "https://demo.firebaseio.com/.json");

    let child = db.reference("/users//alice/").child("Email");
    assert_eq!(child.path(), "/users/alice/Email");
    assert_eq!(
        db.node_url(&child.path).unwrap().as_str(),
        "https://demo.firebaseio.com/users/alice/Email.json"
    );

    let db = db.with_namespace("demo-ns");
    assert_eq!(
        db.node_url(&db.reference("users").path).unwrap().as_str(),
        "https://demo.firebaseio.com/users.json?ns=demo-ns"
    );
}

#[test]
fn test_reference_navigation() {
    let client = ClientBuilder::new(Client::new()).build();
    let db = FirebaseDatabase::new_with_client(client, "https://demo.firebaseio.com").unwrap();

    let email = db.root().child("users").child("alice/Email");
    assert_eq!(email.key(), Some("Email"));
    assert_eq!(email.parent().unwrap().path(), "/users/alice");
    assert!(db.root().parent().is_none());
    assert_eq!(db.root().key(), None);
}

#[test]
fn test_invalid_database_url() {
    let client = ClientBuilder::new(Client::new()).build();
    let result = FirebaseDatabase::new_with_client(client, "not a url");
    assert!(matches!(result, Err(DatabaseError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_get_value() {
    let server = MockServer::start();
    let db = create_db(&server);

    let mock = server.mock(|when, then| {
        when.method(GET).path("/players/p1.json");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "name": "Ada", "score": 42 }));
    });

    let snapshot = db.reference("players/p1").get().await.unwrap();
    assert!(snapshot.exists());
    assert_eq!(snapshot.key(), Some("p1"));
    assert_eq!(snapshot.child("score").value(), &json!(42));

    let player: Player = snapshot.get().unwrap().unwrap();
    assert_eq!(
        player,
        Player {
            name: "Ada".to_string(),
            score: 42
        }
    );

    mock.assert();
}

#[tokio::test]
async fn test_get_missing_value() {
    let server = MockServer::start();
    let db = create_db(&server);

    let mock = server.mock(|when, then| {
        when.method(GET).path("/players/nobody.json");
        then.status(200)
            .header("content-type", "application/json")
            .body("null");
    });

    let snapshot = db.reference("players/nobody").get().await.unwrap();
    assert!(!snapshot.exists());
    assert_eq!(snapshot.get::<Player>().unwrap(), None);

    mock.assert();
}

#[tokio::test]
async fn test_set_value() {
    let server = MockServer::start();
    let db = create_db(&server);

    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/players/p1.json")
            .header("content-type", "application/json")
            .json_body(json!({ "name": "Ada", "score": 7 }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "name": "Ada", "score": 7 }));
    });

    let player = Player {
        name: "Ada".to_string(),
        score: 7,
    };
    db.reference("players").child("p1").set(&player).await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_set_raw_json() {
    let server = MockServer::start();
    let db = create_db(&server);

    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/players/p2.json")
            .json_body(json!({ "name": "Grace", "score": 1 }));
        then.status(200).json_body(json!({ "name": "Grace", "score": 1 }));
    });

    db.reference("players/p2")
        .set_raw_json(r#"{"name":"Grace","score":1}"#)
        .await
        .unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_set_raw_json_rejects_malformed_document() {
    // Nothing listens here; the document must be rejected before any request.
    let db = FirebaseDatabase::unauthenticated("http://127.0.0.1:9").unwrap();

    let result = db.reference("players/p2").set_raw_json("{\"name\":").await;
    assert!(matches!(result, Err(DatabaseError::SerializationError(_))));
}

#[tokio::test]
async fn test_update_children() {
    let server = MockServer::start();
    let db = create_db(&server);

    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/players.json")
            .json_body(json!({ "p1/score": 8, "p2/score": 2 }));
        then.status(200).json_body(json!({ "p1/score": 8, "p2/score": 2 }));
    });

    db.reference("players")
        .update(&json!({ "p1/score": 8, "p2/score": 2 }))
        .await
        .unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_update_requires_object() {
    let db = FirebaseDatabase::unauthenticated("http://127.0.0.1:9").unwrap();

    let result = db.reference("players").update(&json!([1, 2, 3])).await;
    assert!(matches!(result, Err(DatabaseError::SerializationError(_))));

    let result = db.reference("players").update(&json!({ "p1.score": 1 })).await;
    assert!(matches!(result, Err(DatabaseError::InvalidPath(_))));
}

#[tokio::test]
async fn test_push_value() {
    let server = MockServer::start();
    let db = create_db(&server);

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/scores.json")
            .json_body(json!({ "name": "Ada", "score": 3 }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "name": "-NxAbc123" }));
    });

    let pushed = db
        .reference("scores")
        .push(&Player {
            name: "Ada".to_string(),
            score: 3,
        })
        .await
        .unwrap();
    assert_eq!(pushed.key(), Some("-NxAbc123"));
    assert_eq!(pushed.path(), "/scores/-NxAbc123");

    mock.assert();
}

#[tokio::test]
async fn test_remove_value() {
    let server = MockServer::start();
    let db = create_db(&server);

    let mock = server.mock(|when, then| {
        when.method(DELETE).path("/players/p1.json");
        then.status(200).body("null");
    });

    db.reference("players/p1").remove().await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_api_error_message() {
    let server = MockServer::start();
    let db = create_db(&server);

    let mock = server.mock(|when, then| {
        when.method(GET).path("/secret.json");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({ "error": "Permission denied" }));
    });

    match db.reference("secret").get().await {
        Err(DatabaseError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Permission denied");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }

    mock.assert();
}

#[tokio::test]
async fn test_api_error_without_json_body() {
    let server = MockServer::start();
    let db = create_db(&server);

    let mock = server.mock(|when, then| {
        when.method(DELETE).path("/players/p1.json");
        then.status(404).body("Not Found");
    });

    match db.reference("players/p1").remove().await {
        Err(DatabaseError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.starts_with("Remove value failed"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }

    mock.assert();
}

#[tokio::test]
async fn test_server_errors_are_not_retried() {
    let server = MockServer::start();
    let db = FirebaseDatabase::unauthenticated(&server.url("")).unwrap();

    let get = server.mock(|when, then| {
        when.method(GET).path("/users/u1/Username.json");
        then.status(503)
            .header("content-type", "application/json")
            .json_body(json!({ "error": "Service Unavailable" }));
    });
    let post = server.mock(|when, then| {
        when.method(POST).path("/scores.json");
        then.status(500).body("Internal Server Error");
    });

    let result = db.reference("users/u1/Username").get().await;
    assert!(matches!(result, Err(DatabaseError::Api { status: 503, .. })));

    let result = db.reference("scores").push(&json!({ "score": 1 })).await;
    assert!(matches!(result, Err(DatabaseError::Api { status: 500, .. })));

    // `assert` checks for exactly one matching request.
    get.assert();
    post.assert();
}

#[tokio::test]
async fn test_invalid_key_never_sends_request() {
    let db = FirebaseDatabase::unauthenticated("http://127.0.0.1:9").unwrap();

    for bad in ["users/a.b", "users/#1", "users/$me", "users/[0]"] {
        let result = db.reference(bad).get().await;
        assert!(matches!(result, Err(DatabaseError::InvalidPath(_))), "{}", bad);
    }
}

#[tokio::test]
async fn test_secret_and_namespace_query_params() {
    let server = MockServer::start();
    let db = FirebaseDatabase::with_secret(&server.url(""), "s3cr3t")
        .unwrap()
        .with_namespace("demo-ns");

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/players/p1/name.json")
            .query_param("auth", "s3cr3t")
            .query_param("ns", "demo-ns");
        then.status(200).json_body(json!("Ada"));
    });

    let snapshot = db.reference("players/p1/name").get().await.unwrap();
    assert_eq!(snapshot.value(), &json!("Ada"));

    mock.assert();
}

#[tokio::test]
async fn test_store_impl_for_firebase_database() {
    let server = MockServer::start();
    let db = create_db(&server);

    let put = server.mock(|when, then| {
        when.method(PUT)
            .path("/users/u1/Email.json")
            .json_body(json!("u1@example.com"));
        then.status(200).json_body(json!("u1@example.com"));
    });
    let get = server.mock(|when, then| {
        when.method(GET).path("/users.json");
        then.status(200)
            .json_body(json!({ "u1": { "Username": "u1", "Email": "u1@example.com" } }));
    });

    db.set_value("users/u1/Email", json!("u1@example.com"))
        .await
        .unwrap();
    let snapshot = db.get_value("users").await.unwrap();
    assert_eq!(snapshot.child("u1/Username").value(), &json!("u1"));

    put.assert();
    get.assert();
}

#[test]
fn test_snapshot_navigation() {
    let snapshot = snapshot::DataSnapshot::new(
        Some("users".to_string()),
        json!({
            "alice": { "Username": "alice", "Email": "alice@example.com" },
            "list": ["zero", null, "two"]
        }),
    );

    assert_eq!(snapshot.children_count(), 2);
    assert!(snapshot.has_child("alice/Email"));
    assert!(!snapshot.has_child("alice/Phone"));
    assert!(!snapshot.has_child("alice/Email/deeper"));
    assert_eq!(snapshot.child("list/2").value(), &json!("two"));
    assert_eq!(snapshot.child("list").children_count(), 2);

    let missing = snapshot.child("bob/Username");
    assert_eq!(missing.key(), Some("Username"));
    assert!(!missing.exists());
}

#[tokio::test]
async fn test_memory_set_and_get() {
    let db = MemoryDatabase::new();

    db.set_value("users/alice", json!({ "Username": "alice", "Email": null }))
        .await
        .unwrap();

    let snapshot = db.get_value("users/alice").await.unwrap();
    assert_eq!(snapshot.key(), Some("alice"));
    assert_eq!(snapshot.value(), &json!({ "Username": "alice" }));
    assert!(!db.get_value("users/bob").await.unwrap().exists());
}

#[tokio::test]
async fn test_memory_remove_prunes_empty_parents() {
    let db = MemoryDatabase::with_contents(json!({
        "users": { "alice": { "Username": "alice" } },
        "other": 1
    }));

    db.remove_value("users/alice/Username").await.unwrap();

    assert!(!db.get_value("users/alice").await.unwrap().exists());
    assert!(!db.get_value("users").await.unwrap().exists());
    assert_eq!(db.contents().await, json!({ "other": 1 }));
}

#[tokio::test]
async fn test_memory_writes_through_leaves() {
    let db = MemoryDatabase::with_contents(json!({ "users": "flat" }));

    // Removing under a leaf is a no-op.
    db.remove_value("users/alice").await.unwrap();
    assert_eq!(db.contents().await, json!({ "users": "flat" }));

    db.set_value("users/alice/Username", json!("alice")).await.unwrap();
    assert_eq!(
        db.contents().await,
        json!({ "users": { "alice": { "Username": "alice" } } })
    );
}

#[tokio::test]
async fn test_memory_update_is_all_or_nothing() {
    let db = MemoryDatabase::with_contents(json!({ "a": { "x": 1, "y": 2 } }));

    let mut values = serde_json::Map::new();
    values.insert("x".to_string(), json!(10));
    values.insert("bad.key".to_string(), json!(0));
    assert!(db.update_values("a", values).await.is_err());
    assert_eq!(db.contents().await, json!({ "a": { "x": 1, "y": 2 } }));

    let mut values = serde_json::Map::new();
    values.insert("x".to_string(), json!(10));
    values.insert("z/deep".to_string(), json!(true));
    db.update_values("a", values).await.unwrap();
    assert_eq!(
        db.contents().await,
        json!({ "a": { "x": 10, "y": 2, "z": { "deep": true } } })
    );
}

#[tokio::test]
async fn test_memory_arrays_are_indexed() {
    let db = MemoryDatabase::new();
    db.set_value("lists/a", json!(["zero", "one", "two"]))
        .await
        .unwrap();

    assert_eq!(db.get_value("lists/a/1").await.unwrap().value(), &json!("one"));
    assert!(!db.get_value("lists/a/7").await.unwrap().exists());

    db.set_value("lists/a/1", json!("uno")).await.unwrap();
    assert_eq!(
        db.get_value("lists/a").await.unwrap().value(),
        &json!(["zero", "uno", "two"])
    );

    // Interior removal leaves a hole; trailing removal shortens.
    db.remove_value("lists/a/1").await.unwrap();
    db.remove_value("lists/a/2").await.unwrap();
    assert_eq!(db.get_value("lists/a").await.unwrap().value(), &json!(["zero"]));

    db.remove_value("lists/a/0").await.unwrap();
    assert_eq!(db.contents().await, json!(null));
}

#[tokio::test]
async fn test_memory_array_nulls_and_named_children() {
    let db = MemoryDatabase::with_contents(json!({ "a": ["x", null, "z", null] }));
    assert_eq!(db.contents().await, json!({ "a": ["x", null, "z"] }));

    db.set_value("a/name", json!("n")).await.unwrap();
    assert_eq!(
        db.contents().await,
        json!({ "a": { "0": "x", "2": "z", "name": "n" } })
    );
}
