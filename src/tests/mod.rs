use std::sync::Arc;

use rocket::{
    http::{ContentType, Method, Status},
    local::asynchronous::{Client, LocalResponse},
    serde::json::{json, Value},
};

use crate::{leaderboard::LeaderboardService, score::ScoreEntry, store::in_memory};

async fn spawn_client_with(service: LeaderboardService, allow_origin: &str) -> Client {
    Client::tracked(super::build_rocket(service, allow_origin))
        .await
        .expect("valid rocket instance")
}

/// A server backed by an empty in-memory database
async fn spawn_client() -> Client {
    let service = LeaderboardService::new(Arc::new(in_memory().await), 10);
    spawn_client_with(service, "*").await
}

async fn deserialize_response<'a, T: rocket::serde::DeserializeOwned>(
    response: LocalResponse<'a>,
) -> rocket::serde::json::serde_json::Result<T> {
    let string = response.into_string().await.unwrap_or_default();
    rocket::serde::json::serde_json::from_str(&string)
}

/// Posts a raw body to `uri`
async fn post_raw<'a>(
    client: &'a Client,
    uri: &'a str,
    body: impl AsRef<[u8]>,
) -> LocalResponse<'a> {
    client
        .post(uri)
        .header(ContentType::JSON)
        .body(body)
        .dispatch()
        .await
}

/// Submits a score and returns the stored record
async fn submit<'a>(client: &'a Client, body: Value) -> Result<ScoreEntry, LocalResponse<'a>> {
    let response = post_raw(client, "/leaderboard", body.to_string()).await;
    if response.status() != Status::Ok {
        return Err(response);
    }

    let entry = deserialize_response::<ScoreEntry>(response).await.unwrap();
    Ok(entry)
}

/// Fetches the leaderboard from `uri`
async fn get_leaderboard<'a>(
    client: &'a Client,
    uri: &'a str,
) -> Result<Vec<ScoreEntry>, LocalResponse<'a>> {
    let response = client.get(uri).dispatch().await;
    if response.status() != Status::Ok {
        return Err(response);
    }

    let entries = deserialize_response::<Vec<ScoreEntry>>(response)
        .await
        .unwrap();
    Ok(entries)
}

/// An empty leaderboard is an empty array, not an error
#[rocket::async_test]
async fn empty_leaderboard() {
    let client = spawn_client().await;

    let entries = get_leaderboard(&client, "/leaderboard").await.unwrap();
    assert!(entries.is_empty());
}

/// Submits scores and reads them back in ranking order
#[rocket::async_test]
async fn submit_then_list() {
    let client = spawn_client().await;

    let entry = submit(&client, json!({ "name": "abc!23", "score": 55 }))
        .await
        .unwrap();
    assert_eq!((entry.name.as_str(), entry.score), ("ABC", 55));

    let low = submit(&client, json!({ "name": "Z9", "score": -5.7 }))
        .await
        .unwrap();
    assert_eq!(low.score, 0);

    let high = submit(&client, json!({ "name": "top", "score": 2_000_000 }))
        .await
        .unwrap();
    assert_eq!(high.score, 1_000_000);

    let entries = get_leaderboard(&client, "/leaderboard").await.unwrap();
    assert_eq!(entries, vec![high, entry, low]);
}

/// Bad initials are rejected with a readable message and nothing is stored
#[rocket::async_test]
async fn invalid_initials() {
    let client = spawn_client().await;

    let response = submit(&client, json!({ "name": "", "score": 10 }))
        .await
        .unwrap_err();
    assert_eq!(response.status(), Status::BadRequest);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(body["error"], "Invalid initials (A–Z / 0–9, up to 3 chars)");

    // A body that is not JSON at all has no initials either
    let response = post_raw(&client, "/leaderboard", "name=ABC".to_owned()).await;
    assert_eq!(response.status(), Status::BadRequest);

    let entries = get_leaderboard(&client, "/leaderboard").await.unwrap();
    assert!(entries.is_empty());
}

/// The same routes answer under `/api`
#[rocket::async_test]
async fn api_prefix() {
    let client = spawn_client().await;

    let response = post_raw(
        &client,
        "/api/leaderboard",
        json!({ "name": "api", "score": "42" }).to_string(),
    )
    .await;
    assert_eq!(response.status(), Status::Ok);

    let entries = get_leaderboard(&client, "/api/leaderboard").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!((entries[0].name.as_str(), entries[0].score), ("API", 42));
}

/// Pre-flight requests succeed with an empty body on any path
#[rocket::async_test]
async fn preflight() {
    let client = spawn_client().await;

    for uri in ["/leaderboard", "/api/leaderboard", "/anything/else"] {
        let response = client.options(uri).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Methods"),
            Some("GET, POST, OPTIONS")
        );
        assert!(response.into_string().await.unwrap_or_default().is_empty());
    }
}

/// Methods other than GET, POST and OPTIONS are refused
#[rocket::async_test]
async fn method_not_allowed() {
    let client = spawn_client().await;

    let responses = vec![
        client.put("/leaderboard").dispatch().await,
        client.patch("/leaderboard").dispatch().await,
        client.delete("/api/leaderboard").dispatch().await,
        client.req(Method::Trace, "/leaderboard").dispatch().await,
        client.req(Method::Connect, "/api/leaderboard").dispatch().await,
    ];
    for response in responses {
        assert_eq!(response.status(), Status::MethodNotAllowed);
        assert_eq!(
            response.headers().get_one("Allow"),
            Some("GET, POST, OPTIONS")
        );
    }
}

/// Unknown paths under the leaderboard still answer with a JSON body
#[rocket::async_test]
async fn unknown_path() {
    let client = spawn_client().await;

    let response = client.get("/leaderboard/extra").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(body["error"], "Not Found");

    let response = client.get("/nowhere").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(response.content_type(), Some(ContentType::JSON));
}

/// Bodies that are not UTF-8 are decoded as `{}` and rejected for their initials
#[rocket::async_test]
async fn binary_body() {
    let client = spawn_client().await;

    let response = post_raw(&client, "/leaderboard", vec![0xff, 0xfe, b'{']).await;
    assert_eq!(response.status(), Status::BadRequest);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(body["error"], "Invalid initials (A–Z / 0–9, up to 3 chars)");
}

/// Submissions well past a few kilobytes are still accepted, up to a megabyte
#[rocket::async_test]
async fn large_body() {
    let client = spawn_client().await;

    let padded = json!({ "name": "BIG", "score": 5, "pad": "x".repeat(10_000) });
    let entry = submit(&client, padded).await.unwrap();
    assert_eq!((entry.name.as_str(), entry.score), ("BIG", 5));

    let oversized = json!({ "name": "FAT", "score": 5, "pad": "x".repeat(2 * 1024 * 1024) });
    let response = submit(&client, oversized).await.unwrap_err();
    assert_eq!(response.status(), Status::PayloadTooLarge);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(body["error"], "Request body too large");

    let entries = get_leaderboard(&client, "/leaderboard").await.unwrap();
    assert_eq!(entries.len(), 1);
}

/// Every response carries the cross-origin headers
#[rocket::async_test]
async fn cors_headers() {
    let client = spawn_client().await;

    let response = client.get("/leaderboard").dispatch().await;
    let headers = response.headers();
    assert_eq!(headers.get_one("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(
        headers.get_one("Access-Control-Allow-Headers"),
        Some("Content-Type")
    );

    let service = LeaderboardService::new(Arc::new(in_memory().await), 10);
    let client = spawn_client_with(service, "https://player.github.io").await;
    let response = submit(&client, json!({ "name": "", "score": 1 }))
        .await
        .unwrap_err();
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("https://player.github.io")
    );
}

/// Without a store both reads and writes fail, but bad initials are still a client error
#[rocket::async_test]
async fn missing_configuration() {
    let service = LeaderboardService::unconfigured("Missing DATABASE_URL", 10);
    let client = spawn_client_with(service, "*").await;

    let response = get_leaderboard(&client, "/leaderboard").await.unwrap_err();
    assert_eq!(response.status(), Status::InternalServerError);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(body["error"], "Store is not configured");
    assert_eq!(body["detail"], "Missing DATABASE_URL");

    let response = submit(&client, json!({ "name": "ABC", "score": 1 }))
        .await
        .unwrap_err();
    assert_eq!(response.status(), Status::InternalServerError);

    let response = submit(&client, json!({ "name": "***", "score": 1 }))
        .await
        .unwrap_err();
    assert_eq!(response.status(), Status::BadRequest);
}

/// A store that cannot be reached is reported with detail
#[rocket::async_test]
async fn store_unavailable() {
    let store = crate::store::RestStore::new("http://127.0.0.1:9", "key", "scores");
    let service = LeaderboardService::new(Arc::new(store), 10);
    let client = spawn_client_with(service, "*").await;

    let response = submit(&client, json!({ "name": "ABC", "score": 1 }))
        .await
        .unwrap_err();
    assert_eq!(response.status(), Status::InternalServerError);
    let body = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(body["error"], "Server error");
    assert!(body["detail"].as_str().is_some());
}

#[rocket::async_test]
async fn index_page() {
    let client = spawn_client().await;

    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::HTML));
}
