#[allow(dead_code)]
mod common;

use common::{TestServer, SUPERUSER_TOKEN, USER_TOKEN};
use productdb_common::AppSettings;
use serde_json::json;

fn notification(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "type": "ERR",
        "summary_message": "This is a summary",
        "detailed_message": "This is the detail message",
    })
}

async fn create(server: &TestServer, token: Option<&str>, body: &serde_json::Value) -> reqwest::Response {
    let mut req = reqwest::Client::new()
        .post(server.url("/notifications"))
        .json(body);
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    req.send().await.unwrap()
}

#[tokio::test]
async fn add_notification_requires_superuser() {
    let server = TestServer::new(AppSettings::default()).await;
    let body = notification("MyTitle");

    assert_eq!(create(&server, None, &body).await.status(), 401);
    assert_eq!(create(&server, Some(USER_TOKEN), &body).await.status(), 403);
}

#[tokio::test]
async fn add_and_read_notification() {
    let server = TestServer::new(AppSettings::default()).await;

    let resp = create(&server, Some(SUPERUSER_TOKEN), &notification("MyTitle")).await;
    assert_eq!(resp.status(), 201);
    let created: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(created["type"], "ERR");
    let id = created["id"].as_str().unwrap().to_string();

    let list: Vec<serde_json::Value> = reqwest::get(server.url("/notifications"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "MyTitle");

    let detail = reqwest::get(server.url(&format!("/notifications/{id}"))).await.unwrap();
    assert_eq!(detail.status(), 200);
    let detail: serde_json::Value = detail.json().await.unwrap();
    assert_eq!(detail["summary_message"], "This is a summary");
}

#[tokio::test]
async fn missing_field_is_rejected() {
    let server = TestServer::new(AppSettings::default()).await;
    let body = json!({
        "title": "MyTitle",
        "type": "ERR",
        "detailed_message": "This is the detail message",
    });

    let resp = create(&server, Some(SUPERUSER_TOKEN), &body).await;
    assert_eq!(resp.status(), 400);
    let err: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "invalid_request");
    assert!(err["error"]["details"]["summary_message"].is_string());

    let list: Vec<serde_json::Value> = reqwest::get(server.url("/notifications"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn list_is_newest_first() {
    let server = TestServer::new(AppSettings::default()).await;
    for title in ["first", "second", "third"] {
        let resp = create(&server, Some(SUPERUSER_TOKEN), &notification(title)).await;
        assert_eq!(resp.status(), 201);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let list: Vec<serde_json::Value> = reqwest::Client::new()
        .get(server.url("/notifications"))
        .bearer_auth(USER_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<&str> = list.iter().map(|m| m["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn unknown_notification_is_404() {
    let server = TestServer::new(AppSettings::default()).await;
    let resp = reqwest::Client::new()
        .get(server.url("/notifications/9999"))
        .bearer_auth(USER_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn login_only_mode_hides_notifications_from_anonymous() {
    let server = TestServer::new(AppSettings {
        login_only_mode: true,
        ..Default::default()
    })
    .await;
    let created: serde_json::Value = create(&server, Some(SUPERUSER_TOKEN), &notification("t"))
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let resp = reqwest::get(server.url("/notifications")).await.unwrap();
    assert_eq!(resp.status(), 401);
    let resp = reqwest::get(server.url(&format!("/notifications/{id}"))).await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = reqwest::Client::new()
        .get(server.url(&format!("/notifications/{id}")))
        .bearer_auth(USER_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn malformed_notification_body_is_gated_before_parsing() {
    let server = TestServer::new(AppSettings::default()).await;
    let send = |token: Option<&'static str>| {
        let mut req = reqwest::Client::new()
            .post(server.url("/notifications"))
            .header("content-type", "application/json")
            .body("{\"title\": ");
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send()
    };

    assert_eq!(send(None).await.unwrap().status(), 401);
    assert_eq!(send(Some(USER_TOKEN)).await.unwrap().status(), 403);

    let resp = send(Some(SUPERUSER_TOKEN)).await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "invalid_request");
}
