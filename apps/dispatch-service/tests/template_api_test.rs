//! # テンプレート API の統合テスト
//!
//! テンプレートの登録から無効化・削除までを HTTP 経由で検証する。

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use bulkmail_dispatch_service::{
    handler::{DispatchState, TemplateState, api_routes},
    test_utils::{DispatchTestBuilder, DispatchTestSetup},
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_app(setup: &DispatchTestSetup) -> Router {
    api_routes(
        Arc::new(DispatchState {
            coordinator: setup.sut.clone(),
            history:     setup.history.clone(),
        }),
        Arc::new(TemplateState {
            catalog: setup.catalog.clone(),
        }),
    )
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(setup: &DispatchTestSetup, req: Request<Body>) -> (StatusCode, Value) {
    let response = test_app(setup).oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn welcome_body() -> Value {
    json!({
        "name": "welcome",
        "subject": "ようこそ",
        "content": "<p>こんにちは {{name}} さん</p>",
        "description": "新規登録時の案内"
    })
}

#[tokio::test]
async fn test_登録したテンプレートをidと名前で取得できる() {
    // Given
    let setup = DispatchTestBuilder::new().build();

    // When
    let (status, created) = call(
        &setup,
        request(Method::POST, "/api/v1/templates", Some(welcome_body())),
    )
    .await;

    // Then
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["name"], "welcome");
    assert_eq!(created["data"]["is_active"], true);

    let id = created["data"]["id"].as_str().unwrap();
    let (status, by_id) = call(
        &setup,
        request(Method::GET, &format!("/api/v1/templates/{id}"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["data"], created["data"]);

    let (status, by_name) = call(
        &setup,
        request(Method::GET, "/api/v1/templates/name/welcome", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_name["data"]["id"], id);
}

#[tokio::test]
async fn test_同名のテンプレートは409を返す() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    setup.add_template("welcome", true);

    // When
    let (status, json) = call(
        &setup,
        request(Method::POST, "/api/v1/templates", Some(welcome_body())),
    )
    .await;

    // Then
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);
}

#[rstest]
#[case::名前が空(json!({ "name": "", "subject": "s", "content": "c" }))]
#[case::件名が空白のみ(json!({ "name": "n", "subject": "   ", "content": "c" }))]
#[case::本文が空(json!({ "name": "n", "subject": "s", "content": "" }))]
#[tokio::test]
async fn test_不正な入力は400を返す(#[case] body: Value) {
    let setup = DispatchTestBuilder::new().build();

    let (status, json) = call(
        &setup,
        request(Method::POST, "/api/v1/templates", Some(body)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["type"],
        "https://bulkmail.example.com/errors/validation-error"
    );
}

#[tokio::test]
async fn test_更新で内容が置き換わる() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);

    // When
    let (status, json) = call(
        &setup,
        request(
            Method::PUT,
            &format!("/api/v1/templates/{}", template.id()),
            Some(json!({
                "name": "welcome-v2",
                "subject": "Welcome again",
                "content": "<p>Hi {{name}}</p>"
            })),
        ),
    )
    .await;

    // Then
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "welcome-v2");
    assert_eq!(json["data"]["subject"], "Welcome again");
    assert_eq!(json["data"]["is_active"], true);
}

#[tokio::test]
async fn test_無効化したテンプレートは有効一覧から外れ配信できない() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let active = setup.add_template("welcome", true);
    let retired = setup.add_template("retired", true);

    // When
    let (status, json) = call(
        &setup,
        request(
            Method::PATCH,
            &format!("/api/v1/templates/{}/deactivate", retired.id()),
            None,
        ),
    )
    .await;

    // Then
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["is_active"], false);

    let (_, listed) = call(
        &setup,
        request(Method::GET, "/api/v1/templates/active", None),
    )
    .await;
    let names: Vec<&str> = listed["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec![active.name().as_str()]);

    let (status, _) = call(
        &setup,
        request(
            Method::POST,
            "/api/v1/mail/send",
            Some(json!({
                "recipient": "ann@example.com",
                "template_id": retired.id().to_string()
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_有効化したテンプレートで配信できる() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", false);

    // When
    let (status, _) = call(
        &setup,
        request(
            Method::PATCH,
            &format!("/api/v1/templates/{}/activate", template.id()),
            None,
        ),
    )
    .await;

    // Then
    assert_eq!(status, StatusCode::OK);
    let (status, json) = call(
        &setup,
        request(
            Method::POST,
            "/api/v1/mail/send",
            Some(json!({
                "recipient": "ann@example.com",
                "template_id": template.id().to_string()
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "SUCCESS");
}

#[tokio::test]
async fn test_削除しても配信履歴は残る() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);
    let (status, _) = call(
        &setup,
        request(
            Method::POST,
            "/api/v1/mail/send",
            Some(json!({
                "recipient": "ann@example.com",
                "template_id": template.id().to_string()
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // When
    let (status, _) = call(
        &setup,
        request(
            Method::DELETE,
            &format!("/api/v1/templates/{}", template.id()),
            None,
        ),
    )
    .await;

    // Then
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(
        &setup,
        request(
            Method::GET,
            &format!("/api/v1/templates/{}", template.id()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, history) = call(
        &setup,
        request(
            Method::GET,
            "/api/v1/mail/history/recipient/ann@example.com",
            None,
        ),
    )
    .await;
    assert_eq!(
        history["data"][0]["template_id"],
        template.id().to_string()
    );
}

#[tokio::test]
async fn test_存在しないテンプレートの削除は404を返す() {
    let setup = DispatchTestBuilder::new().build();

    let (status, _) = call(
        &setup,
        request(
            Method::DELETE,
            "/api/v1/templates/01890a5d-ac96-774b-bcce-b302099a8057",
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
