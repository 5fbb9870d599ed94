//! # 配信 API の統合テスト
//!
//! ルーター全体をインメモリのモックで組み立て、HTTP 経由で配信パイプラインを検証する。
//!
//! - 1 通の配信が `SUCCESS` / `FAILED` の記録として返る
//! - 検証に失敗した配信は記録を作らない
//! - 一括配信の結果は宛先と同じ順序で返る

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
use bulkmail_domain::delivery::DeliveryStatus;
use pretty_assertions::assert_eq;
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

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_sendは変数を置換して送信しsuccessの記録を返す() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(post_json(
            "/api/v1/mail/send",
            json!({
                "recipient": "ann@example.com",
                "template_id": template.id().to_string(),
                "variables": { "name": "Ann" }
            }),
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"]["status"], "SUCCESS");
    assert_eq!(json["data"]["recipient"], "ann@example.com");
    assert_eq!(json["data"]["subject"], "Welcome");
    assert_eq!(json["data"]["variables"], r#"{"name":"Ann"}"#);
    assert!(json["data"]["error_message"].is_null());

    let sent = setup.transport.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].html_body, "<p>Hello Ann</p>");
}

#[tokio::test]
async fn test_variablesがnullなら変数なしで送信する() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(post_json(
            "/api/v1/mail/send",
            json!({
                "recipient": "ann@example.com",
                "template_id": template.id().to_string(),
                "subject": null,
                "variables": null
            }),
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"]["status"], "SUCCESS");
    assert!(json["data"]["variables"].is_null());
    assert_eq!(
        setup.transport.sent_messages()[0].html_body,
        "<p>Hello {{name}}</p>"
    );
}

#[tokio::test]
async fn test_一括配信もvariablesのnullを受け付ける() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(post_json(
            "/api/v1/mail/send/bulk",
            json!({
                "recipients": ["a@example.com"],
                "template_id": template.id().to_string(),
                "variables": null
            }),
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"][0]["record"]["status"], "SUCCESS");
}

#[tokio::test]
async fn test_送信失敗は200でfailedの記録を返す() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);
    setup.transport.fail_for("ann@example.com");
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(post_json(
            "/api/v1/mail/send",
            json!({
                "recipient": "ann@example.com",
                "template_id": template.id().to_string()
            }),
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"]["status"], "FAILED");
    assert!(json["data"]["error_message"].is_string());
    assert_eq!(setup.record_repo.records()[0].status(), DeliveryStatus::Failed);
}

#[tokio::test]
async fn test_不正な宛先は400で記録を作らない() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(post_json(
            "/api/v1/mail/send",
            json!({
                "recipient": "not-an-address",
                "template_id": template.id().to_string()
            }),
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = read_json(response).await;
    assert_eq!(
        json["type"],
        "https://bulkmail.example.com/errors/validation-error"
    );
    assert!(setup.record_repo.records().is_empty());
    assert!(setup.transport.sent_messages().is_empty());
}

#[tokio::test]
async fn test_長すぎる件名の上書きは400で記録を作らない() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(post_json(
            "/api/v1/mail/send",
            json!({
                "recipient": "ann@example.com",
                "template_id": template.id().to_string(),
                "subject": "s".repeat(300)
            }),
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = read_json(response).await;
    assert_eq!(
        json["type"],
        "https://bulkmail.example.com/errors/validation-error"
    );
    assert!(setup.record_repo.records().is_empty());
    assert!(setup.transport.sent_messages().is_empty());
}

#[tokio::test]
async fn test_無効なテンプレートは400のtemplate_inactiveを返す() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("retired", false);
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(post_json(
            "/api/v1/mail/send",
            json!({
                "recipient": "ann@example.com",
                "template_id": template.id().to_string()
            }),
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = read_json(response).await;
    assert_eq!(
        json["type"],
        "https://bulkmail.example.com/errors/template-inactive"
    );
    assert!(setup.record_repo.records().is_empty());
}

#[tokio::test]
async fn test_存在しないテンプレートは404を返す() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(post_json(
            "/api/v1/mail/send",
            json!({
                "recipient": "ann@example.com",
                "template_id": "01890a5d-ac96-774b-bcce-b302099a8057"
            }),
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_一括配信は宛先と同じ順序で結果を返す() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);
    setup.transport.fail_for("b@example.com");
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(post_json(
            "/api/v1/mail/send/bulk",
            json!({
                "recipients": ["a@example.com", "b@example.com", "broken", "c@example.com"],
                "template_id": template.id().to_string(),
                "variables": { "name": "friend" }
            }),
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    let outcomes = json["data"].as_array().unwrap();
    assert_eq!(outcomes.len(), 4);

    assert_eq!(outcomes[0]["outcome"], "recorded");
    assert_eq!(outcomes[0]["record"]["recipient"], "a@example.com");
    assert_eq!(outcomes[0]["record"]["status"], "SUCCESS");
    assert_eq!(outcomes[1]["record"]["status"], "FAILED");
    assert_eq!(outcomes[2]["outcome"], "rejected");
    assert_eq!(outcomes[2]["recipient"], "broken");
    assert_eq!(outcomes[2]["error"]["status"], 400);
    assert_eq!(outcomes[3]["record"]["recipient"], "c@example.com");

    assert_eq!(setup.record_repo.records().len(), 3);
}

#[tokio::test]
async fn test_空の宛先リストは400を返す() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(post_json(
            "/api/v1/mail/send/bulk",
            json!({ "recipients": [], "template_id": template.id().to_string() }),
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_宛先の履歴を取得できる() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let template = setup.add_template("welcome", true);
    for recipient in ["ann@example.com", "bob@example.com"] {
        let response = test_app(&setup)
            .oneshot(post_json(
                "/api/v1/mail/send",
                json!({ "recipient": recipient, "template_id": template.id().to_string() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // When
    let response = test_app(&setup)
        .oneshot(get("/api/v1/mail/history/recipient/ann@example.com"))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    let records = json["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["recipient"], "ann@example.com");
}

#[tokio::test]
async fn test_日付範囲の履歴を取得できる() {
    // Given
    let builder = DispatchTestBuilder::new();
    let setup = builder.build();
    let record = tokio_test::assert_ok!(
        setup
            .ledger
            .create(builder.new_delivery("ann@example.com"))
            .await
    );
    let today = builder.now().date_naive();

    // When
    let response = test_app(&setup)
        .oneshot(get(&format!(
            "/api/v1/mail/history/date-range?start_date={today}&end_date={today}"
        )))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    let records = json["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], record.id().to_string());
    assert_eq!(records[0]["status"], "SENDING");
}

#[tokio::test]
async fn test_開始日が終了日より後なら空の履歴を返す() {
    // Given
    let setup = DispatchTestBuilder::new().build();
    let sut = test_app(&setup);

    // When
    let response = sut
        .oneshot(get(
            "/api/v1/mail/history/date-range?start_date=2026-03-11&end_date=2026-03-10",
        ))
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn test_validateはアドレス形式の判定結果を返す() {
    let setup = DispatchTestBuilder::new().build();

    let valid = read_json(
        test_app(&setup)
            .oneshot(get("/api/v1/mail/validate/ann@example.com"))
            .await
            .unwrap(),
    )
    .await;
    let invalid = read_json(
        test_app(&setup)
            .oneshot(get("/api/v1/mail/validate/ann@localhost"))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(valid["data"], json!({ "email": "ann@example.com", "valid": true }));
    assert_eq!(invalid["data"]["valid"], false);
}
