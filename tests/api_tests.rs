mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

async fn create_card(app: axum::Router, pipeline: &str, body: Value) -> Value {
    let (status, body) = common::make_request(
        app,
        "POST",
        &format!("/api/pipelines/{}/cards", pipeline),
        Some(body.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    serde_json::from_str(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let pool = common::setup_test_db().await;
    let (app, _rx) = common::test_app(pool);

    let (status, body) = common::make_request(app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"ok\""));
}

#[tokio::test]
async fn test_create_card_defaults_to_first_stage() {
    let pool = common::setup_test_db().await;
    let (app, _rx) = common::test_app(pool);

    let card = create_card(
        app.clone(),
        "leads",
        json!({ "name": "Northwind Bistro", "company": "Northwind" }),
    )
    .await;

    assert_eq!(card["stage"], "new");
    assert_eq!(card["pipeline"], "leads");
    assert_eq!(card["score"], 10);

    let card_id = card["id"].as_str().unwrap();
    let (status, body) = common::make_request(
        app,
        "GET",
        &format!("/api/pipelines/leads/cards/{}", card_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let fetched: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(fetched["name"], "Northwind Bistro");
}

#[tokio::test]
async fn test_create_card_rejects_foreign_stage() {
    let pool = common::setup_test_db().await;
    let (app, _rx) = common::test_app(pool);

    let (status, body) = common::make_request(
        app,
        "POST",
        "/api/pipelines/leads/cards",
        Some(json!({ "name": "Harbor", "stage": "negotiation" }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid lead stage"));
}

#[tokio::test]
async fn test_unknown_pipeline_is_bad_request() {
    let pool = common::setup_test_db().await;
    let (app, _rx) = common::test_app(pool);

    let (status, body) =
        common::make_request(app, "GET", "/api/pipelines/deals/cards", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid pipeline"));
}

#[tokio::test]
async fn test_move_stage_returns_message_and_updates_derived_fields() {
    let pool = common::setup_test_db().await;
    let (app, mut events) = common::test_app(pool);

    let card = create_card(app.clone(), "leads", json!({ "id": "1", "name": "Northwind" })).await;
    assert_eq!(card["id"], "1");
    let _created = events.recv().await.unwrap();

    let (status, body) = common::make_request(
        app.clone(),
        "PATCH",
        "/api/pipelines/leads/cards/1/stage",
        Some(json!({ "stage": "contacted" }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({ "message": "Lead moved to Contacted" })
    );

    let event: Value = serde_json::from_str(&events.recv().await.unwrap()).unwrap();
    assert_eq!(event["type"], "cardMoved");
    assert_eq!(event["from_stage"], "new");
    assert_eq!(event["to_stage"], "contacted");

    let (_, body) =
        common::make_request(app.clone(), "GET", "/api/pipelines/leads/cards/1", None).await;
    let moved: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(moved["stage"], "contacted");
    assert_eq!(moved["score"], 25);
    assert!(moved["stage_changed_at"].is_string());

    let (status, body) = common::make_request(
        app,
        "GET",
        "/api/pipelines/leads/cards/1/transitions",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let transitions: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0]["from_stage"], "new");
    assert_eq!(transitions[0]["to_stage"], "contacted");
}

#[tokio::test]
async fn test_move_to_same_stage_writes_no_audit_row() {
    let pool = common::setup_test_db().await;
    let (app, _rx) = common::test_app(pool);

    create_card(
        app.clone(),
        "opportunities",
        json!({ "id": "opp-1", "name": "Listing upgrade" }),
    )
    .await;

    let (status, body) = common::make_request(
        app.clone(),
        "PATCH",
        "/api/pipelines/opportunities/cards/opp-1/stage",
        Some(json!({ "stage": "discovery" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Opportunity already in Discovery"));

    let (_, body) = common::make_request(
        app,
        "GET",
        "/api/pipelines/opportunities/cards/opp-1/transitions",
        None,
    )
    .await;
    let transitions: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert!(transitions.is_empty());
}

#[tokio::test]
async fn test_move_stage_errors_use_error_body() {
    let pool = common::setup_test_db().await;
    let (app, _rx) = common::test_app(pool);

    create_card(app.clone(), "leads", json!({ "id": "2", "name": "Harbor" })).await;

    let (status, body) = common::make_request(
        app.clone(),
        "PATCH",
        "/api/pipelines/leads/cards/2/stage",
        Some(json!({ "stage": "closed_won" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["error"], "Invalid lead stage: closed_won");

    let (status, body) = common::make_request(
        app.clone(),
        "PATCH",
        "/api/pipelines/leads/cards/missing/stage",
        Some(json!({ "stage": "contacted" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Card not found: missing"));

    // a lead id is not visible through the opportunities pipeline
    let (status, _) = common::make_request(
        app,
        "PATCH",
        "/api/pipelines/opportunities/cards/2/stage",
        Some(json!({ "stage": "negotiation" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_board_groups_cards_in_column_order() {
    let pool = common::setup_test_db().await;
    let (app, _rx) = common::test_app(pool);

    create_card(app.clone(), "leads", json!({ "name": "A", "stage": "qualified" })).await;
    create_card(app.clone(), "leads", json!({ "name": "B" })).await;
    create_card(app.clone(), "leads", json!({ "name": "C", "stage": "qualified" })).await;
    create_card(app.clone(), "opportunities", json!({ "name": "D" })).await;

    let (status, body) =
        common::make_request(app, "GET", "/api/pipelines/leads/board", None).await;
    assert_eq!(status, StatusCode::OK);

    let board: Value = serde_json::from_str(&body).unwrap();
    let columns = board["columns"].as_array().unwrap();
    let stages: Vec<&str> = columns.iter().map(|c| c["stage"].as_str().unwrap()).collect();
    assert_eq!(
        stages,
        vec!["new", "contacted", "qualified", "unqualified", "converted"]
    );

    let qualified: Vec<&str> = columns[2]["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(qualified, vec!["A", "C"]);
    assert_eq!(columns[0]["cards"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_pipelines_describes_columns() {
    let pool = common::setup_test_db().await;
    let (app, _rx) = common::test_app(pool);

    let (status, body) = common::make_request(app, "GET", "/api/pipelines", None).await;
    assert_eq!(status, StatusCode::OK);

    let pipelines: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(pipelines.len(), 2);
    assert_eq!(pipelines[0]["id"], "leads");
    assert_eq!(pipelines[1]["noun"], "Opportunity");
    assert_eq!(pipelines[1]["stages"][4]["title"], "Closed Won");
    assert_eq!(pipelines[1]["stages"][4]["score_weight"], 100);
    assert_eq!(pipelines[0]["mutation_timeout_secs"], 15);
}

#[tokio::test]
async fn test_duplicate_card_id_is_a_conflict() {
    let pool = common::setup_test_db().await;
    let (app, _rx) = common::test_app(pool);

    create_card(app.clone(), "leads", json!({ "id": "1", "name": "A" })).await;

    let (status, body) = common::make_request(
        app,
        "POST",
        "/api/pipelines/leads/cards",
        Some(json!({ "id": "1", "name": "A" }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["error"], "Card already exists: 1");
}

#[tokio::test]
async fn test_events_follow_creates_and_real_moves_only() {
    let pool = common::setup_test_db().await;
    let (app, mut events) = common::test_app(pool);

    create_card(app.clone(), "leads", json!({ "id": "7", "name": "Lumen" })).await;
    let created: Value = serde_json::from_str(&events.recv().await.unwrap()).unwrap();
    assert_eq!(created["type"], "cardCreated");
    assert_eq!(created["card_id"], "7");
    assert_eq!(created["pipeline"], "leads");

    for stage in ["new", "qualified", "qualified", "converted"] {
        let (status, _) = common::make_request(
            app.clone(),
            "PATCH",
            "/api/pipelines/leads/cards/7/stage",
            Some(json!({ "stage": stage }).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let mut moves = Vec::new();
    while let Ok(raw) = events.try_recv() {
        let event: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(event["type"], "cardMoved");
        assert_eq!(event["card_id"], "7");
        moves.push((
            event["from_stage"].as_str().unwrap().to_string(),
            event["to_stage"].as_str().unwrap().to_string(),
        ));
    }

    assert_eq!(
        moves,
        vec![
            ("new".to_string(), "qualified".to_string()),
            ("qualified".to_string(), "converted".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_pipelines_report_clamped_timeout() {
    let pool = common::setup_test_db().await;
    let mut config = common::test_config();
    config.mutation_timeout_secs = 0;
    let (app, _rx) = common::test_app_with_config(pool, config);

    let (_, body) = common::make_request(app, "GET", "/api/pipelines", None).await;
    let pipelines: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(pipelines[0]["mutation_timeout_secs"], 1);
}
