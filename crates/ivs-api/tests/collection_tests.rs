//! Question bank, favorites, mistakes and practice sets.

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{TestClient, app, database_state, db, register_user};

/// Ids of the questions in the first category of a question page
fn question_ids(page: &Value) -> Vec<String> {
    page["items"][0]["questions"]
        .as_array()
        .expect("questions")
        .iter()
        .map(|q| q["id"].as_str().expect("id").to_string())
        .collect()
}

fn email_of(data: &Value) -> String {
    data["user"]["email"].as_str().expect("email").to_string()
}

#[tokio::test]
async fn test_question_bank_browsing() {
    let Some(state) = database_state().await else {
        return;
    };
    let pool = state.pool.clone();
    let client = TestClient::new(app(state));
    let (client, data) = register_user(&client, "bank").await;

    let response = client.get("/api/v1/questions/categories").await;
    response.assert_status(StatusCode::OK);
    let categories = response.data();
    let networks = categories
        .as_array()
        .expect("categories")
        .iter()
        .find(|c| c["name"] == "Computer Networks")
        .expect("seeded category");
    assert_eq!(networks["id"], "computer-networks");

    let response = client
        .get("/api/v1/questions?category=Computer%20Networks&pageSize=2")
        .await;
    response.assert_status(StatusCode::OK);
    let page = response.data();
    assert_eq!(page["pageSize"], 2);
    assert_eq!(page["items"][0]["category"], "Computer Networks");
    assert!(page["total"].as_i64().expect("total") >= 2);

    let response = client.get("/api/v1/questions?difficulty=impossible").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = client
        .post_json("/api/v1/questions/search", &json!({"query": "handshake"}))
        .await;
    response.assert_status(StatusCode::OK);
    let ids = question_ids(&response.data());
    assert!(!ids.is_empty());

    let response = client.get(&format!("/api/v1/questions/{}", ids[0])).await;
    response.assert_status(StatusCode::OK);
    let question = response.data();
    assert!(question["text"].as_str().expect("text").contains("handshake"));
    assert!(question["followUps"].is_array());

    let response = client
        .get("/api/v1/questions/00000000-0000-0000-0000-000000000000")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "QUESTION_NOT_FOUND");

    let response = client
        .post_json(
            "/api/v1/questions/export",
            &json!({"questionIds": [ids[0]], "format": "txt"}),
        )
        .await;
    response.assert_status(StatusCode::OK);
    assert!(response.text().starts_with("--- Computer Networks ---"));

    db::delete_user_by_email(&pool, &email_of(&data))
        .await
        .expect("cleanup");
}

#[tokio::test]
async fn test_favorites_and_mistakes() {
    let Some(state) = database_state().await else {
        return;
    };
    let pool = state.pool.clone();
    let client = TestClient::new(app(state));
    let (client, data) = register_user(&client, "fav").await;

    let response = client.get("/api/v1/favorites/export").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let page = client.get("/api/v1/questions?pageSize=3").await.data();
    let ids = question_ids(&page);
    let question_id = ids[0].clone();

    let response = client
        .post_json("/api/v1/favorites", &json!({"questionId": question_id}))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = client
        .post_json("/api/v1/favorites", &json!({"questionId": question_id}))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "ALREADY_FAVORITED");

    let response = client.get("/api/v1/favorites").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data(), json!([question_id]));

    let response = client.get("/api/v1/favorites/export?format=json").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename=\"favorites.json\""
    );

    let response = client
        .delete(&format!("/api/v1/favorites/{question_id}"))
        .await;
    response.assert_status(StatusCode::OK);
    let response = client
        .delete(&format!("/api/v1/favorites/{question_id}"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let mistake = json!({"questionId": question_id, "userAnswer": "Not sure", "score": 20});
    let response = client.post_json("/api/v1/mistakes", &mistake).await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.data()["score"], 20);

    let response = client.get("/api/v1/mistakes").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data().as_array().expect("mistakes").len(), 1);

    let response = client
        .delete(&format!("/api/v1/mistakes/{question_id}"))
        .await;
    response.assert_status(StatusCode::OK);

    let response = client.get("/api/v1/mistakes").await;
    assert_eq!(response.data(), json!([]));
    let response = client.get("/api/v1/mistakes/export").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    db::delete_user_by_email(&pool, &email_of(&data))
        .await
        .expect("cleanup");
}

#[tokio::test]
async fn test_practice_set_lifecycle() {
    let Some(state) = database_state().await else {
        return;
    };
    let pool = state.pool.clone();
    let client = TestClient::new(app(state));
    let (owner, owner_data) = register_user(&client, "owner").await;
    let (other, other_data) = register_user(&client, "other").await;

    let response = owner
        .post_json(
            "/api/v1/practice-sets",
            &json!({"name": "Networking drill", "description": "Before the onsite"}),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let set = response.data();
    let set_id = set["id"].as_str().expect("id").to_string();
    assert_eq!(set["isPublic"], false);
    assert_eq!(set["questionCount"], 0);

    let response = owner.get(&format!("/api/v1/practice-sets/{set_id}/export")).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let page = owner.get("/api/v1/questions?pageSize=2").await.data();
    let question_id = question_ids(&page)[0].clone();

    let uri = format!("/api/v1/practice-sets/{set_id}/questions");
    let response = owner.post_json(&uri, &json!({"questionId": question_id})).await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.data()["questionCount"], 1);

    let response = owner.post_json(&uri, &json!({"questionId": question_id})).await;
    response.assert_status(StatusCode::CONFLICT);

    // Private sets are invisible to other users
    let response = other.get(&uri).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "PRACTICE_SET_NOT_FOUND");

    let set_uri = format!("/api/v1/practice-sets/{set_id}");
    let response = owner.put_json(&set_uri, &json!({"isPublic": true})).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["isPublic"], true);
    assert_eq!(response.data()["description"], "Before the onsite");

    let response = other.get(&uri).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data().as_array().expect("questions").len(), 1);

    // Public sets are still read-only for others
    let response = other.put_json(&set_uri, &json!({"name": "Mine now"})).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let response = other.delete(&set_uri).await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = owner.put_json(&set_uri, &json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = owner.put_json(&set_uri, &json!({"description": null})).await;
    response.assert_status(StatusCode::OK);
    assert!(response.data()["description"].is_null());

    let response = other
        .get(&format!("/api/v1/practice-sets/{set_id}/export?format=txt"))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename=\"Networking_drill.txt\""
    );

    let response = owner.delete(&set_uri).await;
    response.assert_status(StatusCode::OK);
    let response = owner.get("/api/v1/practice-sets").await;
    assert_eq!(response.data(), json!([]));

    for data in [owner_data, other_data] {
        db::delete_user_by_email(&pool, &email_of(&data))
            .await
            .expect("cleanup");
    }
}
