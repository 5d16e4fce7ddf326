//! Answer submission, scoring, history, statistics and resume upload.

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{TestClient, app, database_state, db, register_user};

const HANDSHAKE_ANSWER: &str = "The client sends SYN, the server replies with SYN-ACK and the \
    client confirms with ACK. Teardown uses FIN and ACK in each direction. TIME_WAIT keeps the \
    connection around for twice the maximum segment lifetime so delayed segments expire.";

async fn handshake_question(client: &TestClient) -> Value {
    let response = client
        .post_json("/api/v1/questions/search", &json!({"query": "handshake"}))
        .await;
    response.assert_status(StatusCode::OK);
    let id = response.data()["items"][0]["questions"][0]["id"]
        .as_str()
        .expect("question id")
        .to_string();

    client.get(&format!("/api/v1/questions/{id}")).await.data()
}

#[tokio::test]
async fn test_submit_score_and_follow_up() {
    let Some(state) = database_state().await else {
        return;
    };
    let pool = state.pool.clone();
    let client = TestClient::new(app(state));
    let (client, data) = register_user(&client, "answer").await;

    let question = handshake_question(&client).await;
    let question_id = question["id"].as_str().expect("id").to_string();

    let response = client
        .post_json(
            "/api/v1/answers",
            &json!({"questionId": question_id, "answerText": "   ", "timeSpent": 10}),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = client
        .post_json(
            "/api/v1/answers",
            &json!({
                "questionId": question_id,
                "answerText": HANDSHAKE_ANSWER,
                "timeSpent": 95,
                "metadata": {"device": "web"},
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let answer = response.data();
    let answer_id = answer["id"].as_str().expect("answer id").to_string();
    assert!(answer["score"].is_null());
    assert_eq!(answer["metadata"]["device"], "web");

    let response = client
        .post(&format!("/api/v1/answers/{answer_id}/ai-score"))
        .await;
    response.assert_status(StatusCode::OK);
    let scored = response.data();
    assert_eq!(scored["source"], "keyword");
    let score = scored["score"].as_i64().expect("score");
    assert!((0..=100).contains(&score));
    assert!(!scored["matchedKeywords"].as_array().expect("keywords").is_empty());

    let follow_up_id = question["followUps"][0]["id"]
        .as_str()
        .expect("seeded follow-up")
        .to_string();

    let response = client
        .post_json(
            "/api/v1/answers",
            &json!({"parentAnswerId": answer_id, "answerText": "SYN flood", "timeSpent": 5}),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = client
        .post_json(
            "/api/v1/answers",
            &json!({
                "parentAnswerId": answer_id,
                "followUpQuestionId": follow_up_id,
                "answerText": "It protects against delayed duplicate segments.",
                "timeSpent": 30,
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let follow_up_answer = response.data();
    assert_eq!(follow_up_answer["questionId"], question_id.as_str());
    assert_eq!(follow_up_answer["parentAnswerId"], answer_id.as_str());

    let response = client
        .get(&format!("/api/v1/answers/history?questionId={question_id}"))
        .await;
    response.assert_status(StatusCode::OK);
    let history = response.data();
    assert_eq!(history["total"], 2);
    assert_eq!(history["answers"][0]["category"], "Computer Networks");

    let response = client
        .get("/api/v1/answers/history?startDate=2026-05-02&endDate=2026-05-01")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = client.get("/api/v1/answers/statistics").await;
    response.assert_status(StatusCode::OK);
    let statistics = response.data();
    assert_eq!(statistics["totalAnswered"], 2);
    assert_eq!(statistics["totalTimeSpent"], 125);
    assert_eq!(
        statistics["categoryStats"]["Computer Networks"]["totalAnswered"],
        2
    );
    assert_eq!(statistics["recentActivity"][0]["answersCount"], 2);

    let response = client.get("/api/v1/statistics/overview").await;
    response.assert_status(StatusCode::OK);
    let overview = response.data();
    assert_eq!(overview["totalAnswered"], 2);
    assert_eq!(overview["scoredAnswers"], 1);
    assert_eq!(overview["currentStreak"], 1);

    let response = client.get("/api/v1/statistics/progress?days=7").await;
    response.assert_status(StatusCode::OK);
    let progress = response.data();
    let points = progress.as_array().expect("points");
    assert_eq!(points.len(), 7);
    assert_eq!(points[6]["cumulativeAnswered"], 2);

    let response = client.get("/api/v1/statistics/activity?days=3").await;
    response.assert_status(StatusCode::OK);
    let activity = response.data();
    assert_eq!(activity["activeDays"], 1);
    assert_eq!(activity["longestStreak"], 1);

    let response = client.get("/api/v1/statistics/category").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()[0]["category"], "Computer Networks");

    db::delete_user_by_email(&pool, data["user"]["email"].as_str().expect("email"))
        .await
        .expect("cleanup");
}

#[tokio::test]
async fn test_answers_are_private() {
    let Some(state) = database_state().await else {
        return;
    };
    let pool = state.pool.clone();
    let client = TestClient::new(app(state));
    let (alice, alice_data) = register_user(&client, "alice").await;
    let (bob, bob_data) = register_user(&client, "bob").await;

    let question = handshake_question(&alice).await;
    let response = alice
        .post_json(
            "/api/v1/answers",
            &json!({"questionId": question["id"], "answerText": "SYN, SYN-ACK, ACK", "timeSpent": 1}),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let answer_id = response.data()["id"].as_str().expect("id").to_string();

    let response = bob
        .post(&format!("/api/v1/answers/{answer_id}/ai-score"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = bob.get("/api/v1/answers/history").await;
    assert_eq!(response.data()["total"], 0);

    for data in [alice_data, bob_data] {
        db::delete_user_by_email(&pool, data["user"]["email"].as_str().expect("email"))
            .await
            .expect("cleanup");
    }
}

#[tokio::test]
async fn test_resume_upload() {
    let Some(state) = database_state().await else {
        return;
    };
    let pool = state.pool.clone();
    let client = TestClient::new(app(state));
    let (client, data) = register_user(&client, "resume").await;

    let response = client
        .post_multipart(
            "/api/v1/upload/resume",
            Some(("cv.pdf", "application/pdf", b"%PDF-1.4\n% test resume\n".as_slice())),
            &[],
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let resume = response.data();
    assert_eq!(resume["fileName"], "cv.pdf");
    assert_eq!(resume["contentType"], "application/pdf");
    assert_eq!(resume["size"], 23);

    let response = client
        .post_multipart("/api/v1/upload/resume", None, &[("note", "no file")])
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    db::delete_user_by_email(&pool, data["user"]["email"].as_str().expect("email"))
        .await
        .expect("cleanup");
}
