use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn unsubscribe_returns_200_and_deactivates_the_subscriber() {
    let test_app = TestApp::spawn_app().await;
    test_app
        .post_subscription(json!({ "email": "a@b.com" }))
        .await;

    let response = test_app.post_unsubscribe(json!({ "email": "a@b.com" })).await;
    assert_eq!(200, response.status().as_u16());

    let subscribers: Vec<serde_json::Value> = test_app
        .get_subscribers()
        .await
        .json()
        .await
        .expect("Failed to parse the subscribers response.");

    // Deactivated, not deleted.
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0]["active"], false);
    assert!(!subscribers[0]["unsubscribedAt"].is_null());
}

#[tokio::test]
async fn unsubscribe_of_unknown_email_returns_404() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .post_unsubscribe(json!({ "email": "ghost@test.com" }))
        .await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn unsubscribe_returns_400_when_the_email_is_invalid() {
    let test_app = TestApp::spawn_app().await;

    let test_cases = vec![
        (json!({ "email": "not-an-email" }), "malformed email"),
        (json!({}), "missing email field"),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_unsubscribe(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn unsubscribing_twice_is_idempotent() {
    let test_app = TestApp::spawn_app().await;
    test_app
        .post_subscription(json!({ "email": "a@b.com" }))
        .await;

    let first = test_app.post_unsubscribe(json!({ "email": "a@b.com" })).await;
    let second = test_app.post_unsubscribe(json!({ "email": "a@b.com" })).await;

    // Leaving twice is still a success, never an error.
    assert_eq!(200, first.status().as_u16());
    assert_eq!(200, second.status().as_u16());
}
