use serde_json::json;

use crate::helpers::{create_newsletter_with, random_id, TestApp};

#[tokio::test]
async fn stats_require_the_admin_token() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .api_client
        .get(format!("{}/admin/stats", test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn stats_reflect_newsletters_and_subscribers() {
    let test_app = TestApp::spawn_app().await;

    create_newsletter_with(
        &test_app,
        json!({ "title": "Public", "content": "#", "published": true }),
    )
    .await;
    create_newsletter_with(&test_app, json!({ "title": "Draft", "content": "#" })).await;

    test_app
        .post_subscription(json!({ "email": "a@b.com" }))
        .await;
    test_app
        .post_subscription(json!({ "email": "c@d.com" }))
        .await;
    test_app.post_unsubscribe(json!({ "email": "c@d.com" })).await;

    let stats: serde_json::Value = test_app
        .get_stats()
        .await
        .json()
        .await
        .expect("Failed to parse the stats response.");

    assert_eq!(stats["totalNewsletters"], 2);
    assert_eq!(stats["published"], 1);
    assert_eq!(stats["drafts"], 1);
    assert_eq!(stats["totalSubscribers"], 2);
    assert_eq!(stats["activeSubscribers"], 1);
}

#[tokio::test]
async fn deleting_a_subscriber_requires_the_admin_token() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .api_client
        .delete(format!("{}/subscribers/{}", test_app.address, random_id()))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn deleting_an_unknown_subscriber_returns_404() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.delete_subscriber(&random_id()).await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn a_deleted_subscriber_can_resubscribe_as_a_new_record() {
    let test_app = TestApp::spawn_app().await;

    test_app
        .post_subscription(json!({ "email": "x@y.com" }))
        .await;
    let subscribers: Vec<serde_json::Value> = test_app
        .get_subscribers()
        .await
        .json()
        .await
        .expect("Failed to parse the subscribers response.");
    let original_id = subscribers[0]["id"].as_str().unwrap().to_string();

    let response = test_app.delete_subscriber(&original_id).await;
    assert_eq!(200, response.status().as_u16());

    let subscribers: Vec<serde_json::Value> = test_app
        .get_subscribers()
        .await
        .json()
        .await
        .expect("Failed to parse the subscribers response.");
    assert!(subscribers.is_empty());

    // Hard delete means the next subscribe starts from scratch.
    let response = test_app
        .post_subscription(json!({ "email": "x@y.com" }))
        .await;
    assert_eq!(201, response.status().as_u16());

    let subscribers: Vec<serde_json::Value> = test_app
        .get_subscribers()
        .await
        .json()
        .await
        .expect("Failed to parse the subscribers response.");
    assert_eq!(subscribers.len(), 1);
    assert_ne!(subscribers[0]["id"].as_str().unwrap(), original_id);
}
