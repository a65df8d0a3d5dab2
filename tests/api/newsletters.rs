use serde_json::json;

use crate::helpers::{create_newsletter_with, random_id, TestApp};

#[tokio::test]
async fn creating_a_newsletter_requires_the_admin_token() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .api_client
        .post(format!("{}/newsletters", test_app.address))
        .json(&json!({ "title": "Hello", "content": "Body" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn creating_a_newsletter_requires_title_and_content() {
    let test_app = TestApp::spawn_app().await;

    let test_cases = vec![
        (json!({ "content": "Body" }), "missing title"),
        (json!({ "title": "Hello" }), "missing content"),
        (json!({ "title": "", "content": "Body" }), "empty title"),
        (json!({ "title": "Hello", "content": "  " }), "blank content"),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_newsletter(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn a_created_newsletter_gets_a_slug_derived_from_its_title() {
    let test_app = TestApp::spawn_app().await;

    let newsletter = create_newsletter_with(
        &test_app,
        json!({ "title": "Hello World!", "content": "# Hi" }),
    )
    .await;

    assert_eq!(newsletter["slug"], "hello-world");
    assert_eq!(newsletter["category"], "update");
    assert_eq!(newsletter["published"], false);
    assert!(newsletter["publishedAt"].is_null());
}

#[tokio::test]
async fn two_newsletters_with_the_same_title_get_distinct_slugs() {
    let test_app = TestApp::spawn_app().await;

    let first = create_newsletter_with(
        &test_app,
        json!({ "title": "Hello World!", "content": "# Hi" }),
    )
    .await;
    let second = create_newsletter_with(
        &test_app,
        json!({ "title": "Hello World!", "content": "# Hi again" }),
    )
    .await;

    let first_slug = first["slug"].as_str().unwrap();
    let second_slug = second["slug"].as_str().unwrap();

    assert_eq!(first_slug, "hello-world");
    assert_ne!(first_slug, second_slug);
    // The second slug is the first plus a deterministic suffix.
    assert!(second_slug.starts_with("hello-world-"));
}

#[tokio::test]
async fn creating_as_published_stamps_the_publish_date() {
    let test_app = TestApp::spawn_app().await;

    let newsletter = create_newsletter_with(
        &test_app,
        json!({ "title": "Launch", "content": "# Hi", "published": true }),
    )
    .await;

    assert_eq!(newsletter["published"], true);
    assert!(!newsletter["publishedAt"].is_null());
}

#[tokio::test]
async fn publishing_then_editing_keeps_the_publish_date() {
    let test_app = TestApp::spawn_app().await;
    let draft = create_newsletter_with(
        &test_app,
        json!({ "title": "Launch", "content": "# Hi" }),
    )
    .await;
    let id = draft["id"].as_str().unwrap();

    let published: serde_json::Value = test_app
        .put_newsletter(id, json!({ "published": true }))
        .await
        .json()
        .await
        .expect("Failed to parse the update response.");
    let published_at = published["publishedAt"].clone();
    assert!(!published_at.is_null());

    // Editing the title regenerates the slug but must not move the date.
    let retitled: serde_json::Value = test_app
        .put_newsletter(id, json!({ "title": "Launch day" }))
        .await
        .json()
        .await
        .expect("Failed to parse the update response.");

    assert_eq!(retitled["slug"], "launch-day");
    assert_eq!(retitled["publishedAt"], published_at);
}

#[tokio::test]
async fn unpublishing_and_republishing_keep_the_original_publish_date() {
    let test_app = TestApp::spawn_app().await;
    let newsletter = create_newsletter_with(
        &test_app,
        json!({ "title": "Launch", "content": "# Hi", "published": true }),
    )
    .await;
    let id = newsletter["id"].as_str().unwrap();
    let original_published_at = newsletter["publishedAt"].clone();

    let unpublished: serde_json::Value = test_app
        .put_newsletter(id, json!({ "published": false }))
        .await
        .json()
        .await
        .expect("Failed to parse the update response.");
    assert_eq!(unpublished["published"], false);
    assert_eq!(unpublished["publishedAt"], original_published_at);

    let republished: serde_json::Value = test_app
        .put_newsletter(id, json!({ "published": true }))
        .await
        .json()
        .await
        .expect("Failed to parse the update response.");
    assert_eq!(republished["published"], true);
    assert_eq!(republished["publishedAt"], original_published_at);
}

#[tokio::test]
async fn a_partial_patch_leaves_omitted_fields_untouched() {
    let test_app = TestApp::spawn_app().await;
    let newsletter = create_newsletter_with(
        &test_app,
        json!({
            "title": "Hello",
            "content": "# Hi",
            "excerpt": "teaser",
            "tags": ["welcome", "launch"],
        }),
    )
    .await;
    let id = newsletter["id"].as_str().unwrap();

    let updated: serde_json::Value = test_app
        .put_newsletter(id, json!({ "pinned": true }))
        .await
        .json()
        .await
        .expect("Failed to parse the update response.");

    assert_eq!(updated["pinned"], true);
    assert_eq!(updated["title"], "Hello");
    assert_eq!(updated["excerpt"], "teaser");
    assert_eq!(updated["tags"], json!(["welcome", "launch"]));
}

#[tokio::test]
async fn an_explicit_null_clears_a_nullable_field() {
    let test_app = TestApp::spawn_app().await;
    let newsletter = create_newsletter_with(
        &test_app,
        json!({ "title": "Hello", "content": "# Hi", "excerpt": "teaser" }),
    )
    .await;
    let id = newsletter["id"].as_str().unwrap();

    let updated: serde_json::Value = test_app
        .put_newsletter(id, json!({ "excerpt": null }))
        .await
        .json()
        .await
        .expect("Failed to parse the update response.");

    assert!(updated["excerpt"].is_null());
}

#[tokio::test]
async fn anonymous_callers_only_see_published_newsletters() {
    let test_app = TestApp::spawn_app().await;
    create_newsletter_with(
        &test_app,
        json!({ "title": "Public", "content": "# Hi", "published": true }),
    )
    .await;
    create_newsletter_with(&test_app, json!({ "title": "Draft", "content": "# Hi" })).await;

    let public: serde_json::Value = test_app
        .get_newsletters("", false)
        .await
        .json()
        .await
        .expect("Failed to parse the list response.");
    assert_eq!(public["total"], 1);
    assert_eq!(public["newsletters"][0]["title"], "Public");

    let privileged: serde_json::Value = test_app
        .get_newsletters("", true)
        .await
        .json()
        .await
        .expect("Failed to parse the list response.");
    assert_eq!(privileged["total"], 2);
}

#[tokio::test]
async fn newsletters_are_ordered_pinned_first_then_by_publish_date() {
    let test_app = TestApp::spawn_app().await;

    // P1: pinned, published first (oldest date).
    let p1 = create_newsletter_with(
        &test_app,
        json!({ "title": "P1", "content": "#", "published": true, "pinned": true }),
    )
    .await;
    // P2: unpublished pin-less post published second (newer than P1).
    let p2 = create_newsletter_with(
        &test_app,
        json!({ "title": "P2", "content": "#", "published": true }),
    )
    .await;
    // P3: pinned, published last (newest date).
    let p3 = create_newsletter_with(
        &test_app,
        json!({ "title": "P3", "content": "#", "published": true, "pinned": true }),
    )
    .await;

    let page: serde_json::Value = test_app
        .get_newsletters("?published=true", true)
        .await
        .json()
        .await
        .expect("Failed to parse the list response.");

    let ids: Vec<&str> = page["newsletters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|newsletter| newsletter["id"].as_str().unwrap())
        .collect();

    assert_eq!(
        ids,
        vec![
            p3["id"].as_str().unwrap(),
            p1["id"].as_str().unwrap(),
            p2["id"].as_str().unwrap(),
        ]
    );
}

#[tokio::test]
async fn listing_paginates_with_total_pages() {
    let test_app = TestApp::spawn_app().await;
    for index in 0..3 {
        create_newsletter_with(
            &test_app,
            json!({ "title": format!("Post {}", index), "content": "#", "published": true }),
        )
        .await;
    }

    let first: serde_json::Value = test_app
        .get_newsletters("?page=1&limit=2", false)
        .await
        .json()
        .await
        .expect("Failed to parse the list response.");
    assert_eq!(first["newsletters"].as_array().unwrap().len(), 2);
    assert_eq!(first["total"], 3);
    assert_eq!(first["totalPages"], 2);
    assert_eq!(first["page"], 1);

    let second: serde_json::Value = test_app
        .get_newsletters("?page=2&limit=2", false)
        .await
        .json()
        .await
        .expect("Failed to parse the list response.");
    assert_eq!(second["newsletters"].as_array().unwrap().len(), 1);
    assert_eq!(second["page"], 2);
}

#[tokio::test]
async fn listing_filters_by_category() {
    let test_app = TestApp::spawn_app().await;
    create_newsletter_with(
        &test_app,
        json!({ "title": "Big news", "content": "#", "published": true, "category": "announcement" }),
    )
    .await;
    create_newsletter_with(
        &test_app,
        json!({ "title": "Weekly", "content": "#", "published": true }),
    )
    .await;

    let page: serde_json::Value = test_app
        .get_newsletters("?category=announcement", false)
        .await
        .json()
        .await
        .expect("Failed to parse the list response.");

    assert_eq!(page["total"], 1);
    assert_eq!(page["newsletters"][0]["title"], "Big news");
}

#[tokio::test]
async fn an_unknown_category_is_rejected() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.get_newsletters("?category=digest", false).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn getting_a_newsletter_includes_the_author_name() {
    let test_app = TestApp::spawn_app().await;
    let newsletter = create_newsletter_with(
        &test_app,
        json!({ "title": "Hello", "content": "# Hi" }),
    )
    .await;

    let fetched: serde_json::Value = test_app
        .get_newsletter(newsletter["id"].as_str().unwrap())
        .await
        .json()
        .await
        .expect("Failed to parse the newsletter response.");

    assert_eq!(fetched["title"], "Hello");
    assert_eq!(fetched["author"]["name"], "Admin");
}

#[tokio::test]
async fn getting_an_unknown_newsletter_returns_404() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.get_newsletter(&random_id()).await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn updating_requires_the_admin_token() {
    let test_app = TestApp::spawn_app().await;
    let newsletter = create_newsletter_with(
        &test_app,
        json!({ "title": "Hello", "content": "# Hi" }),
    )
    .await;

    let response = test_app
        .api_client
        .put(format!(
            "{}/newsletters/{}",
            test_app.address,
            newsletter["id"].as_str().unwrap()
        ))
        .json(&json!({ "pinned": true }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn updating_an_unknown_newsletter_returns_404() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .put_newsletter(&random_id(), json!({ "pinned": true }))
        .await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn deleting_a_newsletter_removes_it() {
    let test_app = TestApp::spawn_app().await;
    let newsletter = create_newsletter_with(
        &test_app,
        json!({ "title": "Hello", "content": "# Hi" }),
    )
    .await;
    let id = newsletter["id"].as_str().unwrap();

    let response = test_app.delete_newsletter(id).await;
    assert_eq!(200, response.status().as_u16());

    let response = test_app.get_newsletter(id).await;
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn deleting_an_unknown_newsletter_returns_404() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.delete_newsletter(&random_id()).await;

    assert_eq!(404, response.status().as_u16());
}
