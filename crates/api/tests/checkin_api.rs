mod common;

use chrono::Days;
use reqwest::StatusCode;
use serde_json::{json, Value};
use sqlx::types::Uuid;

use hotwheels_common::utc_today;
use hotwheels_runtime::{Badge, CheckinRecord, LedgerStore, BACKFILL_LIMIT_DAYS};

use common::TestApp;

#[tokio::test]
async fn requests_without_valid_credentials_are_rejected() -> anyhow::Result<()> {
    let app = TestApp::spawn(true).await?;
    let user = Uuid::new_v4();

    let response = app.http.get(app.url("/api/checkin")).send().await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>().await?["error"], "unauthorized");

    let response = app.http.post(app.url("/api/checkin")).bearer_auth("not-a-token").send().await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.http
        .post(app.url("/api/checkin"))
        .header("authorization", app.token_for(user)?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(app.store.count_checkins(user).await?, 0);
    Ok(())
}

#[tokio::test]
async fn status_is_read_only() -> anyhow::Result<()> {
    let app = TestApp::spawn(false).await?;
    let user = Uuid::new_v4();
    app.store.insert_badge(Badge::new("Starter", "First day", 1, "common")).await?;

    let first: Value = app.get_as(user, "/api/checkin")?.send().await?.json().await?;
    let second: Value = app.get_as(user, "/api/checkin")?.send().await?.json().await?;

    assert_eq!(first, second);
    assert_eq!(first["total_checkins"], 0);
    assert_eq!(first["current_level"], 0);
    assert_eq!(first["next_badge_level"], 1);
    assert_eq!(first["all_badges"].as_array().map(Vec::len), Some(1));
    assert_eq!(app.store.count_checkins(user).await?, 0);
    Ok(())
}

#[tokio::test]
async fn first_checkin_awards_the_level_one_badge() -> anyhow::Result<()> {
    let app = TestApp::spawn(false).await?;
    let user = Uuid::new_v4();
    let badge = app.store.insert_badge(Badge::new("Starter", "First day", 1, "common")).await?;

    let response = app.post_as(user, "/api/checkin")?.send().await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["level"], 1);
    assert_eq!(body["total_checkins"], 1);
    assert_eq!(body["badge_awarded"], true);
    assert_eq!(body["new_badge"]["id"], badge.id.to_string());
    assert_eq!(body["checkin"]["checkin_date"], utc_today().to_string());

    let status: Value = app.get_as(user, "/api/checkin")?.send().await?.json().await?;
    assert_eq!(status["user_badges"][0]["badge_id"], badge.id.to_string());
    Ok(())
}

#[tokio::test]
async fn second_checkin_on_the_same_day_is_rejected() -> anyhow::Result<()> {
    let app = TestApp::spawn(false).await?;
    let user = Uuid::new_v4();

    assert_eq!(app.post_as(user, "/api/checkin")?.send().await?.status(), StatusCode::CREATED);

    let response = app.post_as(user, "/api/checkin")?.send().await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["checkin"]["level"], 1);
    assert!(body["error"].is_string());

    assert_eq!(app.store.count_checkins(user).await?, 1);
    Ok(())
}

#[tokio::test]
async fn level_follows_the_number_of_days() -> anyhow::Result<()> {
    let app = TestApp::spawn(false).await?;
    let user = Uuid::new_v4();
    let today = utc_today();

    for (level, back) in (1..=4).zip((1..=4u64).rev()) {
        let date = today.checked_sub_days(Days::new(back)).unwrap();
        app.store.insert_checkin(CheckinRecord::new(user, date, level, None)).await?;
    }

    let body: Value = app.post_as(user, "/api/checkin")?.send().await?.json().await?;
    assert_eq!(body["level"], 5);
    assert_eq!(body["total_checkins"], 5);
    assert_eq!(body["badge_awarded"], false);

    let status: Value = app.get_as(user, "/api/checkin")?.send().await?.json().await?;
    assert_eq!(status["current_level"], 5);
    assert_eq!(status["checkins"].as_array().map(Vec::len), Some(5));
    Ok(())
}

#[tokio::test]
async fn forced_checkins_walk_back_one_day_each() -> anyhow::Result<()> {
    let app = TestApp::spawn(true).await?;
    let user = Uuid::new_v4();

    let mut dates = Vec::new();
    for expected_level in 1..=3 {
        let response = app.post_as(user, "/api/checkin")?.json(&json!({ "force": true })).send().await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await?;
        assert_eq!(body["level"], expected_level);
        dates.push(body["checkin"]["checkin_date"].as_str().unwrap_or_default().to_string());
    }

    let today = utc_today();
    let expected: Vec<String> = (0..3u64)
        .map(|back| today.checked_sub_days(Days::new(back)).unwrap().to_string())
        .collect();
    assert_eq!(dates, expected);
    Ok(())
}

#[tokio::test]
async fn forced_checkins_need_to_be_enabled() -> anyhow::Result<()> {
    let app = TestApp::spawn(false).await?;
    let user = Uuid::new_v4();

    let response = app.post_as(user, "/api/checkin")?.json(&json!({ "force": true })).send().await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.store.count_checkins(user).await?, 0);
    Ok(())
}

#[tokio::test]
async fn malformed_body_means_a_normal_checkin() -> anyhow::Result<()> {
    let app = TestApp::spawn(false).await?;
    let user = Uuid::new_v4();

    let response = app.post_as(user, "/api/checkin")?
        .header("content-type", "application/json")
        .body("{force: yes")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn storage_failure_is_a_server_error() -> anyhow::Result<()> {
    let app = TestApp::spawn(false).await?;
    let user = Uuid::new_v4();
    app.store.fail_checkin_inserts(true);

    let response = app.post_as(user, "/api/checkin")?.send().await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await?;
    let fields: Vec<&String> = body.as_object().map(|o| o.keys().collect()).unwrap_or_default();
    assert_eq!(fields, vec!["error"]);
    assert!(body["error"].is_string());
    assert_eq!(app.store.count_checkins(user).await?, 0);
    Ok(())
}

#[tokio::test]
async fn exhausted_backfill_is_a_bad_request() -> anyhow::Result<()> {
    let app = TestApp::spawn(true).await?;
    let user = Uuid::new_v4();
    let today = utc_today();

    for (i, back) in (500..=BACKFILL_LIMIT_DAYS).rev().enumerate() {
        let date = today.checked_sub_days(Days::new(back)).unwrap();
        app.store.insert_checkin(CheckinRecord::new(user, date, i as i32 + 1, None)).await?;
    }
    let before = app.store.count_checkins(user).await?;

    let response = app.post_as(user, "/api/checkin")?.json(&json!({ "force": true })).send().await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>().await?["error"].is_string());
    assert_eq!(app.store.count_checkins(user).await?, before);
    Ok(())
}
