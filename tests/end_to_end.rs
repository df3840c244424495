mod common;

use chrono::Duration;
use iptv_source_cache::{
    errors::AppError,
    models::{LogLevel, SourceCreateRequest},
};
use tokio_test::assert_ok;

use common::test_app;

#[tokio::test]
async fn test_add_then_scheduled_refresh_fills_cache() {
    let app = test_app();
    assert!(app.service.list_sources().await.unwrap().is_empty());

    assert_ok!(
        app.service
            .add_source(SourceCreateRequest::new(
                "news",
                "http://example.com/news.m3u",
                "m3u",
            ))
            .await
    );

    let listed = app.service.list_sources().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].directory_name, "news");
    assert!(listed[0].last_updated.is_none());

    let body = "#EXTM3U\n#EXTINF:-1,News One\nhttp://stream.example.com/1.ts\n";
    app.fetcher.respond("http://example.com/news.m3u", 200, body);

    let summary = app.service.run_scheduled_batch().await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.succeeded, 1);

    assert_eq!(app.service.cached_content("news").await.unwrap(), body);
    let listed = app.service.list_sources().await.unwrap();
    assert_eq!(listed[0].last_updated, Some(summary.started_at));
}

#[tokio::test]
async fn test_login_validate_logout() {
    let app = test_app();

    let session_id = app
        .service
        .login("admin", "admin123", Some("agentX"))
        .await
        .unwrap();
    assert_eq!(
        app.service.validate_session(&session_id).await.unwrap(),
        "admin"
    );

    app.service.logout(&session_id).await.unwrap();
    assert!(matches!(
        app.service.validate_session(&session_id).await,
        Err(AppError::InvalidSession)
    ));
}

#[tokio::test]
async fn test_session_slides_with_use() {
    let app = test_app();
    let session_id = app.service.login("admin", "admin123", None).await.unwrap();

    app.clock.advance(Duration::days(6));
    assert_ok!(app.service.validate_session(&session_id).await);
    app.clock.advance(Duration::days(6));
    assert_ok!(app.service.validate_session(&session_id).await);

    app.clock.advance(Duration::days(8));
    assert!(app.service.validate_session(&session_id).await.is_err());
}

#[tokio::test]
async fn test_unreachable_source_is_logged_once() {
    let app = test_app();
    app.service
        .add_source(SourceCreateRequest::new(
            "dead",
            "http://unreachable.invalid/list.m3u",
            "m3u",
        ))
        .await
        .unwrap();

    let summary = app.service.run_scheduled_batch().await.unwrap();
    assert_eq!(summary.failed, 1);

    let errors: Vec<_> = app
        .service
        .recent_logs()
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.level == LogLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("dead"));
    assert!(app.service.list_sources().await.unwrap()[0]
        .last_updated
        .is_none());
}

#[tokio::test]
async fn test_refresh_one_completes_in_background() {
    let app = test_app();
    app.service
        .add_source(SourceCreateRequest::new(
            "sports",
            "http://example.com/sports.m3u8",
            "m3u8",
        ))
        .await
        .unwrap();
    app.fetcher
        .respond("http://example.com/sports.m3u8", 200, "#EXTM3U sports");

    app.service.refresh_one("sports").await.unwrap();

    let mut refreshed = false;
    for _ in 0..100 {
        if app.service.cached_content("sports").await.is_ok() {
            refreshed = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(refreshed, "background refresh never completed");
}
