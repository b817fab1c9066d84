//! Test utilities for integration testing.

use crate::config::{Config, DatabaseConfig, PoolSettings};
use crate::db::handlers::{Repository, Segments};
use crate::db::models::segments::{SegmentCreateDBRequest, SegmentDBResponse};
use axum_test::TestServer;
use sqlx::PgPool;

/// Build the full router on top of a `#[sqlx::test]` pool
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig {
            // Unused: tests hand the application a ready pool
            url: "postgres://localhost/segments-test".to_string(),
            pool: PoolSettings {
                max_connections: 2,
                min_connections: 0,
                ..Default::default()
            },
        },
        ..Default::default()
    }
}

pub async fn create_test_segment(pool: &PgPool, title: &str, auto_user_pct: i16) -> SegmentDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut repo = Segments::new(&mut conn);

    repo.create(&SegmentCreateDBRequest {
        title: title.to_string(),
        description: format!("{title} segment"),
        auto_user_pct,
    })
    .await
    .expect("Failed to create test segment")
}
