//! Shared test harness: a per-test PostgreSQL schema and a router to
//! issue requests against.
//!
//! Tests are skipped when neither `TEST_DATABASE_URL` nor `DATABASE_URL`
//! is set, so the pure unit suite stays runnable without a database.

use anyhow::Context as _;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use hospital_api::{
    api::create_router,
    config::{Config, DatabaseConfig, LoggingConfig, ServerConfig},
    AppState,
};
use sqlx::Connection as _;
use tower::ServiceExt as _;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    schema: String,
    admin_database_url: String,
}

impl TestApp {
    /// Build an app over a fresh schema, or `None` when no database is
    /// configured.
    pub async fn new() -> anyhow::Result<Option<Self>> {
        let Some(admin_database_url) = test_database_url() else {
            eprintln!("TEST_DATABASE_URL not set; skipping database-backed test");
            return Ok(None);
        };

        let schema = format!("test_{}", Uuid::new_v4().simple());
        let mut admin_conn = sqlx::PgConnection::connect(&admin_database_url)
            .await
            .context("connect admin db for schema create")?;
        sqlx::query(&format!(r#"CREATE SCHEMA "{}""#, schema))
            .execute(&mut admin_conn)
            .await
            .context("create test schema")?;

        let config = Config {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: with_search_path(&admin_database_url, &schema)?,
                pool_min_size: 0,
                pool_max_size: 5,
                pool_timeout_seconds: 30,
                test_database_url: None,
            },
            logging: LoggingConfig::default(),
        };

        let state = AppState::new(config).await.context("init app state")?;
        let router = create_router(state.clone());

        Ok(Some(Self {
            router,
            state,
            schema,
            admin_database_url,
        }))
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, serde_json::Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value)?)
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body)?)
            .await
            .context("router request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok((status, headers, json))
    }

    /// Drop the per-test schema. Best-effort; a leaked schema only
    /// clutters the test database.
    pub async fn teardown(self) {
        if let Ok(mut conn) = sqlx::PgConnection::connect(&self.admin_database_url).await {
            let _ = sqlx::query(&format!(r#"DROP SCHEMA "{}" CASCADE"#, self.schema))
                .execute(&mut conn)
                .await;
        }
    }
}

fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

fn with_search_path(database_url: &str, schema: &str) -> anyhow::Result<String> {
    let mut url = url::Url::parse(database_url).context("parse database url")?;
    url.query_pairs_mut()
        .append_pair("options", &format!("-csearch_path={schema}"));
    Ok(url.to_string())
}
