// argo-watcher API client
//
// Thin wrapper over a shared reqwest connection pool. One GET per call, no
// retries; failures come back as typed `ArgoError`s.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{ArgoError, Result};

pub const TASKS_PATH: &str = "/api/v1/tasks";
pub const HEALTH_PATH: &str = "/healthz";

/// A container image deployed by a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub image: String,
    pub tag: String,
}

/// A deployment task as reported by argo-watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub app: String,
    pub author: String,
    pub project: String,
    pub images: Vec<Image>,
    pub status: String,
    pub created: f64,
    pub updated: f64,
    #[serde(default)]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub timeout: Option<i64>,
}

/// Query string for `GET /api/v1/tasks`. `None` values are left out, empty
/// strings are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskQuery<'a> {
    pub from_timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<&'a str>,
}

/// Source of deployment records. Implemented by the HTTP client; the tool
/// layer and readiness probe only see this trait.
#[async_trait]
pub trait DeploymentSource: Send + Sync {
    /// Succeeds iff the downstream health endpoint answers 2xx.
    async fn check_health(&self) -> Result<()>;

    /// Fetch tasks in `[from_timestamp, to_timestamp)`, optionally filtered by app.
    async fn get_tasks(
        &self,
        from_timestamp: i64,
        to_timestamp: Option<i64>,
        app: Option<&str>,
    ) -> Result<Vec<Task>>;
}

/// HTTP client for the argo-watcher API
#[derive(Debug, Clone)]
pub struct ArgoWatcherClient {
    client: Client,
    base_url: String,
}

impl ArgoWatcherClient {
    /// Wrap an existing connection pool.
    pub fn new(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the shared connection pool from service configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ArgoError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::new(&config.argo_watcher_url, client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("❌ argo-watcher returned {}: {}", status, body);
        Err(ArgoError::HttpStatus {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DeploymentSource for ArgoWatcherClient {
    async fn check_health(&self) -> Result<()> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        debug!("Checking argo-watcher health at {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ArgoError::Transport(e.to_string()))?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn get_tasks(
        &self,
        from_timestamp: i64,
        to_timestamp: Option<i64>,
        app: Option<&str>,
    ) -> Result<Vec<Task>> {
        let url = format!("{}{}", self.base_url, TASKS_PATH);
        let query = TaskQuery {
            from_timestamp,
            to_timestamp,
            app,
        };
        debug!("🌐 GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ArgoError::Transport(e.to_string()))?;

        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;

        parse_tasks(&body)
    }
}

/// Parse a `{"tasks": [...]}` envelope. A missing `tasks` key is an empty
/// list; anything else that does not fit fails the whole batch.
pub fn parse_tasks(body: &str) -> Result<Vec<Task>> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| ArgoError::Validation(format!("Response is not valid JSON: {}", e)))?;

    let object = envelope
        .as_object()
        .ok_or_else(|| ArgoError::Validation("Response is not a JSON object".to_string()))?;

    let items = match object.get("tasks") {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ArgoError::Validation(format!(
                "'tasks' must be an array, got {}",
                json_type_name(other)
            )))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Task::deserialize(item)
                .map_err(|e| ArgoError::Validation(format!("Invalid task at index {}: {}", index, e)))
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{RawQuery, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    #[derive(Clone)]
    struct MockArgo {
        status: StatusCode,
        body: String,
        queries: Arc<Mutex<Vec<Option<String>>>>,
    }

    async fn tasks_handler(
        State(mock): State<MockArgo>,
        RawQuery(query): RawQuery,
    ) -> (StatusCode, String) {
        mock.queries.lock().unwrap().push(query);
        (mock.status, mock.body.clone())
    }

    async fn health_handler(State(mock): State<MockArgo>) -> (StatusCode, String) {
        (mock.status, mock.body.clone())
    }

    /// Serve a canned response on an ephemeral port and return the base URL.
    async fn spawn_mock(status: StatusCode, body: Value) -> (String, Arc<Mutex<Vec<Option<String>>>>) {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let mock = MockArgo {
            status,
            body: body.to_string(),
            queries: Arc::clone(&queries),
        };
        let app = Router::new()
            .route(TASKS_PATH, get(tasks_handler))
            .route(HEALTH_PATH, get(health_handler))
            .with_state(mock);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), queries)
    }

    /// A base URL nothing is listening on.
    async fn dead_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    fn full_task() -> Value {
        json!({
            "id": "1",
            "app": "app-1",
            "author": "tester",
            "project": "TestProject",
            "images": [{"image": "img", "tag": "v1"}],
            "status": "deployed",
            "created": 1.0,
            "updated": 2.0,
            "status_reason": "Success",
            "validated": true,
            "timeout": 600
        })
    }

    #[test]
    fn test_task_full_record() {
        let task: Task = serde_json::from_value(full_task()).unwrap();
        assert_eq!(task.id, "1");
        assert_eq!(
            task.images,
            vec![Image {
                image: "img".to_string(),
                tag: "v1".to_string()
            }]
        );
        assert!(task.validated);
        assert_eq!(task.status_reason.as_deref(), Some("Success"));
        assert_eq!(task.timeout, Some(600));
    }

    #[test]
    fn test_task_minimal_record_defaults() {
        let task: Task = serde_json::from_value(json!({
            "id": "minimal-id",
            "app": "test-app",
            "author": "tester",
            "project": "proj",
            "images": [],
            "status": "pending",
            "created": 1,
            "updated": 2.5
        }))
        .unwrap();
        assert!(!task.validated);
        assert_eq!(task.status_reason, None);
        assert_eq!(task.timeout, None);
        assert_eq!(task.created, 1.0);
    }

    #[test]
    fn test_task_missing_required_field_is_rejected() {
        let err = parse_tasks(&json!({"tasks": [{"id": "1", "author": "tester"}]}).to_string())
            .unwrap_err();
        assert!(matches!(err, ArgoError::Validation(_)));
    }

    #[test]
    fn test_one_bad_record_fails_the_batch() {
        let mut bad = full_task();
        bad["images"] = json!([{"image": "img"}]);
        let body = json!({"tasks": [full_task(), bad]}).to_string();

        match parse_tasks(&body) {
            Err(ArgoError::Validation(msg)) => assert!(msg.contains("index 1"), "{}", msg),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_tasks_envelopes() {
        assert!(parse_tasks(r#"{"tasks": []}"#).unwrap().is_empty());
        assert!(parse_tasks("{}").unwrap().is_empty());
        assert!(matches!(parse_tasks(r#"{"tasks": {}}"#), Err(ArgoError::Validation(_))));
        assert!(matches!(parse_tasks(r#"{"tasks": null}"#), Err(ArgoError::Validation(_))));
        assert!(matches!(parse_tasks("[]"), Err(ArgoError::Validation(_))));
        assert!(matches!(parse_tasks("<html>"), Err(ArgoError::Validation(_))));
    }

    #[test]
    fn test_query_serialization() {
        let cases = [
            (
                TaskQuery { from_timestamp: 123, to_timestamp: Some(456), app: Some("my-app") },
                "from_timestamp=123&to_timestamp=456&app=my-app",
            ),
            (
                TaskQuery { from_timestamp: 123, to_timestamp: None, app: Some("my-app") },
                "from_timestamp=123&app=my-app",
            ),
            (
                TaskQuery { from_timestamp: 123, to_timestamp: None, app: None },
                "from_timestamp=123",
            ),
            (
                TaskQuery { from_timestamp: 123, to_timestamp: None, app: Some("") },
                "from_timestamp=123&app=",
            ),
        ];

        for (query, expected) in cases {
            assert_eq!(serde_urlencoded::to_string(&query).unwrap(), expected);
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ArgoWatcherClient::new("http://argo/", Client::new());
        assert_eq!(client.base_url(), "http://argo");
    }

    #[tokio::test]
    async fn test_get_tasks_success() {
        let (base_url, _) = spawn_mock(StatusCode::OK, json!({"tasks": [full_task()]})).await;
        let client = ArgoWatcherClient::new(&base_url, Client::new());

        let tasks = client.get_tasks(0, None, None).await.unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].app, "app-1");
        assert!(tasks[0].validated);
        assert_eq!(tasks[0].timeout, Some(600));
    }

    #[tokio::test]
    async fn test_get_tasks_preserves_server_order() {
        let mut second = full_task();
        second["id"] = json!("2");
        let mut third = full_task();
        third["id"] = json!("0");
        let (base_url, _) =
            spawn_mock(StatusCode::OK, json!({"tasks": [full_task(), second, third]})).await;
        let client = ArgoWatcherClient::new(&base_url, Client::new());

        let ids: Vec<String> = client
            .get_tasks(0, None, None)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "0"]);
    }

    #[tokio::test]
    async fn test_get_tasks_sends_expected_query() {
        let (base_url, queries) = spawn_mock(StatusCode::OK, json!({"tasks": []})).await;
        let client = ArgoWatcherClient::new(&base_url, Client::new());

        client.get_tasks(123, Some(456), Some("my-app")).await.unwrap();
        client.get_tasks(123, None, Some("my-app")).await.unwrap();
        client.get_tasks(123, None, None).await.unwrap();
        client.get_tasks(123, None, Some("")).await.unwrap();

        let recorded = queries.lock().unwrap().clone();
        assert_eq!(
            recorded,
            vec![
                Some("from_timestamp=123&to_timestamp=456&app=my-app".to_string()),
                Some("from_timestamp=123&app=my-app".to_string()),
                Some("from_timestamp=123".to_string()),
                Some("from_timestamp=123&app=".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_tasks_missing_key_is_empty() {
        let (base_url, _) = spawn_mock(StatusCode::OK, json!({})).await;
        let client = ArgoWatcherClient::new(&base_url, Client::new());
        assert!(client.get_tasks(0, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_tasks_http_error() {
        let (base_url, _) =
            spawn_mock(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"})).await;
        let client = ArgoWatcherClient::new(&base_url, Client::new());

        match client.get_tasks(0, None, None).await {
            Err(ArgoError::HttpStatus { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_tasks_connection_failure() {
        let client = ArgoWatcherClient::new(&dead_url().await, Client::new());
        assert!(matches!(
            client.get_tasks(0, None, None).await,
            Err(ArgoError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_reqwest_error_maps_to_transport() {
        let err = Client::new().get(dead_url().await).send().await.unwrap_err();
        assert!(matches!(ArgoError::from(err), ArgoError::Transport(_)));
    }

    #[tokio::test]
    async fn test_check_health() {
        let (base_url, _) = spawn_mock(StatusCode::OK, json!({"status": "ok"})).await;
        let client = ArgoWatcherClient::new(&base_url, Client::new());
        client.check_health().await.unwrap();

        let (base_url, _) = spawn_mock(StatusCode::SERVICE_UNAVAILABLE, json!({})).await;
        let client = ArgoWatcherClient::new(&base_url, Client::new());
        assert!(matches!(
            client.check_health().await,
            Err(ArgoError::HttpStatus { status: 503, .. })
        ));

        let client = ArgoWatcherClient::new(&dead_url().await, Client::new());
        assert!(matches!(client.check_health().await, Err(ArgoError::Transport(_))));
    }
}
