//! reqwest-backed implementation of [`AdminApi`].

use std::env;

use anyhow::{Context, Result};
use async_trait::async_trait;
use flytedeck_types::{
    Execution, ExecutionCreateRequest, ExecutionData, ExecutionTerminateRequest, Identifier, IdentifierScope, LaunchPlan,
    NodeExecution, NodeExecutionIdentifier, PaginatedEntities, RequestConfig, TaskExecution, TaskExecutionIdentifier, Workflow,
    WorkflowExecutionIdentifier,
};
use flytedeck_util::ConsoleConfig;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{AdminApi, error::ApiError};

/// Hostnames allowed to use plain HTTP.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];
const API_PREFIX: &str = "/api/v1";

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'%').add(b'/').add(b'?').add(b'`');

/// Thin wrapper around a configured `reqwest::Client` for admin API access.
#[derive(Debug, Clone)]
pub struct AdminClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl AdminClient {
    /// Build a client from resolved console configuration.
    ///
    /// Non-localhost hosts must use HTTPS.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self> {
        validate_base_url(&config.admin_api_base)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(config.request_timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url: config.admin_api_base.trim_end_matches('/').to_string(),
            http,
            user_agent: format!("flytedeck/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Build a request for an API-relative path such as `/workflows/p/d/n`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, path);
        debug!(%url, %method, "building request");

        self.http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent)
    }

    async fn send_json(&self, path: &str, builder: RequestBuilder) -> Result<Value> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("network error requesting {path}"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("read response body from {path}"))?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound { path: path.to_string() }.into());
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }
        debug!(path, status = status.as_u16(), bytes = text.len(), "admin response received");
        serde_json::from_str(&text).with_context(|| format!("invalid JSON from {path}"))
    }

    async fn get_entity<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.send_json(path, self.request(Method::GET, path)).await?;
        serde_json::from_value(value).with_context(|| format!("unexpected response shape from {path}"))
    }

    async fn list_entities<T: DeserializeOwned>(
        &self,
        path: &str,
        entity_field: &'static str,
        config: &RequestConfig,
    ) -> Result<PaginatedEntities<T>> {
        let builder = self.request(Method::GET, path).query(&list_query(config));
        let mut value = self.send_json(path, builder).await?;

        let entities = match value.get_mut(entity_field).map(Value::take) {
            Some(Value::Null) | None => Vec::new(),
            Some(raw) => serde_json::from_value(raw).with_context(|| format!("unexpected '{entity_field}' shape from {path}"))?,
        };
        let token = value
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        Ok(PaginatedEntities { entities, token })
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn list_workflows(&self, scope: &IdentifierScope, config: &RequestConfig) -> Result<PaginatedEntities<Workflow>> {
        self.list_entities(&scoped_path("workflows", scope), "workflows", config).await
    }

    async fn get_workflow(&self, id: &Identifier) -> Result<Workflow> {
        self.get_entity(&identifier_path("workflows", id)).await
    }

    async fn list_launch_plans(&self, scope: &IdentifierScope, config: &RequestConfig) -> Result<PaginatedEntities<LaunchPlan>> {
        self.list_entities(&scoped_path("launch_plans", scope), "launchPlans", config).await
    }

    async fn get_launch_plan(&self, id: &Identifier) -> Result<LaunchPlan> {
        self.get_entity(&identifier_path("launch_plans", id)).await
    }

    async fn get_execution(&self, id: &WorkflowExecutionIdentifier) -> Result<Execution> {
        self.get_entity(&execution_path("executions", id)).await
    }

    async fn list_executions(&self, scope: &IdentifierScope, config: &RequestConfig) -> Result<PaginatedEntities<Execution>> {
        self.list_entities(&scoped_path("executions", scope), "executions", config).await
    }

    async fn list_node_executions(
        &self,
        id: &WorkflowExecutionIdentifier,
        config: &RequestConfig,
    ) -> Result<PaginatedEntities<NodeExecution>> {
        self.list_entities(&execution_path("node_executions", id), "nodeExecutions", config)
            .await
    }

    async fn list_task_executions(
        &self,
        id: &NodeExecutionIdentifier,
        config: &RequestConfig,
    ) -> Result<PaginatedEntities<TaskExecution>> {
        self.list_entities(&node_execution_path("task_executions", id), "taskExecutions", config)
            .await
    }

    async fn create_execution(&self, request: &ExecutionCreateRequest) -> Result<WorkflowExecutionIdentifier> {
        let path = "/executions";
        let builder = self.request(Method::POST, path).json(request);
        let mut value = self.send_json(path, builder).await?;
        let id = value
            .get_mut("id")
            .map(Value::take)
            .ok_or_else(|| ApiError::MissingField {
                path: path.to_string(),
                field: "id",
            })?;
        serde_json::from_value(id).context("unexpected execution id shape")
    }

    async fn terminate_execution(&self, id: &WorkflowExecutionIdentifier, cause: &str) -> Result<()> {
        let path = execution_path("executions", id);
        let request = ExecutionTerminateRequest {
            id: id.clone(),
            cause: cause.to_string(),
        };
        let builder = self.request(Method::DELETE, &path).json(&request);
        self.send_json(&path, builder).await?;
        Ok(())
    }

    async fn get_execution_data(&self, id: &WorkflowExecutionIdentifier) -> Result<ExecutionData> {
        self.get_entity(&execution_path("data/executions", id)).await
    }

    async fn get_node_execution_data(&self, id: &NodeExecutionIdentifier) -> Result<ExecutionData> {
        self.get_entity(&node_execution_path("data/node_executions", id)).await
    }

    async fn get_task_execution_data(&self, id: &TaskExecutionIdentifier) -> Result<ExecutionData> {
        let path = format!(
            "{}/{}/{}/{}/{}/{}",
            node_execution_path("data/task_executions", &id.node_execution_id),
            encode_segment(&id.task_id.project),
            encode_segment(&id.task_id.domain),
            encode_segment(&id.task_id.name),
            encode_segment(&id.task_id.version),
            id.retry_attempt
        );
        self.get_entity(&path).await
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

fn scoped_path(prefix: &str, scope: &IdentifierScope) -> String {
    let segments: Vec<String> = scope.segments().into_iter().map(encode_segment).collect();
    format!("/{}/{}", prefix, segments.join("/"))
}

fn identifier_path(prefix: &str, id: &Identifier) -> String {
    format!(
        "/{}/{}/{}/{}/{}",
        prefix,
        encode_segment(&id.project),
        encode_segment(&id.domain),
        encode_segment(&id.name),
        encode_segment(&id.version)
    )
}

fn execution_path(prefix: &str, id: &WorkflowExecutionIdentifier) -> String {
    format!(
        "/{}/{}/{}/{}",
        prefix,
        encode_segment(&id.project),
        encode_segment(&id.domain),
        encode_segment(&id.name)
    )
}

fn node_execution_path(prefix: &str, id: &NodeExecutionIdentifier) -> String {
    format!("{}/{}", execution_path(prefix, &id.execution_id), encode_segment(&id.node_id))
}

fn list_query(config: &RequestConfig) -> Vec<(&'static str, String)> {
    let mut query = vec![("limit", config.limit.to_string())];
    if let Some(token) = config.token.as_deref().filter(|token| !token.is_empty()) {
        query.push(("token", token.to_string()));
    }
    if let Some(sort) = &config.sort {
        query.push(("sort_by.key", sort.key.clone()));
        query.push(("sort_by.direction", sort.direction.as_query_value().to_string()));
    }
    if let Some(filter) = &config.filter {
        query.push(("filters", filter.clone()));
    }
    query
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
fn validate_base_url(base: &str) -> Result<(), ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };
    let parsed_base_url = Url::parse(base).map_err(|error| invalid(error.to_string()))?;
    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| invalid("URL must include a host".into()))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(invalid(format!(
            "non-localhost hosts must use https; got '{}://'",
            parsed_base_url.scheme()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flytedeck_types::{ResourceType, Sort, sort_fields};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        task::JoinHandle,
    };

    #[test]
    fn validates_base_urls() {
        assert!(validate_base_url("http://localhost:30081").is_ok());
        assert!(validate_base_url("http://127.0.0.1").is_ok());
        assert!(validate_base_url("https://admin.example.com").is_ok());
        assert!(matches!(
            validate_base_url("http://admin.example.com"),
            Err(ApiError::InvalidBaseUrl { .. })
        ));
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn builds_paths_with_encoded_segments() {
        let id = Identifier::new(ResourceType::Workflow, "flyte", "development", "my wf", "v/1");
        assert_eq!(identifier_path("workflows", &id), "/workflows/flyte/development/my%20wf/v%2F1");

        let scope = IdentifierScope::from(&id.named_entity());
        assert_eq!(scoped_path("launch_plans", &scope), "/launch_plans/flyte/development/my%20wf");
    }

    #[test]
    fn list_query_includes_sort_and_token() {
        let config = RequestConfig::with_limit(50)
            .sorted(Sort::ascending(sort_fields::CREATED_AT))
            .with_token(Some("abc".into()));
        let query = list_query(&config);
        assert!(query.contains(&("limit", "50".to_string())));
        assert!(query.contains(&("token", "abc".to_string())));
        assert!(query.contains(&("sort_by.key", "created_at".to_string())));
        assert!(query.contains(&("sort_by.direction", "ASCENDING".to_string())));
    }

    /// Accept one connection, capture the full request, answer with `response`, then close.
    async fn serve_once(response: &'static [u8]) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let address = listener.local_addr().expect("listener address");
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept connection");
            let request = read_request(&mut socket).await;
            socket.write_all(response).await.expect("write response");
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{address}"), server)
    }

    async fn read_request(socket: &mut TcpStream) -> Vec<u8> {
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let read = socket.read(&mut chunk).await.expect("read request");
            request.extend_from_slice(&chunk[..read]);
            if read == 0 || request_complete(&request) {
                return request;
            }
        }
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    fn client_for(base: String) -> AdminClient {
        let config = ConsoleConfig {
            admin_api_base: base,
            ..ConsoleConfig::default()
        };
        AdminClient::from_config(&config).expect("client for local base")
    }

    fn run_id() -> WorkflowExecutionIdentifier {
        WorkflowExecutionIdentifier {
            project: "flyte".into(),
            domain: "development".into(),
            name: "run-1".into(),
        }
    }

    #[tokio::test]
    async fn https_base_performs_tls_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let address = listener.local_addr().expect("listener address");
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept connection");
            let mut first = [0u8; 1];
            let read = socket.read(&mut first).await.expect("read client hello");
            (read, first[0])
        });

        let client = client_for(format!("https://{address}"));
        let error = client.get_execution(&run_id()).await.expect_err("server closes without answering");
        assert!(!format!("{error:#}").contains("scheme is not http"), "error: {error:#}");

        let (read, first_byte) = server.await.expect("server task");
        assert_eq!(read, 1);
        // TLS handshake record
        assert_eq!(first_byte, 0x16);
    }

    #[tokio::test]
    async fn truncated_body_is_reported_as_read_failure() {
        let (base, server) =
            serve_once(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 64\r\n\r\n{\"id\":").await;

        let error = client_for(base).get_execution(&run_id()).await.expect_err("body is cut short");
        let message = format!("{error:#}");
        assert!(message.contains("read response body from /executions/flyte/development/run-1"), "error: {message}");
        assert!(!message.contains("invalid JSON"));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn terminate_sends_delete_with_cause() {
        let (base, server) =
            serve_once(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}").await;

        client_for(base)
            .terminate_execution(&run_id(), "stopped by operator")
            .await
            .expect("terminate accepted");

        let request = server.await.expect("server task");
        assert!(request.starts_with("DELETE /api/v1/executions/flyte/development/run-1 "), "request: {request}");
        assert!(request.contains(r#""cause":"stopped by operator""#));
        assert!(request.contains(r#""name":"run-1""#));
    }

    #[tokio::test]
    async fn task_execution_data_uses_full_attempt_path() {
        let (base, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 56\r\n\r\n{\"inputs\":{\"url\":\"s3://b/in.pb\",\"bytes\":7},\"outputs\":{}}",
        )
        .await;
        let id = TaskExecutionIdentifier {
            task_id: Identifier::new(ResourceType::Task, "flyte", "development", "core.say_hello", "v1"),
            node_execution_id: NodeExecutionIdentifier {
                node_id: "n0".into(),
                execution_id: run_id(),
            },
            retry_attempt: 2,
        };

        let data = client_for(base).get_task_execution_data(&id).await.expect("execution data");
        assert_eq!(data.inputs.url, "s3://b/in.pb");
        assert_eq!(data.inputs.bytes, 7);

        let request = server.await.expect("server task");
        assert!(
            request.starts_with("GET /api/v1/data/task_executions/flyte/development/run-1/n0/flyte/development/core.say_hello/v1/2 "),
            "request: {request}"
        );
    }

    #[test]
    fn client_rejects_insecure_remote_base() {
        let config = ConsoleConfig {
            admin_api_base: "http://admin.example.com".into(),
            ..ConsoleConfig::default()
        };
        assert!(AdminClient::from_config(&config).is_err());
    }
}
