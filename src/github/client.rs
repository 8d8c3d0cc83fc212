// GitHub API HTTP client.
// Fetches JSON documents by URL, tracking rate limits and mapping HTTP failures.

use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde_json::Value;

use crate::config::GitHubConfig;
use crate::error::{LazyOrgError, Result};

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Anything that can resolve a URL to a decoded JSON document.
#[async_trait]
pub trait JsonSource: Send {
    async fn get_json(&mut self, url: &str) -> Result<Value>;
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

/// GitHub API client with optional authentication and rate limit tracking.
pub struct GitHubClient {
    client: Client,
    rate_limit: RateLimit,
}

impl GitHubClient {
    /// Create a new GitHub client, authenticating when a token is given.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| LazyOrgError::Other(e.to_string()))?,
            );
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("lazyorg"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(LazyOrgError::Api)?;

        Ok(Self {
            client,
            rate_limit: RateLimit::default(),
        })
    }

    /// Create a client from the GitHub section of the configuration.
    pub fn from_config(config: &GitHubConfig) -> Result<Self> {
        Self::new(config.token.as_deref())
    }

    /// Get the current rate limit information.
    pub fn rate_limit(&self) -> &RateLimit {
        &self.rate_limit
    }

    /// Make a GET request to an absolute URL.
    pub async fn get(&mut self, url: &str) -> Result<Response> {
        log::debug!("GET {url}");
        let response = self.client.get(url).send().await.map_err(LazyOrgError::Api)?;

        self.update_rate_limit(&response);
        self.check_response(response).await
    }

    /// Fetch a URL and decode its body as JSON.
    pub async fn fetch(&mut self, url: &str) -> Result<Value> {
        let response = self.get(url).await?;
        let value: Value = response.json().await?;
        Ok(value)
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&mut self, response: &Response) {
        if let Some(limit) = header_u64(response, "x-ratelimit-limit") {
            self.rate_limit.limit = limit;
        }
        if let Some(remaining) = header_u64(response, "x-ratelimit-remaining") {
            self.rate_limit.remaining = remaining;
        }
        if let Some(reset) = header_u64(response, "x-ratelimit-reset") {
            self.rate_limit.reset = reset;
        }
        log::trace!(
            "rate limit {}/{} (reset {})",
            self.rate_limit.remaining,
            self.rate_limit.limit,
            self.rate_limit.reset
        );
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(LazyOrgError::Unauthorized),
            StatusCode::NOT_FOUND => {
                let url = response.url().to_string();
                Err(LazyOrgError::NotFound(url))
            }
            StatusCode::FORBIDDEN
                if header_u64(&response, "x-ratelimit-remaining") == Some(0) =>
            {
                Err(LazyOrgError::RateLimited {
                    reset_at: format_reset(self.rate_limit.reset),
                })
            }
            StatusCode::FORBIDDEN => Err(LazyOrgError::Other(format!(
                "Forbidden: {}",
                response.text().await.unwrap_or_default()
            ))),
            status => Err(LazyOrgError::Other(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            ))),
        }
    }
}

#[async_trait]
impl JsonSource for GitHubClient {
    async fn get_json(&mut self, url: &str) -> Result<Value> {
        self.fetch(url).await
    }
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Render a rate limit reset epoch as a wall-clock time.
fn format_reset(reset: u64) -> String {
    chrono::DateTime::from_timestamp(reset as i64, 0)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Render a raw HTTP/1.1 response with the given extra headers.
    fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut response = format!("HTTP/1.1 {}\r\n", status);
        for (name, value) in headers {
            response.push_str(&format!("{}: {}\r\n", name, value));
        }
        response.push_str(&format!(
            "content-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        ));
        response
    }

    /// Bind a local listener and return it with its base URL.
    async fn listen() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        (listener, base)
    }

    /// Answer one connection per canned response, in order.
    fn serve(listener: TcpListener, responses: Vec<String>) {
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });
    }

    async fn fetch_one(response: String) -> (GitHubClient, String, Result<Value>) {
        let (listener, base) = listen().await;
        serve(listener, vec![response]);
        let url = format!("{}/orgs/testorg", base);
        let mut client = GitHubClient::new(None).unwrap();
        let result = client.fetch(&url).await;
        (client, url, result)
    }

    #[test]
    fn test_new_with_and_without_token() {
        assert!(GitHubClient::new(None).is_ok());
        assert!(GitHubClient::new(Some("ghp_example")).is_ok());
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let result = GitHubClient::new(Some("bad\ntoken"));
        assert!(matches!(result, Err(LazyOrgError::Other(_))));
    }

    #[test]
    fn test_rate_limit_starts_empty() {
        let client = GitHubClient::new(None).unwrap();
        assert_eq!(client.rate_limit().limit, 0);
        assert_eq!(client.rate_limit().remaining, 0);
    }

    #[test]
    fn test_format_reset() {
        assert_eq!(format_reset(0), "00:00:00");
        assert_eq!(format_reset(3_661), "01:01:01");
    }

    #[tokio::test]
    async fn test_fetch_decodes_json_and_records_rate_limit() {
        let (client, _, result) = fetch_one(http_response(
            "200 OK",
            &[
                ("content-type", "application/json"),
                ("x-ratelimit-limit", "60"),
                ("x-ratelimit-remaining", "59"),
                ("x-ratelimit-reset", "1700000000"),
            ],
            r#"{"login": "testorg"}"#,
        ))
        .await;

        assert_eq!(result.unwrap(), serde_json::json!({"login": "testorg"}));
        assert_eq!(client.rate_limit().limit, 60);
        assert_eq!(client.rate_limit().remaining, 59);
        assert_eq!(client.rate_limit().reset, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (_, _, result) = fetch_one(http_response("401 Unauthorized", &[], "")).await;
        assert!(matches!(result, Err(LazyOrgError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_not_found_carries_url() {
        let (_, url, result) = fetch_one(http_response("404 Not Found", &[], "")).await;
        match result {
            Err(LazyOrgError::NotFound(found)) => assert_eq!(found, url),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forbidden_with_exhausted_quota_is_rate_limited() {
        let (_, _, result) = fetch_one(http_response(
            "403 Forbidden",
            &[
                ("x-ratelimit-limit", "60"),
                ("x-ratelimit-remaining", "0"),
                ("x-ratelimit-reset", "3661"),
            ],
            "",
        ))
        .await;

        match result {
            Err(LazyOrgError::RateLimited { reset_at }) => assert_eq!(reset_at, "01:01:01"),
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forbidden_without_rate_headers_is_other() {
        let (_, _, result) = fetch_one(http_response("403 Forbidden", &[], "banned")).await;
        match result {
            Err(LazyOrgError::Other(message)) => assert_eq!(message, "Forbidden: banned"),
            other => panic!("expected Other, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forbidden_with_quota_left_is_other() {
        let (_, _, result) = fetch_one(http_response(
            "403 Forbidden",
            &[("x-ratelimit-remaining", "12")],
            "nope",
        ))
        .await;
        assert!(matches!(result, Err(LazyOrgError::Other(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_other() {
        let (_, _, result) =
            fetch_one(http_response("500 Internal Server Error", &[], "boom")).await;
        match result {
            Err(LazyOrgError::Other(message)) => {
                assert!(message.starts_with("HTTP 500"));
                assert!(message.ends_with("boom"));
            }
            other => panic!("expected Other, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_api_error() {
        let (_, _, result) = fetch_one(http_response("200 OK", &[], "{nope")).await;
        let err = result.unwrap_err();
        assert!(matches!(err, LazyOrgError::Api(_)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_org_client_over_http() {
        let (listener, base) = listen().await;
        let repos_url = format!("{}/orgs/testorg/repos", base);
        serve(
            listener,
            vec![
                http_response(
                    "200 OK",
                    &[],
                    &serde_json::json!({"login": "testorg", "repos_url": repos_url}).to_string(),
                ),
                http_response(
                    "200 OK",
                    &[],
                    r#"[{"name": "r1", "license": {"key": "mit"}},
                        {"name": "r2", "license": {"key": "apache-2.0"}},
                        {"name": "r3"}]"#,
                ),
            ],
        );

        let client = GitHubClient::new(None).unwrap();
        let mut org = crate::github::OrgClient::new(client, &base, "testorg");

        // Both documents are served once; later reads come from the memo.
        assert_eq!(
            org.list_public_repos(None).await.unwrap(),
            vec!["r1", "r2", "r3"]
        );
        assert_eq!(
            org.list_public_repos(Some("apache-2.0")).await.unwrap(),
            vec!["r2"]
        );
    }
}
