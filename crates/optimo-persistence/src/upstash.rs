//! Upstash Redis REST backend.
//!
//! Each operation is one HTTP request: `POST <url>` with the Redis command
//! as a JSON array body and `Authorization: Bearer <token>`. Upstash answers
//! `{"result": ...}` on success and `{"error": "..."}` otherwise.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::error::{PersistenceError, Result};
use crate::kv::KvStore;

/// Environment variable for the REST endpoint.
pub const UPSTASH_URL_ENV: &str = "UPSTASH_REDIS_REST_URL";

/// Environment variable for the REST token.
pub const UPSTASH_TOKEN_ENV: &str = "UPSTASH_REDIS_REST_TOKEN";

#[derive(Debug, Deserialize)]
struct RestResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Redis over Upstash's REST API.
#[derive(Clone)]
pub struct UpstashStore {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl UpstashStore {
    /// Creates a store with a default HTTP client.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url, token)
    }

    /// Creates a store sharing an existing HTTP client (and its timeout).
    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    async fn command(&self, args: Vec<String>) -> Result<Value> {
        trace!(command = %args.first().map(String::as_str).unwrap_or(""), "Upstash request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&args)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_response(status.as_u16(), &body)
    }
}

/// Extracts `result` from a REST reply, mapping `error` and HTTP failures.
fn parse_response(status: u16, body: &str) -> Result<Value> {
    match serde_json::from_str::<RestResponse>(body) {
        Ok(RestResponse {
            error: Some(error), ..
        }) => Err(PersistenceError::Backend(error)),
        Ok(parsed) if (200..300).contains(&status) => Ok(parsed.result),
        _ => Err(PersistenceError::Backend(format!(
            "HTTP {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        ))),
    }
}

fn as_optional_string(value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Ok(Some(other.to_string())),
    }
}

fn as_integer(value: &Value) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| PersistenceError::InvalidData(format!("expected integer, got {}", value)))
}

fn as_string_array(value: Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(PersistenceError::InvalidData(format!(
                    "expected string member, got {}",
                    other
                ))),
            })
            .collect(),
        other => Err(PersistenceError::InvalidData(format!(
            "expected array, got {}",
            other
        ))),
    }
}

fn ttl_millis(ttl: Duration) -> String {
    ttl.as_millis().max(1).to_string()
}

fn cmd<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl KvStore for UpstashStore {
    fn name(&self) -> &'static str {
        "upstash"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        as_optional_string(self.command(cmd(["GET", key])).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut args = cmd(["SET", key, value]);
        if let Some(ttl) = ttl {
            args.push("PX".to_string());
            args.push(ttl_millis(ttl));
        }
        self.command(args).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let px = ttl_millis(ttl);
        let result = self
            .command(cmd(["SET", key, value, "NX", "PX", px.as_str()]))
            .await?;
        Ok(!result.is_null())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = self.command(cmd(["DEL", key])).await?;
        Ok(as_integer(&result)? > 0)
    }

    async fn push(&self, key: &str, value: &str) -> Result<u64> {
        let result = self.command(cmd(["RPUSH", key, value])).await?;
        Ok(as_integer(&result)?.max(0) as u64)
    }

    async fn list(&self, key: &str) -> Result<Vec<String>> {
        as_string_array(self.command(cmd(["LRANGE", key, "0", "-1"])).await?)
    }

    async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<()> {
        let score = score.to_string();
        self.command(cmd(["ZADD", key, score.as_str(), member]))
            .await?;
        Ok(())
    }

    async fn zrange_by_score(&self, key: &str, min: i64, max: i64) -> Result<Vec<String>> {
        let min = min.to_string();
        let max = max.to_string();
        as_string_array(
            self.command(cmd(["ZRANGEBYSCORE", key, min.as_str(), max.as_str()]))
                .await?,
        )
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        let result = self.command(cmd(["ZREM", key, member])).await?;
        Ok(as_integer(&result)? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let value = parse_response(200, r#"{"result":"OK"}"#).unwrap();
        assert_eq!(value, Value::String("OK".to_string()));
    }

    #[test]
    fn test_parse_null_result() {
        let value = parse_response(200, r#"{"result":null}"#).unwrap();
        assert!(value.is_null());
        assert_eq!(as_optional_string(value).unwrap(), None);
    }

    #[test]
    fn test_parse_error_body() {
        let result = parse_response(400, r#"{"error":"WRONGTYPE Operation against a key"}"#);
        match result {
            Err(PersistenceError::Backend(msg)) => assert!(msg.starts_with("WRONGTYPE")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_http_failure_without_json() {
        let result = parse_response(502, "Bad Gateway");
        assert!(matches!(result, Err(PersistenceError::Backend(_))));
    }

    #[test]
    fn test_string_array() {
        let members = as_string_array(serde_json::json!(["a", "b"])).unwrap();
        assert_eq!(members, vec!["a", "b"]);
        assert!(as_string_array(serde_json::json!([1])).is_err());
        assert!(as_string_array(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_ttl_never_zero() {
        assert_eq!(ttl_millis(Duration::ZERO), "1");
        assert_eq!(ttl_millis(Duration::from_secs(2)), "2000");
    }

    #[test]
    fn test_url_trailing_slash_trimmed() {
        let store = UpstashStore::new("https://eu1-x.upstash.io/", "token");
        assert_eq!(store.url, "https://eu1-x.upstash.io");
    }
}
