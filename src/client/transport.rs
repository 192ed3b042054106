//! HTTP transport to the remote analysis service.
//!
//! Primary agents receive the artifact as a multipart upload; the
//! adjudicator receives a JSON body. Both return the raw JSON response,
//! normalization happens in the client.

use crate::config::ServiceConfig;
use crate::error::TransportError;
use crate::models::{AdjudicationPayload, AgentId, Artifact};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// One request per agent against the analysis service.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Upload the artifact to a primary agent's endpoint.
    async fn analyze(&self, agent: AgentId, artifact: &Artifact) -> Result<Value, TransportError>;

    /// Send the aggregate payload to the adjudicator's endpoint.
    async fn adjudicate(&self, payload: &AdjudicationPayload) -> Result<Value, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

impl HttpTransport {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Endpoint for `agent`.
    pub fn endpoint(&self, agent: AgentId) -> String {
        format!("{}/analyze/{}", self.base_url, agent.as_str())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, TransportError> {
        let response = request.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                debug!("Failed to read body of {} response: {}", status, e);
                String::new()
            });
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        serde_json::from_str(&body).map_err(|e| TransportError::InvalidBody(e.to_string()))
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout_seconds)
        } else if err.is_connect() {
            TransportError::Connect(self.base_url.clone())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn analyze(&self, agent: AgentId, artifact: &Artifact) -> Result<Value, TransportError> {
        let url = self.endpoint(agent);
        debug!("POST {} ({} bytes)", url, artifact.bytes().len());

        let part =
            Part::bytes(artifact.bytes().to_vec()).file_name(artifact.file_name().to_string());
        let form = Form::new().part("file", part);

        self.send(self.http_client.post(&url).multipart(form)).await
    }

    async fn adjudicate(&self, payload: &AdjudicationPayload) -> Result<Value, TransportError> {
        let url = self.endpoint(AgentId::Justice);
        debug!("POST {}", url);

        self.send(self.http_client.post(&url).json(payload)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn transport(base_url: &str, timeout_seconds: u64) -> HttpTransport {
        HttpTransport::new(&ServiceConfig {
            base_url: base_url.to_string(),
            timeout_seconds,
        })
        .unwrap()
    }

    /// Accept one connection, capture the request, reply with `status` and `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });

        (format!("http://{}", addr), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let transport = transport("http://127.0.0.1:8000/", 5);
        assert_eq!(
            transport.endpoint(AgentId::Skeptic),
            "http://127.0.0.1:8000/analyze/skeptic"
        );
        assert_eq!(
            transport.endpoint(AgentId::Justice),
            "http://127.0.0.1:8000/analyze/justice"
        );
    }

    #[tokio::test]
    async fn test_analyze_uploads_multipart_file() {
        let (url, server) = serve_once("200 OK", r#"{"analysis":"ok","risk_score":10}"#).await;
        let transport = transport(&url, 5);
        let artifact = Artifact::new("filing.pdf", b"%PDF-1.4 body".to_vec());

        let body = transport.analyze(AgentId::Accountant, &artifact).await.unwrap();
        assert_eq!(body["analysis"], "ok");
        assert_eq!(body["risk_score"], 10);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /analyze/accountant HTTP/1.1"));
        assert!(request.to_lowercase().contains("multipart/form-data"));
        assert!(request.contains("name=\"file\""));
        assert!(request.contains("filename=\"filing.pdf\""));
        assert!(request.contains("%PDF-1.4 body"));
    }

    #[tokio::test]
    async fn test_adjudicate_posts_json_payload() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"verdict":"CLEAR","confidence_score":90,"analysis":"fine"}"#,
        )
        .await;
        let transport = transport(&url, 5);
        let payload = AdjudicationPayload::build(|agent| match agent {
            AgentId::Legal => Some("clean contracts"),
            _ => None,
        });

        let body = transport.adjudicate(&payload).await.unwrap();
        assert_eq!(body["verdict"], "CLEAR");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /analyze/justice HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.contains(r#""legal_analysis":"clean contracts""#));
        assert!(request.contains(r#""accountant_analysis":"No Data""#));
    }

    #[tokio::test]
    async fn test_bare_string_body_is_returned() {
        let (url, _server) = serve_once("200 OK", r#""just text""#).await;
        let body = transport(&url, 5)
            .analyze(AgentId::Legal, &Artifact::new("a.pdf", b"x".to_vec()))
            .await
            .unwrap();
        assert_eq!(body, Value::String("just text".to_string()));
    }

    #[tokio::test]
    async fn test_error_status_is_transport_error() {
        let (url, _server) = serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#).await;
        let err = transport(&url, 5)
            .analyze(AgentId::Legal, &Artifact::new("a.pdf", b"x".to_vec()))
            .await
            .unwrap_err();

        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_survives_truncated_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            // Promise more bytes than are sent, then hang up.
            let response = "HTTP/1.1 502 Bad Gateway\r\ncontent-length: 100\r\nconnection: close\r\n\r\npartial";
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        let err = transport(&url, 5)
            .analyze(AgentId::Skeptic, &Artifact::new("a.pdf", b"x".to_vec()))
            .await
            .unwrap_err();

        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 502);
                assert!(body.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_transport_error() {
        let (url, _server) = serve_once("200 OK", "<html>oops</html>").await;
        let err = transport(&url, 5)
            .analyze(AgentId::Bloodhound, &Artifact::new("a.pdf", b"x".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport(&format!("http://{}", addr), 5)
            .analyze(AgentId::Accountant, &Artifact::new("a.pdf", b"x".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect(_)));
    }

    #[tokio::test]
    async fn test_request_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let err = transport(&format!("http://{}", addr), 1)
            .adjudicate(&AdjudicationPayload::build(|_| None))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(1)));
    }
}
