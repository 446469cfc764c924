//! HTTP adapter: Implementation of ThresholdService using reqwest.
//!
//! Issues a single `GET <base>?ga=..&age=..&bili=..&risk=any|none` and accepts
//! only a 2xx JSON body with numeric `photo_threshold` and
//! `exchange_threshold` fields.

use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Url};

use crate::config::EngineConfig;
use crate::domain::Thresholds;
use crate::ports::{ThresholdQuery, ThresholdResponse, ThresholdService, ThresholdServiceError};

/// reqwest-backed threshold service client.
#[derive(Debug, Clone)]
pub struct HttpThresholdService {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpThresholdService {
    /// Create a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns `ThresholdServiceError::InvalidUrl` if the URL does not parse,
    /// or `ThresholdServiceError::Network` if the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ThresholdServiceError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ThresholdServiceError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ThresholdServiceError::Network(e.to_string()))?;

        tracing::info!("Threshold service client configured (timeout={:?})", timeout);

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Build a client from configuration. `Ok(None)` when no service URL is set.
    ///
    /// # Errors
    /// Returns `NeoRiskError::Remote` if the configured URL is invalid.
    pub fn from_config(config: &EngineConfig) -> crate::Result<Option<Self>> {
        match config.bili_service_url.as_deref() {
            Some(url) => Ok(Some(Self::new(url, config.bili_timeout)?)),
            None => Ok(None),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_send_error(&self, e: &reqwest::Error) -> ThresholdServiceError {
        if e.is_timeout() {
            ThresholdServiceError::Timeout(self.timeout.as_millis() as u64)
        } else {
            ThresholdServiceError::Network(e.to_string())
        }
    }
}

impl ThresholdService for HttpThresholdService {
    async fn fetch_thresholds(
        &self,
        query: &ThresholdQuery,
    ) -> Result<Thresholds, ThresholdServiceError> {
        tracing::debug!(
            "Requesting remote thresholds (ga={}, age={}h, risk={:?})",
            query.ga,
            query.age,
            query.risk
        );

        let response = self
            .client
            .get(self.base_url.clone())
            .query(query)
            .header(USER_AGENT, format!("neorisk/{}", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ThresholdServiceError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let parsed: ThresholdResponse = serde_json::from_slice(&body)
            .map_err(|e| ThresholdServiceError::MalformedPayload(e.to_string()))?;

        parsed.into_thresholds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RiskParam;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn query() -> ThresholdQuery {
        ThresholdQuery {
            ga: 39.43,
            age: 24,
            bili: 8.0,
            risk: RiskParam::None,
        }
    }

    /// Serve exactly one HTTP response and hand back the request line.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Should bind");
        let addr = listener.local_addr().expect("Should have addr");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("Should accept");
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.expect("Should read request");
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("Should write response");
            let _ = socket.shutdown().await;
            request.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{addr}/thresholds"), handle)
    }

    #[tokio::test]
    async fn test_successful_lookup() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"photo_threshold": 12.6, "exchange_threshold": 19.3, "source": "aap2022"}"#,
        )
        .await;
        let service = HttpThresholdService::new(&url, Duration::from_secs(2)).expect("Should build");

        let thresholds = service.fetch_thresholds(&query()).await.expect("Should fetch");
        assert!((thresholds.photo - 12.6).abs() < 1e-9);
        assert!((thresholds.exchange - 19.3).abs() < 1e-9);

        let request_line = server.await.expect("Server task should finish");
        assert!(request_line.starts_with("GET /thresholds?"));
        assert!(request_line.contains("ga=39.43"));
        assert!(request_line.contains("age=24"));
        assert!(request_line.contains("bili=8"));
        assert!(request_line.contains("risk=none"));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (url, _server) = serve_once("HTTP/1.1 503 Service Unavailable", "{}").await;
        let service = HttpThresholdService::new(&url, Duration::from_secs(2)).expect("Should build");

        let err = service.fetch_thresholds(&query()).await.expect_err("Should fail");
        assert!(matches!(err, ThresholdServiceError::Status(503)));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let (url, _server) = serve_once("HTTP/1.1 200 OK", r#"{"photo": 12.6}"#).await;
        let service = HttpThresholdService::new(&url, Duration::from_secs(2)).expect("Should build");

        let err = service.fetch_thresholds(&query()).await.expect_err("Should fail");
        assert!(matches!(err, ThresholdServiceError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Should bind");
        let addr = listener.local_addr().expect("Should have addr");
        drop(listener);

        let service = HttpThresholdService::new(&format!("http://{addr}/"), Duration::from_secs(2))
            .expect("Should build");
        let err = service.fetch_thresholds(&query()).await.expect_err("Should fail");
        assert!(matches!(
            err,
            ThresholdServiceError::Network(_) | ThresholdServiceError::Timeout(_)
        ));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Should bind");
        let addr = listener.local_addr().expect("Should have addr");
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.expect("Should accept");
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let service = HttpThresholdService::new(&format!("http://{addr}/"), Duration::from_millis(200))
            .expect("Should build");
        let err = service.fetch_thresholds(&query()).await.expect_err("Should time out");
        assert!(matches!(err, ThresholdServiceError::Timeout(_)));
    }

    #[test]
    fn test_from_config() {
        let unset = EngineConfig::default();
        assert!(HttpThresholdService::from_config(&unset)
            .expect("Should succeed")
            .is_none());

        let config = EngineConfig {
            bili_service_url: Some("http://127.0.0.1:9/thresholds".to_string()),
            bili_timeout: Duration::from_millis(500),
            ..EngineConfig::default()
        };
        let service = HttpThresholdService::from_config(&config)
            .expect("Should succeed")
            .expect("Should be configured");
        assert_eq!(service.timeout(), Duration::from_millis(500));

        let defaulted = EngineConfig {
            bili_service_url: Some("http://127.0.0.1:9/thresholds".to_string()),
            ..EngineConfig::default()
        };
        let service = HttpThresholdService::from_config(&defaulted)
            .expect("Should succeed")
            .expect("Should be configured");
        assert_eq!(service.timeout(), crate::application::DEFAULT_REMOTE_TIMEOUT);

        let bad = EngineConfig {
            bili_service_url: Some("::nope::".to_string()),
            ..EngineConfig::default()
        };
        let err = HttpThresholdService::from_config(&bad).expect_err("Should fail");
        assert!(matches!(
            err,
            crate::NeoRiskError::Remote(ThresholdServiceError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_invalid_url() {
        let err = HttpThresholdService::new("not a url", Duration::from_secs(3)).expect_err("Should fail");
        assert!(matches!(err, ThresholdServiceError::InvalidUrl(_)));
    }
}
