//! Job document sources

use async_trait::async_trait;
use tracing::debug;

use super::ProwJob;
use crate::error::{ReportError, Result};

/// Supplies job documents by identifier
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch(&self, job_id: &str) -> Result<ProwJob>;
}

/// Fetches job documents from the job-tracking service over HTTP
#[derive(Debug, Clone)]
pub struct HttpJobSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpJobSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn job_url(&self) -> String {
        format!("{}/prowjob", self.base_url)
    }
}

#[async_trait]
impl JobSource for HttpJobSource {
    async fn fetch(&self, job_id: &str) -> Result<ProwJob> {
        const OPERATION: &str = "failed to get job document";

        let url = self.job_url();
        debug!("Fetching job {} from {}", job_id, url);

        let response = self
            .client
            .get(&url)
            .query(&[("prowjob", job_id)])
            .send()
            .await
            .map_err(|e| ReportError::unreachable(OPERATION, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::unreachable(
                OPERATION,
                format!("got response status code {}", status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ReportError::unreachable(OPERATION, e))?;

        serde_yaml::from_str(&body).map_err(|e| ReportError::malformed("job document", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a loopback port
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_job_document() {
        let base = serve_once(
            "200 OK",
            "spec:\n  pod_spec:\n    containers:\n      - args: [\"--target=e2e\"]\nstatus:\n  url: https://x/origin-ci-test/logs/1\n",
        )
        .await;

        let job = HttpJobSource::new(&base).fetch("abc").await.unwrap();
        assert_eq!(job.spec.pod_spec.containers[0].args, vec!["--target=e2e"]);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let base = serve_once("404 Not Found", "not found").await;

        let err = HttpJobSource::new(&base).fetch("abc").await.unwrap_err();
        assert!(matches!(err, ReportError::Unreachable(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_undecodable_body() {
        let base = serve_once("200 OK", "spec: [unterminated").await;

        let err = HttpJobSource::new(&base).fetch("abc").await.unwrap_err();
        assert!(matches!(err, ReportError::Malformed(_)));
    }
}
