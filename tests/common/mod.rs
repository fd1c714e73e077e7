#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ci_junit_report::{
    HttpJobSource, MemoryStore, Renderer, ReportConfig, ReportPipeline, Result,
};
use tempfile::TempDir;

pub const BUCKET: &str = "origin-ci-test";
pub const JOB_URL: &str =
    "https://prow.ci.openshift.org/view/gs/origin-ci-test/logs/periodic-ci-e2e/1001";
pub const PREFIX: &str = "logs/periodic-ci-e2e/1001/artifacts/e2e";
pub const BROWSE_PREFIX: &str = "https://gcsweb-ci.apps.ci.l2s4.p1.openshiftapps.com/gcs/origin-ci-test/";

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Job document as served by the job-tracking service
pub fn job_yaml(args: &[&str], url: &str) -> String {
    let args = args
        .iter()
        .map(|a| format!("          - \"{}\"", a))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"apiVersion: prow.k8s.io/v1
kind: ProwJob
spec:
  type: periodic
  pod_spec:
    containers:
      - image: ci-operator:latest
        args:
{}
status:
  state: success
  url: {}
"#,
        args, url
    )
}

pub fn e2e_job_yaml() -> String {
    job_yaml(&["--lease-server=https://lease", "--target=e2e"], JOB_URL)
}

/// Loopback HTTP server answering every request with the same response
pub struct TestServer {
    pub url: String,
    requests: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn start(status_line: &str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test server");
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let counter = requests.clone();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf);
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        Self { url, requests }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Renderer remembering every call
#[derive(Default)]
pub struct RecordingRenderer {
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

#[async_trait]
impl Renderer for RecordingRenderer {
    async fn render(&self, xml_path: &Path, html_path: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((xml_path.to_path_buf(), html_path.to_path_buf()));
        Ok(())
    }
}

pub fn marker_name(step: &str) -> String {
    format!("{}/{}/finished.json", PREFIX, step)
}

pub fn build_log_name(step: &str) -> String {
    format!("{}/{}/build-log.txt", PREFIX, step)
}

pub fn add_step(store: &mut MemoryStore, step: &str, passed: bool, log: &str) {
    let result = if passed { "SUCCESS" } else { "FAILURE" };
    store.insert(
        marker_name(step),
        format!(
            r#"{{"timestamp":1673344800,"passed":{},"result":"{}"}}"#,
            passed, result
        ),
    );
    store.insert(build_log_name(step), log);
}

pub fn config_for(server: &TestServer, artifact_dir: &Path) -> ReportConfig {
    ReportConfig {
        job_service_url: server.url.clone(),
        ..Default::default()
    }
    .with_overrides(Some("1001".to_string()), Some(artifact_dir.to_path_buf()))
}

pub fn pipeline_for(
    server: &TestServer,
    artifact_dir: &Path,
    store: Arc<MemoryStore>,
    renderer: Arc<RecordingRenderer>,
) -> ReportPipeline {
    let config = config_for(server, artifact_dir);
    let jobs = Arc::new(HttpJobSource::new(&config.job_service_url));
    ReportPipeline::new(config, jobs, store, renderer)
}
