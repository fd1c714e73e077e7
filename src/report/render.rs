//! HTML rendering of the written report
//!
//! Rendering is delegated to an external program run through
//! `bash -c "<command> < <xml> > <html>"`. Output goes to a staging file
//! beside the HTML path and is moved into place only when the renderer
//! succeeds.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::RendererConfig;
use crate::error::{ReportError, Result};

const STAGING_SUFFIX: &str = ".partial";

#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, xml_path: &Path, html_path: &Path) -> Result<()>;
}

/// Skips rendering entirely
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn render(&self, _xml_path: &Path, _html_path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Runs an external renderer, optionally installing it first
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    command: String,
    install: Option<String>,
}

impl CommandRenderer {
    pub fn new(command: &str, install: Option<&str>) -> Self {
        Self {
            command: command.to_string(),
            install: install.map(str::to_string),
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(&config.command, config.install.as_deref())
    }

    async fn install(&self, install: &str) -> Result<()> {
        info!("Installing renderer: {}", install);
        run_script(install).await
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, xml_path: &Path, html_path: &Path) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(ReportError::Config("renderer command is empty".to_string()));
        }
        if let Some(install) = &self.install {
            self.install(install).await?;
        }

        let staging = staging_path(html_path);
        let script = format!(
            "{} < {} > {}",
            self.command,
            shell_quote(xml_path),
            shell_quote(&staging)
        );

        info!(
            "Rendering {} to {}",
            xml_path.display(),
            html_path.display()
        );
        if let Err(e) = run_script(&script).await {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                debug!(path = %staging.display(), error = %cleanup, "No staging file to remove");
            }
            return Err(e);
        }

        tokio::fs::rename(&staging, html_path).await?;
        Ok(())
    }
}

async fn run_script(script: &str) -> Result<()> {
    let status = Command::new("bash")
        .args(["-c", script])
        .status()
        .await
        .map_err(|e| ReportError::Render(format!("failed to run {}: {}", script, e)))?;

    if !status.success() {
        return Err(ReportError::Render(format!(
            "{} exited with code {}",
            script,
            status.code().unwrap_or(-1)
        )));
    }
    Ok(())
}

fn staging_path(html_path: &Path) -> PathBuf {
    let mut name = OsString::from(html_path.as_os_str());
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

/// Single-quote a path for the shell
fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_renderer_pipes_files() {
        let dir = tempfile::tempdir().unwrap();
        let xml = dir.path().join("junit.xml");
        let html = dir.path().join("junit-summary.html");
        std::fs::write(&xml, "<testsuites/>").unwrap();

        CommandRenderer::new("cat", None)
            .render(&xml, &html)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&html).unwrap(), "<testsuites/>");
    }

    #[tokio::test]
    async fn test_command_renderer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let xml = dir.path().join("junit.xml");
        std::fs::write(&xml, "<testsuites/>").unwrap();

        let err = CommandRenderer::new("false", None)
            .render(&xml, &dir.path().join("out.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
    }

    #[tokio::test]
    async fn test_install_failure_stops_render() {
        let dir = tempfile::tempdir().unwrap();
        let xml = dir.path().join("junit.xml");
        let html = dir.path().join("junit-summary.html");
        std::fs::write(&xml, "<testsuites/>").unwrap();

        let err = CommandRenderer::new("cat", Some("exit 3"))
            .render(&xml, &html)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
        assert!(!html.exists());
    }

    #[tokio::test]
    async fn test_noop_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("junit-summary.html");
        tokio_test::assert_ok!(NoopRenderer.render(&dir.path().join("junit.xml"), &html).await);
        assert!(!html.exists());
    }

    #[tokio::test]
    async fn test_command_renderer_quoted_arguments_and_spaced_paths() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("job's report");
        std::fs::create_dir(&out).unwrap();
        let xml = out.join("junit.xml");
        let html = out.join("junit summary.html");
        std::fs::write(&xml, "<testsuites/>").unwrap();

        CommandRenderer::new("sed -e 's/testsuites/rendered report/'", None)
            .render(&xml, &html)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&html).unwrap(), "<rendered report/>");
        assert!(!staging_path(&html).exists());
    }

    #[tokio::test]
    async fn test_missing_renderer_leaves_no_html() {
        let dir = tempfile::tempdir().unwrap();
        let xml = dir.path().join("junit.xml");
        let html = dir.path().join("junit-summary.html");
        std::fs::write(&xml, "<testsuites/>").unwrap();

        let err = CommandRenderer::new("ci-junit-report-no-such-renderer", None)
            .render(&xml, &html)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
        assert!(!html.exists());
        assert!(!staging_path(&html).exists());
    }

    #[tokio::test]
    async fn test_failed_render_keeps_previous_html() {
        let dir = tempfile::tempdir().unwrap();
        let xml = dir.path().join("junit.xml");
        let html = dir.path().join("junit-summary.html");
        std::fs::write(&xml, "<testsuites/>").unwrap();
        std::fs::write(&html, "<html>previous</html>").unwrap();

        let err = CommandRenderer::new("false", None)
            .render(&xml, &html)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
        assert_eq!(std::fs::read_to_string(&html).unwrap(), "<html>previous</html>");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote(Path::new("/tmp/a b")), "'/tmp/a b'");
        assert_eq!(shell_quote(Path::new("/tmp/it's")), r"'/tmp/it'\''s'");
    }
}
