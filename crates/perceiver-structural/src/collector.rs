use std::path::PathBuf;

use selfheal_core_types::{Artifacts, FailureId};
use tracing::warn;

use crate::errors::PerceiverError;
use crate::ports::PageCapture;

/// Writes failure artifacts to disk. Each artifact is collected
/// independently; a failed capture leaves its slot empty.
#[derive(Clone, Debug)]
pub struct ArtifactCollector {
    dir: PathBuf,
}

impl ArtifactCollector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn collect<P>(&self, page: &P, failure_id: &FailureId) -> Artifacts
    where
        P: PageCapture + ?Sized,
    {
        Artifacts {
            dom_snapshot: self.collect_dom(page, failure_id).await,
            a11y_snapshot: self.collect_a11y(page, failure_id).await,
            screenshot: self.collect_screenshot(page, failure_id).await,
        }
    }

    pub async fn collect_dom<P>(&self, page: &P, id: &FailureId) -> Option<PathBuf>
    where
        P: PageCapture + ?Sized,
    {
        let result = match page.content().await {
            Ok(dom) => self.write(&format!("{id}_dom.html"), dom.as_bytes()).await,
            Err(err) => Err(err),
        };
        settle("dom", result)
    }

    pub async fn collect_a11y<P>(&self, page: &P, id: &FailureId) -> Option<PathBuf>
    where
        P: PageCapture + ?Sized,
    {
        let result = match page.aria_snapshot().await {
            Ok(snapshot) => {
                self.write(&format!("{id}_a11y.yaml"), snapshot.as_bytes())
                    .await
            }
            Err(err) => Err(err),
        };
        settle("a11y", result)
    }

    pub async fn collect_screenshot<P>(&self, page: &P, id: &FailureId) -> Option<PathBuf>
    where
        P: PageCapture + ?Sized,
    {
        let result = match page.screenshot().await {
            Ok(png) => self.write(&format!("{id}_screenshot.png"), &png).await,
            Err(err) => Err(err),
        };
        settle("screenshot", result)
    }

    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, PerceiverError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| PerceiverError::Io(format!("{}", err)))?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|err| PerceiverError::Io(format!("{}", err)))?;
        Ok(path)
    }
}

fn settle(artifact: &str, result: Result<PathBuf, PerceiverError>) -> Option<PathBuf> {
    match result {
        Ok(path) => Some(path),
        Err(err) => {
            warn!(target: "collector", artifact, error = %err, "artifact collection failed");
            None
        }
    }
}
