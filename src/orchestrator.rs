use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::SummaryCache;
use crate::config::SummaryConfig;
use crate::dataset::TabularDataset;
use crate::error::SummaryError;
use crate::external::ExternalSummarizer;
use crate::fingerprint::fingerprint;
use crate::local::{NO_DATA_SUMMARY, basic_summary};

/// Summary text and whether it came from the cache
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,

    #[serde(rename = "cached")]
    pub from_cache: bool,
}

/// Single entry point for producing upload summaries
///
/// Combines the fingerprint cache, the external interpreter chain and the
/// local fallback. Only a dataset that cannot be serialized makes it fail.
pub struct SummaryOrchestrator {
    cache: Arc<SummaryCache>,
    external: ExternalSummarizer,
}

impl SummaryOrchestrator {
    pub fn new(cache: Arc<SummaryCache>, external: ExternalSummarizer) -> Self {
        Self { cache, external }
    }

    /// Orchestrator over the process-wide cache and the configured interpreters
    pub fn from_config(config: &SummaryConfig) -> Self {
        Self::new(SummaryCache::global(), ExternalSummarizer::from_config(config))
    }

    pub fn cache(&self) -> &Arc<SummaryCache> {
        &self.cache
    }

    /// Produce a summary for a dataset
    ///
    /// A cached summary is returned as-is without running anything. On a
    /// miss the external commands are tried, then the local summary, and the
    /// result is cached. An empty dataset short-circuits to
    /// [`NO_DATA_SUMMARY`] and leaves the cache untouched.
    ///
    /// # Arguments
    /// * `dataset` - Parsed rows of the upload
    ///
    /// # Returns
    /// * `Result<SummaryResult, SummaryError>` - The summary, or a serialization error
    pub async fn orchestrate(&self, dataset: &TabularDataset) -> Result<SummaryResult, SummaryError> {
        let fp = fingerprint(dataset)?;

        if let Some(summary) = self.cache.get(&fp) {
            debug!("[{}] summary cache hit", fp.short());
            return Ok(SummaryResult {
                summary,
                from_cache: true,
            });
        }

        if dataset.is_empty() {
            return Ok(SummaryResult {
                summary: NO_DATA_SUMMARY.to_string(),
                from_cache: false,
            });
        }

        debug!("[{}] summary cache miss, {} rows", fp.short(), dataset.len());
        let summary = match self.external.summarize(dataset, &fp).await? {
            Some(summary) => summary,
            None => {
                info!("[{}] using local summary", fp.short());
                basic_summary(dataset)
            }
        };

        self.cache.put(fp, summary.clone());

        Ok(SummaryResult {
            summary,
            from_cache: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{CommandOutput, SummaryCommand};
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixed(CommandOutput, Arc<AtomicUsize>);

    #[async_trait]
    impl SummaryCommand for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn run(&self, _artifact: &Path, _timeout: Duration) -> CommandOutput {
            self.1.fetch_add(1, Ordering::SeqCst);
            self.0.clone()
        }
    }

    fn orchestrator(output: CommandOutput, dir: &TempDir) -> (SummaryOrchestrator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = SummaryConfig {
            temp_dir: dir.path().to_path_buf(),
            ..SummaryConfig::default()
        };
        let external = ExternalSummarizer::with_commands(
            vec![Box::new(Fixed(output, Arc::clone(&calls)))],
            &config,
        );
        (
            SummaryOrchestrator::new(Arc::new(SummaryCache::new()), external),
            calls,
        )
    }

    fn sample() -> TabularDataset {
        serde_json::from_value(json!([
            {"Name": "Alice", "Age": 30, "City": "New York"},
            {"Name": "Bob", "Age": 25, "City": "Los Angeles"}
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn external_summary_is_cached() {
        let dir = TempDir::new().unwrap();
        let output = CommandOutput::Completed {
            success: true,
            code: Some(0),
            stdout: "from python\n".to_string(),
            stderr: String::new(),
        };
        let (orch, calls) = orchestrator(output, &dir);

        let first = orch.orchestrate(&sample()).await.unwrap();
        assert_eq!(first.summary, "from python");
        assert!(!first.from_cache);

        let second = orch.orchestrate(&sample()).await.unwrap();
        assert_eq!(second.summary, "from python");
        assert!(second.from_cache);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn falls_back_to_local_summary() {
        let dir = TempDir::new().unwrap();
        let (orch, _) = orchestrator(CommandOutput::SpawnFailed("missing".to_string()), &dir);

        let result = orch.orchestrate(&sample()).await.unwrap();
        assert_eq!(result.summary, basic_summary(&sample()));
        assert!(!result.from_cache);
        assert_eq!(orch.cache().len(), 1);
    }

    #[tokio::test]
    async fn empty_dataset_skips_everything() {
        let dir = TempDir::new().unwrap();
        let (orch, calls) = orchestrator(CommandOutput::TimedOut, &dir);

        let result = orch.orchestrate(&TabularDataset::default()).await.unwrap();
        assert_eq!(result.summary, NO_DATA_SUMMARY);
        assert!(!result.from_cache);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(orch.cache().is_empty());
    }

    #[test]
    fn result_serializes_cached_flag() {
        let result = SummaryResult {
            summary: "s".to_string(),
            from_cache: true,
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"summary": "s", "cached": true})
        );
    }
}
