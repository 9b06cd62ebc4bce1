//! External interpreter summaries.
//!
//! The dataset is written once to a JSON artifact, then each configured
//! interpreter is asked in turn to summarize it. Failures are classified so
//! that a missing library stops the whole chain early while ordinary failures
//! just move on to the next candidate.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempPath;
use tokio::process::Command;

use crate::config::SummaryConfig;
use crate::dataset::TabularDataset;
use crate::error::SummaryError;
use crate::fingerprint::Fingerprint;

/// Raw result of running one candidate command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutput {
    /// The process ran to completion
    Completed {
        success: bool,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The process could not be started
    SpawnFailed(String),

    /// The process exceeded its time limit and was killed
    TimedOut,
}

/// What the summarizer should do after a candidate ran
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Trimmed, non-empty summary text
    Summary(String),

    /// This candidate failed; try the next one
    Retry(String),

    /// A required library is missing; stop trying candidates
    DependencyMissing(String),
}

/// A single candidate able to summarize a JSON artifact
#[async_trait]
pub trait SummaryCommand: Send + Sync {
    /// Name used in log lines
    fn name(&self) -> &str;

    /// Run against the artifact at `artifact`, bounded by `timeout`
    async fn run(&self, artifact: &Path, timeout: Duration) -> CommandOutput;
}

/// An interpreter invoked as `<program> <script> <artifact>`
#[derive(Clone, Debug)]
pub struct InterpreterCommand {
    program: String,
    script: PathBuf,
}

impl InterpreterCommand {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
        }
    }
}

#[async_trait]
impl SummaryCommand for InterpreterCommand {
    fn name(&self) -> &str {
        &self.program
    }

    async fn run(&self, artifact: &Path, timeout: Duration) -> CommandOutput {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.script)
            .arg(artifact)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(timeout, cmd.output()).await {
            Err(_) => CommandOutput::TimedOut,
            Ok(Err(e)) => CommandOutput::SpawnFailed(e.to_string()),
            Ok(Ok(output)) => CommandOutput::Completed {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
        }
    }
}

/// Decide what a command's output means
///
/// Failed runs are checked for a dependency signature in the spawn error or
/// in stdout and stderr. Successful runs are only checked on stderr, so a
/// summary that happens to mention a signature word is still accepted.
///
/// # Arguments
/// * `output` - Result of running the candidate
/// * `signatures` - Substrings meaning a required library is absent
///
/// # Returns
/// * `AttemptOutcome` - Summary, retry, or stop
pub fn classify(output: &CommandOutput, signatures: &[String]) -> AttemptOutcome {
    match output {
        CommandOutput::TimedOut => AttemptOutcome::Retry("timed out".to_string()),
        CommandOutput::SpawnFailed(message) => match find_signature(signatures, &[message]) {
            Some(sig) => AttemptOutcome::DependencyMissing(sig),
            None => AttemptOutcome::Retry(format!("failed to start: {}", message)),
        },
        CommandOutput::Completed {
            success: false,
            code,
            stdout,
            stderr,
        } => match find_signature(signatures, &[stdout, stderr]) {
            Some(sig) => AttemptOutcome::DependencyMissing(sig),
            None => AttemptOutcome::Retry(match code {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            }),
        },
        CommandOutput::Completed {
            success: true,
            stdout,
            stderr,
            ..
        } => {
            if let Some(sig) = find_signature(signatures, &[stderr]) {
                return AttemptOutcome::DependencyMissing(sig);
            }
            let summary = stdout.trim();
            if summary.is_empty() {
                AttemptOutcome::Retry("empty output".to_string())
            } else {
                AttemptOutcome::Summary(summary.to_string())
            }
        }
    }
}

fn find_signature(signatures: &[String], streams: &[&String]) -> Option<String> {
    signatures
        .iter()
        .filter(|sig| !sig.is_empty())
        .find(|sig| streams.iter().any(|text| text.contains(sig.as_str())))
        .cloned()
}

/// Runs candidate commands in order against one artifact per call
pub struct ExternalSummarizer {
    commands: Vec<Box<dyn SummaryCommand>>,
    timeout: Duration,
    temp_dir: PathBuf,
    signatures: Vec<String>,
}

impl ExternalSummarizer {
    /// One [`InterpreterCommand`] per configured program
    pub fn from_config(config: &SummaryConfig) -> Self {
        let commands = config
            .commands
            .iter()
            .map(|program| {
                Box::new(InterpreterCommand::new(program.clone(), config.script_path.clone()))
                    as Box<dyn SummaryCommand>
            })
            .collect();
        Self::with_commands(commands, config)
    }

    /// Use explicit candidates with the config's timeout, directory and signatures
    pub fn with_commands(commands: Vec<Box<dyn SummaryCommand>>, config: &SummaryConfig) -> Self {
        Self {
            commands,
            timeout: config.timeout,
            temp_dir: config.temp_dir.clone(),
            signatures: config.dependency_signatures.clone(),
        }
    }

    /// Try each candidate until one produces a summary
    ///
    /// The artifact is removed before returning on every path. Failing to
    /// write it is logged and treated like every candidate failing.
    ///
    /// # Arguments
    /// * `dataset` - Rows to summarize
    /// * `fingerprint` - Dataset key, used to name the artifact
    ///
    /// # Returns
    /// * `Ok(Some(summary))` - A candidate succeeded
    /// * `Ok(None)` - No candidate succeeded; the caller should fall back
    /// * `Err(SummaryError)` - The dataset could not be serialized
    pub async fn summarize(
        &self,
        dataset: &TabularDataset,
        fingerprint: &Fingerprint,
    ) -> Result<Option<String>, SummaryError> {
        if self.commands.is_empty() {
            return Ok(None);
        }

        let payload = serde_json::to_vec(dataset)?;
        let dir = self.temp_dir.clone();
        let prefix = format!("upload-{}-", fingerprint.short());
        let written = tokio::task::spawn_blocking(move || write_artifact(&dir, &prefix, &payload))
            .await
            .unwrap_or_else(|e| Err(std::io::Error::other(e)));
        let artifact = match written {
            Ok(path) => path,
            Err(e) => {
                warn!(
                    "[{}] could not write summary artifact in {}: {}",
                    fingerprint.short(),
                    self.temp_dir.display(),
                    e
                );
                return Ok(None);
            }
        };

        let summary = self.run_candidates(&artifact, fingerprint).await;

        let path = artifact.to_path_buf();
        if let Err(e) = artifact.close() {
            warn!(
                "[{}] failed to remove artifact {}: {}",
                fingerprint.short(),
                path.display(),
                e
            );
        }

        Ok(summary)
    }

    async fn run_candidates(&self, artifact: &Path, fingerprint: &Fingerprint) -> Option<String> {
        for command in &self.commands {
            let output = command.run(artifact, self.timeout).await;
            match classify(&output, &self.signatures) {
                AttemptOutcome::Summary(summary) => {
                    info!(
                        "[{}] summary generated using {}",
                        fingerprint.short(),
                        command.name()
                    );
                    return Some(summary);
                }
                AttemptOutcome::DependencyMissing(signature) => {
                    info!(
                        "[{}] {} is missing a dependency ({}), skipping remaining commands",
                        fingerprint.short(),
                        command.name(),
                        signature
                    );
                    return None;
                }
                AttemptOutcome::Retry(reason) => {
                    debug!(
                        "[{}] {} failed: {}, trying next command",
                        fingerprint.short(),
                        command.name(),
                        reason
                    );
                }
            }
        }

        info!(
            "[{}] all summary commands failed, using local summary",
            fingerprint.short()
        );
        None
    }
}

/// Write the dataset to a uniquely named file under `dir`
fn write_artifact(dir: &Path, prefix: &str, payload: &[u8]) -> std::io::Result<TempPath> {
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".json")
        .tempfile_in(dir)?;
    file.write_all(payload)?;
    file.flush()?;

    Ok(file.into_temp_path())
}
