use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::client::ApiError;

#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("Failed to create bucket '{bucket}': {source}")]
    CreateBucket {
        bucket: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to grant the transfer service access to bucket '{bucket}': {source}")]
    GrantAccess {
        bucket: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to create transfer job: {0}")]
    CreateJob(#[source] ApiError),

    #[error("Failed to prepare scratch path '{path}': {source}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum SampleExecutionError {
    #[error("Unknown sample '{0}'")]
    UnknownSample(String),

    #[error("Failed to launch sample '{sample}': {source}")]
    Spawn {
        sample: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sample '{sample}' exited with {}: {}", exit_label(.code), trimmed(.stderr))]
    Failed {
        sample: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Sample '{sample}' timed out after {timeout:?}")]
    TimedOut { sample: String, timeout: Duration },
}

impl SampleExecutionError {
    pub fn stderr(&self) -> Option<&str> {
        match self {
            SampleExecutionError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SampleExecutionError::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {}", c),
        None => "a signal".to_string(),
    }
}

fn trimmed(s: &str) -> &str {
    s.trim()
}

/// What a failed cleanup step was trying to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupTarget {
    Bucket(String),
    TransferJob(String),
    Scratch(PathBuf),
}

impl fmt::Display for CleanupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupTarget::Bucket(name) => write!(f, "bucket '{}'", name),
            CleanupTarget::TransferJob(name) => write!(f, "transfer job '{}'", name),
            CleanupTarget::Scratch(path) => write!(f, "scratch dir '{}'", path.display()),
        }
    }
}

#[derive(Debug)]
pub struct CleanupFailure {
    pub target: CleanupTarget,
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

/// Every failure from one best-effort cleanup pass.
#[derive(Debug, Default)]
pub struct CleanupError {
    failures: Vec<CleanupFailure>,
}

impl CleanupError {
    pub fn push(
        &mut self,
        target: CleanupTarget,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) {
        self.failures.push(CleanupFailure {
            target,
            source: source.into(),
        });
    }

    pub fn failures(&self) -> &[CleanupFailure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: CleanupError) {
        self.failures.extend(other.failures);
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), CleanupError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for CleanupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cleanup step(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.target, failure.source)?;
        }
        Ok(())
    }
}

impl std::error::Error for CleanupError {}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error(transparent)]
    SampleExecution(#[from] SampleExecutionError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),

    #[error("Interrupted; resources were cleaned up before exiting")]
    Interrupted,
}
