use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use super::error::SampleExecutionError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// One finished run of a sample.
#[derive(Debug, Clone)]
pub struct SampleInvocation {
    pub sample: String,
    pub args: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl SampleInvocation {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs samples as child processes of an entry-point program (`<program> <sample> <args>...`).
#[derive(Debug, Clone)]
pub struct SampleRunner {
    program: PathBuf,
    samples: Option<Vec<String>>,
    envs: Vec<(OsString, OsString)>,
    timeout: Duration,
}

impl SampleRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            samples: None,
            envs: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Runner for the `cloud-samples` binary at `program`; only its samples resolve.
    pub fn for_samples_binary(program: impl Into<PathBuf>) -> Self {
        Self::new(program).with_samples(crate::cli::SAMPLES.iter().copied())
    }

    pub fn with_samples<I, S>(mut self, samples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.samples = Some(samples.into_iter().map(Into::into).collect());
        self
    }

    /// Sets a variable for child processes only.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn resolve(&self, sample: &str) -> Result<(), SampleExecutionError> {
        match &self.samples {
            Some(known) if !known.iter().any(|s| s == sample) => {
                Err(SampleExecutionError::UnknownSample(sample.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Runs the sample to completion; a non-zero exit is an error.
    pub async fn invoke<S: AsRef<str>>(
        &self,
        sample: &str,
        args: &[S],
    ) -> Result<SampleInvocation, SampleExecutionError> {
        self.resolve(sample)?;
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();

        let mut cmd = Command::new(&self.program);
        cmd.arg(sample)
            .args(&args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), sample, ?args, "running sample");
        let child = cmd.spawn().map_err(|source| SampleExecutionError::Spawn {
            sample: sample.to_string(),
            source,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| SampleExecutionError::Spawn {
                sample: sample.to_string(),
                source,
            })?,
            // Dropping the future drops the child, which kills it
            Err(_) => {
                return Err(SampleExecutionError::TimedOut {
                    sample: sample.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        let invocation = SampleInvocation {
            sample: sample.to_string(),
            args,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        debug!(sample, exit_code = ?invocation.exit_code, "sample finished");

        if !output.status.success() {
            return Err(SampleExecutionError::Failed {
                sample: invocation.sample,
                code: invocation.exit_code,
                stdout: invocation.stdout,
                stderr: invocation.stderr,
            });
        }
        Ok(invocation)
    }

    /// Runs the sample and returns its standard output.
    pub async fn run<S: AsRef<str>>(
        &self,
        sample: &str,
        args: &[S],
    ) -> Result<String, SampleExecutionError> {
        Ok(self.invoke(sample, args).await?.stdout)
    }
}
