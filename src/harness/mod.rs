//! Test harness for the samples: provisions buckets and scratch directories,
//! runs sample binaries, tracks the transfer jobs they create and tears all of
//! it down again whatever the outcome of the test.

pub mod error;
pub mod jobs;
pub mod provisioner;
pub mod runner;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{error, warn};

use crate::client::CloudClient;

pub use error::{
    CleanupError, CleanupFailure, CleanupTarget, HarnessError, ProvisioningError,
    SampleExecutionError,
};
pub use jobs::{JobLifecycleManager, TransferJobRecord};
pub use provisioner::{BucketRecord, ResourceProvisioner};
pub use runner::{SampleInvocation, SampleRunner};

/// The per-test bundle of provisioner, job manager and runner.
pub struct Harness {
    provisioner: ResourceProvisioner,
    jobs: JobLifecycleManager,
    runner: SampleRunner,
    teardown_on_interrupt: bool,
}

impl Harness {
    pub fn new(client: Arc<CloudClient>, runner: SampleRunner) -> Self {
        Self {
            provisioner: ResourceProvisioner::new(client.clone()),
            jobs: JobLifecycleManager::new(client),
            runner,
            teardown_on_interrupt: false,
        }
    }

    /// Tear down and bail out on Ctrl-C while a scoped body runs.
    ///
    /// Installing the handler replaces the default SIGINT behavior for the
    /// rest of the process lifetime, so this is off by default.
    pub fn teardown_on_interrupt(mut self, enabled: bool) -> Self {
        self.teardown_on_interrupt = enabled;
        self
    }

    pub fn provisioner(&self) -> &ResourceProvisioner {
        &self.provisioner
    }

    pub fn jobs(&self) -> &JobLifecycleManager {
        &self.jobs
    }

    pub fn runner(&self) -> &SampleRunner {
        &self.runner
    }

    /// Deletes buckets, then transfer jobs, then scratch directories.
    /// Every step runs even when an earlier one failed.
    pub async fn teardown(&self) -> Result<(), CleanupError> {
        let mut errors = CleanupError::default();
        if let Err(e) = self.provisioner.delete_buckets().await {
            errors.merge(e);
        }
        if let Err(e) = self.jobs.clean_up().await {
            errors.merge(e);
        }
        if let Err(e) = self.provisioner.remove_scratch().await {
            errors.merge(e);
        }
        errors.into_result()
    }

    /// Runs `body`, then always runs [`Harness::teardown`].
    ///
    /// An error or panic from `body` wins over teardown failures, which are
    /// only logged in that case. A panic is resumed after teardown.
    pub async fn scoped<T, E, Fut>(&self, body: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: From<HarnessError> + std::fmt::Display,
    {
        let guarded = AssertUnwindSafe(body).catch_unwind();
        let outcome = if self.teardown_on_interrupt {
            tokio::select! {
                outcome = guarded => Some(outcome),
                Ok(()) = tokio::signal::ctrl_c() => None,
            }
        } else {
            Some(guarded.await)
        };

        let cleanup = self.teardown().await;

        match outcome {
            None => {
                if let Err(e) = &cleanup {
                    error!(error = %e, "teardown after interrupt failed");
                }
                Err(HarnessError::Interrupted.into())
            }
            Some(Err(panic)) => {
                if let Err(e) = &cleanup {
                    error!(error = %e, "teardown after panic failed");
                }
                std::panic::resume_unwind(panic)
            }
            Some(Ok(Err(e))) => {
                if let Err(cleanup_err) = &cleanup {
                    warn!(error = %e, cleanup_error = %cleanup_err, "teardown failed after test error");
                }
                Err(e)
            }
            Some(Ok(Ok(value))) => match cleanup {
                Ok(()) => Ok(value),
                Err(e) => Err(HarnessError::Cleanup(e).into()),
            },
        }
    }
}
