pub mod asset;
pub mod cli;
pub mod client;
pub mod config;
pub mod harness;
pub mod logging;
pub mod storage;
pub mod transfer;
pub mod util;

pub use client::{ApiError, CloudClient, Service};
pub use config::{Config, Endpoints};
pub use transfer::{JobStatus, TransferJob};
pub use util::{TRANSFER_SUCCESS_MARKER, find_transfer_job_name, unique_bucket_name};
