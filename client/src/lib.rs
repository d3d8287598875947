//! Cliente de la API de batch: transporte HTTP, modo demo, store compartido,
//! flujo de carga y vista de jobs.

pub mod api;
pub mod config;
pub mod download;
pub mod error;
pub mod fallback;
pub mod http;
pub mod jobs_view;
pub mod poll;
pub mod refresh;
pub mod store;
pub mod upload;

#[cfg(test)]
mod testing;

pub use api::{connect, ApiResult, BatchApi, UploadOptions};
pub use config::{Config, ConfigError};
pub use download::save_report;
pub use error::{ApiError, StoreError};
pub use fallback::MockFallback;
pub use http::HttpBatchApi;
pub use jobs_view::{can_download, can_retry, JobListView, RowAction, ROWS_PER_PAGE_OPTIONS};
pub use poll::poll_job_status;
pub use refresh::{RefreshListener, RefreshTrigger};
pub use store::{BatchStore, Outcome, StoreSnapshot};
pub use upload::{SubmitRefused, UploadFile, UploadState, UploadStatus, UploadWorkflow};
