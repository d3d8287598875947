use async_trait::async_trait;
use common::{ActionAck, BatchJob, BatchReport, JobListing, JobStatusReport, UploadReceipt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::ApiError;
use crate::fallback::MockFallback;
use crate::http::HttpBatchApi;
use crate::upload::UploadFile;

pub type ApiResult<T> = Result<T, ApiError>;

/// Campos extra que viajan junto al archivo en el multipart (clave -> valor).
pub type UploadOptions = BTreeMap<String, String>;

/// Único punto de contacto con la API remota de batch.
///
/// Tanto el cliente HTTP real como el decorador de demo devuelven las
/// mismas formas, así que quien llama no sabe de dónde vino la respuesta.
#[async_trait]
pub trait BatchApi: Send + Sync {
    /// `POST /batch/upload` (multipart: `file` + un campo por opción)
    async fn upload_batch(&self, file: &UploadFile, options: &UploadOptions)
        -> ApiResult<UploadReceipt>;

    /// `GET /batch/jobs?page=&size=`, `page` en base 0
    async fn get_batch_jobs(&self, page: u32, size: u32) -> ApiResult<JobListing>;

    /// `GET /batch/jobs/{jobId}`
    async fn get_batch_job(&self, job_id: &str) -> ApiResult<BatchJob>;

    /// `GET /batch/jobs/{jobId}/status`
    async fn get_batch_job_status(&self, job_id: &str) -> ApiResult<JobStatusReport>;

    /// `POST /batch/jobs/{jobId}/retry`
    async fn retry_failed_records(&self, job_id: &str) -> ApiResult<ActionAck>;

    /// `GET /batch/jobs/{jobId}/report` (binario, normalmente text/csv)
    async fn download_batch_report(&self, job_id: &str) -> ApiResult<BatchReport>;

    /// `POST /batch/jobs/{jobId}/cancel`
    async fn cancel_batch_job(&self, job_id: &str) -> ApiResult<ActionAck>;
}

/// Arma el cliente según la configuración: HTTP puro, o HTTP envuelto en
/// el fallback de demo si `mock_fallback_enabled`.
pub fn connect(config: &Config) -> ApiResult<Arc<dyn BatchApi>> {
    let http = HttpBatchApi::new(&config.base_url, config.request_timeout)?;

    if config.mock_fallback_enabled {
        info!(
            "modo demo activo: los fallos de {} se reemplazan con datos simulados",
            config.base_url
        );
        Ok(Arc::new(MockFallback::new(http)))
    } else {
        Ok(Arc::new(http))
    }
}
