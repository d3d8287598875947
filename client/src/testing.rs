//! Piezas compartidas por los tests del crate: una API falsa que cuenta
//! llamadas y un backend HTTP en proceso.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use common::{
    ActionAck, BatchJob, BatchJobStatus, BatchReport, JobListing, JobStatusReport, Page,
    UploadReceipt,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{ApiResult, BatchApi, UploadOptions};
use crate::error::ApiError;
use crate::upload::UploadFile;

pub fn sample_job(
    id: &str,
    status: BatchJobStatus,
    total: u64,
    success: u64,
    failed: u64,
    minutes_ago: i64,
) -> BatchJob {
    let uploaded = Utc::now() - ChronoDuration::minutes(minutes_ago);
    BatchJob {
        job_id: id.to_string(),
        file_name: format!("{id}.csv"),
        status,
        total_records: total,
        success_count: success,
        failed_count: failed,
        uploaded_date: uploaded,
        completed_date: status.is_terminal().then(|| uploaded + ChronoDuration::minutes(1)),
        uploaded_by: "ops.admin".to_string(),
    }
}

/// API en memoria. Cuenta cada llamada y puede fallar o demorarse a pedido.
#[derive(Default)]
pub struct FakeApi {
    pub jobs: Vec<BatchJob>,
    pub raw_listing: bool,
    pub failure: Option<Option<String>>,
    pub page_delays: HashMap<u32, Duration>,
    pub upload_delay: Option<Duration>,
    pub status_script: Mutex<VecDeque<JobStatusReport>>,

    pub fetch_calls: Mutex<Vec<(u32, u32)>>,
    pub upload_calls: AtomicUsize,
    pub retry_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl FakeApi {
    pub fn with_jobs(jobs: Vec<BatchJob>) -> Self {
        Self {
            jobs,
            ..Default::default()
        }
    }

    /// Todas las operaciones fallan con 503 y el mensaje dado.
    pub fn failing(message: Option<&str>) -> Self {
        Self {
            failure: Some(message.map(str::to_string)),
            ..Default::default()
        }
    }

    pub fn delay_page(mut self, page: u32, delay: Duration) -> Self {
        self.page_delays.insert(page, delay);
        self
    }

    pub fn delay_upload(mut self, delay: Duration) -> Self {
        self.upload_delay = Some(delay);
        self
    }

    pub fn script_status(self, reports: Vec<JobStatusReport>) -> Self {
        *self.status_script.lock().unwrap() = reports.into();
        self
    }

    pub fn fetches(&self) -> Vec<(u32, u32)> {
        self.fetch_calls.lock().unwrap().clone()
    }

    fn check(&self) -> ApiResult<()> {
        match &self.failure {
            Some(message) => Err(ApiError::Status {
                status: 503,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BatchApi for FakeApi {
    async fn upload_batch(
        &self,
        file: &UploadFile,
        _options: &UploadOptions,
    ) -> ApiResult<UploadReceipt> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.upload_delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        Ok(UploadReceipt {
            job_id: "BATCH-000500".to_string(),
            file_name: file.name.clone(),
            status: BatchJobStatus::Queued,
            uploaded_date: Some(Utc::now()),
            message: None,
        })
    }

    async fn get_batch_jobs(&self, page: u32, size: u32) -> ApiResult<JobListing> {
        self.fetch_calls.lock().unwrap().push((page, size));
        if let Some(delay) = self.page_delays.get(&page).copied() {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        if self.raw_listing {
            return Ok(JobListing::Raw(self.jobs.clone()));
        }
        Ok(JobListing::Paged(Page::from_slice(&self.jobs, page, size)))
    }

    async fn get_batch_job(&self, job_id: &str) -> ApiResult<BatchJob> {
        self.check()?;
        self.jobs
            .iter()
            .find(|j| j.job_id == job_id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                message: Some("Job no encontrado".into()),
            })
    }

    async fn get_batch_job_status(&self, job_id: &str) -> ApiResult<JobStatusReport> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let next = self.status_script.lock().unwrap().pop_front();
        Ok(next.unwrap_or(JobStatusReport {
            job_id: job_id.to_string(),
            status: BatchJobStatus::Processing,
            progress: 50.0,
        }))
    }

    async fn retry_failed_records(&self, job_id: &str) -> ApiResult<ActionAck> {
        self.retry_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(ActionAck {
            success: true,
            message: "Reintento encolado".into(),
            job_id: job_id.to_string(),
        })
    }

    async fn download_batch_report(&self, _job_id: &str) -> ApiResult<BatchReport> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(BatchReport {
            bytes: b"Job ID,Status\n".to_vec(),
            file_name: None,
            content_type: "text/csv".into(),
        })
    }

    async fn cancel_batch_job(&self, job_id: &str) -> ApiResult<ActionAck> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(ActionAck {
            success: true,
            message: "Cancelado".into(),
            job_id: job_id.to_string(),
        })
    }
}

/// Levanta un router axum en 127.0.0.1 con puerto libre; devuelve `http://host:puerto`.
pub async fn spawn_backend(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// URL a un puerto que nadie escucha (se libera apenas se obtiene).
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/api")
}

/// Directorio temporal nuevo en cada llamada; dos tests con el mismo
/// nombre no se pisan aunque corran en paralelo.
pub fn temp_dir(sub: &str) -> std::path::PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let n = NEXT.fetch_add(1, Ordering::SeqCst);
    let base = std::env::temp_dir()
        .join("batchctl_tests")
        .join(format!("{sub}-{}-{n}", std::process::id()));
    let _ = std::fs::remove_dir_all(&base);
    std::fs::create_dir_all(&base).unwrap();
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_no_se_repite_entre_llamadas() {
        let a = temp_dir("mismo_nombre");
        let b = temp_dir("mismo_nombre");
        std::fs::write(a.join("x.csv"), b"a").unwrap();

        assert_ne!(a, b);
        assert!(a.join("x.csv").exists());
        assert!(b.is_dir());
        assert!(!b.join("x.csv").exists());
    }
}
