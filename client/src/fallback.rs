//! Modo demo: envuelve cualquier `BatchApi` y, cuando la llamada real
//! falla, responde con datos simulados de la misma forma.

use async_trait::async_trait;
use common::mock;
use common::{ActionAck, BatchJob, BatchReport, JobListing, JobStatusReport, UploadReceipt};
use tracing::warn;

use crate::api::{ApiResult, BatchApi, UploadOptions};
use crate::error::ApiError;
use crate::upload::UploadFile;

pub struct MockFallback<A> {
    inner: A,
}

impl<A: BatchApi> MockFallback<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

/// Sólo se tapan fallas del backend o del camino hasta él. Los errores
/// locales (archivo ilegible, URL o request mal armados) salen tal cual.
fn is_backend_failure(err: &ApiError) -> bool {
    match err {
        ApiError::Transport(e) => !e.is_builder(),
        ApiError::Status { .. } | ApiError::Decode(_) => true,
        ApiError::InvalidUrl(_) | ApiError::Io(_) => false,
    }
}

fn recover<T>(op: &str, res: ApiResult<T>, demo: impl FnOnce() -> ApiResult<T>) -> ApiResult<T> {
    match res {
        Err(err) if is_backend_failure(&err) => {
            warn!("{} falló ({}); usando datos de demo", op, err);
            demo()
        }
        other => other,
    }
}

#[async_trait]
impl<A: BatchApi> BatchApi for MockFallback<A> {
    async fn upload_batch(
        &self,
        file: &UploadFile,
        options: &UploadOptions,
    ) -> ApiResult<UploadReceipt> {
        let res = self.inner.upload_batch(file, options).await;
        recover("upload", res, || Ok(mock::mock_upload_receipt(&file.name)))
    }

    async fn get_batch_jobs(&self, page: u32, size: u32) -> ApiResult<JobListing> {
        let res = self.inner.get_batch_jobs(page, size).await;
        recover("listado de jobs", res, || {
            Ok(JobListing::Paged(mock::mock_job_page(page, size)))
        })
    }

    async fn get_batch_job(&self, job_id: &str) -> ApiResult<BatchJob> {
        let res = self.inner.get_batch_job(job_id).await;
        recover("detalle de job", res, || Ok(mock::mock_job_detail(job_id)))
    }

    async fn get_batch_job_status(&self, job_id: &str) -> ApiResult<JobStatusReport> {
        let res = self.inner.get_batch_job_status(job_id).await;
        recover("estado de job", res, || Ok(mock::mock_status_report(job_id)))
    }

    async fn retry_failed_records(&self, job_id: &str) -> ApiResult<ActionAck> {
        let res = self.inner.retry_failed_records(job_id).await;
        recover("retry", res, || Ok(mock::mock_ack(job_id, "retry")))
    }

    async fn download_batch_report(&self, job_id: &str) -> ApiResult<BatchReport> {
        let res = self.inner.download_batch_report(job_id).await;
        recover("reporte", res, || Ok(mock::mock_report(job_id)?))
    }

    async fn cancel_batch_job(&self, job_id: &str) -> ApiResult<ActionAck> {
        let res = self.inner.cancel_batch_job(job_id).await;
        recover("cancelación", res, || Ok(mock::mock_ack(job_id, "cancel")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpBatchApi;
    use crate::testing::{sample_job, spawn_backend, temp_dir, unreachable_base_url, FakeApi};
    use axum::{routing::post, Json, Router};
    use common::BatchJobStatus;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn caido() -> MockFallback<HttpBatchApi> {
        let http = HttpBatchApi::new(&unreachable_base_url(), Duration::from_secs(2)).unwrap();
        MockFallback::new(http)
    }

    fn es_id_batch(id: &str) -> bool {
        id.len() == 12
            && id.starts_with("BATCH-")
            && id[6..].chars().all(|c| c.is_ascii_digit())
    }

    #[tokio::test]
    async fn upload_caido_devuelve_recibo_de_demo() {
        let api = caido();
        let file = UploadFile::from_bytes("pagos_marzo.csv", "text/csv", b"a,b\n".to_vec());

        let receipt = api.upload_batch(&file, &UploadOptions::new()).await.unwrap();

        assert!(es_id_batch(&receipt.job_id), "id raro: {}", receipt.job_id);
        assert_eq!(receipt.file_name, "pagos_marzo.csv");
        assert_eq!(receipt.status, BatchJobStatus::Queued);
        assert!(receipt.uploaded_date.is_some());
        assert!(receipt.message.is_some());
    }

    #[tokio::test]
    async fn listado_caido_es_el_corpus_paginado() {
        let api = caido();

        let listing = api.get_batch_jobs(1, 4).await.unwrap();

        let JobListing::Paged(page) = listing else {
            panic!("se esperaba página");
        };
        assert_eq!(page.content.len(), 4);
        assert_eq!(page.total_elements, 10);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.number, 1);
        assert_eq!(page.size, 4);
        assert!(page
            .content
            .windows(2)
            .all(|w| w[0].uploaded_date >= w[1].uploaded_date));

        // determinista entre llamadas
        let again = api.get_batch_jobs(1, 4).await.unwrap();
        assert_eq!(again.jobs(), page.content.as_slice());

        let last = api.get_batch_jobs(2, 4).await.unwrap();
        assert_eq!(last.jobs().len(), 2);
    }

    #[tokio::test]
    async fn acciones_caidas_devuelven_acuses_de_demo() {
        let api = caido();

        let status = api.get_batch_job_status("BATCH-000042").await.unwrap();
        assert_eq!(status.job_id, "BATCH-000042");
        assert_eq!(status.status, BatchJobStatus::Processing);
        assert!(status.progress < 100.0);

        let ack = api.retry_failed_records("BATCH-000042").await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.job_id, "BATCH-000042");

        assert!(api.cancel_batch_job("BATCH-000042").await.unwrap().success);

        let job = api.get_batch_job("BATCH-000042").await.unwrap();
        assert_eq!(job.job_id, "BATCH-000042");
    }

    #[tokio::test]
    async fn reporte_caido_es_csv_con_encabezado() {
        let api = caido();

        let report = api.download_batch_report("BATCH-000042").await.unwrap();
        let text = String::from_utf8(report.bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("Job ID,Status,Total Records,Processed,Success,Failed")
        );
        assert!(lines.next().unwrap().starts_with("BATCH-000042,"));
        assert_eq!(report.content_type, "text/csv");
    }

    #[tokio::test]
    async fn si_la_api_responde_no_se_toca_nada() {
        let job = sample_job("BATCH-000777", BatchJobStatus::Completed, 10, 10, 0, 5);
        let api = MockFallback::new(FakeApi::with_jobs(vec![job.clone()]));

        let listing = api.get_batch_jobs(0, 10).await.unwrap();
        assert_eq!(listing.total_count(), 1);
        assert_eq!(api.get_batch_job("BATCH-000777").await.unwrap(), job);
    }

    #[tokio::test]
    async fn error_del_servidor_tambien_se_tapa() {
        let api = MockFallback::new(FakeApi::failing(Some("mantenimiento")));

        let listing = api.get_batch_jobs(0, 5).await.unwrap();

        assert_eq!(listing.total_count(), 10);
        assert_eq!(listing.jobs().len(), 5);
    }

    #[tokio::test]
    async fn archivo_local_ilegible_no_se_disfraza_de_exito() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/api/batch/upload",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "jobId": "BATCH-000001", "status": "QUEUED" }))
                }
            }),
        );
        let base = spawn_backend(router).await;
        let http = HttpBatchApi::new(&format!("{base}/api"), Duration::from_secs(5)).unwrap();
        let api = MockFallback::new(http);

        let path = temp_dir("fallback_archivo_borrado").join("lote.csv");
        std::fs::write(&path, b"id,monto\n1,10\n").unwrap();
        let file = UploadFile::from_path(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let res = api.upload_batch(&file, &UploadOptions::new()).await;

        assert!(matches!(res, Err(ApiError::Io(_))), "vino {res:?}");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn solo_fallas_del_backend_se_tapan() {
        assert!(is_backend_failure(&ApiError::Status {
            status: 500,
            message: None
        }));
        assert!(is_backend_failure(&ApiError::Decode("x".into())));
        assert!(!is_backend_failure(&ApiError::InvalidUrl("x".into())));
        assert!(!is_backend_failure(&ApiError::Io(std::io::Error::other("x"))));
    }
}
