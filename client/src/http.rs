use async_trait::async_trait;
use common::{ActionAck, BatchJob, BatchReport, JobListing, JobStatusReport, UploadReceipt};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::api::{ApiResult, BatchApi, UploadOptions};
use crate::error::ApiError;
use crate::upload::UploadFile;

/// Cliente real contra la API de batch.
#[derive(Debug, Clone)]
pub struct HttpBatchApi {
    client: Client,
    base_url: Url,
}

/// Cuerpo de error típico del backend: `{ "message": "..." }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl HttpBatchApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// base + segmentos, cada uno escapado (los job ids vienen de afuera).
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

/// Deja pasar respuestas 2xx; el resto se convierte en `ApiError::Status`
/// rescatando el `message` del cuerpo si es JSON.
async fn check_status(resp: Response) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty());

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
    let resp = check_status(resp).await?;
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// `attachment; filename="reporte.csv"` -> `reporte.csv`.
/// Sólo el último componente: nunca se escribe fuera del directorio elegido.
fn disposition_file_name(header: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        let name = value.rsplit(['/', '\\']).next()?.trim();
        (!name.is_empty() && name != "." && name != "..").then(|| name.to_string())
    })
}

#[async_trait]
impl BatchApi for HttpBatchApi {
    async fn upload_batch(
        &self,
        file: &UploadFile,
        options: &UploadOptions,
    ) -> ApiResult<UploadReceipt> {
        let url = self.endpoint(&["batch", "upload"])?;
        let bytes = file.read_bytes().await?;
        debug!("POST {} ({} bytes, {} opciones)", url, bytes.len(), options.len());

        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let mut form = Form::new().part("file", part);
        for (key, value) in options {
            form = form.text(key.clone(), value.clone());
        }

        let resp = self.client.post(url).multipart(form).send().await?;
        let mut receipt: UploadReceipt = decode(resp).await?;
        if receipt.file_name.is_empty() {
            receipt.file_name = file.name.clone();
        }
        Ok(receipt)
    }

    async fn get_batch_jobs(&self, page: u32, size: u32) -> ApiResult<JobListing> {
        let url = self.endpoint(&["batch", "jobs"])?;
        debug!("GET {} page={} size={}", url, page, size);

        let resp = self
            .client
            .get(url)
            .query(&[("page", page), ("size", size)])
            .send()
            .await?;
        decode(resp).await
    }

    async fn get_batch_job(&self, job_id: &str) -> ApiResult<BatchJob> {
        let url = self.endpoint(&["batch", "jobs", job_id])?;
        debug!("GET {}", url);
        decode(self.client.get(url).send().await?).await
    }

    async fn get_batch_job_status(&self, job_id: &str) -> ApiResult<JobStatusReport> {
        let url = self.endpoint(&["batch", "jobs", job_id, "status"])?;
        debug!("GET {}", url);
        decode(self.client.get(url).send().await?).await
    }

    async fn retry_failed_records(&self, job_id: &str) -> ApiResult<ActionAck> {
        let url = self.endpoint(&["batch", "jobs", job_id, "retry"])?;
        debug!("POST {}", url);
        decode(self.client.post(url).send().await?).await
    }

    async fn download_batch_report(&self, job_id: &str) -> ApiResult<BatchReport> {
        let url = self.endpoint(&["batch", "jobs", job_id, "report"])?;
        debug!("GET {}", url);

        let resp = check_status(self.client.get(url).send().await?).await?;
        let headers = resp.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/csv")
            .to_string();
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name);

        let bytes = resp.bytes().await?.to_vec();
        Ok(BatchReport {
            bytes,
            file_name,
            content_type,
        })
    }

    async fn cancel_batch_job(&self, job_id: &str) -> ApiResult<ActionAck> {
        let url = self.endpoint(&["batch", "jobs", job_id, "cancel"])?;
        debug!("POST {}", url);
        decode(self.client.post(url).send().await?).await
    }
}
