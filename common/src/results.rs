use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::job::{lenient_datetime, BatchJobStatus, JobId};

/// Respuesta de `POST /batch/upload`. El backend real a veces sólo manda
/// `jobId`, por eso casi todo tiene default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub job_id: JobId,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub status: BatchJobStatus,
    #[serde(
        default,
        deserialize_with = "lenient_datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub uploaded_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /batch/jobs/{jobId}/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusReport {
    pub job_id: JobId,
    pub status: BatchJobStatus,
    /// 0..=100; acepta enteros o decimales y recorta lo que se salga
    #[serde(default, deserialize_with = "clamped_percent")]
    pub progress: f64,
}

fn clamped_percent<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(raw.clamp(0.0, 100.0))
}

/// Acuse de retry / cancel: `{ success, message, jobId }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionAck {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub job_id: JobId,
}

/// Reporte binario de un job (normalmente CSV).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub bytes: Vec<u8>,
    /// Nombre sugerido por el servidor (Content-Disposition), si vino
    pub file_name: Option<String>,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn receipt_minimo_solo_con_job_id() {
        let r: UploadReceipt = serde_json::from_value(json!({ "jobId": "BATCH-004242" })).unwrap();

        assert_eq!(r.job_id, "BATCH-004242");
        assert_eq!(r.status, BatchJobStatus::Queued);
        assert!(r.file_name.is_empty());
        assert!(r.uploaded_date.is_none());
    }

    #[test]
    fn receipt_con_pending_y_fecha_sin_zona() {
        let r: UploadReceipt = serde_json::from_value(json!({
            "jobId": "BATCH-000001",
            "fileName": "pagos.csv",
            "status": "PENDING",
            "uploadedDate": "2024-03-01T09:00:00.123",
            "message": "ok"
        }))
        .unwrap();

        assert_eq!(r.status, BatchJobStatus::Queued);
        assert!(r.uploaded_date.is_some());
        assert_eq!(r.message.as_deref(), Some("ok"));
    }

    #[test]
    fn progreso_decimal_o_fuera_de_rango() {
        let parse = |v: serde_json::Value| -> JobStatusReport {
            serde_json::from_value(json!({
                "jobId": "BATCH-000001",
                "status": "PROCESSING",
                "progress": v
            }))
            .unwrap()
        };

        assert_eq!(parse(json!(42.5)).progress, 42.5);
        assert_eq!(parse(json!(40)).progress, 40.0);
        assert_eq!(parse(json!(130)).progress, 100.0);
        assert_eq!(parse(json!(-3)).progress, 0.0);
        assert_eq!(parse(json!(null)).progress, 0.0);
    }

    #[test]
    fn ack_tolera_campos_faltantes() {
        let ack: ActionAck = serde_json::from_value(json!({ "success": false })).unwrap();
        assert!(!ack.success);
        assert!(ack.message.is_empty());
    }
}
