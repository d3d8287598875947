use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type JobId = String;

/// Estado de un batch job tal como lo reporta la API remota.
/// El cliente nunca lo cambia: sólo lo vuelve a pedir.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchJobStatus {
    /// Algunos backends lo mandan como "PENDING"
    #[default]
    #[serde(alias = "PENDING")]
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
    /// Cualquier valor que no conocemos; no queremos romper una página entera por una fila rara
    #[serde(other)]
    Unknown,
}

impl BatchJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchJobStatus::Queued => "QUEUED",
            BatchJobStatus::Processing => "PROCESSING",
            BatchJobStatus::Completed => "COMPLETED",
            BatchJobStatus::Failed => "FAILED",
            BatchJobStatus::Cancelled => "CANCELLED",
            BatchJobStatus::Unknown => "UNKNOWN",
        }
    }

    /// Estados de los que el job ya no sale.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchJobStatus::Completed | BatchJobStatus::Failed | BatchJobStatus::Cancelled
        )
    }
}

impl fmt::Display for BatchJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Una unidad de carga masiva: un archivo subido y su procesamiento.
///
/// Nombres canónicos en el JSON: `successCount` / `failedCount`.
/// Se aceptan también `successRecords` / `failedRecords` (el generador de
/// mocks viejo usaba esos) y `createdDate` como alias de `uploadedDate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    pub job_id: JobId,
    #[serde(default)]
    pub file_name: String,
    pub status: BatchJobStatus,

    #[serde(default)]
    pub total_records: u64,
    #[serde(default, alias = "successRecords")]
    pub success_count: u64,
    #[serde(default, alias = "failedRecords")]
    pub failed_count: u64,

    #[serde(alias = "createdDate", deserialize_with = "lenient_datetime::deserialize")]
    pub uploaded_date: DateTime<Utc>,
    /// null hasta que el job termina
    #[serde(default, deserialize_with = "lenient_datetime::option")]
    pub completed_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub uploaded_by: String,
}

impl BatchJob {
    /// Registros ya procesados (bien o mal).
    pub fn processed_records(&self) -> u64 {
        self.success_count + self.failed_count
    }

    /// Progreso 0..=100 calculado a partir de los contadores.
    pub fn progress_percent(&self) -> f64 {
        if self.total_records == 0 {
            return if self.status == BatchJobStatus::Completed {
                100.0
            } else {
                0.0
            };
        }
        let pct = self.processed_records() as f64 / self.total_records as f64 * 100.0;
        pct.min(100.0)
    }

    /// success + failed <= total siempre, y == total cuando está COMPLETED.
    /// Sólo informa: el cliente nunca corrige contadores.
    pub fn check_counts(&self) -> Result<(), CountViolation> {
        let processed = self.processed_records();
        let total = self.total_records;
        if processed > total {
            return Err(CountViolation::Overflow { processed, total });
        }
        if self.status == BatchJobStatus::Completed && processed != total {
            return Err(CountViolation::Incomplete { processed, total });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CountViolation {
    #[error("procesados ({processed}) supera el total ({total})")]
    Overflow { processed: u64, total: u64 },
    #[error("COMPLETED con {processed} de {total} registros procesados")]
    Incomplete { processed: u64, total: u64 },
}

/// Fechas tal como las mandan los backends Java: a veces RFC 3339,
/// a veces `LocalDateTime` sin zona (se asume UTC).
pub(crate) mod lenient_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    const NAIVE_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("fecha inválida: {raw}")))
    }

    pub fn option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("fecha inválida: {raw}"))),
        }
    }
}
