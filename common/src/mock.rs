//! Datos sintéticos para cuando la API de batch no responde y el modo demo
//! está activo. Todo tiene la misma forma que las respuestas reales.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::io;

use crate::format::report_file_name;
use crate::job::{BatchJob, BatchJobStatus};
use crate::page::Page;
use crate::results::{ActionAck, BatchReport, JobStatusReport, UploadReceipt};

/// Cantidad fija de jobs del corpus de demo.
pub const MOCK_CORPUS_SIZE: usize = 10;

/// Semilla fija: el corpus es siempre el mismo entre llamadas.
const MOCK_SEED: u64 = 0x0BA7_C4_2024;

/// 2024-03-15T18:00:00Z, ancla de las fechas del corpus
const MOCK_ANCHOR_EPOCH: i64 = 1_710_525_600;

pub const REPORT_HEADER: [&str; 6] = [
    "Job ID",
    "Status",
    "Total Records",
    "Processed",
    "Success",
    "Failed",
];

const UPLOADERS: [&str; 4] = ["ops.admin", "jlopez", "mgarcia", "finance.bot"];

const STATUS_CYCLE: [BatchJobStatus; 5] = [
    BatchJobStatus::Completed,
    BatchJobStatus::Processing,
    BatchJobStatus::Failed,
    BatchJobStatus::Queued,
    BatchJobStatus::Cancelled,
];

/// Id con el formato `BATCH-######` (6 dígitos con ceros a la izquierda).
pub fn generate_job_id() -> String {
    format_job_id(rand::thread_rng().gen_range(0..1_000_000))
}

fn format_job_id(n: u32) -> String {
    format!("BATCH-{n:06}")
}

/// Arma un job respetando los invariantes de contadores:
/// success + failed <= total, y == total cuando está COMPLETED.
fn mock_job(rng: &mut StdRng, index: usize, job_id: String, anchor: DateTime<Utc>) -> BatchJob {
    let status = STATUS_CYCLE[rng.gen_range(0..STATUS_CYCLE.len())];
    let total: u64 = rng.gen_range(50..=5_000);

    let (success, failed) = match status {
        BatchJobStatus::Completed => {
            let failed = rng.gen_range(0..=total / 10);
            (total - failed, failed)
        }
        BatchJobStatus::Processing | BatchJobStatus::Cancelled => {
            let processed = rng.gen_range(0..total);
            let failed = rng.gen_range(0..=processed / 10);
            (processed - failed, failed)
        }
        BatchJobStatus::Failed => {
            let processed = rng.gen_range(0..=total / 2);
            let success = rng.gen_range(0..=processed);
            (success, processed - success)
        }
        BatchJobStatus::Queued | BatchJobStatus::Unknown => (0, 0),
    };

    let uploaded_date = anchor
        - Duration::hours(rng.gen_range(1..=240))
        - Duration::minutes(rng.gen_range(0..60));
    let completed_date = status
        .is_terminal()
        .then(|| uploaded_date + Duration::minutes(rng.gen_range(2..=90)));

    let ext = if index % 3 == 0 { "xlsx" } else { "csv" };
    let file_name = format!("pagos_{}_{:02}.{ext}", uploaded_date.format("%Y%m%d"), index + 1);

    BatchJob {
        job_id,
        file_name,
        status,
        total_records: total,
        success_count: success,
        failed_count: failed,
        uploaded_date,
        completed_date,
        uploaded_by: UPLOADERS[rng.gen_range(0..UPLOADERS.len())].to_string(),
    }
}

/// Corpus determinista de `MOCK_CORPUS_SIZE` jobs, ordenado por
/// `uploaded_date` descendente.
pub fn mock_batch_jobs() -> Vec<BatchJob> {
    let mut rng = StdRng::seed_from_u64(MOCK_SEED);
    let anchor = DateTime::<Utc>::from_timestamp(MOCK_ANCHOR_EPOCH, 0).unwrap_or_default();

    let mut seen_ids = HashSet::new();
    let mut jobs = Vec::with_capacity(MOCK_CORPUS_SIZE);
    for index in 0..MOCK_CORPUS_SIZE {
        // ids únicos dentro del corpus
        let job_id = loop {
            let candidate = format_job_id(rng.gen_range(0..1_000_000));
            if seen_ids.insert(candidate.clone()) {
                break candidate;
            }
        };
        jobs.push(mock_job(&mut rng, index, job_id, anchor));
    }

    jobs.sort_by(|a, b| b.uploaded_date.cmp(&a.uploaded_date));
    jobs
}

/// Página `[page*size, page*size+size)` del corpus de demo.
pub fn mock_job_page(page: u32, size: u32) -> Page<BatchJob> {
    Page::from_slice(&mock_batch_jobs(), page, size)
}

/// Un job del corpus por id, o un placeholder QUEUED si no existe.
pub fn mock_job_detail(job_id: &str) -> BatchJob {
    mock_batch_jobs()
        .into_iter()
        .find(|job| job.job_id == job_id)
        .unwrap_or_else(|| BatchJob {
            job_id: job_id.to_string(),
            file_name: String::new(),
            status: BatchJobStatus::Queued,
            total_records: 0,
            success_count: 0,
            failed_count: 0,
            uploaded_date: Utc::now(),
            completed_date: None,
            uploaded_by: String::new(),
        })
}

pub fn mock_upload_receipt(file_name: &str) -> UploadReceipt {
    let job_id = generate_job_id();
    UploadReceipt {
        message: Some(format!(
            "Modo demo: {file_name} encolado como {job_id} (API no disponible)"
        )),
        job_id,
        file_name: file_name.to_string(),
        status: BatchJobStatus::Queued,
        uploaded_date: Some(Utc::now()),
    }
}

pub fn mock_status_report(job_id: &str) -> JobStatusReport {
    JobStatusReport {
        job_id: job_id.to_string(),
        status: BatchJobStatus::Processing,
        progress: f64::from(rand::thread_rng().gen_range(0u8..100)),
    }
}

/// Acuse positivo para retry / cancel; `action` va en el mensaje.
pub fn mock_ack(job_id: &str, action: &str) -> ActionAck {
    ActionAck {
        success: true,
        message: format!("Modo demo: {action} aceptado para {job_id}"),
        job_id: job_id.to_string(),
    }
}

/// CSV mínimo: encabezado fijo + una fila de ejemplo para `job_id`.
/// Si el job está en el corpus se usan sus números.
pub fn mock_report_csv(job_id: &str) -> io::Result<Vec<u8>> {
    let (status, total, success, failed) = mock_batch_jobs()
        .into_iter()
        .find(|job| job.job_id == job_id)
        .map(|job| {
            (
                job.status,
                job.total_records,
                job.success_count,
                job.failed_count,
            )
        })
        .unwrap_or((BatchJobStatus::Completed, 100, 95, 5));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADER)?;
    writer.write_record([
        job_id.to_string(),
        status.to_string(),
        total.to_string(),
        (success + failed).to_string(),
        success.to_string(),
        failed.to_string(),
    ])?;
    writer.into_inner().map_err(|e| e.into_error())
}

pub fn mock_report(job_id: &str) -> io::Result<BatchReport> {
    Ok(BatchReport {
        bytes: mock_report_csv(job_id)?,
        file_name: Some(report_file_name(job_id)),
        content_type: "text/csv".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn es_job_id_valido(id: &str) -> bool {
        match id.strip_prefix("BATCH-") {
            Some(digits) => digits.len() == 6 && digits.chars().all(|c| c.is_ascii_digit()),
            None => false,
        }
    }

    #[test]
    fn job_id_tiene_formato_batch_seis_digitos() {
        for _ in 0..200 {
            let id = generate_job_id();
            assert!(es_job_id_valido(&id), "id inválido: {id}");
        }
        assert_eq!(format_job_id(42), "BATCH-000042");
    }

    #[test]
    fn corpus_es_determinista_ordenado_y_consistente() {
        let a = mock_batch_jobs();
        let b = mock_batch_jobs();
        assert_eq!(a, b);
        assert_eq!(a.len(), MOCK_CORPUS_SIZE);

        for pair in a.windows(2) {
            assert!(pair[0].uploaded_date >= pair[1].uploaded_date);
        }
        for job in &a {
            assert!(es_job_id_valido(&job.job_id));
            assert_eq!(job.check_counts(), Ok(()), "contadores inválidos en {:?}", job);
            assert_eq!(job.completed_date.is_some(), job.status.is_terminal());
        }

        let ids: HashSet<_> = a.iter().map(|j| j.job_id.clone()).collect();
        assert_eq!(ids.len(), MOCK_CORPUS_SIZE);
    }

    #[test]
    fn paginas_del_corpus() {
        for size in [1u32, 3, 4, 10, 25] {
            for page in 0..4u32 {
                let p = mock_job_page(page, size);
                assert!(p.content.len() <= size as usize);
                assert_eq!(p.total_elements, 10);
                assert_eq!(p.total_pages, 10u64.div_ceil(size as u64));
                assert_eq!(p.number, page);
                assert_eq!(p.size, size);
                for pair in p.content.windows(2) {
                    assert!(pair[0].uploaded_date >= pair[1].uploaded_date);
                }
            }
        }

        // la segunda página sigue a la primera
        let all = mock_batch_jobs();
        let second = mock_job_page(1, 4);
        assert_eq!(second.content, all[4..8].to_vec());
    }

    #[test]
    fn reporte_csv_tiene_encabezado_y_fila_del_job() {
        let csv = String::from_utf8(mock_report_csv("BATCH-123456").unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Job ID,Status,Total Records,Processed,Success,Failed");
        assert_eq!(lines[1], "BATCH-123456,COMPLETED,100,100,95,5");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn reporte_usa_numeros_del_corpus_si_existe() {
        let job = mock_batch_jobs().remove(0);
        let csv = String::from_utf8(mock_report_csv(&job.job_id).unwrap()).unwrap();
        let row = csv.lines().nth(1).unwrap();

        assert!(row.starts_with(&format!("{},{}", job.job_id, job.status)));
        assert!(row.ends_with(&format!("{},{}", job.success_count, job.failed_count)));

        let report = mock_report(&job.job_id).unwrap();
        assert_eq!(report.content_type, "text/csv");
        assert_eq!(report.file_name, Some(report_file_name(&job.job_id)));
    }

    #[test]
    fn upload_y_acks_de_demo() {
        let r = mock_upload_receipt("pagos.csv");
        assert!(es_job_id_valido(&r.job_id));
        assert_eq!(r.file_name, "pagos.csv");
        assert_eq!(r.status, BatchJobStatus::Queued);
        assert!(r.uploaded_date.is_some());

        let s = mock_status_report("BATCH-000001");
        assert_eq!(s.status, BatchJobStatus::Processing);
        assert!((0.0..100.0).contains(&s.progress));

        let ack = mock_ack("BATCH-000001", "retry");
        assert!(ack.success);
        assert_eq!(ack.job_id, "BATCH-000001");

        let placeholder = mock_job_detail("BATCH-999999x");
        assert_eq!(placeholder.status, BatchJobStatus::Queued);
    }
}
