//! Consulta repetida del estado de un job hasta que termine.

use common::JobStatusReport;
use std::time::Duration;
use tracing::debug;

use crate::api::ApiResult;
use crate::store::BatchStore;

/// `tokio::time::interval` no acepta cero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pide el estado cada `interval` hasta que sea terminal o se llegue a
/// `max_polls` consultas. Llama a `on_update` con cada respuesta y
/// devuelve la última. Un `interval` menor a 10 ms se sube a 10 ms.
pub async fn poll_job_status<F>(
    store: &BatchStore,
    job_id: &str,
    interval: Duration,
    max_polls: u32,
    mut on_update: F,
) -> ApiResult<JobStatusReport>
where
    F: FnMut(&JobStatusReport),
{
    let mut ticker = tokio::time::interval(interval.max(MIN_POLL_INTERVAL));
    let mut polls = 0u32;

    loop {
        ticker.tick().await;
        polls += 1;

        let report = store.get_batch_job_status(job_id).await?;
        debug!(
            "poll #{} de {}: {} {:.1}%",
            polls, job_id, report.status, report.progress
        );
        on_update(&report);

        if report.status.is_terminal() || polls >= max_polls.max(1) {
            return Ok(report);
        }
    }
}
