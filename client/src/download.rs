//! Guardado de reportes descargados.

use common::{report_file_name, BatchReport};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Escribe el reporte en `dir` y devuelve la ruta final.
///
/// Primero va a un `.part` y se renombra al terminar, así nunca queda un
/// reporte a medio escribir con el nombre final.
pub async fn save_report(dir: &Path, report: &BatchReport, job_id: &str) -> io::Result<PathBuf> {
    let name = report
        .file_name
        .clone()
        .unwrap_or_else(|| report_file_name(job_id));

    tokio::fs::create_dir_all(dir).await?;
    let final_path = dir.join(&name);
    let part_path = dir.join(format!("{name}.part"));

    if let Err(err) = tokio::fs::write(&part_path, &report.bytes).await {
        let _ = tokio::fs::remove_file(&part_path).await;
        return Err(err);
    }
    if let Err(err) = tokio::fs::rename(&part_path, &final_path).await {
        let _ = tokio::fs::remove_file(&part_path).await;
        return Err(err);
    }

    info!(
        "reporte de {} guardado en {} ({} bytes)",
        job_id,
        final_path.display(),
        report.bytes.len()
    );
    Ok(final_path)
}
