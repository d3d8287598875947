//! Vista paginada de jobs: qué página se mira, cuántas filas, qué acciones
//! tiene cada fila y cómo se dibuja la tabla.

use common::{
    format_date_time, format_number, format_status, get_status_color, total_pages, BatchJob,
    BatchJobStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::download::save_report;
use crate::error::StoreError;
use crate::refresh::RefreshListener;
use crate::store::{BatchStore, Outcome};

pub const ROWS_PER_PAGE_OPTIONS: [u32; 4] = [5, 10, 25, 50];
pub const DEFAULT_ROWS_PER_PAGE: u32 = 10;

/// Lleva un tamaño cualquiera a la opción válida más cercana por arriba.
pub fn normalize_rows_per_page(n: u32) -> u32 {
    ROWS_PER_PAGE_OPTIONS
        .iter()
        .copied()
        .find(|opt| *opt >= n)
        .unwrap_or(ROWS_PER_PAGE_OPTIONS[ROWS_PER_PAGE_OPTIONS.len() - 1])
}

pub fn can_download(job: &BatchJob) -> bool {
    job.status == BatchJobStatus::Completed
}

pub fn can_retry(job: &BatchJob) -> bool {
    job.status == BatchJobStatus::Completed && job.failed_count > 0
}

/// Resultado de una acción de fila.
#[derive(Debug, Clone, PartialEq)]
pub enum RowAction {
    /// La acción no aplica a esa fila; no se llamó a la API.
    Disabled,
    Done(String),
    Saved(PathBuf),
    Failed(String),
}

pub struct JobListView {
    store: Arc<BatchStore>,
    refresh: RefreshListener,
    page: u32,
    rows_per_page: u32,
    total_count: u64,
    download_dir: PathBuf,
}

impl JobListView {
    pub fn new(
        store: Arc<BatchStore>,
        refresh: RefreshListener,
        rows_per_page: u32,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            refresh,
            page: 0,
            rows_per_page: normalize_rows_per_page(rows_per_page),
            total_count: 0,
            download_dir,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn rows_per_page(&self) -> u32 {
        self.rows_per_page
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn jobs(&self) -> Vec<BatchJob> {
        self.store.batch_jobs()
    }

    /// Carga inicial.
    pub async fn load(&mut self) -> Result<(), StoreError> {
        self.fetch().await
    }

    /// Recarga manual de la página actual.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        self.fetch().await
    }

    /// Espera al próximo aviso de refresh y recarga.
    /// `None` cuando ya nadie puede avisar.
    pub async fn watch_refresh(&mut self) -> Option<Result<(), StoreError>> {
        let tick = self.refresh.changed().await?;
        debug!("refresh #{} recibido", tick);
        Some(self.fetch().await)
    }

    /// Si hubo avisos desde la última vez, recarga una sola vez.
    pub async fn sync_with_refresh(&mut self) -> Result<bool, StoreError> {
        if !self.refresh.has_changed() {
            return Ok(false);
        }
        self.refresh.mark_seen();
        self.fetch().await?;
        Ok(true)
    }

    pub async fn set_page(&mut self, page: u32) -> Result<(), StoreError> {
        self.page = page;
        self.fetch().await
    }

    /// Cambiar el tamaño vuelve a la primera página.
    pub async fn set_rows_per_page(&mut self, rows: u32) -> Result<(), StoreError> {
        self.rows_per_page = normalize_rows_per_page(rows);
        self.page = 0;
        self.fetch().await
    }

    async fn fetch(&mut self) -> Result<(), StoreError> {
        match self
            .store
            .fetch_batch_jobs(self.page, self.rows_per_page)
            .await
        {
            Ok(listing) => {
                self.total_count = listing.total_count();
                Ok(())
            }
            Err(StoreError::Superseded { seq }) => {
                debug!("fetch #{} reemplazado, se ignora", seq);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn find(&self, job_id: &str) -> Option<BatchJob> {
        self.store
            .batch_jobs()
            .into_iter()
            .find(|job| job.job_id == job_id)
    }

    /// Reintenta los registros fallidos de un job de la página actual.
    /// Si sale bien, recarga la página.
    pub async fn retry(&mut self, job_id: &str) -> RowAction {
        match self.find(job_id) {
            Some(job) if can_retry(&job) => {}
            _ => return RowAction::Disabled,
        }

        match self.store.retry_failed_records(job_id).await {
            Outcome::Success(ack) => {
                info!("retry de {} aceptado", job_id);
                if let Err(err) = self.fetch().await {
                    debug!("no se pudo recargar tras el retry: {}", err);
                }
                RowAction::Done(ack.message)
            }
            Outcome::Failure(message) => RowAction::Failed(message),
        }
    }

    /// Descarga el reporte de un job COMPLETED de la página actual.
    pub async fn download(&self, job_id: &str) -> RowAction {
        match self.find(job_id) {
            Some(job) if can_download(&job) => {}
            _ => return RowAction::Disabled,
        }

        match self.store.download_report(job_id).await {
            Outcome::Success(report) => {
                match save_report(&self.download_dir, &report, job_id).await {
                    Ok(path) => RowAction::Saved(path),
                    Err(err) => RowAction::Failed(format!("No se pudo guardar el reporte: {err}")),
                }
            }
            Outcome::Failure(message) => RowAction::Failed(message),
        }
    }

    /// Tabla en texto plano con la página actual.
    pub fn render(&self) -> String {
        let snap = self.store.snapshot();
        let mut out = String::new();

        if snap.loading {
            out.push_str("Cargando...\n");
        }
        if let Some(err) = &snap.error {
            out.push_str(&format!("Error: {err}\n"));
        }

        out.push_str(&format!(
            "{:<14} {:<28} {:<24} {:>10} {:>10} {:>10} {:<17} {}\n",
            "JOB ID", "ARCHIVO", "ESTADO", "TOTAL", "EXITOSOS", "FALLIDOS", "SUBIDO", "ACCIONES"
        ));

        if snap.batch_jobs.is_empty() && !snap.loading {
            out.push_str("(no hay batch jobs)\n");
        }

        for job in &snap.batch_jobs {
            let status = job.status.as_str();
            let label = format!(
                "{} [{}]",
                format_status(status),
                get_status_color(status)
            );

            let mut actions = Vec::new();
            if can_download(job) {
                actions.push("reporte");
            }
            if can_retry(job) {
                actions.push("reintentar");
            }
            let actions = if actions.is_empty() {
                "-".to_string()
            } else {
                actions.join(",")
            };

            out.push_str(&format!(
                "{:<14} {:<28} {:<24} {:>10} {:>10} {:>10} {:<17} {}\n",
                job.job_id,
                truncate(&job.file_name, 28),
                label,
                format_number(job.total_records),
                format_number(job.success_count),
                format_number(job.failed_count),
                format_date_time(Some(job.uploaded_date)),
                actions
            ));
        }

        out.push_str(&self.footer());
        out
    }

    fn footer(&self) -> String {
        let pages = total_pages(self.total_count, self.rows_per_page);
        let from = if self.total_count == 0 {
            0
        } else {
            u64::from(self.page) * u64::from(self.rows_per_page) + 1
        };
        let to = (u64::from(self.page) + 1) * u64::from(self.rows_per_page);
        format!(
            "Página {} de {} | {}-{} de {} | Filas por página: {}\n",
            self.page + 1,
            pages.max(1),
            from,
            to.min(self.total_count),
            format_number(self.total_count),
            self.rows_per_page
        )
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max - 1).collect();
    cut.push('…');
    cut
}
