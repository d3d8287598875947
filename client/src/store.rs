//! Estado compartido de la lista de jobs.
//!
//! Se comparte como `Arc<BatchStore>` entre vistas. Cada fetch lleva un
//! número de secuencia: si al volver ya hay uno más nuevo, su respuesta
//! se descarta sin tocar el estado.

use common::{ActionAck, BatchJob, BatchReport, JobListing, JobStatusReport, UploadReceipt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::api::{ApiResult, BatchApi, UploadOptions};
use crate::error::StoreError;
use crate::upload::UploadFile;

const FETCH_FAILED: &str = "No se pudieron obtener los batch jobs";
const UPLOAD_FAILED: &str = "No se pudo subir el archivo";
const RETRY_FAILED: &str = "No se pudieron reintentar los registros fallidos";
const DOWNLOAD_FAILED: &str = "No se pudo descargar el reporte";
const CANCEL_FAILED: &str = "No se pudo cancelar el job";

/// Resultado de las operaciones que nunca devuelven error: o hay datos
/// o hay un mensaje para mostrar.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> Outcome<T> {
    fn from_api(res: ApiResult<T>, fallback: &str) -> Self {
        match res {
            Ok(data) => Outcome::Success(data),
            Err(err) => {
                warn!("{}: {}", fallback, err);
                Outcome::Failure(err.user_message(fallback))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub batch_jobs: Vec<BatchJob>,
    pub loading: bool,
    pub error: Option<String>,
}

/* ==== Estado interno ==== */

/// Marca de "hay una llamada en vuelo" que sólo la llamada más nueva puede limpiar.
#[derive(Debug, Default)]
struct Slot {
    issued: u64,
    in_flight: Option<u64>,
}

impl Slot {
    fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight = Some(self.issued);
        self.issued
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.issued == seq
    }

    fn finish(&mut self, seq: u64) {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    batch_jobs: Vec<BatchJob>,
    error: Option<String>,
    fetch: Slot,
    upload: Slot,
}

#[derive(Debug, Clone, Copy)]
enum SlotKind {
    Fetch,
    Upload,
}

impl StoreState {
    fn loading(&self) -> bool {
        self.fetch.in_flight.is_some() || self.upload.in_flight.is_some()
    }

    fn slot(&mut self, kind: SlotKind) -> &mut Slot {
        match kind {
            SlotKind::Fetch => &mut self.fetch,
            SlotKind::Upload => &mut self.upload,
        }
    }
}

/// Libera el slot al salir, también si el future se descarta a mitad de camino.
struct InFlight<'a> {
    store: &'a BatchStore,
    kind: SlotKind,
    seq: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.store.lock().slot(self.kind).finish(self.seq);
    }
}

/* ==== Store ==== */

pub struct BatchStore {
    api: Arc<dyn BatchApi>,
    state: Mutex<StoreState>,
}

impl BatchStore {
    pub fn new(api: Arc<dyn BatchApi>) -> Self {
        Self {
            api,
            state: Mutex::new(StoreState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, kind: SlotKind) -> InFlight<'_> {
        let mut st = self.lock();
        if let SlotKind::Fetch = kind {
            st.error = None;
        }
        let seq = st.slot(kind).begin();
        InFlight {
            store: self,
            kind,
            seq,
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let st = self.lock();
        StoreSnapshot {
            batch_jobs: st.batch_jobs.clone(),
            loading: st.loading(),
            error: st.error.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading()
    }

    pub fn batch_jobs(&self) -> Vec<BatchJob> {
        self.lock().batch_jobs.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Trae una página y la deja como contenido actual del store.
    ///
    /// Devuelve el listado completo para que la vista lleve la cuenta total.
    /// Si mientras tanto salió otro fetch, devuelve `Superseded` y no toca nada.
    pub async fn fetch_batch_jobs(&self, page: u32, size: u32) -> Result<JobListing, StoreError> {
        let guard = self.begin(SlotKind::Fetch);
        let seq = guard.seq;
        debug!("fetch #{} page={} size={}", seq, page, size);

        let res = self.api.get_batch_jobs(page, size).await;

        let mut st = self.lock();
        if !st.fetch.is_latest(seq) {
            debug!("fetch #{} descartado (último: #{})", seq, st.fetch.issued);
            return Err(StoreError::Superseded { seq });
        }
        st.fetch.finish(seq);

        match res {
            Ok(listing) => {
                for job in listing.jobs() {
                    if let Err(violation) = job.check_counts() {
                        warn!("contadores inconsistentes en {}: {}", job.job_id, violation);
                    }
                }
                st.batch_jobs = listing.jobs().to_vec();
                debug!(
                    "fetch #{} ok: {} jobs de {}",
                    seq,
                    st.batch_jobs.len(),
                    listing.total_count()
                );
                Ok(listing)
            }
            Err(err) => {
                warn!("fetch #{} falló: {}", seq, err);
                st.error = Some(err.user_message(FETCH_FAILED));
                Err(err.into())
            }
        }
    }

    pub async fn upload_batch(
        &self,
        file: &UploadFile,
        options: &UploadOptions,
    ) -> Outcome<UploadReceipt> {
        let guard = self.begin(SlotKind::Upload);
        info!("subiendo {} ({} bytes)", file.name, file.size);

        let res = self.api.upload_batch(file, options).await;

        drop(guard);
        Outcome::from_api(res, UPLOAD_FAILED)
    }

    /// Un ack con `success: false` también cuenta como fallo.
    pub async fn retry_failed_records(&self, job_id: &str) -> Outcome<ActionAck> {
        info!("reintentando registros fallidos de {}", job_id);
        let res = self.api.retry_failed_records(job_id).await;
        ack_outcome(res, RETRY_FAILED)
    }

    pub async fn download_report(&self, job_id: &str) -> Outcome<BatchReport> {
        info!("descargando reporte de {}", job_id);
        Outcome::from_api(self.api.download_batch_report(job_id).await, DOWNLOAD_FAILED)
    }

    pub async fn cancel_batch_job(&self, job_id: &str) -> Outcome<ActionAck> {
        info!("cancelando {}", job_id);
        let res = self.api.cancel_batch_job(job_id).await;
        ack_outcome(res, CANCEL_FAILED)
    }

    pub async fn get_batch_job_status(&self, job_id: &str) -> ApiResult<JobStatusReport> {
        self.api.get_batch_job_status(job_id).await
    }

    pub async fn get_batch_job(&self, job_id: &str) -> ApiResult<BatchJob> {
        self.api.get_batch_job(job_id).await
    }
}

fn ack_outcome(res: ApiResult<ActionAck>, fallback: &str) -> Outcome<ActionAck> {
    match Outcome::from_api(res, fallback) {
        Outcome::Success(ack) if !ack.success => {
            let message = if ack.message.is_empty() {
                fallback.to_string()
            } else {
                ack.message
            };
            Outcome::Failure(message)
        }
        other => other,
    }
}
