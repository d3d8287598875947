//! Flujo de carga de un archivo:
//! `Idle -> FileSelected -> Uploading -> {Succeeded | Failed}`, y `reset -> Idle`.

use common::{mime_type_for, validate_upload, JobId, ValidationError, MAX_UPLOAD_BYTES};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::UploadOptions;
use crate::refresh::RefreshTrigger;
use crate::store::{BatchStore, Outcome};

/// De dónde salen los bytes del archivo.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    Memory(Vec<u8>),
    /// Se lee recién al subir; elegir un archivo enorme no lo carga en memoria
    Disk(PathBuf),
}

/// Archivo elegido por el usuario.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub source: FileSource,
}

impl UploadFile {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Memory(bytes),
        }
    }

    /// Toma nombre y tamaño de la metadata y deduce el MIME por extensión.
    pub async fn from_path(path: &Path) -> io::Result<Self> {
        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} no es un archivo", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            mime_type: mime_type_for(&name).to_string(),
            name,
            size: meta.len(),
            source: FileSource::Disk(path.to_path_buf()),
        })
    }

    pub async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Disk(path) => {
                let bytes = tokio::fs::read(path).await?;
                // el archivo pudo crecer desde que se eligió
                if bytes.len() as u64 > MAX_UPLOAD_BYTES {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("{} supera el máximo de {} bytes", self.name, MAX_UPLOAD_BYTES),
                    ));
                }
                Ok(bytes)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_upload(&self.name, self.size, &self.mime_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    FileSelected,
    Uploading,
    Succeeded,
    Failed,
}

/// Resultado del último intento de carga.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadStatus {
    pub success: bool,
    pub message: String,
    pub job_id: Option<JobId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRefused {
    #[error("no hay archivo seleccionado")]
    NoFile,
    #[error("ya hay una operación en curso")]
    Busy,
}

/// Estado transitorio de la pantalla de carga.
pub struct UploadWorkflow {
    state: UploadState,
    selected: Option<UploadFile>,
    validation_error: Option<String>,
    status: Option<UploadStatus>,
    refresh: RefreshTrigger,
}

impl UploadWorkflow {
    /// `refresh` se incrementa una vez por cada carga exitosa.
    pub fn new(refresh: RefreshTrigger) -> Self {
        Self {
            state: UploadState::Idle,
            selected: None,
            validation_error: None,
            status: None,
            refresh,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn selected(&self) -> Option<&UploadFile> {
        self.selected.as_ref()
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn status(&self) -> Option<&UploadStatus> {
        self.status.as_ref()
    }

    /// Valida y, si pasa, deja el archivo seleccionado.
    /// Si no pasa, guarda el mensaje y descarta la selección.
    pub fn select_file(&mut self, file: UploadFile) -> Result<(), ValidationError> {
        if let Err(err) = file.validate() {
            warn!("archivo rechazado: {} ({})", file.name, err);
            self.validation_error = Some(err.to_string());
            self.selected = None;
            self.state = UploadState::Idle;
            return Err(err);
        }

        self.validation_error = None;
        self.status = None;
        self.selected = Some(file);
        self.state = UploadState::FileSelected;
        Ok(())
    }

    /// El botón de subir sólo está habilitado con archivo y sin nada en vuelo.
    pub fn can_submit(&self, store: &BatchStore) -> bool {
        self.selected.is_some() && !store.is_loading()
    }

    /// Sube el archivo seleccionado a través del store.
    ///
    /// - éxito: limpia la selección, guarda `{true, mensaje, jobId}` y
    ///   dispara exactamente un refresh
    /// - fallo: guarda `{false, mensaje}` y deja el archivo para reintentar
    pub async fn submit(
        &mut self,
        store: &BatchStore,
        options: &UploadOptions,
    ) -> Result<UploadStatus, SubmitRefused> {
        if self.selected.is_none() {
            return Err(SubmitRefused::NoFile);
        }
        if store.is_loading() {
            return Err(SubmitRefused::Busy);
        }

        self.state = UploadState::Uploading;
        self.validation_error = None;

        // la selección se suelta recién con el resultado en mano: si el
        // future se descarta, el archivo sigue elegido
        let Some(file) = self.selected.as_ref() else {
            return Err(SubmitRefused::NoFile);
        };
        let name = file.name.clone();
        let outcome = store.upload_batch(file, options).await;

        let status = match outcome {
            Outcome::Success(receipt) => {
                let message = receipt.message.clone().unwrap_or_else(|| {
                    format!("{} subido correctamente (job {})", name, receipt.job_id)
                });
                let tick = self.refresh.bump();
                info!("carga ok: {} -> {} (refresh #{})", name, receipt.job_id, tick);
                self.selected = None;
                self.state = UploadState::Succeeded;
                UploadStatus {
                    success: true,
                    message,
                    job_id: Some(receipt.job_id),
                }
            }
            Outcome::Failure(message) => {
                warn!("carga falló: {} ({})", name, message);
                self.state = UploadState::Failed;
                UploadStatus {
                    success: false,
                    message,
                    job_id: None,
                }
            }
        };

        self.status = Some(status.clone());
        Ok(status)
    }

    /// Vuelve a `Idle` desde cualquier estado.
    pub fn reset(&mut self) {
        self.state = UploadState::Idle;
        self.selected = None;
        self.validation_error = None;
        self.status = None;
    }
}
