//! Errores de la capa de cliente.

use thiserror::Error;

/// Error al hablar con la API de batch.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No hubo respuesta (conexión rechazada, timeout, TLS...).
    #[error("error de transporte: {0}")]
    Transport(#[from] reqwest::Error),

    /// El servidor respondió con un estado no exitoso.
    /// `message` es el campo `message` del cuerpo JSON, si vino.
    #[error(
        "el servidor respondió {status}: {}",
        .message.as_deref().unwrap_or("sin detalle")
    )]
    Status { status: u16, message: Option<String> },

    /// La respuesta no tenía la forma esperada.
    #[error("respuesta inválida: {0}")]
    Decode(String),

    #[error("URL base inválida: {0}")]
    InvalidUrl(String),

    #[error("error de E/S: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Mensaje legible que mandó el servidor, si mandó alguno.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Lo que se le muestra al usuario: el mensaje del servidor o `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.message().unwrap_or(fallback).to_string()
    }
}

/// Errores del store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Llegó la respuesta de un fetch que ya fue reemplazado por otro más nuevo.
    #[error("respuesta descartada: el fetch {seq} fue reemplazado por uno más reciente")]
    Superseded { seq: u64 },
}
