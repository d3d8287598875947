use thiserror::Error;

/// Tope duro de tamaño para una carga: 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Tipos MIME de CSV / Excel que acepta el endpoint de carga.
pub const ACCEPTED_MIME_TYPES: [&str; 4] = [
    "text/csv",
    "application/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Extensiones que ofrece el selector de archivos.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Selecciona un archivo CSV o Excel ({file_name} es {mime_type})")]
    UnsupportedType { file_name: String, mime_type: String },

    #[error("El archivo pesa {size} bytes; el máximo es {limit} bytes (10 MB)")]
    TooLarge { size: u64, limit: u64 },

    #[error("El archivo no tiene nombre")]
    MissingName,
}

fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// MIME a partir de la extensión, como lo haría el navegador al elegir archivo.
pub fn mime_type_for(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        _ => "application/octet-stream",
    }
}

/// Valida un archivo antes de subirlo:
/// - MIME dentro de `ACCEPTED_MIME_TYPES` o nombre terminado en `.csv`
/// - tamaño <= `MAX_UPLOAD_BYTES`
pub fn validate_upload(file_name: &str, size: u64, mime_type: &str) -> Result<(), ValidationError> {
    if file_name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }

    let mime = mime_type.trim().to_ascii_lowercase();
    let type_ok = ACCEPTED_MIME_TYPES.contains(&mime.as_str())
        || file_name.to_ascii_lowercase().ends_with(".csv");
    if !type_ok {
        return Err(ValidationError::UnsupportedType {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
        });
    }

    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }

    Ok(())
}
