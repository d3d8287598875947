//! Capa de formateo: convierte valores crudos en strings para mostrar
//! y en categorías de color de la UI. Funciones puras, sin estado.

use chrono::{DateTime, Utc};
use std::fmt;

/// Lo que se muestra cuando no hay valor.
pub const EMPTY_VALUE: &str = "-";

/* =========================
   Números y moneda
   ========================= */

/// Agrupa de a miles con coma: 1234567 -> "1,234,567".
fn group_thousands(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `format_number(1234567) == "1,234,567"`. Sirve para cualquier entero.
pub fn format_number<N: Into<i128>>(n: N) -> String {
    let n: i128 = n.into();
    let body = group_thousands(n.unsigned_abs());
    if n < 0 {
        format!("-{body}")
    } else {
        body
    }
}

fn currency_symbol(code: &str) -> Option<(&'static str, usize)> {
    match code {
        "USD" => Some(("$", 2)),
        "EUR" => Some(("€", 2)),
        "GBP" => Some(("£", 2)),
        "JPY" => Some(("¥", 0)),
        _ => None,
    }
}

/// `format_currency(Some(1000.0), "USD") == "$1,000.00"`, `None -> "-"`.
/// Monedas sin símbolo conocido salen como `"CHF 1,000.00"`.
pub fn format_currency(amount: Option<f64>, currency: &str) -> String {
    let Some(amount) = amount.filter(|a| a.is_finite()) else {
        return EMPTY_VALUE.to_string();
    };

    let code = currency.trim().to_ascii_uppercase();
    let (symbol, decimals) = currency_symbol(&code).unwrap_or(("", 2));

    let factor = 10u128.pow(decimals as u32);
    let scaled = (amount.abs() * factor as f64).round() as u128;
    let mut body = group_thousands(scaled / factor);
    if decimals > 0 {
        body.push_str(&format!(".{:0width$}", scaled % factor, width = decimals));
    }

    // -0.004 redondea a cero: sin signo
    let sign = if amount < 0.0 && scaled > 0 { "-" } else { "" };

    if symbol.is_empty() {
        format!("{sign}{code} {body}")
    } else {
        format!("{sign}{symbol}{body}")
    }
}

pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return EMPTY_VALUE.to_string();
    }
    format!("{value:.1}%")
}

/// Tamaño de archivo legible: "512 B", "1.5 KB", "10.0 MB".
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/* =========================
   Fechas
   ========================= */

pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| EMPTY_VALUE.to_string())
}

pub fn format_date_time(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| EMPTY_VALUE.to_string())
}

/* =========================
   Estados
   ========================= */

/// Categoría de color con la que la UI pinta un estado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Success,
    Info,
    Warning,
    Error,
    Default,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Success => "success",
            StatusColor::Info => "info",
            StatusColor::Warning => "warning",
            StatusColor::Error => "error",
            StatusColor::Default => "default",
        }
    }
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapeo fijo estado -> color. Cualquier cosa desconocida es `default`.
pub fn get_status_color(status: &str) -> StatusColor {
    match status.trim().to_ascii_uppercase().as_str() {
        "COMPLETED" => StatusColor::Success,
        "PROCESSING" => StatusColor::Info,
        "FAILED" => StatusColor::Error,
        "QUEUED" | "PENDING" => StatusColor::Warning,
        _ => StatusColor::Default,
    }
}

/// "PROCESSING" -> "Processing", "PARTIALLY_FAILED" -> "Partially failed".
pub fn format_status(status: &str) -> String {
    let lower = status.trim().replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => EMPTY_VALUE.to_string(),
    }
}

/// Nombre por defecto del reporte descargado de un job.
pub fn report_file_name(job_id: &str) -> String {
    format!("batch-report-{job_id}.csv")
}
