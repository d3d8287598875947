use serde::{Deserialize, Serialize};

use crate::job::BatchJob;

/// Envoltorio de paginación estilo Spring:
/// `{ content, totalElements, totalPages, number, size }`.
/// `number` es la página pedida (base 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

/// ceil(total / size); con size 0 no hay páginas.
pub fn total_pages(total_elements: u64, size: u32) -> u64 {
    if size == 0 {
        return 0;
    }
    total_elements.div_ceil(size as u64)
}

impl<T: Clone> Page<T> {
    /// Corta `[page*size, page*size+size)` de una colección completa.
    pub fn from_slice(items: &[T], page: u32, size: u32) -> Self {
        let total = items.len();
        let start = (page as usize).saturating_mul(size as usize).min(total);
        let end = start.saturating_add(size as usize).min(total);

        Page {
            content: items[start..end].to_vec(),
            total_elements: total as u64,
            total_pages: total_pages(total as u64, size),
            number: page,
            size,
        }
    }
}

/// Respuesta del listado de jobs: con envoltorio de paginación o,
/// en backends viejos, el array pelado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobListing {
    Paged(Page<BatchJob>),
    Raw(Vec<BatchJob>),
}

impl JobListing {
    pub fn jobs(&self) -> &[BatchJob] {
        match self {
            JobListing::Paged(page) => &page.content,
            JobListing::Raw(jobs) => jobs,
        }
    }

    pub fn into_jobs(self) -> Vec<BatchJob> {
        match self {
            JobListing::Paged(page) => page.content,
            JobListing::Raw(jobs) => jobs,
        }
    }

    /// `totalElements` si viene paginado, si no el largo del array.
    pub fn total_count(&self) -> u64 {
        match self {
            JobListing::Paged(page) => page.total_elements,
            JobListing::Raw(jobs) => jobs.len() as u64,
        }
    }
}
