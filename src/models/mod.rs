// src/models/mod.rs

pub mod ingredient;
pub mod mark;
pub mod recipe;
pub mod user;

/// Rejects strings made only of whitespace.
pub(crate) fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

/// Query parameters shared by the list endpoints.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ListParams {
    /// 1-based page number (default: 1).
    pub page: Option<usize>,

    /// Number of items per page (default: 10, max: 100).
    pub limit: Option<usize>,
}

impl ListParams {
    /// Slices an already-filtered collection down to the requested page.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let limit = self.limit.unwrap_or(10).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        items
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect()
    }
}
