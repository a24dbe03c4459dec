use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{ServiceError, ServiceResult};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Fresh record identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Page request as received from query strings
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Validated `(page, limit)`: page >= 1 and 1 <= limit <= 100
    pub fn resolve(&self) -> ServiceResult<(u32, u32)> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 {
            return Err(ServiceError::ValidationError("page must be at least 1".to_string()));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(ServiceError::ValidationError(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok((page, limit))
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Cut an already ordered list into the requested page
pub fn paginate<T>(items: Vec<T>, params: PageParams) -> ServiceResult<Page<T>> {
    let (page, limit) = params.resolve()?;
    let total = items.len();
    let total_pages = ((total as u64 + limit as u64 - 1) / limit as u64) as u32;
    let skip = (page as usize - 1) * limit as usize;
    let items = items.into_iter().skip(skip).take(limit as usize).collect();
    Ok(Page {
        items,
        page,
        limit,
        total,
        total_pages,
    })
}

/// Lower-case extension of a file name
pub fn file_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}
