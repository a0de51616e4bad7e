//! Shared query parsing and pagination for the list routes.

use tflow_core::Page;

use crate::error::ApiError;

pub const DEFAULT_JOBS_PAGE_SIZE: usize = 10;
pub const DEFAULT_CANDIDATES_PAGE_SIZE: usize = 50;

/// 1-based page index and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: usize,
    pub page_size: usize,
}

impl Paging {
    /// Parse raw query values. Blank values fall back to defaults; zero is raised to one.
    pub fn parse(
        page: Option<&str>,
        page_size: Option<&str>,
        default_page_size: usize,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            page: parse_positive("page", page)?.unwrap_or(1),
            page_size: parse_positive("pageSize", page_size)?.unwrap_or(default_page_size),
        })
    }

    /// Cut one page out of the filtered, sorted matches; `total` counts all of them.
    pub fn apply<T>(self, matches: Vec<T>) -> Page<T> {
        let total = matches.len();
        let start = (self.page - 1).saturating_mul(self.page_size);
        let items = matches
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect();
        Page {
            items,
            total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<usize>, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse::<usize>()
            .map(|n| Some(n.max(1)))
            .map_err(|_| ApiError::Validation(format!("{name} must be a positive integer"))),
    }
}

/// Lower-cased search needle, or `None` when blank.
pub fn search_needle(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

/// Exact-match filter value, or `None` when blank.
pub fn exact_filter(raw: Option<&str>) -> Option<&str> {
    raw.filter(|v| !v.is_empty())
}
