//! Page envelope, shaped like the STAPI search response
//!
//! Page numbers and sizes are numeric throughout; callers never compare
//! page state as strings.

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Requested page (0-based page number)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Build a request, clamping the size into `1..=MAX_PAGE_SIZE`
    pub fn new(page_number: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page_number: page_number.unwrap_or(0),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Slice one page out of an already filtered and sorted list
    pub fn paginate<T: Clone>(&self, items: &[T]) -> (PageInfo, Vec<T>) {
        let start = (self.page_number as usize).saturating_mul(self.page_size as usize);
        let slice: Vec<T> = items
            .iter()
            .skip(start)
            .take(self.page_size as usize)
            .cloned()
            .collect();

        let info = PageInfo::new(
            self.page_number,
            self.page_size,
            slice.len() as u32,
            items.len() as u32,
        );
        (info, slice)
    }
}

/// Page metadata block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page_number: u32,
    pub page_size: u32,
    pub number_of_elements: u32,
    pub total_elements: u32,
    pub total_pages: u32,
    pub first_page: bool,
    pub last_page: bool,
}

impl PageInfo {
    pub fn new(page_number: u32, page_size: u32, number_of_elements: u32, total_elements: u32) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_elements.div_ceil(page_size)
        };

        Self {
            page_number,
            page_size,
            number_of_elements,
            total_elements,
            total_pages,
            first_page: page_number == 0,
            last_page: page_number.saturating_add(1) >= total_pages,
        }
    }
}

/// Sort block kept for response compatibility
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortInfo {
    pub clauses: Vec<SortClause>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    pub name: String,
    pub direction: String,
    #[serde(rename = "clauseOrder")]
    pub clause_order: u32,
}

impl SortInfo {
    /// Single ascending clause on `field`
    pub fn ascending(field: &str) -> Self {
        Self {
            clauses: vec![SortClause {
                name: field.to_string(),
                direction: "ASC".to_string(),
                clause_order: 0,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_size() {
        assert_eq!(PageRequest::new(None, None).page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(PageRequest::new(None, Some(0)).page_size, 1);
        assert_eq!(PageRequest::new(None, Some(5000)).page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_paginate_middle_page() {
        let items: Vec<u32> = (0..7).collect();
        let (info, page) = PageRequest::new(Some(1), Some(3)).paginate(&items);
        assert_eq!(page, vec![3, 4, 5]);
        assert_eq!(info.total_pages, 3);
        assert!(!info.first_page);
        assert!(!info.last_page);
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let items: Vec<u32> = (0..4).collect();
        let (info, page) = PageRequest::new(Some(9), Some(2)).paginate(&items);
        assert!(page.is_empty());
        assert_eq!(info.number_of_elements, 0);
        assert_eq!(info.total_elements, 4);
        assert!(info.last_page);
    }

    #[test]
    fn test_empty_list_is_single_last_page() {
        let info = PageInfo::new(0, 20, 0, 0);
        assert_eq!(info.total_pages, 0);
        assert!(info.first_page && info.last_page);
    }
}
