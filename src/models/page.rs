//! Pagination parameters shared by listing endpoints

use crate::config::InventoryConfig;

/// Normalized page request (1-based page number)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Clamp raw query values: page >= 1, 1 <= per_page <= max_page_size
    pub fn new(page: Option<i64>, per_page: Option<i64>, config: &InventoryConfig) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(config.default_page_size)
                .clamp(1, config.max_page_size.max(1)),
        }
    }

    /// Rows to skip; saturates for page numbers past any real result set
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Slice an already ordered in-memory collection
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(self.limit() as usize)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        let config = InventoryConfig::default();
        let page = PageRequest::new(Some(0), Some(10_000), &config);
        assert_eq!(page, PageRequest { page: 1, per_page: config.max_page_size });

        let defaults = PageRequest::new(None, None, &config);
        assert_eq!(defaults.per_page, config.default_page_size);
    }

    #[test]
    fn slices_requested_window() {
        let config = InventoryConfig::default();
        let page = PageRequest::new(Some(2), Some(3), &config);
        let items: Vec<i32> = (1..=10).collect();
        assert_eq!(page.offset(), 3);
        assert_eq!(page.slice(&items), vec![4, 5, 6]);
    }

    #[test]
    fn huge_page_number_does_not_overflow() {
        let config = InventoryConfig::default();
        let page = PageRequest::new(Some(i64::MAX), Some(20), &config);
        assert_eq!(page.offset(), i64::MAX);
        let items: Vec<i32> = (1..=10).collect();
        assert!(page.slice(&items).is_empty());
    }
}
