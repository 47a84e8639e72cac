use serde::Serialize;
use tracing::warn;

use crate::model::Row;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub page_index: usize,
    pub page_size: usize,
    pub total_items: usize,
}

impl PageWindow {
    pub fn new(requested_page: usize, page_size: usize, total_items: usize) -> Self {
        let page_size = page_size.max(1);
        let page_count = total_items.div_ceil(page_size).max(1);

        Self {
            page_index: requested_page.clamp(1, page_count),
            page_size,
            total_items,
        }
    }

    pub fn page_count(&self) -> usize {
        self.total_items.div_ceil(self.page_size).max(1)
    }

    pub fn start_index(&self) -> usize {
        ((self.page_index - 1) * self.page_size).min(self.total_items)
    }

    pub fn end_index(&self) -> usize {
        (self.start_index() + self.page_size).min(self.total_items)
    }

    pub fn len(&self) -> usize {
        self.end_index() - self.start_index()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn paginate<T>(items: &[T], page_index: usize, page_size: usize) -> (PageWindow, &[T]) {
    let window = PageWindow::new(page_index, page_size, items.len());
    let slice = &items[window.start_index()..window.end_index()];
    (window, slice)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn project<'a, I>(rows: I, columns: &[String]) -> ProjectedTable
where
    I: IntoIterator<Item = &'a Row>,
{
    let rows = rows
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).unwrap_or_default().to_string())
                .collect()
        })
        .collect();

    ProjectedTable {
        columns: columns.to_vec(),
        rows,
    }
}

pub fn resolve_columns(available: &[String], requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return available.to_vec();
    }

    let mut resolved = Vec::with_capacity(requested.len());
    for name in requested {
        let name = name.trim();
        if !available.iter().any(|column| column == name) {
            warn!(column = name, "ignoring unknown column");
            continue;
        }
        if !resolved.iter().any(|column: &String| column == name) {
            resolved.push(name.to_string());
        }
    }

    if resolved.is_empty() {
        warn!("no requested column exists; showing all columns");
        return available.to_vec();
    }

    resolved
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn third_page_of_twenty_three_holds_three_rows() {
        let items: Vec<usize> = (0..23).collect();
        let (window, slice) = paginate(&items, 3, 10);

        assert_eq!(window.page_index, 3);
        assert_eq!(window.start_index(), 20);
        assert_eq!(window.end_index(), 23);
        assert_eq!(slice, &[20, 21, 22]);
        assert_eq!(window.page_count(), 3);
    }

    #[test]
    fn page_index_is_clamped_into_range() {
        let items: Vec<usize> = (0..23).collect();

        let (window, slice) = paginate(&items, 99, 10);
        assert_eq!(window.page_index, 3);
        assert_eq!(slice.len(), 3);

        let (window, slice) = paginate(&items, 0, 10);
        assert_eq!(window.page_index, 1);
        assert_eq!(slice.len(), 10);
    }

    #[test]
    fn window_size_never_exceeds_remaining_items() {
        for total in [0usize, 1, 9, 10, 11, 57] {
            let items: Vec<usize> = (0..total).collect();
            for page in 0..8 {
                let (window, slice) = paginate(&items, page, 10);
                assert!(window.page_index >= 1 && window.page_index <= window.page_count());
                assert_eq!(
                    slice.len(),
                    10.min(total - window.start_index()),
                    "total={total} page={page}"
                );
            }
        }
    }

    #[test]
    fn empty_input_yields_single_empty_page() {
        let items: Vec<u8> = Vec::new();
        let (window, slice) = paginate(&items, 5, 10);
        assert_eq!(window.page_index, 1);
        assert_eq!(window.page_count(), 1);
        assert!(slice.is_empty());
        assert!(window.is_empty());
    }

    #[test]
    fn projection_follows_requested_order_and_blanks_missing_cells() {
        let columns: Arc<[String]> = vec!["a".to_string(), "b".to_string()].into();
        let row = Row::new(columns, vec!["1".to_string(), "2".to_string()]);

        let table = project([&row], &["b".to_string(), "zz".to_string(), "a".to_string()]);
        assert_eq!(table.columns, vec!["b", "zz", "a"]);
        assert_eq!(table.rows, vec![vec!["2", "", "1"]]);
    }

    #[test]
    fn resolve_columns_defaults_to_resource_order() {
        let available = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        assert_eq!(resolve_columns(&available, &[]), available);
        assert_eq!(
            resolve_columns(&available, &["c".to_string(), "nope".to_string(), "a".to_string()]),
            vec!["c", "a"]
        );
        assert_eq!(resolve_columns(&available, &["nope".to_string()]), available);
    }
}
