//! Sort, filter, paginate and select over an in-memory record list.
//!
//! [`Table`] holds presentation state only. Records are passed in on every
//! call so the record store stays the single owner of the data, and
//! [`Table::visible_rows`] is a pure function of the records and the state.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    sync::Arc,
};

use chrono::{DateTime, NaiveDate, Utc};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Typed value of one cell, used for sorting and filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Empty,
    Integer(i64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Integer(_) => 1,
            Self::Text(_) => 2,
            Self::Date(_) => 3,
            Self::Timestamp(_) => 4,
        }
    }

    /// Total order used by sorting. Empty cells come first; text compares
    /// case-insensitively with a case-sensitive tie break.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Date(a), Self::Timestamp(b)) => a.cmp(&b.date_naive()),
            (Self::Timestamp(a), Self::Date(b)) => a.date_naive().cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Date(date) => f.write_str(&format_long_date(*date)),
            Self::Timestamp(at) => f.write_str(&format_long_date(at.date_naive())),
        }
    }
}

/// `March 4, 2024`.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

pub struct ColumnDescriptor<T> {
    pub id: &'static str,
    pub header: &'static str,
    pub accessor: fn(&T) -> CellValue,
    pub renderer: Option<fn(&T) -> String>,
    pub sortable: bool,
    pub filterable: bool,
    pub hideable: bool,
}

impl<T> ColumnDescriptor<T> {
    /// A sortable, filterable, hideable column rendered from its cell value.
    pub fn new(id: &'static str, header: &'static str, accessor: fn(&T) -> CellValue) -> Self {
        Self {
            id,
            header,
            accessor,
            renderer: None,
            sortable: true,
            filterable: true,
            hideable: true,
        }
    }

    pub fn with_renderer(mut self, renderer: fn(&T) -> String) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn unfilterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    pub fn always_visible(mut self) -> Self {
        self.hideable = false;
        self
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }

    pub fn render(&self, row: &T) -> String {
        match self.renderer {
            Some(renderer) => renderer(row),
            None => self.value(row).to_string(),
        }
    }
}

#[derive(Clone)]
pub enum ColumnFilter {
    /// Case-insensitive substring of the rendered cell.
    Contains(String),
    Equals(CellValue),
    Predicate(Arc<dyn Fn(&CellValue) -> bool + Send + Sync>),
}

impl ColumnFilter {
    pub fn predicate(f: impl Fn(&CellValue) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    fn matches<T>(&self, column: &ColumnDescriptor<T>, row: &T) -> bool {
        match self {
            Self::Contains(needle) => column
                .render(row)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Self::Equals(expected) => column.value(row) == *expected,
            Self::Predicate(f) => f(&column.value(row)),
        }
    }
}

impl fmt::Debug for ColumnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(needle) => f.debug_tuple("Contains").field(needle).finish(),
            Self::Equals(value) => f.debug_tuple("Equals").field(value).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub column: &'static str,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSummary {
    pub selected: usize,
    pub total: usize,
}

impl fmt::Display for SelectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} row(s) selected.", self.selected, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub id: &'static str,
    pub label: &'static str,
    pub sorted: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub key: String,
    pub selected: bool,
    pub cells: Vec<String>,
}

/// Everything a renderer needs for one frame of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    pub summary: SelectionSummary,
    pub page_index: usize,
    pub page_count: usize,
    pub can_previous: bool,
    pub can_next: bool,
}

pub struct Table<T> {
    columns: Vec<ColumnDescriptor<T>>,
    row_key: fn(&T) -> String,
    sort: Option<SortState>,
    filters: BTreeMap<&'static str, ColumnFilter>,
    visibility: HashMap<&'static str, bool>,
    selected: BTreeSet<String>,
    page_index: usize,
    page_size: usize,
}

impl<T> Table<T> {
    pub fn new(columns: Vec<ColumnDescriptor<T>>, row_key: fn(&T) -> String) -> Self {
        Self {
            columns,
            row_key,
            sort: None,
            filters: BTreeMap::new(),
            visibility: HashMap::new(),
            selected: BTreeSet::new(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn columns(&self) -> &[ColumnDescriptor<T>] {
        &self.columns
    }

    fn column(&self, id: &str) -> Option<&ColumnDescriptor<T>> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn row_key(&self, row: &T) -> String {
        (self.row_key)(row)
    }

    // --- sorting ---

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Cycles unsorted -> ascending -> descending -> unsorted on `column_id`.
    /// Picking a different column replaces the active sort. Returns false for
    /// unknown or non-sortable columns.
    pub fn toggle_sort(&mut self, column_id: &str) -> bool {
        let Some(column) = self.column(column_id).filter(|column| column.sortable) else {
            return false;
        };
        let column = column.id;

        self.sort = match self.sort.take() {
            Some(SortState {
                column: active,
                direction: SortDirection::Ascending,
            }) if active == column => Some(SortState {
                column,
                direction: SortDirection::Descending,
            }),
            Some(SortState {
                column: active,
                direction: SortDirection::Descending,
            }) if active == column => None,
            _ => Some(SortState {
                column,
                direction: SortDirection::Ascending,
            }),
        };
        true
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    // --- filtering ---

    pub fn filters(&self) -> impl Iterator<Item = (&'static str, &ColumnFilter)> {
        self.filters.iter().map(|(id, filter)| (*id, filter))
    }

    /// Returns false for unknown or non-filterable columns. Changing filters
    /// moves back to the first page.
    pub fn set_filter(&mut self, column_id: &str, filter: ColumnFilter) -> bool {
        let Some(column) = self.column(column_id).filter(|column| column.filterable) else {
            return false;
        };
        let id = column.id;
        self.filters.insert(id, filter);
        self.page_index = 0;
        true
    }

    pub fn clear_filter(&mut self, column_id: &str) -> bool {
        let removed = self.filters.remove(column_id).is_some();
        if removed {
            self.page_index = 0;
        }
        removed
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page_index = 0;
    }

    // --- visibility ---

    /// Returns false for unknown columns and for columns that cannot be
    /// hidden.
    pub fn set_column_visibility(&mut self, column_id: &str, visible: bool) -> bool {
        let Some(column) = self.column(column_id).filter(|column| column.hideable) else {
            return false;
        };
        let id = column.id;
        self.visibility.insert(id, visible);
        true
    }

    pub fn is_column_visible(&self, column_id: &str) -> bool {
        self.visibility.get(column_id).copied().unwrap_or(true)
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDescriptor<T>> {
        self.columns
            .iter()
            .filter(|column| self.is_column_visible(column.id))
            .collect()
    }

    // --- selection ---

    /// Flips the selection of `key`; returns whether it is selected now.
    pub fn toggle_row_selected(&mut self, key: &str) -> bool {
        if self.selected.remove(key) {
            false
        } else {
            self.selected.insert(key.to_string());
            true
        }
    }

    pub fn deselect_row(&mut self, key: &str) {
        self.selected.remove(key);
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.contains(key)
    }

    pub fn selected_keys(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn selection_summary(&self, records: &[T]) -> SelectionSummary {
        let filtered = self.filtered_rows(records);
        let selected = filtered
            .iter()
            .filter(|row| self.selected.contains(&self.row_key(row)))
            .count();
        SelectionSummary {
            selected,
            total: filtered.len(),
        }
    }

    // --- row model ---

    /// Rows that satisfy every active filter, in input order.
    pub fn filtered_rows<'a>(&self, records: &'a [T]) -> Vec<&'a T> {
        let active: Vec<(&ColumnDescriptor<T>, &ColumnFilter)> = self
            .filters
            .iter()
            .filter_map(|(id, filter)| self.column(id).map(|column| (column, filter)))
            .collect();

        records
            .iter()
            .filter(|row| {
                active
                    .iter()
                    .all(|&(column, filter)| filter.matches(column, *row))
            })
            .collect()
    }

    /// Filtered rows in sort order. The sort is stable, so rows comparing
    /// equal keep their input order.
    pub fn sorted_rows<'a>(&self, records: &'a [T]) -> Vec<&'a T> {
        let mut rows = self.filtered_rows(records);
        let Some(sort) = &self.sort else {
            return rows;
        };
        let Some(column) = self.column(sort.column) else {
            return rows;
        };

        rows.sort_by(|a, b| {
            let ordering = column.value(a).compare(&column.value(b));
            match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        rows
    }

    /// The current page of filtered, sorted rows.
    pub fn visible_rows<'a>(&self, records: &'a [T]) -> Vec<&'a T> {
        self.sorted_rows(records)
            .into_iter()
            .skip(self.page_index.saturating_mul(self.page_size))
            .take(self.page_size)
            .collect()
    }

    // --- pagination ---

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page_index = 0;
    }

    /// Number of pages; an empty table still has one (empty) page.
    pub fn page_count(&self, records: &[T]) -> usize {
        self.filtered_rows(records)
            .len()
            .div_ceil(self.page_size)
            .max(1)
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self, records: &[T]) -> bool {
        self.page_index + 1 < self.page_count(records)
    }

    pub fn next_page(&mut self, records: &[T]) -> bool {
        if !self.can_next_page(records) {
            return false;
        }
        self.page_index += 1;
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if !self.can_previous_page() {
            return false;
        }
        self.page_index -= 1;
        true
    }

    /// Jumps to `page_index`, clamped to the last page.
    pub fn set_page_index(&mut self, page_index: usize, records: &[T]) {
        self.page_index = page_index.min(self.page_count(records) - 1);
    }

    /// Reconciles state with a freshly loaded record set: drops selections of
    /// rows that no longer exist and clamps the page index.
    pub fn sync(&mut self, records: &[T]) {
        let keys: BTreeSet<String> = records.iter().map(|row| self.row_key(row)).collect();
        self.selected.retain(|key| keys.contains(key));
        self.set_page_index(self.page_index, records);
    }

    // --- rendering ---

    pub fn render_row(&self, row: &T) -> Vec<String> {
        self.visible_columns()
            .into_iter()
            .map(|column| column.render(row))
            .collect()
    }

    pub fn view(&self, records: &[T]) -> TableView {
        let headers = self
            .visible_columns()
            .into_iter()
            .map(|column| HeaderView {
                id: column.id,
                label: column.header,
                sorted: self
                    .sort
                    .as_ref()
                    .filter(|sort| sort.column == column.id)
                    .map(|sort| sort.direction),
            })
            .collect();

        let rows = self
            .visible_rows(records)
            .into_iter()
            .map(|row| {
                let key = self.row_key(row);
                RowView {
                    selected: self.is_selected(&key),
                    key,
                    cells: self.render_row(row),
                }
            })
            .collect();

        TableView {
            headers,
            rows,
            summary: self.selection_summary(records),
            page_index: self.page_index,
            page_count: self.page_count(records),
            can_previous: self.can_previous_page(),
            can_next: self.can_next_page(records),
        }
    }
}

#[cfg(test)]
#[path = "tests/table_tests.rs"]
mod tests;
