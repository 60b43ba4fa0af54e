//! Filtering, sorting and pagination over a row set.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use ledger_model::{Row, TextField};
use serde::{Deserialize, Serialize};

/// Value of a categorical filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Choice {
    /// Sentinel that lets every row through.
    All,
    Is(String),
}

impl FromStr for Choice {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Is(s.to_string()))
        }
    }
}

/// One predicate over a row. Several filters are combined with AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    /// Case-insensitive substring search over one or more text fields.
    Text {
        fields: Vec<TextField>,
        needle: String,
    },
    /// Exact match of a text field.
    Equals { field: TextField, value: Choice },
    /// Contribution slot strictly positive.
    SlotPositive(usize),
}

impl Filter {
    /// Substring search over every text field.
    pub fn search(needle: impl Into<String>) -> Self {
        Self::Text {
            fields: TextField::ALL.to_vec(),
            needle: needle.into(),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Text { fields, needle } => {
                let needle = needle.trim().to_lowercase();
                needle.is_empty()
                    || fields
                        .iter()
                        .any(|field| row.text(*field).to_lowercase().contains(&needle))
            }
            Self::Equals { value: Choice::All, .. } => true,
            Self::Equals {
                field,
                value: Choice::Is(expected),
            } => row.text(*field) == expected,
            Self::SlotPositive(slot) => row.slot(*slot) > 0,
        }
    }
}

/// Column a row set is sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Id,
    Field(TextField),
    Slot(usize),
    Total,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("id"),
            Self::Field(field) => write!(f, "{field}"),
            Self::Slot(slot) => write!(f, "slot {}", slot + 1),
            Self::Total => f.write_str("total"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// The active sort: one key, one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }

    /// Compares two rows on this key; text compares case-insensitively.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ordering = match self.key {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Field(field) => a
                .text(field)
                .to_lowercase()
                .cmp(&b.text(field).to_lowercase()),
            SortKey::Slot(slot) => a.slot(slot).cmp(&b.slot(slot)),
            SortKey::Total => a.total().cmp(&b.total()),
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Next sort after a click on `key`: same key flips, another key starts ascending.
pub fn toggle_sort(current: Option<Sort>, key: SortKey) -> Sort {
    match current {
        Some(sort) if sort.key == key => Sort {
            key,
            direction: sort.direction.reversed(),
        },
        _ => Sort::asc(key),
    }
}

/// One page of a query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, R> {
    pub items: Vec<&'a R>,
    /// 1-based page actually returned, after clamping.
    pub page: usize,
    pub total_pages: usize,
    /// Rows that passed every filter, across all pages.
    pub filtered: usize,
}

/// Filters, sorts and slices `rows`.
///
/// The sort is stable with no secondary key. `page` is clamped to
/// `1..=max(total_pages, 1)`; a `page_size` of zero is read as one.
pub fn query<'a, R>(
    rows: &'a [R],
    filters: &[Filter],
    sort: Option<Sort>,
    page: usize,
    page_size: usize,
) -> Page<'a, R>
where
    R: AsRef<Row>,
{
    let mut matching: Vec<&R> = rows
        .iter()
        .filter(|row| filters.iter().all(|filter| filter.matches(row.as_ref())))
        .collect();
    if let Some(sort) = sort {
        matching.sort_by(|a, b| sort.compare(a.as_ref(), b.as_ref()));
    }

    let page_size = page_size.max(1);
    let filtered = matching.len();
    let total_pages = filtered.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));
    let items = matching
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    tracing::debug!(
        rows = rows.len(),
        filtered,
        page,
        total_pages,
        "query evaluated"
    );
    Page {
        items,
        page,
        total_pages,
        filtered,
    }
}

/// Filters, sort and page of one consolidated view.
///
/// Any change to the filters brings the view back to the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    filters: Vec<Filter>,
    sort: Option<Sort>,
    page: usize,
    page_size: usize,
}

impl QueryState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filters: Vec::new(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn sort(&self) -> Option<Sort> {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_filters(&mut self, filters: Vec<Filter>) {
        self.filters = filters;
        self.page = 1;
    }

    pub fn add_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page = 1;
    }

    /// Sorts on `key`, flipping the direction if it is already active.
    pub fn sort_by(&mut self, key: SortKey) {
        self.sort = Some(toggle_sort(self.sort, key));
    }

    pub fn go_to(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Runs the query and remembers the clamped page.
    pub fn run<'a, R>(&mut self, rows: &'a [R]) -> Page<'a, R>
    where
        R: AsRef<Row>,
    {
        let result = query(rows, &self.filters, self.sort, self.page, self.page_size);
        self.page = result.page;
        result
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(10)
    }
}
