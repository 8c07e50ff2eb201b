//! Table contract shared by every list screen.
//!
//! A page declares its columns, searchable fields, filters and actions; the
//! [`TableModel`] turns a slice of rows plus a [`TableState`] into the page
//! of rows to draw. Rows are only ever borrowed.

use ratatui::style::Color;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};

/// Label shown for rows with no value in a select filter.
pub const MISSING_LABEL: &str = "Non défini";

/// A record that can be displayed in a table.
pub trait TableRow {
  fn row_id(&self) -> i64;

  /// Display value of a field, empty when the row has no such field.
  fn cell(&self, field: &str) -> String;
}

// ============================================================================
// Columns
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRender {
  Text,
  /// Cut to at most n characters with an ellipsis
  Truncate(usize),
  /// Right-aligned, zero shown as-is
  Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub field: &'static str,
  pub header: &'static str,
  pub width: u16,
  pub render: CellRender,
}

impl Column {
  pub const fn text(field: &'static str, header: &'static str, width: u16) -> Self {
    Self {
      field,
      header,
      width,
      render: CellRender::Text,
    }
  }

  pub const fn truncate(field: &'static str, header: &'static str, width: u16, max: usize) -> Self {
    Self {
      field,
      header,
      width,
      render: CellRender::Truncate(max),
    }
  }

  pub const fn number(field: &'static str, header: &'static str, width: u16) -> Self {
    Self {
      field,
      header,
      width,
      render: CellRender::Number,
    }
  }

  pub fn format<R: TableRow>(&self, row: &R) -> String {
    let value = row.cell(self.field);
    match self.render {
      CellRender::Text => value,
      CellRender::Truncate(max) => truncate(&value, max),
      CellRender::Number => format!("{:>width$}", value, width = self.width as usize),
    }
  }
}

/// Truncate to `max` characters, ending with an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    return s.to_string();
  }
  if max == 0 {
    return String::new();
  }
  let mut out: String = s.chars().take(max - 1).collect();
  out.push('…');
  out
}

// ============================================================================
// Filters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
  /// One of the distinct values present in the data
  Select,
  /// Free-text substring match
  Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
  pub field: &'static str,
  pub label: &'static str,
  pub kind: FilterKind,
}

/// Value chosen for one active filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
  /// Exact match; `None` selects rows with no value
  Exact(Option<String>),
  Contains(String),
}

impl FilterValue {
  pub fn label(&self) -> String {
    match self {
      FilterValue::Exact(Some(v)) => v.clone(),
      FilterValue::Exact(None) => MISSING_LABEL.to_string(),
      FilterValue::Contains(text) => format!("~{}", text),
    }
  }
}

fn present(value: String) -> Option<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() || trimmed == MISSING_LABEL || trimmed == "Non définie" {
    None
  } else {
    Some(value)
  }
}

impl FilterConfig {
  pub const fn select(field: &'static str, label: &'static str) -> Self {
    Self {
      field,
      label,
      kind: FilterKind::Select,
    }
  }

  pub const fn text(field: &'static str, label: &'static str) -> Self {
    Self {
      field,
      label,
      kind: FilterKind::Text,
    }
  }

  /// Distinct values for a select filter, missing value first if any row lacks one.
  pub fn options<R: TableRow>(&self, rows: &[R]) -> Vec<Option<String>> {
    if self.kind != FilterKind::Select {
      return Vec::new();
    }

    let values: BTreeSet<Option<String>> = rows.iter().map(|r| present(r.cell(self.field))).collect();

    let mut result = Vec::with_capacity(values.len());
    if values.contains(&None) {
      result.push(None);
    }
    result.extend(values.into_iter().flatten().map(Some));
    result
  }

  pub fn matches<R: TableRow>(&self, row: &R, value: &FilterValue) -> bool {
    match value {
      FilterValue::Exact(expected) => present(row.cell(self.field)) == *expected,
      FilterValue::Contains(text) => contains_ci(&row.cell(self.field), text),
    }
  }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

impl SortDirection {
  pub fn flip(self) -> Self {
    match self {
      SortDirection::Asc => SortDirection::Desc,
      SortDirection::Desc => SortDirection::Asc,
    }
  }

  pub fn arrow(self) -> &'static str {
    match self {
      SortDirection::Asc => "▲",
      SortDirection::Desc => "▼",
    }
  }
}

/// Search text, active filters, sort and page position of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
  pub search: String,
  pub filters: BTreeMap<&'static str, FilterValue>,
  pub sort: Option<(&'static str, SortDirection)>,
  pub page: usize,
  pub page_size: usize,
}

impl TableState {
  pub fn new(page_size: usize) -> Self {
    Self {
      search: String::new(),
      filters: BTreeMap::new(),
      sort: None,
      page: 0,
      page_size: page_size.max(1),
    }
  }

  pub fn set_search(&mut self, text: impl Into<String>) {
    self.search = text.into();
    self.page = 0;
  }

  /// Set or clear (`None`) the filter on a field.
  pub fn set_filter(&mut self, field: &'static str, value: Option<FilterValue>) {
    match value {
      Some(v) => {
        self.filters.insert(field, v);
      }
      None => {
        self.filters.remove(field);
      }
    }
    self.page = 0;
  }

  pub fn filter(&self, field: &str) -> Option<&FilterValue> {
    self.filters.get(field)
  }

  /// Sort by `field` ascending, or flip direction if already sorted by it.
  pub fn sort_by(&mut self, field: &'static str) {
    self.sort = match self.sort {
      Some((current, dir)) if current == field => Some((field, dir.flip())),
      _ => Some((field, SortDirection::Asc)),
    };
  }

  pub fn next_page(&mut self, page_count: usize) {
    if self.page + 1 < page_count {
      self.page += 1;
    }
  }

  pub fn prev_page(&mut self) {
    self.page = self.page.saturating_sub(1);
  }
}

// ============================================================================
// Model
// ============================================================================

/// One page of rows ready to draw.
#[derive(Debug)]
pub struct TablePage<'a, R> {
  pub rows: Vec<&'a R>,
  /// Rows matching search and filters, across all pages
  pub total: usize,
  pub page: usize,
  pub page_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TableModel<'c> {
  pub columns: &'c [Column],
  pub searchable: &'c [&'static str],
  pub filters: &'c [FilterConfig],
}

impl<'c> TableModel<'c> {
  /// Search, filter, sort and paginate `rows` without touching them.
  pub fn view<'a, R: TableRow>(&self, rows: &'a [R], state: &TableState) -> TablePage<'a, R> {
    let search = state.search.trim();

    let mut matched: Vec<&'a R> = rows
      .iter()
      .filter(|row| {
        search.is_empty()
          || self
            .searchable
            .iter()
            .any(|field| contains_ci(&row.cell(field), search))
      })
      .filter(|row| {
        state.filters.iter().all(|(field, value)| {
          match self.filters.iter().find(|f| f.field == *field) {
            Some(config) => config.matches(*row, value),
            // Unknown filters are ignored rather than hiding everything
            None => true,
          }
        })
      })
      .collect();

    // Only columns on screen can be sorted on
    let sort = state
      .sort
      .filter(|(field, _)| self.columns.iter().any(|c| c.field == *field));
    if let Some((field, direction)) = sort {
      // Both sorts are stable, equal keys keep their input order
      match direction {
        SortDirection::Asc => matched.sort_by_cached_key(|row| SortKey::of(&row.cell(field))),
        SortDirection::Desc => matched.sort_by_cached_key(|row| Reverse(SortKey::of(&row.cell(field)))),
      }
    }

    let total = matched.len();
    let page_size = state.page_size.max(1);
    let page_count = total.div_ceil(page_size).max(1);
    let page = state.page.min(page_count - 1);

    let rows = matched
      .into_iter()
      .skip(page * page_size)
      .take(page_size)
      .collect();

    TablePage {
      rows,
      total,
      page,
      page_count,
    }
  }
}

/// Sort key for a cell: finite numbers first in numeric order, then text
/// compared case-insensitively.
#[derive(Debug, PartialEq)]
enum SortKey {
  Number(f64),
  Text(String),
}

impl SortKey {
  fn of(cell: &str) -> Self {
    match cell.trim().parse::<f64>() {
      Ok(x) if x.is_finite() => Self::Number(x),
      _ => Self::Text(cell.to_lowercase()),
    }
  }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for SortKey {
  fn cmp(&self, other: &Self) -> Ordering {
    match (self, other) {
      (Self::Number(x), Self::Number(y)) => x.total_cmp(y),
      (Self::Number(_), Self::Text(_)) => Ordering::Less,
      (Self::Text(_), Self::Number(_)) => Ordering::Greater,
      (Self::Text(a), Self::Text(b)) => a.cmp(b),
    }
  }
}

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
  View,
  Edit,
  Print,
  Delete,
  Deactivate,
  Validate,
  Reject,
  Create,
  Export,
}

impl ActionKind {
  pub fn label(&self) -> &'static str {
    match self {
      ActionKind::View => "Voir",
      ActionKind::Edit => "Modifier",
      ActionKind::Print => "Imprimer",
      ActionKind::Delete => "Supprimer",
      ActionKind::Deactivate => "Désactiver",
      ActionKind::Validate => "Valider",
      ActionKind::Reject => "Refuser",
      ActionKind::Create => "Créer",
      ActionKind::Export => "Exporter",
    }
  }

  /// Whether the action applies to the selected row rather than the whole list.
  pub fn needs_item(&self) -> bool {
    !matches!(self, ActionKind::Create | ActionKind::Export)
  }
}

/// An action button: what it does, its key binding, and how it looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
  pub kind: ActionKind,
  pub key: char,
  pub label: &'static str,
  pub color: Color,
}

impl ActionSpec {
  pub const fn new(kind: ActionKind, key: char, label: &'static str, color: Color) -> Self {
    Self {
      kind,
      key,
      label,
      color,
    }
  }
}

/// What the table hands to the page when an action fires.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest<R> {
  pub kind: ActionKind,
  pub item: Option<R>,
}
