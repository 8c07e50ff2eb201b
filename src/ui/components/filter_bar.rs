use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::table::{truncate, FilterConfig, FilterKind, FilterValue, TableRow, TableState, MISSING_LABEL};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Events emitted by filter bar that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterBarEvent {
  /// Apply (`Some`) or clear (`None`) the filter on `field`
  Changed {
    field: &'static str,
    value: Option<FilterValue>,
  },
}

/// Tab strip for one filter field at a time.
///
/// Select filters list "Tous" then the distinct values (missing first) and
/// move with PageUp/PageDown. Text filters are edited after pressing `=`.
#[derive(Debug, Clone)]
pub struct FilterBar {
  filters: &'static [FilterConfig],
  current: Option<usize>,
  values: Vec<Option<String>>,
  selected: usize, // 0 = Tous, 1+ = index into values
  editing: Option<TextInput>,
}

impl FilterBar {
  pub fn new(filters: &'static [FilterConfig]) -> Self {
    Self {
      filters,
      current: None,
      values: Vec::new(),
      selected: 0,
      editing: None,
    }
  }

  pub fn is_visible(&self) -> bool {
    self.current.is_some()
  }

  /// Text filter being typed; captures every key
  pub fn is_editing(&self) -> bool {
    self.editing.is_some()
  }

  pub fn current(&self) -> Option<&'static FilterConfig> {
    let filters = self.filters;
    self.current.and_then(|i| filters.get(i))
  }

  /// Show the next filter field, hiding the bar after the last one
  pub fn cycle_field<R: TableRow>(&mut self, rows: &[R], state: &TableState) {
    self.editing = None;
    self.current = match self.current {
      None if !self.filters.is_empty() => Some(0),
      Some(i) if i + 1 < self.filters.len() => Some(i + 1),
      _ => None,
    };
    self.sync(rows, state);
  }

  pub fn hide(&mut self) {
    self.current = None;
    self.editing = None;
    self.values.clear();
    self.selected = 0;
  }

  /// Recompute options from `rows` and the selection from `state`
  pub fn sync<R: TableRow>(&mut self, rows: &[R], state: &TableState) {
    let Some(config) = self.current() else {
      self.values.clear();
      self.selected = 0;
      return;
    };
    self.values = config.options(rows);
    self.selected = match state.filter(config.field) {
      Some(FilterValue::Exact(value)) => self
        .values
        .iter()
        .position(|v| v == value)
        .map(|i| i + 1)
        .unwrap_or(0),
      _ => 0,
    };
  }

  fn selected_value(&self) -> Option<FilterValue> {
    if self.selected == 0 {
      return None;
    }
    self
      .values
      .get(self.selected - 1)
      .map(|v| FilterValue::Exact(v.clone()))
  }

  /// Navigate filter tabs with wrapping
  fn navigate(&mut self, forward: bool) {
    let total_tabs = self.values.len() + 1;
    self.selected = if forward {
      (self.selected + 1) % total_tabs
    } else {
      (self.selected + total_tabs - 1) % total_tabs
    };
  }

  pub fn handle_key(&mut self, key: KeyEvent, state: &TableState) -> KeyResult<FilterBarEvent> {
    let Some(config) = self.current() else {
      return KeyResult::NotHandled;
    };

    if let Some(input) = self.editing.as_mut() {
      return match input.handle_key(key) {
        InputResult::Submitted(text) => {
          self.editing = None;
          let text = text.trim().to_string();
          let value = (!text.is_empty()).then_some(FilterValue::Contains(text));
          KeyResult::Event(FilterBarEvent::Changed {
            field: config.field,
            value,
          })
        }
        InputResult::Cancelled => {
          self.editing = None;
          KeyResult::Handled
        }
        _ => KeyResult::Handled,
      };
    }

    match (config.kind, key.code) {
      (FilterKind::Select, KeyCode::PageDown | KeyCode::PageUp) => {
        self.navigate(key.code == KeyCode::PageDown);
        KeyResult::Event(FilterBarEvent::Changed {
          field: config.field,
          value: self.selected_value(),
        })
      }
      (FilterKind::Text, KeyCode::Char('=')) => {
        let current = match state.filter(config.field) {
          Some(FilterValue::Contains(text)) => text.clone(),
          _ => String::new(),
        };
        self.editing = Some(TextInput::with_value(current));
        KeyResult::Handled
      }
      _ => KeyResult::NotHandled,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect, state: &TableState) {
    let Some(config) = self.current() else {
      return;
    };

    let mut spans = vec![Span::styled(
      format!("[{}] ", config.label),
      Style::default().fg(Color::Yellow),
    )];

    match config.kind {
      FilterKind::Select => {
        let tab = |selected: bool| {
          if selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
          } else {
            Style::default().fg(Color::Gray)
          }
        };
        spans.push(Span::styled(" Tous ", tab(self.selected == 0)));
        for (idx, value) in self.values.iter().enumerate() {
          spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
          let label = match value {
            Some(v) => format!(" {} ", truncate(v, 15)),
            None => format!(" {} ", MISSING_LABEL),
          };
          spans.push(Span::styled(label, tab(self.selected == idx + 1)));
        }
      }
      FilterKind::Text => match &self.editing {
        Some(input) => {
          spans.push(Span::raw("contient: "));
          spans.extend(input.spans());
        }
        None => {
          let current = state.filter(config.field).map(FilterValue::label);
          spans.push(Span::raw(current.unwrap_or_else(|| "Tous".to_string())));
          spans.push(Span::styled("  <=> saisir", Style::default().fg(Color::DarkGray)));
        }
      },
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }
}
