//! Small editable forms shown inside the action modal (create/edit flows).

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
  Text(String),
  /// `(id, label)` options; `selected` indexes into them
  Choice {
    options: Vec<(i64, String)>,
    selected: usize,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
  pub name: &'static str,
  pub label: &'static str,
  pub input: FieldInput,
}

impl FormField {
  pub fn text(name: &'static str, label: &'static str, value: impl Into<String>) -> Self {
    Self {
      name,
      label,
      input: FieldInput::Text(value.into()),
    }
  }

  /// Choice field preselecting `current` when it is among the options.
  pub fn choice(
    name: &'static str,
    label: &'static str,
    options: Vec<(i64, String)>,
    current: Option<i64>,
  ) -> Self {
    let selected = current
      .and_then(|id| options.iter().position(|(o, _)| *o == id))
      .unwrap_or(0);
    Self {
      name,
      label,
      input: FieldInput::Choice { options, selected },
    }
  }

  /// Text shown for the field's current value.
  pub fn display(&self) -> String {
    match &self.input {
      FieldInput::Text(value) => value.clone(),
      FieldInput::Choice { options, selected } => options
        .get(*selected)
        .map(|(_, label)| label.clone())
        .unwrap_or_else(|| "(aucun choix)".to_string()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
  pub fields: Vec<FormField>,
  pub focus: usize,
}

impl Form {
  pub fn new(fields: Vec<FormField>) -> Self {
    Self { fields, focus: 0 }
  }

  fn field(&self, name: &str) -> Option<&FormField> {
    self.fields.iter().find(|f| f.name == name)
  }

  /// Trimmed text of a text field, empty if absent.
  pub fn text(&self, name: &str) -> String {
    match self.field(name).map(|f| &f.input) {
      Some(FieldInput::Text(value)) => value.trim().to_string(),
      _ => String::new(),
    }
  }

  /// Selected id of a choice field.
  pub fn choice(&self, name: &str) -> Option<i64> {
    match self.field(name).map(|f| &f.input) {
      Some(FieldInput::Choice { options, selected }) => options.get(*selected).map(|(id, _)| *id),
      _ => None,
    }
  }

  pub fn focus_next(&mut self) {
    if !self.fields.is_empty() {
      self.focus = (self.focus + 1) % self.fields.len();
    }
  }

  pub fn focus_prev(&mut self) {
    if !self.fields.is_empty() {
      self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }
  }

  pub fn push_char(&mut self, c: char) {
    if let Some(FieldInput::Text(value)) = self.fields.get_mut(self.focus).map(|f| &mut f.input) {
      value.push(c);
    }
  }

  pub fn pop_char(&mut self) {
    if let Some(FieldInput::Text(value)) = self.fields.get_mut(self.focus).map(|f| &mut f.input) {
      value.pop();
    }
  }

  /// Labels of choice fields that have nothing to pick from.
  pub fn empty_choices(&self) -> Vec<&'static str> {
    self
      .fields
      .iter()
      .filter(|f| matches!(&f.input, FieldInput::Choice { options, .. } if options.is_empty()))
      .map(|f| f.label)
      .collect()
  }

  /// Move the focused choice by `delta`, wrapping around.
  pub fn cycle(&mut self, delta: isize) {
    if let Some(FieldInput::Choice { options, selected }) =
      self.fields.get_mut(self.focus).map(|f| &mut f.input)
    {
      if options.is_empty() {
        return;
      }
      let len = options.len() as isize;
      *selected = (*selected as isize + delta).rem_euclid(len) as usize;
    }
  }
}

/// Distinct `(id, label)` options drawn from existing rows, sorted by label.
///
/// Rows without an id (0) are skipped.
pub fn options_from<R>(rows: &[R], pick: impl Fn(&R) -> (i64, String)) -> Vec<(i64, String)> {
  let mut seen: BTreeMap<i64, String> = BTreeMap::new();
  for row in rows {
    let (id, label) = pick(row);
    if id > 0 {
      seen.entry(id).or_insert(label);
    }
  }
  let mut options: Vec<(i64, String)> = seen.into_iter().collect();
  options.sort_by(|a, b| a.1.to_lowercase().cmp(&b.1.to_lowercase()));
  options
}
