//! Declarative flattening of nested backend DTOs into display records.
//!
//! Each entity lists its fields once as a table of [`FieldSpec`]s: where to
//! look in the raw JSON, what the flat field is called, and what it falls back
//! to. The same resolution rules apply to every entity, so a missing nested
//! object can never leak a `null` into a table cell.

use serde_json::{Map, Value};

/// How a flat field is produced and what it defaults to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
  /// Trimmed text. Numbers and booleans are stringified.
  Text(&'static str),
  /// Integer. Numeric strings are parsed.
  Int(i64),
  /// Length of an array, 0 when absent.
  Count,
}

/// One row of an entity's mapping table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
  /// Name of the flat field in the normalized record.
  pub target: &'static str,
  /// Dotted paths into the raw DTO, tried in order. First usable value wins.
  pub sources: &'static [&'static str],
  pub kind: FieldKind,
}

impl FieldSpec {
  pub const fn text(target: &'static str, sources: &'static [&'static str], default: &'static str) -> Self {
    Self {
      target,
      sources,
      kind: FieldKind::Text(default),
    }
  }

  pub const fn int(target: &'static str, sources: &'static [&'static str]) -> Self {
    Self {
      target,
      sources,
      kind: FieldKind::Int(0),
    }
  }

  pub const fn count(target: &'static str, sources: &'static [&'static str]) -> Self {
    Self {
      target,
      sources,
      kind: FieldKind::Count,
    }
  }
}

/// Follow a dotted path (`a.b.c`) through nested objects.
pub fn lookup<'a>(raw: &'a Value, path: &str) -> Option<&'a Value> {
  path
    .split('.')
    .try_fold(raw, |node, segment| node.as_object()?.get(segment))
}

/// Apply a mapping table to one raw DTO.
///
/// Every spec produces exactly one field in the output, so the result is
/// total over `fields` regardless of the input's shape.
pub fn apply(fields: &[FieldSpec], raw: &Value) -> Map<String, Value> {
  let mut out = Map::with_capacity(fields.len());
  for spec in fields {
    out.insert(spec.target.to_string(), resolve(spec, raw));
  }
  out
}

fn resolve(spec: &FieldSpec, raw: &Value) -> Value {
  let candidates = spec.sources.iter().filter_map(|path| lookup(raw, path));

  match spec.kind {
    FieldKind::Text(default) => candidates
      .filter_map(as_text)
      .next()
      .map(Value::String)
      .unwrap_or_else(|| Value::String(default.to_string())),
    FieldKind::Int(default) => Value::from(candidates.filter_map(as_int).next().unwrap_or(default)),
    FieldKind::Count => Value::from(
      candidates
        .filter_map(Value::as_array)
        .map(Vec::len)
        .next()
        .unwrap_or(0),
    ),
  }
}

fn as_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => {
      let trimmed = s.trim();
      (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn as_int(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// Join the non-empty parts with a single space.
pub fn join_names(parts: &[&str]) -> String {
  parts
    .iter()
    .map(|p| p.trim())
    .filter(|p| !p.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

/// Read a text field previously produced by [`apply`].
pub fn text_field<'a>(record: &'a Map<String, Value>, field: &str) -> &'a str {
  record.get(field).and_then(Value::as_str).unwrap_or("")
}
