//! Concrete entities served by the backend.
//!
//! An entity ties together a list endpoint, the filter parameters that select
//! it, its mapping table and the flat record the tables display.

mod affectation;
mod personnel;
mod profile;
mod quiz;
mod survey;

pub use affectation::{Affectation, AffectationRecord};
pub use personnel::{Personnel, PersonnelRecord};
pub use profile::{Profile, ProfileRecord};
pub use quiz::{Quiz, QuizRecord};
pub use survey::{Survey, SurveyRecord};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::api::normalize::{self, FieldSpec};
use crate::api::{Endpoint, Result};
use crate::cache::CacheKey;
use crate::table::TableRow;

/// Key under which every record keeps its untouched DTO.
pub const RAW_DATA: &str = "raw_data";

/// A backend collection that can be listed, cached and shown in a table.
pub trait Entity: Send + Sync + 'static {
  /// Entity name, also the cache key prefix.
  const NAME: &'static str;

  /// Declarative mapping from the raw DTO to the flat record.
  const FIELDS: &'static [FieldSpec];

  /// Filter parameters selecting which rows the backend returns.
  type Params: Clone + PartialEq + Debug + Send + Sync + 'static;

  /// Flattened display record.
  type Record: Serialize + DeserializeOwned + Clone + Debug + TableRow + Send + Sync + 'static;

  fn list_endpoint(params: &Self::Params) -> Endpoint;

  fn cache_key(params: &Self::Params) -> CacheKey;

  /// Fill derived fields after the mapping table ran.
  fn finish(_record: &mut Map<String, Value>, _raw: &Value) {}

  /// Turn one raw DTO into a record. Total over the mapping table.
  fn normalize(raw: &Value) -> Result<Self::Record> {
    let mut record = normalize::apply(Self::FIELDS, raw);
    Self::finish(&mut record, raw);
    record.insert(RAW_DATA.to_string(), raw.clone());
    Ok(serde_json::from_value(Value::Object(record))?)
  }
}

/// Lists scoped to one school.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchoolParams {
  pub school_id: i64,
}

impl SchoolParams {
  pub fn cache_key(&self, entity: &str) -> CacheKey {
    CacheKey::new(entity).param("school", self.school_id)
  }
}

/// Lists scoped to one school and school year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchoolYearParams {
  pub school_id: i64,
  pub year_id: i64,
}

impl SchoolYearParams {
  pub fn cache_key(&self, entity: &str) -> CacheKey {
    CacheKey::new(entity)
      .param("school", self.school_id)
      .param("year", self.year_id)
  }
}

/// Insert `nomComplet` built from the record's `prenom` and `nom`.
fn insert_full_name(record: &mut Map<String, Value>) {
  let full = normalize::join_names(&[
    normalize::text_field(record, "prenom"),
    normalize::text_field(record, "nom"),
  ]);
  record.insert("nomComplet".to_string(), Value::String(full));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_param_cache_keys() {
    assert_eq!(
      SchoolParams { school_id: 38 }.cache_key("quizzes").as_str(),
      "quizzes:school=38"
    );
    assert_eq!(
      SchoolYearParams {
        school_id: 38,
        year_id: 226
      }
      .cache_key("surveys")
      .as_str(),
      "surveys:school=38:year=226"
    );
  }
}
