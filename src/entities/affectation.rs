use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Entity, SchoolYearParams};
use crate::api::normalize::{self, FieldSpec};
use crate::api::Endpoint;
use crate::cache::CacheKey;
use crate::table::TableRow;

/// Teacher-to-class assignments for a school year
pub struct Affectation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectationRecord {
  pub id: i64,
  #[serde(rename = "classeId")]
  pub classe_id: i64,
  pub classe: String,
  #[serde(rename = "enseignantId")]
  pub enseignant_id: i64,
  pub enseignant: String,
  #[serde(rename = "matiereId")]
  pub matiere_id: i64,
  pub matiere: String,
  pub annee: String,
  pub raw_data: Value,
}

impl Entity for Affectation {
  const NAME: &'static str = "affectations";

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::int("id", &["id", "affectationid"]),
    FieldSpec::int("classeId", &["classe.id", "classe.classeid"]),
    FieldSpec::text("classe", &["classe.libelle", "classe.classelibelle"], "Non définie"),
    FieldSpec::int("enseignantId", &["personnel.personnelid", "personnel.id"]),
    FieldSpec::int("matiereId", &["matiere.id", "matiere.matiereid"]),
    FieldSpec::text("matiere", &["matiere.libelle", "matiere.matierelibelle"], "Non définie"),
    FieldSpec::text("annee", &["annee.libelle", "annee.anneelibelle"], ""),
  ];

  type Params = SchoolYearParams;
  type Record = AffectationRecord;

  fn list_endpoint(params: &SchoolYearParams) -> Endpoint {
    Endpoint::AffectationsBySchoolYear {
      school_id: params.school_id,
      year_id: params.year_id,
    }
  }

  fn cache_key(params: &SchoolYearParams) -> CacheKey {
    params.cache_key(Self::NAME)
  }

  fn finish(record: &mut Map<String, Value>, raw: &Value) {
    let text = |path: &str| {
      normalize::lookup(raw, path)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
    };
    let name = normalize::join_names(&[
      &text("personnel.personnelprenom"),
      &text("personnel.personnelnom"),
    ]);
    let name = if name.is_empty() {
      "Non défini".to_string()
    } else {
      name
    };
    record.insert("enseignant".to_string(), Value::String(name));
  }
}

impl TableRow for AffectationRecord {
  fn row_id(&self) -> i64 {
    self.id
  }

  fn cell(&self, field: &str) -> String {
    match field {
      "id" => self.id.to_string(),
      "classe" => self.classe.clone(),
      "enseignant" => self.enseignant.clone(),
      "matiere" => self.matiere.clone(),
      "annee" => self.annee.clone(),
      _ => String::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_affectation_normalization() {
    let raw = json!({
      "id": 77,
      "classe": { "id": 5, "libelle": "Tle D" },
      "personnel": { "personnelid": 7, "personnelnom": "Koffi", "personnelprenom": "Awa" },
      "matiere": { "id": 3, "libelle": "SVT" },
      "annee": { "libelle": "2024-2025" }
    });

    let record = Affectation::normalize(&raw).unwrap();

    assert_eq!(record.classe_id, 5);
    assert_eq!(record.enseignant_id, 7);
    assert_eq!(record.enseignant, "Awa Koffi");
    assert_eq!(record.matiere, "SVT");
    assert_eq!(record.annee, "2024-2025");
  }

  #[test]
  fn test_unassigned_teacher() {
    let record = Affectation::normalize(&json!({ "id": 1, "personnel": null })).unwrap();
    assert_eq!(record.enseignant, "Non défini");
    assert_eq!(record.enseignant_id, 0);
  }
}
