use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Entity, SchoolYearParams};
use crate::api::normalize::{self, FieldSpec};
use crate::api::Endpoint;
use crate::cache::CacheKey;
use crate::table::TableRow;

/// Enrollment surveys submitted for a school year
pub struct Survey;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
  pub id: i64,
  pub matricule: String,
  #[serde(rename = "nomComplet")]
  pub nom_complet: String,
  pub classe: String,
  pub statut: String,
  pub date: String,
  pub raw_data: Value,
}

impl SurveyRecord {
  pub fn is_pending(&self) -> bool {
    self.statut == "EN_ATTENTE"
  }
}

impl Entity for Survey {
  const NAME: &'static str = "surveys";

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::int("id", &["inscriptionid", "id"]),
    FieldSpec::text("matricule", &["eleve.matricule", "matricule"], ""),
    FieldSpec::text("classe", &["classe.libelle", "classe.classelibelle"], "Non définie"),
    FieldSpec::text("statut", &["statut", "inscriptionstatut"], "EN_ATTENTE"),
    FieldSpec::text("date", &["dateEnquete", "inscriptiondate"], ""),
  ];

  type Params = SchoolYearParams;
  type Record = SurveyRecord;

  fn list_endpoint(params: &SchoolYearParams) -> Endpoint {
    Endpoint::SurveysBySchoolYear {
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
    let full = normalize::join_names(&[&text("eleve.prenom"), &text("eleve.nom")]);
    record.insert("nomComplet".to_string(), Value::String(full));

    // Dates arrive as full timestamps; the table only shows the day
    if let Some(Value::String(date)) = record.get_mut("date") {
      let day = date
        .get(..10)
        .filter(|d| d.as_bytes().get(4) == Some(&b'-'))
        .map(str::to_string);
      if let Some(day) = day {
        *date = day;
      }
    }
  }
}

impl TableRow for SurveyRecord {
  fn row_id(&self) -> i64 {
    self.id
  }

  fn cell(&self, field: &str) -> String {
    match field {
      "id" => self.id.to_string(),
      "matricule" => self.matricule.clone(),
      "nomComplet" => self.nom_complet.clone(),
      "classe" => self.classe.clone(),
      "statut" => self.statut.clone(),
      "date" => self.date.clone(),
      _ => String::new(),
    }
  }
}
