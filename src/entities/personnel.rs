use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{insert_full_name, Entity, SchoolParams};
use crate::api::normalize::FieldSpec;
use crate::api::Endpoint;
use crate::cache::CacheKey;
use crate::table::TableRow;

/// School staff, listed on the work certificate screen
pub struct Personnel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonnelRecord {
  pub id: i64,
  pub nom: String,
  pub prenom: String,
  #[serde(rename = "nomComplet")]
  pub nom_complet: String,
  pub fonction: String,
  pub contact: String,
  pub email: String,
  pub raw_data: Value,
}

impl Entity for Personnel {
  const NAME: &'static str = "personnel";

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::int("id", &["personnelid", "id"]),
    FieldSpec::text("nom", &["personnelnom"], ""),
    FieldSpec::text("prenom", &["personnelprenom"], ""),
    // fonction is either a label or a {fonctionlibelle} object
    FieldSpec::text(
      "fonction",
      &["fonction", "fonction.fonctionlibelle", "fonction.libelle"],
      "Non définie",
    ),
    FieldSpec::text("contact", &["personnelcontact"], ""),
    FieldSpec::text("email", &["personnelemail"], ""),
  ];

  type Params = SchoolParams;
  type Record = PersonnelRecord;

  fn list_endpoint(params: &SchoolParams) -> Endpoint {
    Endpoint::PersonnelBySchool {
      school_id: params.school_id,
    }
  }

  fn cache_key(params: &SchoolParams) -> CacheKey {
    params.cache_key(Self::NAME)
  }

  fn finish(record: &mut Map<String, Value>, _raw: &Value) {
    insert_full_name(record);
  }
}

impl TableRow for PersonnelRecord {
  fn row_id(&self) -> i64 {
    self.id
  }

  fn cell(&self, field: &str) -> String {
    match field {
      "id" => self.id.to_string(),
      "nom" => self.nom.clone(),
      "prenom" => self.prenom.clone(),
      "nomComplet" => self.nom_complet.clone(),
      "fonction" => self.fonction.clone(),
      "contact" => self.contact.clone(),
      "email" => self.email.clone(),
      _ => String::new(),
    }
  }
}
