use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{insert_full_name, Entity, SchoolParams};
use crate::api::normalize::FieldSpec;
use crate::api::Endpoint;
use crate::cache::CacheKey;
use crate::table::TableRow;

/// User profiles attached to staff members, listed for deactivation
pub struct Profile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
  pub id: i64,
  #[serde(rename = "personnelId")]
  pub personnel_id: i64,
  pub nom: String,
  pub prenom: String,
  #[serde(rename = "nomComplet")]
  pub nom_complet: String,
  pub email: String,
  pub contact: String,
  pub profil: String,
  pub statut: String,
  pub raw_data: Value,
}

impl ProfileRecord {
  pub fn is_active(&self) -> bool {
    !self.statut.eq_ignore_ascii_case("INACTIF") && !self.statut.eq_ignore_ascii_case("DESACTIVE")
  }
}

impl Entity for Profile {
  const NAME: &'static str = "profiles";

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::int("id", &["id", "sous_attent_personn.sous_attent_personn_id"]),
    FieldSpec::int("personnelId", &["sous_attent_personn.sous_attent_personn_id"]),
    FieldSpec::text("nom", &["sous_attent_personn.sous_attent_personn_nom"], ""),
    FieldSpec::text("prenom", &["sous_attent_personn.sous_attent_personn_prenom"], ""),
    FieldSpec::text("email", &["sous_attent_personn.sous_attent_personn_email"], ""),
    FieldSpec::text("contact", &["sous_attent_personn.sous_attent_personn_contact"], ""),
    FieldSpec::text("profil", &["profil.profil_libelle", "profil"], "Non défini"),
    FieldSpec::text("statut", &["statut", "sous_attent_personn.statut"], "Non défini"),
  ];

  type Params = SchoolParams;
  type Record = ProfileRecord;

  fn list_endpoint(params: &SchoolParams) -> Endpoint {
    Endpoint::ProfilesBySchool {
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

impl TableRow for ProfileRecord {
  fn row_id(&self) -> i64 {
    self.id
  }

  fn cell(&self, field: &str) -> String {
    match field {
      "id" => self.id.to_string(),
      "personnelId" => self.personnel_id.to_string(),
      "nom" => self.nom.clone(),
      "prenom" => self.prenom.clone(),
      "nomComplet" => self.nom_complet.clone(),
      "email" => self.email.clone(),
      "contact" => self.contact.clone(),
      "profil" => self.profil.clone(),
      "statut" => self.statut.clone(),
      _ => String::new(),
    }
  }
}
