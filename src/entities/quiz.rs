use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Entity, SchoolParams};
use crate::api::normalize::FieldSpec;
use crate::api::Endpoint;
use crate::cache::CacheKey;
use crate::table::TableRow;

/// Quizzes authored by teachers of a school
pub struct Quiz;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
  pub id: i64,
  pub titre: String,
  pub matiere: String,
  #[serde(rename = "matiereId")]
  pub matiere_id: i64,
  pub classe: String,
  #[serde(rename = "classeId")]
  pub classe_id: i64,
  pub date: String,
  #[serde(rename = "nbQuestions")]
  pub nb_questions: i64,
  pub raw_data: Value,
}

impl Entity for Quiz {
  const NAME: &'static str = "quizzes";

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::int("id", &["quizid", "id"]),
    FieldSpec::text("titre", &["quizlibelle", "titre"], "Sans titre"),
    FieldSpec::text("matiere", &["matiere.libelle", "matiere.matierelibelle"], "Non définie"),
    FieldSpec::int("matiereId", &["matiere.id", "matiere.matiereid"]),
    FieldSpec::text("classe", &["classe.libelle", "classe.classelibelle"], "Non définie"),
    FieldSpec::int("classeId", &["classe.id", "classe.classeid"]),
    FieldSpec::text("date", &["quizdatecreation"], ""),
    FieldSpec::count("nbQuestions", &["questions"]),
  ];

  type Params = SchoolParams;
  type Record = QuizRecord;

  fn list_endpoint(params: &SchoolParams) -> Endpoint {
    Endpoint::QuizzesBySchool {
      school_id: params.school_id,
    }
  }

  fn cache_key(params: &SchoolParams) -> CacheKey {
    params.cache_key(Self::NAME)
  }
}

impl TableRow for QuizRecord {
  fn row_id(&self) -> i64 {
    self.id
  }

  fn cell(&self, field: &str) -> String {
    match field {
      "id" => self.id.to_string(),
      "titre" => self.titre.clone(),
      "matiere" => self.matiere.clone(),
      "classe" => self.classe.clone(),
      "date" => self.date.clone(),
      "nbQuestions" => self.nb_questions.to_string(),
      _ => String::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_question_count_is_derived() {
    let raw = json!({
      "quizid": 9,
      "quizlibelle": "Fractions",
      "matiere": { "id": 2, "libelle": "Mathématiques" },
      "classe": { "id": 14, "libelle": "CM2" },
      "questions": [{ "q": 1 }, { "q": 2 }, { "q": 3 }]
    });

    let record = Quiz::normalize(&raw).unwrap();

    assert_eq!(record.titre, "Fractions");
    assert_eq!(record.matiere_id, 2);
    assert_eq!(record.classe_id, 14);
    assert_eq!(record.nb_questions, 3);
  }

  #[test]
  fn test_quiz_without_relations() {
    let record = Quiz::normalize(&json!({ "quizid": 1, "questions": null })).unwrap();

    assert_eq!(record.titre, "Sans titre");
    assert_eq!(record.matiere, "Non définie");
    assert_eq!(record.nb_questions, 0);
  }
}
