//! Endpoint catalogue for the school-management backend.
//!
//! Every request goes through an [`Endpoint`]; the client joins its path onto
//! the configured base URL.

/// One backend route with its path parameters filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
  // Personnel / work certificates
  PersonnelBySchool { school_id: i64 },
  PersonnelDetail { personnel_id: i64 },
  WorkCertificate { personnel_id: i64, year_id: i64 },

  // Profile deactivation
  ProfilesBySchool { school_id: i64 },
  DeactivateProfile { profile_id: i64 },

  // Enrollment surveys
  SurveysBySchoolYear { school_id: i64, year_id: i64 },
  SurveyStatus { inscription_id: i64 },
  SurveyExport,

  // Quiz authoring
  QuizzesBySchool { school_id: i64 },
  Quizzes,
  Quiz { quiz_id: i64 },

  // Class/teacher affectations
  AffectationsBySchoolYear { school_id: i64, year_id: i64 },
  Affectations,
  Affectation { affectation_id: i64 },
}

impl Endpoint {
  /// Path relative to the API base URL (no leading slash).
  pub fn path(&self) -> String {
    match self {
      Self::PersonnelBySchool { school_id } => format!("personnels/ecole/{}", school_id),
      Self::PersonnelDetail { personnel_id } => format!("personnels/{}", personnel_id),
      Self::WorkCertificate {
        personnel_id,
        year_id,
      } => format!("certificats/travail/{}/annee/{}", personnel_id, year_id),

      Self::ProfilesBySchool { school_id } => format!("profils/ecole/{}", school_id),
      Self::DeactivateProfile { profile_id } => format!("profils/{}/desactiver", profile_id),

      Self::SurveysBySchoolYear { school_id, year_id } => {
        format!("inscriptions/enquetes/ecole/{}/annee/{}", school_id, year_id)
      }
      Self::SurveyStatus { inscription_id } => format!("inscriptions/{}/statut", inscription_id),
      Self::SurveyExport => "inscriptions/enquetes/export".to_string(),

      Self::QuizzesBySchool { school_id } => format!("quiz/ecole/{}", school_id),
      Self::Quizzes => "quiz".to_string(),
      Self::Quiz { quiz_id } => format!("quiz/{}", quiz_id),

      Self::AffectationsBySchoolYear { school_id, year_id } => {
        format!("affectations/ecole/{}/annee/{}", school_id, year_id)
      }
      Self::Affectations => "affectations".to_string(),
      Self::Affectation { affectation_id } => format!("affectations/{}", affectation_id),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_paths_have_no_leading_slash() {
    let endpoints = [
      Endpoint::PersonnelBySchool { school_id: 1 },
      Endpoint::SurveyExport,
      Endpoint::Affectation { affectation_id: 3 },
    ];
    for endpoint in endpoints {
      assert!(!endpoint.path().starts_with('/'), "{:?}", endpoint);
    }
  }

  #[test]
  fn test_path_parameters() {
    assert_eq!(
      Endpoint::WorkCertificate {
        personnel_id: 7,
        year_id: 226
      }
      .path(),
      "certificats/travail/7/annee/226"
    );
    assert_eq!(
      Endpoint::AffectationsBySchoolYear {
        school_id: 38,
        year_id: 226
      }
      .path(),
      "affectations/ecole/38/annee/226"
    );
  }
}
