use futures::future::BoxFuture;
use ratatui::style::Color;

use super::{selected, unsupported};
use crate::api::mutations;
use crate::entities::{SchoolYearParams, Survey, SurveyRecord};
use crate::form::Form;
use crate::table::{ActionKind, ActionRequest, ActionSpec, Column, FilterConfig};
use crate::workflow::{Dispatch, MutationOutcome, Page, PageContext};

/// Enrollment surveys: validate, reject, export.
pub struct SurveysPage;

impl Page for SurveysPage {
  type Entity = Survey;

  const TITLE: &'static str = "Enquêtes";

  const COLUMNS: &'static [Column] = &[
    Column::number("id", "ID", 6),
    Column::text("matricule", "Matricule", 12),
    Column::text("nomComplet", "Élève", 26),
    Column::text("classe", "Classe", 12),
    Column::text("statut", "Statut", 12),
    Column::text("date", "Date", 10),
  ];

  const SEARCHABLE: &'static [&'static str] = &["matricule", "nomComplet", "classe"];

  const FILTERS: &'static [FilterConfig] = &[
    FilterConfig::select("statut", "Statut"),
    FilterConfig::select("classe", "Classe"),
    FilterConfig::text("matricule", "Matricule"),
  ];

  const ACTIONS: &'static [ActionSpec] = &[
    ActionSpec::new(ActionKind::View, 'v', "Voir", Color::Cyan),
    ActionSpec::new(ActionKind::Validate, 'a', "Valider", Color::Green),
    ActionSpec::new(ActionKind::Reject, 'x', "Refuser", Color::Red),
    ActionSpec::new(ActionKind::Export, 'e', "Exporter", Color::Yellow),
  ];

  fn params(ctx: &PageContext) -> SchoolYearParams {
    SchoolYearParams {
      school_id: ctx.school_id,
      year_id: ctx.year_id,
    }
  }

  fn dispatch(kind: ActionKind) -> Dispatch {
    match kind {
      ActionKind::View => Dispatch::Navigate,
      ActionKind::Validate | ActionKind::Reject | ActionKind::Export => Dispatch::Confirm,
      ActionKind::Edit
      | ActionKind::Print
      | ActionKind::Delete
      | ActionKind::Deactivate
      | ActionKind::Create => Dispatch::Unsupported,
    }
  }

  fn prompt(request: &ActionRequest<SurveyRecord>) -> String {
    let who = request
      .item
      .as_ref()
      .map(|s| format!("{} ({})", s.nom_complet, s.matricule))
      .unwrap_or_default();
    // Already processed surveys can still be changed, but say so
    let current = request
      .item
      .as_ref()
      .filter(|s| !s.is_pending())
      .map(|s| format!(" (actuellement {})", s.statut))
      .unwrap_or_default();
    match request.kind {
      ActionKind::Validate => format!("Valider l'enquête de {}{} ?", who, current),
      ActionKind::Reject => format!("Refuser l'enquête de {}{} ?", who, current),
      ActionKind::Export => "Exporter la liste des enquêtes ?".to_string(),
      other => format!("{} ?", other.label()),
    }
  }

  fn mutate(
    ctx: &PageContext,
    request: ActionRequest<SurveyRecord>,
    _form: Option<Form>,
  ) -> BoxFuture<'static, MutationOutcome> {
    let client = ctx.source.client().clone();
    let (school_id, year_id) = (ctx.school_id, ctx.year_id);
    let dir = ctx.download_dir.clone();

    Box::pin(async move {
      match request.kind {
        ActionKind::Validate => {
          let survey = selected(request)?;
          mutations::validate_survey(&client, survey.id)
            .await?
            .into_message("Enquête validée")
        }
        ActionKind::Reject => {
          let survey = selected(request)?;
          mutations::reject_survey(&client, survey.id)
            .await?
            .into_message("Enquête refusée")
        }
        ActionKind::Export => {
          let saved = mutations::export_surveys(&client, school_id, year_id, &dir).await?;
          Ok(format!("Export enregistré: {}", saved.path.display()))
        }
        other => Err(unsupported(other)),
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::TtlCache;
  use crate::entities::Entity;
  use crate::query::DataSource;
  use crate::test_support::{scratch_dir, MockBackend};
  use crate::workflow::{ActionResult, PageController};
  use axum::http::header;
  use axum::routing::{get, post};
  use axum::{Json, Router};
  use serde_json::json;
  use std::sync::Arc;
  use std::time::Duration;

  #[tokio::test]
  async fn test_export_needs_no_selection() {
    let backend = MockBackend::start(
      Router::new()
        .route(
          "/inscriptions/enquetes/ecole/38/annee/226",
          get(|| async { Json(json!({ "content": [] })) }),
        )
        .route(
          "/inscriptions/enquetes/export",
          post(|| async {
            (
              [(header::CONTENT_TYPE, "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")],
              b"PK\x03\x04".to_vec(),
            )
          }),
        ),
    )
    .await;
    let ctx = PageContext {
      source: DataSource::new(backend.client(), Arc::new(TtlCache::new(Duration::from_secs(60)))),
      school_id: 38,
      year_id: 226,
      download_dir: scratch_dir(),
    };
    let mut page = PageController::<SurveysPage>::new(ctx, 20);

    page.mount();
    page.settle().await;
    assert!(page.fetch_state().data.is_empty());

    assert_eq!(page.on_action(ActionKind::Export, None), ActionResult::ModalOpened);
    page.submit();
    page.settle().await;

    let notice = page.notice().unwrap();
    assert!(notice.contains("enquetes_38_"));
    assert!(notice.ends_with(".xlsx"));
  }

  #[test]
  fn test_prompt_names_student() {
    let survey = Survey::normalize(&json!({
      "inscriptionid": 4,
      "eleve": { "matricule": "23-0045B", "nom": "Traoré", "prenom": "Mariam" }
    }))
    .unwrap();

    let prompt = SurveysPage::prompt(&ActionRequest {
      kind: ActionKind::Reject,
      item: Some(survey),
    });
    assert_eq!(prompt, "Refuser l'enquête de Mariam Traoré (23-0045B) ?");
  }

  #[test]
  fn test_prompt_flags_already_processed_survey() {
    let survey = Survey::normalize(&json!({
      "inscriptionid": 5,
      "statut": "VALIDEE",
      "eleve": { "matricule": "23-0046C", "nom": "Kone", "prenom": "Ali" }
    }))
    .unwrap();

    let prompt = SurveysPage::prompt(&ActionRequest {
      kind: ActionKind::Reject,
      item: Some(survey),
    });
    assert_eq!(prompt, "Refuser l'enquête de Ali Kone (23-0046C) (actuellement VALIDEE) ?");
  }
}
