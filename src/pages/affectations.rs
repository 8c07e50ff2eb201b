use futures::future::BoxFuture;
use ratatui::style::Color;

use super::{filled, selected, unsupported};
use crate::api::mutations::{self, AffectationDraft};
use crate::entities::{Affectation, AffectationRecord, SchoolYearParams};
use crate::form::{options_from, Form, FormField};
use crate::table::{ActionKind, ActionRequest, ActionSpec, Column, FilterConfig};
use crate::workflow::{Dispatch, MutationOutcome, Page, PageContext};

/// Class/teacher affectations for the school year.
pub struct AffectationsPage;

fn draft(form: &Form, year_id: i64) -> AffectationDraft {
  AffectationDraft {
    class_id: form.choice("classe").unwrap_or(0),
    teacher_id: form.choice("enseignant").unwrap_or(0),
    subject_id: form.choice("matiere").filter(|id| *id > 0),
    year_id,
  }
}

impl Page for AffectationsPage {
  type Entity = Affectation;

  const TITLE: &'static str = "Affectations";

  const COLUMNS: &'static [Column] = &[
    Column::number("id", "ID", 6),
    Column::text("classe", "Classe", 14),
    Column::text("enseignant", "Enseignant", 28),
    Column::text("matiere", "Matière", 18),
    Column::text("annee", "Année", 10),
  ];

  const SEARCHABLE: &'static [&'static str] = &["classe", "enseignant", "matiere"];

  const FILTERS: &'static [FilterConfig] = &[
    FilterConfig::select("classe", "Classe"),
    FilterConfig::select("matiere", "Matière"),
    FilterConfig::text("enseignant", "Enseignant"),
  ];

  const ACTIONS: &'static [ActionSpec] = &[
    ActionSpec::new(ActionKind::View, 'v', "Voir", Color::Cyan),
    ActionSpec::new(ActionKind::Create, 'a', "Nouvelle", Color::Green),
    ActionSpec::new(ActionKind::Edit, 'e', "Modifier", Color::Yellow),
    ActionSpec::new(ActionKind::Delete, 'd', "Supprimer", Color::Red),
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
      ActionKind::Create | ActionKind::Edit | ActionKind::Delete => Dispatch::Confirm,
      ActionKind::Print
      | ActionKind::Deactivate
      | ActionKind::Validate
      | ActionKind::Reject
      | ActionKind::Export => Dispatch::Unsupported,
    }
  }

  fn prompt(request: &ActionRequest<AffectationRecord>) -> String {
    match (request.kind, &request.item) {
      (ActionKind::Create, _) => "Nouvelle affectation".to_string(),
      (ActionKind::Edit, Some(a)) => format!("Modifier l'affectation de {} en {}", a.enseignant, a.classe),
      (ActionKind::Delete, Some(a)) => format!(
        "Retirer {} de la classe {} ({}) ?",
        a.enseignant, a.classe, a.matiere
      ),
      (kind, _) => format!("{} ?", kind.label()),
    }
  }

  fn form(request: &ActionRequest<AffectationRecord>, rows: &[AffectationRecord]) -> Option<Form> {
    if !matches!(request.kind, ActionKind::Create | ActionKind::Edit) {
      return None;
    }
    let current = request.item.as_ref();

    let mut subjects = vec![(0, "Aucune".to_string())];
    subjects.extend(options_from(rows, |a| (a.matiere_id, a.matiere.clone())));

    Some(Form::new(vec![
      FormField::choice(
        "classe",
        "Classe",
        options_from(rows, |a| (a.classe_id, a.classe.clone())),
        current.map(|a| a.classe_id),
      ),
      FormField::choice(
        "enseignant",
        "Enseignant",
        options_from(rows, |a| (a.enseignant_id, a.enseignant.clone())),
        current.map(|a| a.enseignant_id),
      ),
      FormField::choice("matiere", "Matière", subjects, current.map(|a| a.matiere_id)),
    ]))
  }

  fn mutate(
    ctx: &PageContext,
    request: ActionRequest<AffectationRecord>,
    form: Option<Form>,
  ) -> BoxFuture<'static, MutationOutcome> {
    let client = ctx.source.client().clone();
    let year_id = ctx.year_id;

    Box::pin(async move {
      match request.kind {
        ActionKind::Create => {
          let draft = draft(&filled(form)?, year_id);
          mutations::create_affectation(&client, &draft)
            .await?
            .into_message("Affectation créée")
        }
        ActionKind::Edit => {
          let draft = draft(&filled(form)?, year_id);
          let affectation = selected(request)?;
          mutations::update_affectation(&client, affectation.id, &draft)
            .await?
            .into_message("Affectation modifiée")
        }
        ActionKind::Delete => {
          let affectation = selected(request)?;
          mutations::delete_affectation(&client, affectation.id)
            .await?
            .into_message("Affectation supprimée")
        }
        other => Err(unsupported(other)),
      }
    })
  }
}
