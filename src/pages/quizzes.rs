use futures::future::BoxFuture;
use ratatui::style::Color;

use super::{filled, selected, unsupported};
use crate::api::mutations::{self, QuizDraft};
use crate::entities::{Quiz, QuizRecord, SchoolParams};
use crate::form::{options_from, Form, FormField};
use crate::table::{ActionKind, ActionRequest, ActionSpec, Column, FilterConfig};
use crate::workflow::{Dispatch, MutationOutcome, Page, PageContext};

/// Quiz authoring: create, edit, delete.
pub struct QuizzesPage;

fn draft(form: &Form, school_id: i64) -> QuizDraft {
  QuizDraft {
    title: form.text("titre"),
    subject_id: form.choice("matiere").unwrap_or(0),
    class_id: form.choice("classe").unwrap_or(0),
    school_id,
  }
}

impl Page for QuizzesPage {
  type Entity = Quiz;

  const TITLE: &'static str = "Quiz";

  const COLUMNS: &'static [Column] = &[
    Column::number("id", "ID", 6),
    Column::truncate("titre", "Titre", 32, 32),
    Column::text("matiere", "Matière", 18),
    Column::text("classe", "Classe", 12),
    Column::number("nbQuestions", "Questions", 9),
    Column::text("date", "Créé le", 10),
  ];

  const SEARCHABLE: &'static [&'static str] = &["titre", "matiere", "classe"];

  const FILTERS: &'static [FilterConfig] = &[
    FilterConfig::select("matiere", "Matière"),
    FilterConfig::select("classe", "Classe"),
  ];

  const ACTIONS: &'static [ActionSpec] = &[
    ActionSpec::new(ActionKind::View, 'v', "Voir", Color::Cyan),
    ActionSpec::new(ActionKind::Create, 'a', "Nouveau", Color::Green),
    ActionSpec::new(ActionKind::Edit, 'e', "Modifier", Color::Yellow),
    ActionSpec::new(ActionKind::Delete, 'd', "Supprimer", Color::Red),
  ];

  fn params(ctx: &PageContext) -> SchoolParams {
    SchoolParams {
      school_id: ctx.school_id,
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

  fn prompt(request: &ActionRequest<QuizRecord>) -> String {
    match (request.kind, &request.item) {
      (ActionKind::Create, _) => "Nouveau quiz".to_string(),
      (ActionKind::Edit, Some(q)) => format!("Modifier le quiz « {} »", q.titre),
      (ActionKind::Delete, Some(q)) => format!(
        "Supprimer le quiz « {} » ({} questions) ?",
        q.titre, q.nb_questions
      ),
      (kind, _) => format!("{} ?", kind.label()),
    }
  }

  fn form(request: &ActionRequest<QuizRecord>, rows: &[QuizRecord]) -> Option<Form> {
    if !matches!(request.kind, ActionKind::Create | ActionKind::Edit) {
      return None;
    }
    let current = request.item.as_ref();
    Some(Form::new(vec![
      FormField::text("titre", "Titre", current.map(|q| q.titre.clone()).unwrap_or_default()),
      FormField::choice(
        "matiere",
        "Matière",
        options_from(rows, |q| (q.matiere_id, q.matiere.clone())),
        current.map(|q| q.matiere_id),
      ),
      FormField::choice(
        "classe",
        "Classe",
        options_from(rows, |q| (q.classe_id, q.classe.clone())),
        current.map(|q| q.classe_id),
      ),
    ]))
  }

  fn mutate(
    ctx: &PageContext,
    request: ActionRequest<QuizRecord>,
    form: Option<Form>,
  ) -> BoxFuture<'static, MutationOutcome> {
    let client = ctx.source.client().clone();
    let school_id = ctx.school_id;

    Box::pin(async move {
      match request.kind {
        ActionKind::Create => {
          let draft = draft(&filled(form)?, school_id);
          mutations::create_quiz(&client, &draft)
            .await?
            .into_message("Quiz créé")
        }
        ActionKind::Edit => {
          let draft = draft(&filled(form)?, school_id);
          let quiz = selected(request)?;
          mutations::update_quiz(&client, quiz.id, &draft)
            .await?
            .into_message("Quiz modifié")
        }
        ActionKind::Delete => {
          let quiz = selected(request)?;
          mutations::delete_quiz(&client, quiz.id)
            .await?
            .into_message("Quiz supprimé")
        }
        other => Err(unsupported(other)),
      }
    })
  }
}
