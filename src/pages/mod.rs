//! Screens offered by the terminal client, one per entity.

mod affectations;
mod personnel;
mod profiles;
mod quizzes;
mod surveys;

pub use affectations::AffectationsPage;
pub use personnel::PersonnelPage;
pub use profiles::ProfilesPage;
pub use quizzes::QuizzesPage;
pub use surveys::SurveysPage;

use crate::api::{Error, Result};
use crate::form::Form;
use crate::table::{ActionKind, ActionRequest};

/// The row an action was fired on.
fn selected<R>(request: ActionRequest<R>) -> Result<R> {
  request
    .item
    .ok_or_else(|| Error::Rejected("Aucun élément sélectionné".to_string()))
}

fn unsupported(kind: ActionKind) -> Error {
  Error::Rejected(format!("Action « {} » indisponible ici", kind.label()))
}

/// The filled-in form of a create/edit action.
fn filled(form: Option<Form>) -> Result<Form> {
  form.ok_or_else(|| Error::Rejected("Formulaire manquant".to_string()))
}
