use futures::future::BoxFuture;
use ratatui::style::Color;

use super::{selected, unsupported};
use crate::api::mutations;
use crate::entities::{Profile, ProfileRecord, SchoolParams};
use crate::form::Form;
use crate::table::{ActionKind, ActionRequest, ActionSpec, Column, FilterConfig};
use crate::workflow::{Dispatch, MutationOutcome, Page, PageContext};

/// User profiles, with deactivation.
pub struct ProfilesPage;

impl Page for ProfilesPage {
  type Entity = Profile;

  const TITLE: &'static str = "Profils";

  const COLUMNS: &'static [Column] = &[
    Column::number("id", "ID", 6),
    Column::text("nomComplet", "Nom complet", 26),
    Column::truncate("profil", "Profil", 18, 18),
    Column::truncate("email", "Email", 28, 28),
    Column::text("contact", "Contact", 14),
    Column::text("statut", "Statut", 10),
  ];

  const SEARCHABLE: &'static [&'static str] = &["nomComplet", "email", "contact", "profil"];

  const FILTERS: &'static [FilterConfig] = &[
    FilterConfig::select("profil", "Profil"),
    FilterConfig::select("statut", "Statut"),
  ];

  const ACTIONS: &'static [ActionSpec] = &[
    ActionSpec::new(ActionKind::View, 'v', "Voir", Color::Cyan),
    ActionSpec::new(ActionKind::Deactivate, 'd', "Désactiver", Color::Red),
  ];

  fn params(ctx: &PageContext) -> SchoolParams {
    SchoolParams {
      school_id: ctx.school_id,
    }
  }

  fn dispatch(kind: ActionKind) -> Dispatch {
    match kind {
      ActionKind::View => Dispatch::Navigate,
      ActionKind::Deactivate => Dispatch::Confirm,
      ActionKind::Edit
      | ActionKind::Print
      | ActionKind::Delete
      | ActionKind::Validate
      | ActionKind::Reject
      | ActionKind::Create
      | ActionKind::Export => Dispatch::Unsupported,
    }
  }

  fn prompt(request: &ActionRequest<ProfileRecord>) -> String {
    match &request.item {
      Some(p) if !p.is_active() => format!("Le profil de {} est déjà inactif. Désactiver quand même ?", p.nom_complet),
      Some(p) => format!("Désactiver le profil « {} » de {} ?", p.profil, p.nom_complet),
      None => "Désactiver ce profil ?".to_string(),
    }
  }

  fn mutate(
    ctx: &PageContext,
    request: ActionRequest<ProfileRecord>,
    _form: Option<Form>,
  ) -> BoxFuture<'static, MutationOutcome> {
    let client = ctx.source.client().clone();

    Box::pin(async move {
      match request.kind {
        ActionKind::Deactivate => {
          let profile = selected(request)?;
          mutations::deactivate_profile(&client, profile.id)
            .await?
            .into_message("Profil désactivé")
        }
        other => Err(unsupported(other)),
      }
    })
  }
}
