use futures::future::BoxFuture;
use ratatui::style::Color;

use super::{selected, unsupported};
use crate::api::mutations;
use crate::api::Endpoint;
use crate::entities::{Personnel, PersonnelRecord, SchoolParams};
use crate::form::Form;
use crate::table::{ActionKind, ActionRequest, ActionSpec, Column, FilterConfig};
use crate::workflow::{Dispatch, MutationOutcome, Page, PageContext};

/// Staff list with work certificate generation.
pub struct PersonnelPage;

impl Page for PersonnelPage {
  type Entity = Personnel;

  const TITLE: &'static str = "Personnel";

  const COLUMNS: &'static [Column] = &[
    Column::number("id", "ID", 6),
    Column::text("nomComplet", "Nom complet", 28),
    Column::truncate("fonction", "Fonction", 20, 20),
    Column::text("contact", "Contact", 14),
    Column::truncate("email", "Email", 30, 30),
  ];

  const SEARCHABLE: &'static [&'static str] = &["nomComplet", "fonction", "contact", "email"];

  const FILTERS: &'static [FilterConfig] = &[FilterConfig::select("fonction", "Fonction")];

  const ACTIONS: &'static [ActionSpec] = &[
    ActionSpec::new(ActionKind::View, 'v', "Voir", Color::Cyan),
    ActionSpec::new(ActionKind::Print, 'c', "Certificat", Color::Green),
  ];

  fn params(ctx: &PageContext) -> SchoolParams {
    SchoolParams {
      school_id: ctx.school_id,
    }
  }

  fn dispatch(kind: ActionKind) -> Dispatch {
    match kind {
      ActionKind::View => Dispatch::Navigate,
      ActionKind::Print => Dispatch::Confirm,
      ActionKind::Edit
      | ActionKind::Delete
      | ActionKind::Deactivate
      | ActionKind::Validate
      | ActionKind::Reject
      | ActionKind::Create
      | ActionKind::Export => Dispatch::Unsupported,
    }
  }

  fn prompt(request: &ActionRequest<PersonnelRecord>) -> String {
    match &request.item {
      Some(p) => format!("Générer le certificat de travail de {} ?", p.nom_complet),
      None => "Générer le certificat de travail ?".to_string(),
    }
  }

  fn detail_endpoint(record: &PersonnelRecord) -> Option<Endpoint> {
    Some(Endpoint::PersonnelDetail {
      personnel_id: record.id,
    })
  }

  fn mutate(
    ctx: &PageContext,
    request: ActionRequest<PersonnelRecord>,
    _form: Option<Form>,
  ) -> BoxFuture<'static, MutationOutcome> {
    let client = ctx.source.client().clone();
    let year_id = ctx.year_id;
    let dir = ctx.download_dir.clone();

    Box::pin(async move {
      match request.kind {
        ActionKind::Print => {
          let person = selected(request)?;
          let saved = mutations::generate_work_certificate(&client, person.id, year_id, &dir).await?;
          Ok(format!("Certificat enregistré: {}", saved.path.display()))
        }
        other => Err(unsupported(other)),
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, CacheStore, TtlCache};
  use crate::query::DataSource;
  use crate::test_support::{scratch_dir, Hits, MockBackend};
  use crate::workflow::{ActionResult, PageController};
  use axum::http::{header, StatusCode};
  use axum::response::IntoResponse;
  use axum::routing::{get, post};
  use axum::{Json, Router};
  use serde_json::json;
  use std::sync::Arc;
  use std::time::Duration;

  async fn backend(list_hits: Hits, certificate_ok: bool) -> MockBackend {
    MockBackend::start(
      Router::new()
        .route(
          "/personnels/ecole/38",
          get(move || {
            let hits = list_hits.clone();
            async move {
              hits.hit();
              Json(json!([
                { "personnelid": 7, "personnelnom": "Koffi", "personnelprenom": "Awa", "fonction": null },
                { "personnelid": 9, "personnelnom": "Yao", "personnelprenom": "Kouassi", "fonction": { "fonctionlibelle": "Professeur" } }
              ]))
            }
          }),
        )
        .route(
          "/certificats/travail/7/annee/226",
          post(move || async move {
            if certificate_ok {
              ([(header::CONTENT_TYPE, "application/pdf")], b"%PDF-1.7".to_vec()).into_response()
            } else {
              (StatusCode::GATEWAY_TIMEOUT, "trop lent").into_response()
            }
          }),
        ),
    )
    .await
  }

  fn controller(backend: &MockBackend) -> (PageController<PersonnelPage>, Arc<TtlCache>) {
    let cache = Arc::new(TtlCache::new(Duration::from_secs(300)));
    let ctx = PageContext {
      source: DataSource::new(backend.client(), cache.clone()),
      school_id: 38,
      year_id: 226,
      download_dir: scratch_dir(),
    };
    (PageController::new(ctx, 20), cache)
  }

  #[tokio::test]
  async fn test_certificate_success_clears_cache_and_refetches() {
    let hits = Hits::default();
    let backend = backend(hits.clone(), true).await;
    let (mut page, cache) = controller(&backend);

    page.mount();
    page.settle().await;
    assert_eq!(page.fetch_state().data.len(), 2);
    assert_eq!(cache.len(), 1);

    let awa = page.fetch_state().data[0].clone();
    assert_eq!(awa.fonction, "Non définie");
    assert_eq!(
      page.on_action(ActionKind::Print, Some(awa)),
      ActionResult::ModalOpened
    );
    let (prompt, error) = page.modal_prompt().unwrap();
    assert!(prompt.contains("Awa Koffi"));
    assert!(error.is_none());

    assert!(page.submit());
    page.settle().await;

    assert!(page.workflow().is_idle());
    assert!(page.notice().unwrap().ends_with("certificat-travail-7-226.pdf"));
    assert!(page.context().download_dir.join("certificat-travail-7-226.pdf").exists());
    assert_eq!(hits.count(), 2);
  }

  #[tokio::test]
  async fn test_refresh_overtaken_by_certificate_does_not_restore_old_rows() {
    let hits = Hits::default();
    let counter = hits.clone();
    let backend = MockBackend::start(
      Router::new()
        .route(
          "/personnels/ecole/38",
          get(move || {
            let counter = counter.clone();
            async move {
              let n = counter.hit();
              if n == 1 {
                tokio::time::sleep(Duration::from_millis(300)).await;
              }
              let nom = if n < 2 { "Ancien" } else { "Nouveau" };
              Json(json!([{ "personnelid": 7, "personnelnom": nom }]))
            }
          }),
        )
        .route(
          "/certificats/travail/7/annee/226",
          post(|| async { ([(header::CONTENT_TYPE, "application/pdf")], b"%PDF-1.7".to_vec()) }),
        ),
    )
    .await;
    let (mut page, cache) = controller(&backend);

    page.mount();
    page.settle().await;
    page.on_refresh();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let row = page.fetch_state().data[0].clone();
    page.on_action(ActionKind::Print, Some(row));
    assert!(page.submit());
    page.settle().await;
    assert_eq!(page.fetch_state().data[0].nom, "Nouveau");

    // The slow refresh lands after the mutation cleared the cache
    tokio::time::sleep(Duration::from_millis(400)).await;
    page.poll();
    assert_eq!(page.fetch_state().data[0].nom, "Nouveau");
    assert_eq!(cache.len(), 1);

    let mut reopened = PageController::<PersonnelPage>::new(page.context().clone(), 20);
    reopened.mount();
    reopened.settle().await;

    assert_eq!(reopened.fetch_state().data[0].nom, "Nouveau");
    assert_eq!(
      reopened.fetch_state().performance.map(|p| p.source),
      Some(CacheSource::Cache)
    );
    assert_eq!(hits.count(), 3);
  }

  #[tokio::test]
  async fn test_failed_certificate_keeps_rows_and_shows_error() {
    let hits = Hits::default();
    let backend = backend(hits.clone(), false).await;
    let (mut page, cache) = controller(&backend);

    page.mount();
    page.settle().await;
    let before = page.fetch_state().data.clone();

    let awa = before[0].clone();
    page.on_action(ActionKind::Print, Some(awa));
    page.submit();
    page.settle().await;

    let (_, error) = page.modal_prompt().unwrap();
    assert!(error.is_some());
    assert_eq!(page.fetch_state().data, before);
    assert_eq!(cache.len(), 1);
    assert_eq!(hits.count(), 1);
    assert_eq!(std::fs::read_dir(&page.context().download_dir).unwrap().count(), 0);
  }

  #[tokio::test]
  async fn test_cancel_runs_no_mutation() {
    let hits = Hits::default();
    let backend = backend(hits.clone(), true).await;
    let (mut page, _) = controller(&backend);

    page.mount();
    page.settle().await;

    let awa = page.fetch_state().data[0].clone();
    page.on_action(ActionKind::Print, Some(awa));
    assert!(page.cancel());
    assert!(!page.submit());

    assert!(page.workflow().is_idle());
    assert_eq!(std::fs::read_dir(&page.context().download_dir).unwrap().count(), 0);
  }

  #[tokio::test]
  async fn test_view_navigates_and_unsupported_is_ignored() {
    let backend = backend(Hits::default(), true).await;
    let (mut page, _) = controller(&backend);
    page.mount();
    page.settle().await;

    let awa = page.fetch_state().data[0].clone();
    match page.on_action(ActionKind::View, Some(awa.clone())) {
      ActionResult::Navigate(request) => assert_eq!(request.item.unwrap().id, 7),
      other => panic!("expected navigation, got {:?}", other),
    }
    assert!(page.workflow().is_idle());

    assert_eq!(page.on_action(ActionKind::Delete, Some(awa)), ActionResult::Ignored);
    assert_eq!(page.on_action(ActionKind::Print, None), ActionResult::Ignored);
    assert!(page.workflow().is_idle());
  }
}
