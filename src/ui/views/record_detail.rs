use crate::api::{self, ErrorInfo};
use crate::entities::RAW_DATA;
use crate::query::{Fetched, Performance};
use crate::table::{TableRow, MISSING_LABEL};
use crate::ui::renderfns::format_duration;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::workflow::{Page, PageContext, PageRecord};
use crossterm::event::{KeyCode, KeyEvent};
use futures::future::BoxFuture;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use serde_json::Value;
use tokio::sync::oneshot;

type Loader = Box<dyn Fn(bool) -> BoxFuture<'static, api::Result<Fetched<Value>>> + Send>;

/// Detail screen for one row: its normalized fields, then the raw DTO.
///
/// Pages with a detail endpoint refresh the record from it (cache first).
pub struct RecordDetailView {
  title: String,
  fields: Vec<(String, String)>,
  raw: Value,
  loader: Option<Loader>,
  pending: Option<oneshot::Receiver<api::Result<Fetched<Value>>>>,
  error: Option<ErrorInfo>,
  performance: Option<Performance>,
  scroll: u16,
}

/// Split a serialized record into display fields and its raw DTO
fn split_record(record: Value) -> (Vec<(String, String)>, Value) {
  let Value::Object(mut map) = record else {
    return (Vec::new(), Value::Null);
  };
  let raw = map.remove(RAW_DATA).unwrap_or(Value::Null);
  let fields = map
    .into_iter()
    .map(|(key, value)| {
      let shown = match value {
        Value::Null => MISSING_LABEL.to_string(),
        Value::String(s) if s.is_empty() => MISSING_LABEL.to_string(),
        Value::String(s) => s,
        other => other.to_string(),
      };
      (key, shown)
    })
    .collect();
  (fields, raw)
}

impl RecordDetailView {
  pub fn for_record<P: Page>(ctx: &PageContext, record: &PageRecord<P>) -> Self {
    let title = format!("{} #{}", P::TITLE, record.row_id());
    let (fields, raw) = split_record(serde_json::to_value(record).unwrap_or(Value::Null));

    let loader: Option<Loader> = P::detail_endpoint(record).map(|endpoint| {
      let source = ctx.source.clone();
      Box::new(move |force: bool| {
        let source = source.clone();
        let endpoint = endpoint.clone();
        let fut: BoxFuture<'static, api::Result<Fetched<Value>>> = Box::pin(async move {
          let fetched = source.fetch_object::<P::Entity>(endpoint, force).await?;
          Ok(Fetched {
            data: serde_json::to_value(&fetched.data)?,
            performance: fetched.performance,
          })
        });
        fut
      }) as Loader
    });

    let mut view = Self {
      title,
      fields,
      raw,
      loader,
      pending: None,
      error: None,
      performance: None,
      scroll: 0,
    };
    view.load(false);
    view
  }

  fn load(&mut self, force: bool) {
    let Some(loader) = &self.loader else {
      return;
    };
    let fut = loader(force);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(fut.await);
    });
    self.pending = Some(rx);
  }

  fn is_loading(&self) -> bool {
    self.pending.is_some()
  }

  fn apply(&mut self, result: api::Result<Fetched<Value>>) {
    match result {
      Ok(fetched) => {
        let (fields, raw) = split_record(fetched.data);
        self.fields = fields;
        self.raw = raw;
        self.performance = Some(fetched.performance);
        self.error = None;
      }
      // Keep what the list gave us
      Err(e) => self.error = Some(ErrorInfo::from(e)),
    }
  }

  fn poll(&mut self) {
    let Some(rx) = self.pending.as_mut() else {
      return;
    };
    match rx.try_recv() {
      Ok(result) => {
        self.pending = None;
        self.apply(result);
      }
      Err(oneshot::error::TryRecvError::Empty) => {}
      Err(oneshot::error::TryRecvError::Closed) => self.pending = None,
    }
  }

  #[cfg(test)]
  async fn settle(&mut self) {
    if let Some(rx) = self.pending.take() {
      if let Ok(result) = rx.await {
        self.apply(result);
      }
    }
  }

  fn lines(&self) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let status = if self.is_loading() {
      Line::styled("Chargement du détail...", Style::default().fg(Color::DarkGray))
    } else if let Some(error) = &self.error {
      Line::styled(
        format!("Erreur: {} ({}). 'r' pour réessayer.", error.message, error.kind),
        Style::default().fg(Color::Red),
      )
    } else if let Some(perf) = self.performance {
      Line::styled(
        format!("{} · {}", perf.source.label(), format_duration(perf.duration)),
        Style::default().fg(Color::DarkGray),
      )
    } else {
      Line::default()
    };
    lines.push(status);
    lines.push(Line::default());

    for (key, value) in &self.fields {
      lines.push(Line::from(vec![
        Span::styled(format!("{:<16}", key), Style::default().fg(Color::DarkGray)),
        Span::raw(value.clone()),
      ]));
    }

    if !self.raw.is_null() {
      lines.push(Line::default());
      lines.push(Line::styled("Données brutes", Style::default().fg(Color::Yellow).bold()));
      let pretty = serde_json::to_string_pretty(&self.raw).unwrap_or_default();
      lines.extend(pretty.lines().map(|l| Line::from(l.to_string())));
    }
    lines
  }
}

impl View for RecordDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
      KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
      KeyCode::Char('r') => self.load(true),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(self.lines())
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.title.clone()
  }

  fn tick(&mut self) {
    self.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    let mut shortcuts = vec![Shortcut::new("j/k", "défiler")];
    if self.loader.is_some() {
      shortcuts.push(Shortcut::new("r", "actualiser"));
    }
    shortcuts.push(Shortcut::new("q", "retour"));
    shortcuts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, TtlCache};
  use crate::entities::{Entity, Personnel};
  use crate::pages::{PersonnelPage, QuizzesPage};
  use crate::query::DataSource;
  use crate::test_support::{scratch_dir, Hits, MockBackend};
  use axum::http::StatusCode;
  use axum::routing::get;
  use axum::{Json, Router};
  use serde_json::json;
  use std::sync::Arc;
  use std::time::Duration;

  fn field<'a>(view: &'a RecordDetailView, key: &str) -> Option<&'a str> {
    view
      .fields
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_str())
  }

  fn ctx(backend: &MockBackend) -> PageContext {
    PageContext {
      source: DataSource::new(backend.client(), Arc::new(TtlCache::new(Duration::from_secs(60)))),
      school_id: 38,
      year_id: 226,
      download_dir: scratch_dir(),
    }
  }

  fn listed() -> <Personnel as Entity>::Record {
    Personnel::normalize(&json!({ "personnelid": 7, "personnelnom": "Koffi", "personnelprenom": "Awa" }))
      .unwrap()
  }

  #[tokio::test]
  async fn test_detail_endpoint_replaces_list_fields() {
    let hits = Hits::default();
    let counter = hits.clone();
    let backend = MockBackend::start(Router::new().route(
      "/personnels/7",
      get(move || {
        let counter = counter.clone();
        async move {
          counter.hit();
          Json(json!({ "data": {
            "personnelid": 7, "personnelnom": "Koffi", "personnelprenom": "Awa",
            "personnelemail": "awa.koffi@ecole.ci"
          }}))
        }
      }),
    ))
    .await;
    let ctx = ctx(&backend);

    let mut view = RecordDetailView::for_record::<PersonnelPage>(&ctx, &listed());
    assert_eq!(view.breadcrumb_label(), "Personnel #7");
    assert_eq!(field(&view, "email"), Some(MISSING_LABEL));
    view.settle().await;

    assert_eq!(field(&view, "email"), Some("awa.koffi@ecole.ci"));
    assert_eq!(view.performance.map(|p| p.source), Some(CacheSource::Api));
    assert_eq!(view.raw["personnelemail"], "awa.koffi@ecole.ci");

    // Second visit is served from the cache
    let mut again = RecordDetailView::for_record::<PersonnelPage>(&ctx, &listed());
    again.settle().await;
    assert_eq!(again.performance.map(|p| p.source), Some(CacheSource::Cache));
    assert_eq!(hits.count(), 1);
  }

  #[tokio::test]
  async fn test_failed_detail_keeps_list_fields() {
    let backend = MockBackend::start(Router::new().route(
      "/personnels/7",
      get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    ))
    .await;

    let mut view = RecordDetailView::for_record::<PersonnelPage>(&ctx(&backend), &listed());
    view.settle().await;

    assert!(view.error.is_some());
    assert_eq!(field(&view, "nomComplet"), Some("Awa Koffi"));
  }

  #[tokio::test]
  async fn test_page_without_detail_endpoint_does_not_fetch() {
    let backend = MockBackend::start(Router::new()).await;
    let quiz = crate::entities::Quiz::normalize(&json!({ "quizid": 3, "quizlibelle": "Verbes" })).unwrap();

    let view = RecordDetailView::for_record::<QuizzesPage>(&ctx(&backend), &quiz);
    assert!(!view.is_loading());
    assert_eq!(field(&view, "titre"), Some("Verbes"));
    assert_eq!(view.breadcrumb_label(), "Quiz #3");
  }
}
