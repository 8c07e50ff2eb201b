//! Action workflow: table action → dispatch → modal → mutation → refresh.
//!
//! [`ActionWorkflow`] is the modal state machine, [`Page`] binds one entity to
//! its table layout and mutations, and [`PageController`] glues a page to its
//! [`FetchHook`] and [`TableState`].

use futures::future::BoxFuture;
use std::marker::PhantomData;
use std::path::PathBuf;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::api::{self, Endpoint};
use crate::entities::Entity;
use crate::form::Form;
use crate::query::{DataSource, FetchHook, FetchState};
use crate::table::{
  ActionKind, ActionRequest, ActionSpec, Column, FilterConfig, TableModel, TablePage, TableState,
};

/// Record type displayed by a page.
pub type PageRecord<P> = <<P as Page>::Entity as Entity>::Record;

/// Result of a mutation: the message to show on success.
pub type MutationOutcome = api::Result<String>;

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState<R> {
  Idle,
  ActionRequested(ActionRequest<R>),
  ModalOpen {
    request: ActionRequest<R>,
    error: Option<String>,
  },
  Submitting(ActionRequest<R>),
}

/// Modal lifecycle for one page.
///
/// `Idle → ActionRequested → ModalOpen → Submitting → Idle`, with `cancel`
/// back to `Idle` from the first two steps and `fail` back to `ModalOpen`.
/// Any other transition is refused and leaves the state untouched.
#[derive(Debug, Clone)]
pub struct ActionWorkflow<R> {
  state: WorkflowState<R>,
}

impl<R> Default for ActionWorkflow<R> {
  fn default() -> Self {
    Self {
      state: WorkflowState::Idle,
    }
  }
}

impl<R: Clone> ActionWorkflow<R> {
  pub fn new() -> Self {
    Self::default()
  }

  #[cfg(test)]
  pub fn state(&self) -> &WorkflowState<R> {
    &self.state
  }

  pub fn is_idle(&self) -> bool {
    matches!(self.state, WorkflowState::Idle)
  }

  pub fn is_submitting(&self) -> bool {
    matches!(self.state, WorkflowState::Submitting(_))
  }

  /// The request behind the open or submitting modal, with its last error.
  pub fn modal(&self) -> Option<(&ActionRequest<R>, Option<&str>)> {
    match &self.state {
      WorkflowState::ModalOpen { request, error } => Some((request, error.as_deref())),
      WorkflowState::Submitting(request) => Some((request, None)),
      _ => None,
    }
  }

  pub fn request(&mut self, request: ActionRequest<R>) -> bool {
    if !self.is_idle() {
      return false;
    }
    self.state = WorkflowState::ActionRequested(request);
    true
  }

  pub fn open_modal(&mut self) -> bool {
    match std::mem::replace(&mut self.state, WorkflowState::Idle) {
      WorkflowState::ActionRequested(request) => {
        self.state = WorkflowState::ModalOpen {
          request,
          error: None,
        };
        true
      }
      other => {
        self.state = other;
        false
      }
    }
  }

  /// Close without mutating. Refused while a submission is in flight.
  pub fn cancel(&mut self) -> bool {
    match self.state {
      WorkflowState::ActionRequested(_) | WorkflowState::ModalOpen { .. } => {
        self.state = WorkflowState::Idle;
        true
      }
      _ => false,
    }
  }

  /// Move to `Submitting`, returning the request to execute.
  pub fn begin_submit(&mut self) -> Option<ActionRequest<R>> {
    match std::mem::replace(&mut self.state, WorkflowState::Idle) {
      WorkflowState::ModalOpen { request, .. } => {
        self.state = WorkflowState::Submitting(request.clone());
        Some(request)
      }
      other => {
        self.state = other;
        None
      }
    }
  }

  pub fn succeed(&mut self) -> bool {
    if !self.is_submitting() {
      return false;
    }
    self.state = WorkflowState::Idle;
    true
  }

  /// Reopen the modal with `error` shown in it.
  pub fn fail(&mut self, error: impl Into<String>) -> bool {
    match std::mem::replace(&mut self.state, WorkflowState::Idle) {
      WorkflowState::Submitting(request) => {
        self.state = WorkflowState::ModalOpen {
          request,
          error: Some(error.into()),
        };
        true
      }
      other => {
        self.state = other;
        false
      }
    }
  }
}

// ============================================================================
// Pages
// ============================================================================

/// How a page handles an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
  /// Open another screen for the item
  Navigate,
  /// Ask for confirmation, then run [`Page::mutate`]
  Confirm,
  /// Not offered on this page
  Unsupported,
}

/// Everything a mutation may need besides the request itself.
#[derive(Clone)]
pub struct PageContext {
  pub source: DataSource,
  pub school_id: i64,
  pub year_id: i64,
  pub download_dir: PathBuf,
}

/// One list screen: an entity, how to show it and what its actions do.
pub trait Page: Send + Sync + 'static {
  type Entity: Entity;

  const TITLE: &'static str;
  const COLUMNS: &'static [Column];
  const SEARCHABLE: &'static [&'static str];
  const FILTERS: &'static [FilterConfig];
  const ACTIONS: &'static [ActionSpec];

  fn params(ctx: &PageContext) -> <Self::Entity as Entity>::Params;

  fn dispatch(kind: ActionKind) -> Dispatch;

  /// Question shown in the confirmation modal.
  fn prompt(request: &ActionRequest<PageRecord<Self>>) -> String;

  /// Form to fill in before confirming, for create/edit actions.
  ///
  /// `rows` is the loaded list, used to offer choices.
  fn form(_request: &ActionRequest<PageRecord<Self>>, _rows: &[PageRecord<Self>]) -> Option<Form> {
    None
  }

  fn mutate(
    ctx: &PageContext,
    request: ActionRequest<PageRecord<Self>>,
    form: Option<Form>,
  ) -> BoxFuture<'static, MutationOutcome>;

  /// Endpoint serving the full object behind a row, if the backend has one.
  fn detail_endpoint(_record: &PageRecord<Self>) -> Option<Endpoint> {
    None
  }

  fn model() -> TableModel<'static> {
    TableModel {
      columns: Self::COLUMNS,
      searchable: Self::SEARCHABLE,
      filters: Self::FILTERS,
    }
  }

  fn action_for_key(key: char) -> Option<&'static ActionSpec> {
    Self::ACTIONS.iter().find(|a| a.key == key)
  }
}

/// What the view should do after an action key.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult<R> {
  /// Nothing to do (no selection, workflow busy, unsupported)
  Ignored,
  Navigate(ActionRequest<R>),
  ModalOpened,
}

// ============================================================================
// Controller
// ============================================================================

/// Binds a [`Page`] to its fetch hook, table state and modal workflow.
pub struct PageController<P: Page> {
  ctx: PageContext,
  hook: FetchHook<P::Entity>,
  table: TableState,
  workflow: ActionWorkflow<PageRecord<P>>,
  form: Option<Form>,
  pending: Option<oneshot::Receiver<MutationOutcome>>,
  notice: Option<String>,
  _page: PhantomData<P>,
}

impl<P: Page> PageController<P> {
  pub fn new(ctx: PageContext, page_size: usize) -> Self {
    let hook = FetchHook::new(ctx.source.clone(), P::params(&ctx));
    Self {
      ctx,
      hook,
      table: TableState::new(page_size),
      workflow: ActionWorkflow::new(),
      form: None,
      pending: None,
      notice: None,
      _page: PhantomData,
    }
  }

  pub fn context(&self) -> &PageContext {
    &self.ctx
  }

  pub fn fetch_state(&self) -> &FetchState<PageRecord<P>> {
    self.hook.state()
  }

  pub fn table(&self) -> &TableState {
    &self.table
  }

  pub fn table_mut(&mut self) -> &mut TableState {
    &mut self.table
  }

  pub fn workflow(&self) -> &ActionWorkflow<PageRecord<P>> {
    &self.workflow
  }

  /// Last success message, shown in the status line.
  pub fn notice(&self) -> Option<&str> {
    self.notice.as_deref()
  }

  /// The visible page of rows.
  pub fn page(&self) -> TablePage<'_, PageRecord<P>> {
    P::model().view(self.hook.data(), &self.table)
  }

  /// Initial cache-first load.
  pub fn mount(&mut self) {
    self.hook.fetch();
  }

  pub fn on_refresh(&mut self) {
    self.notice = None;
    self.hook.refresh();
  }

  pub fn on_action(
    &mut self,
    kind: ActionKind,
    item: Option<PageRecord<P>>,
  ) -> ActionResult<PageRecord<P>> {
    if kind.needs_item() && item.is_none() {
      return ActionResult::Ignored;
    }
    let request = ActionRequest { kind, item };
    if !self.workflow.request(request.clone()) {
      return ActionResult::Ignored;
    }

    match P::dispatch(kind) {
      Dispatch::Navigate => {
        self.workflow.cancel();
        ActionResult::Navigate(request)
      }
      Dispatch::Confirm => {
        self.form = P::form(&request, self.hook.data());
        self.workflow.open_modal();
        ActionResult::ModalOpened
      }
      Dispatch::Unsupported => {
        self.workflow.cancel();
        ActionResult::Ignored
      }
    }
  }

  /// Text for the open modal, if any.
  pub fn modal_prompt(&self) -> Option<(String, Option<&str>)> {
    self
      .workflow
      .modal()
      .map(|(request, error)| (P::prompt(request), error))
  }

  /// Form of the open modal, editable until submission.
  pub fn form(&self) -> Option<&Form> {
    self.form.as_ref()
  }

  pub fn form_mut(&mut self) -> Option<&mut Form> {
    if self.workflow.is_submitting() {
      return None;
    }
    self.form.as_mut()
  }

  pub fn cancel(&mut self) -> bool {
    let cancelled = self.workflow.cancel();
    if cancelled {
      self.form = None;
    }
    cancelled
  }

  /// Begin submitting the open modal and return the mutation to run.
  pub fn confirm(&mut self) -> Option<BoxFuture<'static, MutationOutcome>> {
    let request = self.workflow.begin_submit()?;
    info!(page = P::TITLE, action = ?request.kind, "submitting action");
    Some(P::mutate(&self.ctx, request, self.form.clone()))
  }

  /// Run [`confirm`](Self::confirm) on a tokio task; [`poll`](Self::poll) picks up the result.
  pub fn submit(&mut self) -> bool {
    let Some(mutation) = self.confirm() else {
      return false;
    };
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(mutation.await);
    });
    self.pending = Some(rx);
    true
  }

  /// Apply a finished mutation.
  ///
  /// Success closes the modal, clears the whole cache and forces a refetch.
  /// Failure reopens the modal with the error and leaves the rows alone.
  pub fn complete(&mut self, outcome: MutationOutcome) {
    match outcome {
      Ok(message) => {
        if self.workflow.succeed() {
          info!(page = P::TITLE, %message, "action succeeded");
          self.form = None;
          self.ctx.source.cache().invalidate_all();
          self.notice = Some(message);
          self.hook.refresh();
        }
      }
      Err(e) => {
        warn!(page = P::TITLE, error = %e, kind = e.kind_name(), "action failed");
        self.workflow.fail(e.to_string());
      }
    }
  }

  /// Apply finished fetches and mutations. Returns true if anything changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = self.hook.poll();

    if let Some(rx) = self.pending.as_mut() {
      match rx.try_recv() {
        Ok(outcome) => {
          self.pending = None;
          self.complete(outcome);
          changed = true;
        }
        Err(oneshot::error::TryRecvError::Empty) => {}
        Err(oneshot::error::TryRecvError::Closed) => {
          self.pending = None;
          self.complete(Err(api::Error::Io("Opération interrompue".to_string())));
          changed = true;
        }
      }
    }
    changed
  }

  #[cfg(test)]
  pub async fn settle(&mut self) {
    if let Some(rx) = self.pending.take() {
      if let Ok(outcome) = rx.await {
        self.complete(outcome);
      }
    }
    self.hook.settle().await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(kind: ActionKind, item: Option<i64>) -> ActionRequest<i64> {
    ActionRequest { kind, item }
  }

  #[test]
  fn test_edit_round_trip_opens_modal_with_item() {
    let mut wf = ActionWorkflow::new();

    assert!(wf.request(request(ActionKind::Edit, Some(7))));
    assert!(wf.open_modal());

    let (req, error) = wf.modal().unwrap();
    assert_eq!(req.kind, ActionKind::Edit);
    assert_eq!(req.item, Some(7));
    assert!(error.is_none());
  }

  #[test]
  fn test_cancel_returns_to_idle() {
    let mut wf = ActionWorkflow::new();
    wf.request(request(ActionKind::Delete, Some(1)));
    wf.open_modal();

    assert!(wf.cancel());
    assert!(wf.is_idle());
    assert!(wf.begin_submit().is_none());
  }

  #[test]
  fn test_failure_reopens_modal_with_error() {
    let mut wf = ActionWorkflow::new();
    wf.request(request(ActionKind::Deactivate, Some(3)));
    wf.open_modal();

    let submitted = wf.begin_submit().unwrap();
    assert_eq!(submitted.item, Some(3));
    assert!(!wf.cancel());

    assert!(wf.fail("Délai dépassé"));
    let (req, error) = wf.modal().unwrap();
    assert_eq!(req.item, Some(3));
    assert_eq!(error, Some("Délai dépassé"));

    wf.begin_submit().unwrap();
    assert!(wf.succeed());
    assert!(wf.is_idle());
  }

  #[test]
  fn test_invalid_transitions_are_refused() {
    let mut wf: ActionWorkflow<i64> = ActionWorkflow::new();

    assert!(!wf.open_modal());
    assert!(!wf.succeed());
    assert!(!wf.fail("x"));
    assert!(!wf.cancel());
    assert!(wf.is_idle());

    wf.request(request(ActionKind::View, Some(1)));
    assert!(!wf.request(request(ActionKind::Delete, Some(2))));
    assert!(wf.begin_submit().is_none());
    assert_eq!(
      *wf.state(),
      WorkflowState::ActionRequested(request(ActionKind::View, Some(1)))
    );
  }
}
