use crate::table::ActionKind;
use crate::ui::components::confirm_modal::{self, ModalContent, ModalEvent};
use crate::ui::components::{FilterBar, FilterBarEvent, KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_duration, status_color};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::RecordDetailView;
use crate::workflow::{ActionResult, Page, PageContext, PageController, PageRecord};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState as Selection};

/// List screen for one [`Page`]: table, search, filters, sort, pagination
/// and the action modal.
pub struct EntityTableView<P: Page> {
  controller: PageController<P>,
  selection: Selection,
  search: SearchInput,
  filter_bar: FilterBar,
  /// Column the next `s` press sorts by
  sort_cursor: usize,
  /// One-shot hint (e.g. nothing selected), cleared on the next key
  hint: Option<&'static str>,
}

impl<P: Page> EntityTableView<P> {
  pub fn new(ctx: PageContext, page_size: usize) -> Self {
    let mut controller = PageController::new(ctx, page_size);
    controller.mount();
    Self {
      controller,
      selection: Selection::default(),
      search: SearchInput::new(),
      filter_bar: FilterBar::new(P::FILTERS),
      sort_cursor: 0,
      hint: None,
    }
  }

  fn selected_record(&self) -> Option<PageRecord<P>> {
    let index = self.selection.selected()?;
    self.controller.page().rows.get(index).map(|row| (*row).clone())
  }

  fn sync_filter_bar(&mut self) {
    self
      .filter_bar
      .sync(&self.controller.fetch_state().data, self.controller.table());
  }

  fn reset_selection(&mut self) {
    self.selection.select(Some(0));
  }

  fn run_action(&mut self, kind: ActionKind) -> ViewAction {
    let item = self.selected_record();
    if kind.needs_item() && item.is_none() {
      self.hint = Some("Aucune ligne sélectionnée");
      return ViewAction::None;
    }

    match self.controller.on_action(kind, item) {
      ActionResult::Navigate(request) => match request.item {
        Some(record) => ViewAction::Push(Box::new(RecordDetailView::for_record::<P>(
          self.controller.context(),
          &record,
        ))),
        None => ViewAction::None,
      },
      ActionResult::ModalOpened => ViewAction::None,
      ActionResult::Ignored => {
        self.hint = Some("Action indisponible");
        ViewAction::None
      }
    }
  }

  fn handle_modal_key(&mut self, key: KeyEvent) {
    let has_form = self.controller.form().is_some();
    let submitting = self.controller.workflow().is_submitting();

    let KeyResult::Event(event) = confirm_modal::handle_key(key, has_form, submitting) else {
      return;
    };
    match event {
      ModalEvent::Confirm => {
        self.controller.submit();
      }
      ModalEvent::Cancel => {
        self.controller.cancel();
      }
      other => {
        if let Some(form) = self.controller.form_mut() {
          match other {
            ModalEvent::FocusNext => form.focus_next(),
            ModalEvent::FocusPrev => form.focus_prev(),
            ModalEvent::Cycle(delta) => form.cycle(delta),
            ModalEvent::Char(c) => form.push_char(c),
            ModalEvent::Backspace => form.pop_char(),
            ModalEvent::Confirm | ModalEvent::Cancel => {}
          }
        }
      }
    }
  }

  fn cycle_sort(&mut self) {
    let Some(column) = P::COLUMNS.get(self.sort_cursor % P::COLUMNS.len().max(1)) else {
      return;
    };
    self.controller.table_mut().sort = None;
    self.controller.table_mut().sort_by(column.field);
    self.sort_cursor = (self.sort_cursor + 1) % P::COLUMNS.len();
  }

  fn flip_sort(&mut self) {
    if let Some((field, _)) = self.controller.table().sort {
      self.controller.table_mut().sort_by(field);
    }
  }

  fn title(&self) -> String {
    let state = self.controller.fetch_state();
    if state.loading && state.data.is_empty() {
      format!(" {} (chargement...) ", P::TITLE)
    } else if state.loading {
      format!(" {} (actualisation...) ", P::TITLE)
    } else {
      format!(" {} ({}) ", P::TITLE, self.controller.page().total)
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let page = self.controller.page();
    let state = self.controller.fetch_state();

    if page.rows.is_empty() {
      let content = if state.error.is_some() && state.data.is_empty() {
        "Impossible de charger les données. Appuyez sur 'r' pour réessayer."
      } else if state.loading {
        "Chargement..."
      } else if state.data.is_empty() {
        "Aucun élément."
      } else {
        "Aucun résultat pour cette recherche."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    ensure_valid_selection(&mut self.selection, page.rows.len());

    let sort = self.controller.table().sort;
    let header = Row::new(P::COLUMNS.iter().map(|column| {
      let arrow = match sort {
        Some((field, dir)) if field == column.field => format!(" {}", dir.arrow()),
        _ => String::new(),
      };
      Cell::from(format!("{}{}", column.header, arrow))
    }))
    .style(Style::default().fg(Color::Yellow).bold());

    let rows: Vec<Row> = page
      .rows
      .iter()
      .map(|record| {
        Row::new(P::COLUMNS.iter().map(|column| {
          let text = column.format(*record);
          let style = if column.field == "statut" {
            Style::default().fg(status_color(&text))
          } else {
            Style::default()
          };
          Cell::from(text).style(style)
        }))
      })
      .collect();

    let widths: Vec<Constraint> = P::COLUMNS
      .iter()
      .map(|column| Constraint::Length(column.width))
      .collect();

    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.selection);
  }

  fn status_line(&self) -> Line<'static> {
    let page = self.controller.page();
    let state = self.controller.fetch_state();
    let table = self.controller.table();
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![Span::styled(
      format!(" Page {}/{} · {} élément(s)", page.page + 1, page.page_count.max(1), page.total),
      dim,
    )];

    if let Some(perf) = state.performance {
      spans.push(Span::styled(
        format!(" · {} {}", perf.source.label(), format_duration(perf.duration)),
        dim,
      ));
    }
    if !table.search.is_empty() {
      spans.push(Span::styled(format!(" · /{}", table.search), Style::default().fg(Color::Cyan)));
    }
    for (field, value) in &table.filters {
      spans.push(Span::styled(
        format!(" · {}={}", field, value.label()),
        Style::default().fg(Color::Yellow),
      ));
    }
    if let Some(hint) = self.hint {
      spans.push(Span::styled(format!("  {}", hint), Style::default().fg(Color::Yellow)));
    }
    if let Some(notice) = self.controller.notice() {
      spans.push(Span::styled(format!("  ✓ {}", notice), Style::default().fg(Color::Green)));
    }
    if let Some(error) = &state.error {
      spans.push(Span::styled(
        format!("  ✗ {} ({})", error.message, error.kind),
        Style::default().fg(Color::Red),
      ));
    }
    Line::from(spans)
  }

  fn render_modal(&self, frame: &mut Frame, area: Rect) {
    let Some((prompt, error)) = self.controller.modal_prompt() else {
      return;
    };
    let title = self
      .controller
      .workflow()
      .modal()
      .map(|(request, _)| request.kind.label())
      .unwrap_or("Confirmation");

    confirm_modal::render_overlay(
      frame,
      area,
      &ModalContent {
        title,
        prompt: &prompt,
        form: self.controller.form(),
        error,
        submitting: self.controller.workflow().is_submitting(),
      },
    );
  }
}

impl<P: Page> View for EntityTableView<P> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self.hint = None;

    if self.controller.workflow().modal().is_some() {
      self.handle_modal_key(key);
      return ViewAction::None;
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.controller.table_mut().set_search(text);
        self.reset_selection();
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.filter_bar.handle_key(key, self.controller.table()) {
      KeyResult::Event(FilterBarEvent::Changed { field, value }) => {
        self.controller.table_mut().set_filter(field, value);
        self.sync_filter_bar();
        self.reset_selection();
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.selection.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.selection.select_previous(),
      KeyCode::Char('n') | KeyCode::Right => {
        let count = self.controller.page().page_count;
        self.controller.table_mut().next_page(count);
        self.reset_selection();
      }
      KeyCode::Char('p') | KeyCode::Left => {
        self.controller.table_mut().prev_page();
        self.reset_selection();
      }
      KeyCode::Char('s') => self.cycle_sort(),
      KeyCode::Char('S') => self.flip_sort(),
      KeyCode::Char('f') => {
        self
          .filter_bar
          .cycle_field(&self.controller.fetch_state().data, self.controller.table());
      }
      KeyCode::Char('F') => {
        self.controller.table_mut().filters.clear();
        self.filter_bar.hide();
        self.reset_selection();
      }
      KeyCode::Char('r') => self.controller.on_refresh(),
      KeyCode::Enter => return self.run_action(ActionKind::View),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Char(c) => {
        if let Some(spec) = P::action_for_key(c) {
          return self.run_action(spec.kind);
        }
      }
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let filter_height = if self.filter_bar.is_visible() { 1 } else { 0 };
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(filter_height),
        Constraint::Min(1),
        Constraint::Length(1),
      ])
      .split(area);

    self.filter_bar.render(frame, chunks[0], self.controller.table());
    self.render_table(frame, chunks[1]);
    frame.render_widget(Paragraph::new(self.status_line()), chunks[2]);

    self.search.render_overlay(frame, chunks[1]);
    self.render_modal(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    P::TITLE.to_string()
  }

  fn tick(&mut self) {
    if self.controller.poll() {
      self.sync_filter_bar();
    }
  }

  fn is_capturing_input(&self) -> bool {
    self.search.is_active() || self.filter_bar.is_editing() || self.controller.workflow().modal().is_some()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    let mut shortcuts: Vec<Shortcut> = P::ACTIONS
      .iter()
      .map(|action| Shortcut::new(action.key.to_string(), action.label).colored(action.color))
      .collect();
    shortcuts.extend([
      Shortcut::new("/", "recherche"),
      Shortcut::new("f", "filtre"),
      Shortcut::new("s", "tri"),
      Shortcut::new("n/p", "page"),
      Shortcut::new("r", "actualiser"),
      Shortcut::new(":", "commande"),
    ]);
    shortcuts
  }
}
