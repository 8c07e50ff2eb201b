use crate::commands::{Command, CommandAction, Screen};
use crate::event::{Event, EventHandler};
use crate::pages::{AffectationsPage, PersonnelPage, ProfilesPage, QuizzesPage, SurveysPage};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::EntityTableView;
use crate::workflow::PageContext;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Header texts, fixed for the session
#[derive(Debug, Clone)]
pub struct Banner {
  /// Backend name or configured title
  pub title: String,
  /// School and year being browsed
  pub context: String,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  views: Vec<Box<dyn View>>,
  command: CommandInput,
  ctx: PageContext,
  page_size: usize,
  banner: Banner,
  /// Feedback for the last command (unknown name, etc.)
  message: Option<String>,
  should_quit: bool,
}

impl App {
  pub fn new(ctx: PageContext, page_size: usize, banner: Banner, initial: Screen) -> Self {
    let mut app = Self {
      views: Vec::new(),
      command: CommandInput::new(),
      ctx,
      page_size,
      banner,
      message: None,
      should_quit: false,
    };
    app.open(initial);
    app
  }

  /// Replace the whole stack with a fresh root screen.
  ///
  /// Dropping the old views discards their in-flight fetches.
  fn open(&mut self, screen: Screen) {
    info!(?screen, "opening screen");
    let ctx = self.ctx.clone();
    let size = self.page_size;
    let view: Box<dyn View> = match screen {
      Screen::Personnel => Box::new(EntityTableView::<PersonnelPage>::new(ctx, size)),
      Screen::Profiles => Box::new(EntityTableView::<ProfilesPage>::new(ctx, size)),
      Screen::Surveys => Box::new(EntityTableView::<SurveysPage>::new(ctx, size)),
      Screen::Quizzes => Box::new(EntityTableView::<QuizzesPage>::new(ctx, size)),
      Screen::Affectations => Box::new(EntityTableView::<AffectationsPage>::new(ctx, size)),
    };
    self.views = vec![view];
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()));

    let result = match terminal {
      Ok(mut terminal) => self.event_loop(&mut terminal).await,
      Err(e) => Err(e.into()),
    };

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        if let Some(view) = self.views.last_mut() {
          view.tick();
        }
      }
      Event::Resize => {}
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // A view typing text or showing a modal keeps `:` for itself
    let capturing = self.views.last().is_some_and(|v| v.is_capturing_input());
    if !capturing {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(command)) => {
          self.execute(command);
          return;
        }
        KeyResult::Event(CommandEvent::Unknown(text)) => {
          debug!(%text, "unknown command");
          self.message = Some(format!("Commande inconnue: {}", text));
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    self.message = None;
    let Some(view) = self.views.last_mut() else {
      self.should_quit = true;
      return;
    };
    match view.handle_key(key) {
      ViewAction::None => {}
      ViewAction::Push(next) => self.views.push(next),
      ViewAction::Pop => {
        if self.views.len() > 1 {
          self.views.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn execute(&mut self, command: &Command) {
    self.message = None;
    match command.action {
      CommandAction::Open(screen) => self.open(screen),
      CommandAction::Quit => self.should_quit = true,
    }
  }

  pub fn title(&self) -> &str {
    &self.banner.title
  }

  pub fn context_label(&self) -> &str {
    &self.banner.context
  }

  pub fn message(&self) -> Option<&str> {
    self.message.as_deref()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn current_view(&self) -> Option<&dyn View> {
    self.views.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.views.last_mut()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self.views.iter().map(|v| v.breadcrumb_label()).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::TtlCache;
  use crate::query::DataSource;
  use crate::test_support::{scratch_dir, MockBackend};
  use std::sync::Arc;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  async fn build(initial: Screen) -> App {
    let ctx = PageContext {
      source: DataSource::new(
        MockBackend::unreachable_client().await,
        Arc::new(TtlCache::new(Duration::from_secs(60))),
      ),
      school_id: 38,
      year_id: 226,
      download_dir: scratch_dir(),
    };
    let banner = Banner {
      title: "localhost".to_string(),
      context: "École 38 · Année 226".to_string(),
    };
    App::new(ctx, 20, banner, initial)
  }

  fn type_command(app: &mut App, text: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in text.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  #[tokio::test]
  async fn test_command_replaces_root_view() {
    let mut app = build(Screen::Personnel).await;
    assert_eq!(app.breadcrumb(), vec!["Personnel"]);

    type_command(&mut app, "quiz");
    assert_eq!(app.breadcrumb(), vec!["Quiz"]);
    assert!(!app.command_input().is_active());

    type_command(&mut app, "nope");
    assert_eq!(app.message(), Some("Commande inconnue: nope"));
    assert_eq!(app.breadcrumb(), vec!["Quiz"]);
  }

  #[tokio::test]
  async fn test_quit_paths() {
    let mut app = build(Screen::Surveys).await;
    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);

    let mut app = build(Screen::Surveys).await;
    type_command(&mut app, "quit");
    assert!(app.should_quit);

    let mut app = build(Screen::Surveys).await;
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_colon_is_typed_into_search_not_command() {
    let mut app = build(Screen::Profiles).await;
    app.handle_key(key(KeyCode::Char('/')));
    app.handle_key(key(KeyCode::Char(':')));

    assert!(!app.command_input().is_active());
    assert!(app.current_view().is_some_and(|v| v.is_capturing_input()));
  }
}
