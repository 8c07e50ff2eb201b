use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
  pub key: String,
  pub label: &'static str,
  pub color: Color,
}

impl Shortcut {
  pub fn new(key: impl Into<String>, label: &'static str) -> Self {
    Self {
      key: key.into(),
      label,
      color: Color::Cyan,
    }
  }

  pub fn colored(mut self, color: Color) -> Self {
    self.color = color;
    self
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back, or quit from the root)
  Pop,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, filters, modal) and return
/// actions for the App to execute: App → View → Components.
///
/// Views that load data asynchronously own a fetch hook and poll it in
/// [`tick`](View::tick).
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Label for this view in the footer breadcrumb
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to apply finished fetches and mutations
  fn tick(&mut self) {}

  /// True while the view captures every key (text input, modal)
  fn is_capturing_input(&self) -> bool {
    false
  }

  /// Keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new(":", "commande"), Shortcut::new("q", "retour")]
  }
}
