use super::KeyResult;
use crate::form::{FieldInput, Form};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by the confirmation modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalEvent {
  Confirm,
  Cancel,
  FocusNext,
  FocusPrev,
  /// Move the focused choice
  Cycle(isize),
  Char(char),
  Backspace,
}

/// What the modal shows; borrowed from the page controller each frame.
pub struct ModalContent<'a> {
  pub title: &'a str,
  pub prompt: &'a str,
  pub form: Option<&'a Form>,
  pub error: Option<&'a str>,
  pub submitting: bool,
}

/// Map a key to a modal event.
///
/// With a form, letters go to the focused field, so only Enter/Esc confirm
/// and cancel. Every key is swallowed while the modal is open.
pub fn handle_key(key: KeyEvent, has_form: bool, submitting: bool) -> KeyResult<ModalEvent> {
  if submitting {
    return KeyResult::Handled;
  }
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    return KeyResult::NotHandled;
  }

  let event = match (key.code, has_form) {
    (KeyCode::Enter, _) => ModalEvent::Confirm,
    (KeyCode::Esc, _) => ModalEvent::Cancel,
    (KeyCode::Char('y') | KeyCode::Char('o'), false) => ModalEvent::Confirm,
    (KeyCode::Char('n'), false) => ModalEvent::Cancel,
    (KeyCode::Tab | KeyCode::Down, true) => ModalEvent::FocusNext,
    (KeyCode::BackTab | KeyCode::Up, true) => ModalEvent::FocusPrev,
    (KeyCode::Right, true) => ModalEvent::Cycle(1),
    (KeyCode::Left, true) => ModalEvent::Cycle(-1),
    (KeyCode::Backspace, true) => ModalEvent::Backspace,
    (KeyCode::Char(c), true) => ModalEvent::Char(c),
    _ => return KeyResult::Handled,
  };
  KeyResult::Event(event)
}

fn field_lines(form: &Form, submitting: bool) -> Vec<Line<'static>> {
  form
    .fields
    .iter()
    .enumerate()
    .map(|(i, field)| {
      let focused = i == form.focus && !submitting;
      let marker = if focused { "> " } else { "  " };
      let value = match &field.input {
        FieldInput::Text(_) if focused => format!("{}_", field.display()),
        FieldInput::Text(_) => field.display(),
        FieldInput::Choice { .. } => format!("< {} >", field.display()),
      };
      let value_style = if focused {
        Style::default().fg(Color::White).bg(Color::DarkGray)
      } else {
        Style::default().fg(Color::White)
      };
      Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(format!("{:<12}", field.label), Style::default().fg(Color::DarkGray)),
        Span::styled(value, value_style),
      ])
    })
    .collect()
}

/// Warning for choice fields with no options. Options come from the rows
/// already loaded, so an empty list means nothing to pick from yet.
fn empty_choice_hint(form: &Form) -> Option<String> {
  let empty = form.empty_choices();
  if empty.is_empty() {
    return None;
  }
  Some(format!(
    "Aucun choix pour {}: rafraîchissez la liste (r) ou créez d'abord l'élément manquant",
    empty.join(", ")
  ))
}

/// Render the modal centered in `area`
pub fn render_overlay(frame: &mut Frame, area: Rect, content: &ModalContent) {
  let mut lines = vec![Line::from(content.prompt.to_string()), Line::default()];

  if let Some(form) = content.form {
    lines.extend(field_lines(form, content.submitting));
    lines.push(Line::default());
    if let Some(hint) = empty_choice_hint(form) {
      lines.push(Line::styled(hint, Style::default().fg(Color::Yellow)));
      lines.push(Line::default());
    }
  }

  if let Some(error) = content.error {
    lines.push(Line::styled(format!("Erreur: {}", error), Style::default().fg(Color::Red)));
    lines.push(Line::default());
  }

  let hint = if content.submitting {
    Line::styled("Envoi en cours...", Style::default().fg(Color::Yellow))
  } else if content.form.is_some() {
    Line::styled(
      "<Entrée> valider  <Tab> champ suivant  <←/→> choix  <Esc> annuler",
      Style::default().fg(Color::DarkGray),
    )
  } else {
    Line::styled("<y/Entrée> confirmer  <n/Esc> annuler", Style::default().fg(Color::DarkGray))
  };
  lines.push(hint);

  let width = (area.width * 70 / 100).clamp(40, 80).min(area.width);
  // Prompt and error may wrap; leave room for a second line each
  let height = (lines.len() as u16 + 4).min(area.height);

  let x = area.x + (area.width.saturating_sub(width)) / 2;
  let y = area.y + (area.height.saturating_sub(height)) / 2;
  let overlay_area = Rect::new(x, y, width, height);

  frame.render_widget(Clear, overlay_area);

  let border = if content.error.is_some() { Color::Red } else { Color::Yellow };
  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border))
    .title(format!(" {} ", content.title));

  let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
  frame.render_widget(paragraph, overlay_area);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_plain_confirmation_keys() {
    assert_eq!(
      handle_key(key(KeyCode::Char('y')), false, false),
      KeyResult::Event(ModalEvent::Confirm)
    );
    assert_eq!(
      handle_key(key(KeyCode::Char('n')), false, false),
      KeyResult::Event(ModalEvent::Cancel)
    );
    assert_eq!(handle_key(key(KeyCode::Char('j')), false, false), KeyResult::Handled);
  }

  #[test]
  fn test_form_keys_go_to_fields() {
    assert_eq!(
      handle_key(key(KeyCode::Char('n')), true, false),
      KeyResult::Event(ModalEvent::Char('n'))
    );
    assert_eq!(
      handle_key(key(KeyCode::Left), true, false),
      KeyResult::Event(ModalEvent::Cycle(-1))
    );
    assert_eq!(
      handle_key(key(KeyCode::Enter), true, false),
      KeyResult::Event(ModalEvent::Confirm)
    );
  }

  #[test]
  fn test_empty_choice_list_gets_a_hint() {
    use crate::form::FormField;

    let filled = Form::new(vec![FormField::choice(
      "classe",
      "Classe",
      vec![(3, "CM1".to_string())],
      None,
    )]);
    assert_eq!(empty_choice_hint(&filled), None);

    let empty = Form::new(vec![
      FormField::text("titre", "Titre", ""),
      FormField::choice("classe", "Classe", Vec::new(), None),
      FormField::choice("matiere", "Matière", Vec::new(), None),
    ]);
    let hint = empty_choice_hint(&empty).unwrap();
    assert!(hint.starts_with("Aucun choix pour Classe, Matière:"));
  }

  #[test]
  fn test_keys_swallowed_while_submitting() {
    assert_eq!(handle_key(key(KeyCode::Esc), true, true), KeyResult::Handled);
    assert_eq!(handle_key(key(KeyCode::Enter), false, true), KeyResult::Handled);
  }
}
