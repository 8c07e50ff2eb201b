use ratatui::prelude::Color;
use std::time::Duration;

/// Display color for a status cell (surveys, profiles)
pub fn status_color(status: &str) -> Color {
  match status.to_uppercase().as_str() {
    "VALIDEE" | "VALIDÉE" | "ACTIF" => Color::Green,
    "EN_ATTENTE" => Color::Yellow,
    "REFUSEE" | "REFUSÉE" | "INACTIF" | "DESACTIVE" => Color::Red,
    _ => Color::White,
  }
}

/// Short human duration: `850ms`, `1.2s`
pub fn format_duration(duration: Duration) -> String {
  let millis = duration.as_millis();
  if millis < 1000 {
    format!("{}ms", millis)
  } else {
    format!("{:.1}s", duration.as_secs_f64())
  }
}
