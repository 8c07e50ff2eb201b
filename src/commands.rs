//! `:` commands and their autocomplete.

/// Root screens reachable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Personnel,
  Profiles,
  Surveys,
  Quizzes,
  Affectations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
  Open(Screen),
  Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub action: CommandAction,
}

pub const COMMANDS: &[Command] = &[
  Command {
    name: "personnel",
    aliases: &["p", "staff", "personnels"],
    description: "Personnel et certificats de travail",
    action: CommandAction::Open(Screen::Personnel),
  },
  Command {
    name: "profils",
    aliases: &["pr", "profiles", "utilisateurs"],
    description: "Profils utilisateurs",
    action: CommandAction::Open(Screen::Profiles),
  },
  Command {
    name: "enquetes",
    aliases: &["e", "surveys", "enquêtes"],
    description: "Enquêtes de rentrée",
    action: CommandAction::Open(Screen::Surveys),
  },
  Command {
    name: "quiz",
    aliases: &["qz", "quizzes"],
    description: "Quiz par matière et classe",
    action: CommandAction::Open(Screen::Quizzes),
  },
  Command {
    name: "affectations",
    aliases: &["a", "aff"],
    description: "Affectations enseignants / classes",
    action: CommandAction::Open(Screen::Affectations),
  },
  Command {
    name: "quit",
    aliases: &["q", "exit", "quitter"],
    description: "Quitter scolaire",
    action: CommandAction::Quit,
  },
];

/// Rank of `cmd` for `input`, lower is better
fn rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

/// Autocomplete suggestions for `input`, best first.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();
  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&'static Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd, &input).map(|r| (cmd, r)))
    .collect();
  // Stable: ties keep declaration order
  matches.sort_by_key(|(_, r)| *r);
  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Command whose name or alias is exactly `input`
pub fn find(input: &str) -> Option<&'static Command> {
  let input = input.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| matches!(rank(cmd, &input), Some(0) | Some(1)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    assert_eq!(get_suggestions("").len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_and_alias_match() {
    assert_eq!(get_suggestions("quiz")[0].name, "quiz");
    assert_eq!(get_suggestions("e")[0].name, "enquetes");
    assert_eq!(get_suggestions("q")[0].name, "quit");
  }

  #[test]
  fn test_prefix_beats_contains() {
    let names: Vec<_> = get_suggestions("pro").iter().map(|c| c.name).collect();
    assert_eq!(names[0], "profils");
  }

  #[test]
  fn test_fuzzy_match() {
    assert_eq!(get_suggestions("ectat")[0].name, "affectations");
  }

  #[test]
  fn test_find() {
    assert_eq!(
      find("Staff").map(|c| c.action),
      Some(CommandAction::Open(Screen::Personnel))
    );
    assert_eq!(find("exit").map(|c| c.action), Some(CommandAction::Quit));
    assert!(find("perso").is_none());
  }
}
