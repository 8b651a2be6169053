/// Available commands and autocomplete logic

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
  pub name: String,
  pub aliases: &'static [&'static str],
  pub description: String,
}

/// Built-in commands; catalog categories are added at runtime
const BUILTINS: &[(&str, &[&str], &str)] = &[
  ("categories", &["c", "cat"], "List catalog categories"),
  ("quit", &["q", "exit"], "Exit sw9s"),
];

/// What a resolved command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
  ShowCategories,
  OpenCategory(String),
  Quit,
  Unknown(String),
}

/// All commands: built-ins followed by one entry per category.
pub fn all_commands(categories: &[String]) -> Vec<Command> {
  let builtins = BUILTINS.iter().map(|&(name, aliases, description)| Command {
    name: name.to_string(),
    aliases,
    description: description.to_string(),
  });

  let categories = categories.iter().map(|category| Command {
    name: category.clone(),
    aliases: &[],
    description: format!("Browse {}", category),
  });

  builtins.chain(categories).collect()
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str, categories: &[String]) -> Vec<Command> {
  let input_lower = input.trim().to_lowercase();
  let commands = all_commands(categories);

  if input_lower.is_empty() {
    return commands;
  }

  let mut matches: Vec<(Command, u32)> = Vec::new();

  for cmd in commands {
    let priority = if cmd.name == input_lower {
      0
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      1
    } else if cmd.name.starts_with(&input_lower) {
      2
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      3
    } else if cmd.name.contains(&input_lower) {
      4
    } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      5
    } else {
      continue;
    };
    matches.push((cmd, priority));
  }

  // Stable sort keeps built-ins ahead of categories within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Turn a submitted command name into an action.
pub fn resolve(name: &str, categories: &[String]) -> CommandAction {
  let name = name.trim().to_lowercase();
  match name.as_str() {
    "categories" => CommandAction::ShowCategories,
    "quit" => CommandAction::Quit,
    other if categories.iter().any(|c| c == other) => CommandAction::OpenCategory(other.to_string()),
    other => CommandAction::Unknown(other.to_string()),
  }
}
