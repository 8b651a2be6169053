use serde_json::Value;

/// Longest cell text shown before truncating.
pub const MAX_CHAR_LENGTH: usize = 30;

/// Truncate to `MAX_CHAR_LENGTH` characters, appending "..." when cut.
pub fn truncate(s: &str) -> String {
  if s.chars().count() > MAX_CHAR_LENGTH {
    let head: String = s.chars().take(MAX_CHAR_LENGTH).collect();
    format!("{}...", head)
  } else {
    s.to_string()
  }
}

/// Whether `truncate` would cut this text.
pub fn is_truncated(s: &str) -> bool {
  s.chars().count() > MAX_CHAR_LENGTH
}

/// Upper-case the first character ("birth_year" -> "Birth_year").
pub fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Full text of a JSON value as shown to the user.
pub fn value_text(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::String(s) => s.clone(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => n.to_string(),
    other => other.to_string(),
  }
}

/// Text for a table cell: arrays collapse to "...", everything else is
/// truncated.
pub fn cell_text(value: Option<&Value>) -> String {
  match value {
    Some(Value::Array(_)) => "...".to_string(),
    Some(v) => truncate(&value_text(v)),
    None => String::new(),
  }
}
