//! Start routes: `/`, `/:resourceType`, `/:resourceType/:resourceId`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  /// Browse the default category
  Default,
  /// Browse one category
  Category(String),
  /// Show a single entity
  Detail { category: String, id: String },
}

impl Route {
  /// Parse a path. Empty segments are ignored, so `people/`, `/people` and
  /// `people` are the same route. Extra segments are an error.
  pub fn parse(path: &str) -> Result<Self, String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
      [] => Ok(Route::Default),
      [category] => Ok(Route::Category(category.to_string())),
      [category, id] => Ok(Route::Detail {
        category: category.to_string(),
        id: id.to_string(),
      }),
      _ => Err(format!("Unknown route: {}", path)),
    }
  }

  /// The category this route browses, falling back to `default`.
  pub fn category<'a>(&'a self, default: &'a str) -> &'a str {
    match self {
      Route::Default => default,
      Route::Category(category) => category,
      Route::Detail { category, .. } => category,
    }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Route::Default => write!(f, "/"),
      Route::Category(category) => write!(f, "/{}", category),
      Route::Detail { category, id } => write!(f, "/{}/{}", category, id),
    }
  }
}
