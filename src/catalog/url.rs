//! Classifiers for catalog entity URLs of the form `.../{category}/{id}/`.

/// Extract the category segment from an entity URL.
///
/// Matches a trailing `/{category}/{digits}/`; anything else yields `None`.
pub fn extract_resource_type_from_url(url: &str) -> Option<&str> {
  let (before, _) = split_trailing_id(url)?;
  let (_, category) = before.rsplit_once('/')?;
  if category.is_empty() {
    None
  } else {
    Some(category)
  }
}

/// Extract the numeric id from a URL ending in `/{digits}/`.
pub fn extract_id_from_url(url: &str) -> Option<&str> {
  split_trailing_id(url).map(|(_, id)| id)
}

/// Split `.../{digits}/` into the part before the id and the id itself.
fn split_trailing_id(url: &str) -> Option<(&str, &str)> {
  let rest = url.strip_suffix('/')?;
  let (before, id) = rest.rsplit_once('/')?;
  if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
    Some((before, id))
  } else {
    None
  }
}
