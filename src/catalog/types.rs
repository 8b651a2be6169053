//! Domain types for catalog responses and resolved references.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::url::extract_id_from_url;

/// A single catalog entity: field name to raw JSON value, in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(pub Map<String, Value>);

impl Entity {
  pub fn get(&self, field: &str) -> Option<&Value> {
    self.0.get(field)
  }

  pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.0.iter()
  }

  /// The entity's own URL, if it carries one.
  pub fn url(&self) -> Option<&str> {
    self.0.get("url").and_then(Value::as_str)
  }

  /// Numeric id taken from the entity's own URL.
  pub fn id(&self) -> Option<&str> {
    self.url().and_then(extract_id_from_url)
  }

  /// Human label: `name`, falling back to `title`.
  pub fn label(&self) -> Option<&str> {
    self
      .0
      .get("name")
      .or_else(|| self.0.get("title"))
      .and_then(Value::as_str)
  }

  pub fn into_inner(self) -> Map<String, Value> {
    self.0
  }

  /// Entity for any JSON body: objects as they are, anything else under a
  /// single `value` field.
  pub fn from_value(value: Value) -> Self {
    match value {
      Value::Object(map) => Self(map),
      other => {
        let mut map = Map::new();
        map.insert("value".to_string(), other);
        Self(map)
      }
    }
  }
}

impl From<Map<String, Value>> for Entity {
  fn from(map: Map<String, Value>) -> Self {
    Self(map)
  }
}

/// One page of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
  /// Total number of items in the whole collection
  pub count: u64,
  #[serde(default)]
  pub next: Option<String>,
  #[serde(default)]
  pub previous: Option<String>,
  #[serde(default)]
  pub results: Vec<Entity>,
}

/// Category name to collection URL, in the order the root resource lists them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryMap {
  entries: Vec<(String, String)>,
}

impl CategoryMap {
  /// Build from the root resource's JSON object. Non-string values are skipped.
  pub fn from_json(map: &Map<String, Value>) -> Self {
    let entries = map
      .iter()
      .filter_map(|(name, url)| url.as_str().map(|u| (name.clone(), u.to_string())))
      .collect();
    Self { entries }
  }

  pub fn names(&self) -> Vec<String> {
    self.entries.iter().map(|(name, _)| name.clone()).collect()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .entries
      .iter()
      .map(|(name, url)| (name.as_str(), url.as_str()))
  }
}

/// How a raw field value is treated by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
  /// Left untouched
  Scalar(Value),
  /// A single URL pointing at another entity
  SingleReference(String),
  /// A non-empty list of URLs pointing at other entities
  ReferenceList(Vec<String>),
}

impl FieldValue {
  /// Classify a field by name and value.
  ///
  /// A field named exactly `url` is always a scalar, so an entity never
  /// resolves itself. A non-empty array only counts as a reference list when
  /// every element is a string; anything else stays a scalar.
  pub fn classify(name: &str, value: &Value) -> Self {
    match value {
      Value::Array(items) if !items.is_empty() => {
        let urls: Option<Vec<String>> = items
          .iter()
          .map(|item| item.as_str().map(String::from))
          .collect();
        match urls {
          Some(urls) => FieldValue::ReferenceList(urls),
          None => FieldValue::Scalar(value.clone()),
        }
      }
      Value::String(s) if s.starts_with("http") && name != "url" => {
        FieldValue::SingleReference(s.clone())
      }
      _ => FieldValue::Scalar(value.clone()),
    }
  }
}

/// A reference field after substitution: the category tag and the fetched
/// entities in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference {
  /// Category inferred from the first URL; `None` if it didn't match
  pub tag: Option<String>,
  pub entities: Vec<Entity>,
}

impl ResolvedReference {
  /// Tagged-array form: `[tag, ...entities]`, with `null` for a missing tag.
  pub fn to_json(&self) -> Value {
    let mut items = Vec::with_capacity(self.entities.len() + 1);
    items.push(
      self
        .tag
        .as_ref()
        .map(|t| Value::String(t.clone()))
        .unwrap_or(Value::Null),
    );
    items.extend(self.entities.iter().map(|e| Value::Object(e.0.clone())));
    Value::Array(items)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedField {
  Value(Value),
  Reference(ResolvedReference),
}

impl ResolvedField {
  pub fn to_json(&self) -> Value {
    match self {
      ResolvedField::Value(v) => v.clone(),
      ResolvedField::Reference(r) => r.to_json(),
    }
  }

  pub fn as_reference(&self) -> Option<&ResolvedReference> {
    match self {
      ResolvedField::Reference(r) => Some(r),
      ResolvedField::Value(_) => None,
    }
  }
}

/// An entity whose reference fields have been resolved one level deep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedEntity {
  pub fields: Vec<(String, ResolvedField)>,
}

impl ResolvedEntity {
  pub fn get(&self, name: &str) -> Option<&ResolvedField> {
    self
      .fields
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, field)| field)
  }

  /// Entities of every resolved reference, flattened in field order, with
  /// the tag of the field each came from.
  pub fn referenced_entities(&self) -> Vec<(Option<&str>, &Entity)> {
    self
      .fields
      .iter()
      .filter_map(|(_, field)| field.as_reference())
      .flat_map(|r| r.entities.iter().map(move |e| (r.tag.as_deref(), e)))
      .collect()
  }

  pub fn to_json(&self) -> Value {
    let map: Map<String, Value> = self
      .fields
      .iter()
      .map(|(name, field)| (name.clone(), field.to_json()))
      .collect();
    Value::Object(map)
  }
}
