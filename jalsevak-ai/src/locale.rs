//! Locale file flattening
//!
//! UI string files are nested JSON objects. Translation works on a flat
//! key → text map, so nested keys are joined with a separator and the
//! document is rebuilt afterwards with the same structure.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

/// Default key separator ("common.buttons.save")
pub const DEFAULT_SEPARATOR: &str = ".";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocaleError {
    /// Two different leaves join to the same flat key, e.g. `{"a.b": ..}`
    /// next to `{"a": {"b": ..}}`
    #[error("locale key '{0}' is produced by more than one entry; its key contains the separator")]
    KeyCollision(String),
}

/// Collect every string leaf under a dotted key, in document order
///
/// Arrays, numbers, booleans and nulls are skipped; they are copied through
/// unchanged by `unflatten_into`.
///
/// # Errors
/// `KeyCollision` when two leaves flatten to the same key. Translating such
/// a document would write one leaf's text into the other.
pub fn flatten_locale(
    json: &Value,
    separator: &str,
) -> Result<IndexMap<String, String>, LocaleError> {
    let mut result = IndexMap::new();
    flatten_value(json, separator, None, &mut result)?;
    Ok(result)
}

fn flatten_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut IndexMap<String, String>,
) -> Result<(), LocaleError> {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key = prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_value(value, separator, Some(&full_key), result)?;
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                match result.entry(key.to_string()) {
                    Entry::Occupied(entry) => {
                        return Err(LocaleError::KeyCollision(entry.key().clone()))
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(s.clone());
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Rebuild `original` with string leaves replaced from `translations`
///
/// Keys absent from `translations` keep their original text.
pub fn unflatten_into(
    original: &Value,
    translations: &IndexMap<String, String>,
    separator: &str,
) -> Value {
    rebuild(original, translations, separator, None)
}

fn rebuild(
    json: &Value,
    translations: &IndexMap<String, String>,
    separator: &str,
    prefix: Option<&str>,
) -> Value {
    match json {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                let full_key = prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                out.insert(
                    key.clone(),
                    rebuild(value, translations, separator, Some(&full_key)),
                );
            }
            Value::Object(out)
        }
        Value::String(s) => {
            let text = prefix
                .and_then(|key| translations.get(key))
                .unwrap_or(s);
            Value::String(text.clone())
        }
        other => other.clone(),
    }
}
