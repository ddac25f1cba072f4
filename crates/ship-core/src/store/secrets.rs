//! Operations on the Ship: the mapping from secret id to secret document.

use std::collections::BTreeMap;

use crate::document::Document;
use crate::error::{Result, ShipError};
use crate::resolver::{IdResolver, Match};

fn entries(ship: &Document) -> Result<&BTreeMap<String, Document>> {
    ship.as_mapping()
        .ok_or_else(|| ShipError::Corrupt("Ship is not a mapping".to_string()))
}

fn entries_mut(ship: &mut Document) -> Result<&mut BTreeMap<String, Document>> {
    ship.as_mapping_mut()
        .ok_or_else(|| ShipError::Corrupt("Ship is not a mapping".to_string()))
}

fn resolve(ship: &Document, query: &str, threshold: f64) -> Result<Match> {
    let ids = entries(ship)?.keys().cloned();
    IdResolver::new(ids, threshold)
        .resolve(query)
        .ok_or_else(|| ShipError::IdNotFound(query.to_string()))
}

/// Store `value` under the exact id `id`, returning any value it replaces.
pub fn insert(ship: &mut Document, id: &str, value: Document) -> Result<Option<Document>> {
    if id.trim().is_empty() {
        return Err(ShipError::InvalidInput("Secret id cannot be empty".to_string()));
    }
    Ok(entries_mut(ship)?.insert(id.to_string(), value))
}

/// Look up the secret whose id best matches `query`.
pub fn get<'a>(ship: &'a Document, query: &str, threshold: f64) -> Result<(Match, &'a Document)> {
    let found = resolve(ship, query, threshold)?;
    let value = entries(ship)?
        .get(&found.id)
        .ok_or_else(|| ShipError::IdNotFound(query.to_string()))?;
    Ok((found, value))
}

/// Remove the secret whose id best matches `query`.
pub fn remove(ship: &mut Document, query: &str, threshold: f64) -> Result<(Match, Document)> {
    let found = resolve(ship, query, threshold)?;
    let value = entries_mut(ship)?
        .remove(&found.id)
        .ok_or_else(|| ShipError::IdNotFound(query.to_string()))?;
    Ok((found, value))
}

/// All ids, sorted.
pub fn ids(ship: &Document) -> Result<Vec<String>> {
    Ok(entries(ship)?.keys().cloned().collect())
}
