//! Predicate parsing cache

use crate::error::Result;
use crate::predicate::ast::PredicateNode;
use crate::predicate::parser;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, trace};

/// Most expressions held at once; a full cache is emptied before inserting
pub const MAX_CACHE_ENTRIES: usize = 1024;

/// Global predicate cache with fast hashing (ahash)
static PREDICATE_CACHE: Lazy<RwLock<AHashMap<String, PredicateNode>>> =
    Lazy::new(|| RwLock::new(AHashMap::with_capacity(256)));

/// Get or parse a predicate string, using cache for repeated expressions.
///
/// Empty expressions are not cached and yield `Ok(None)`.
#[inline]
pub fn get_or_parse(expression: &str) -> Result<Option<PredicateNode>> {
    {
        let cache = PREDICATE_CACHE.read();
        if let Some(ast) = cache.get(expression) {
            return Ok(Some(ast.clone()));
        }
    }

    trace!(expression, "predicate cache miss");
    let parsed = parser::parse(expression)?;

    if let Some(ast) = &parsed {
        let mut cache = PREDICATE_CACHE.write();
        if cache.len() >= MAX_CACHE_ENTRIES && !cache.contains_key(expression) {
            debug!(entries = cache.len(), "predicate cache full, clearing");
            cache.clear();
        }
        cache.insert(expression.to_string(), ast.clone());
    }

    Ok(parsed)
}

/// Clear the predicate cache
pub fn clear_cache() {
    PREDICATE_CACHE.write().clear();
}

/// Number of cached expressions
pub fn cache_size() -> usize {
    PREDICATE_CACHE.read().len()
}
