//! System font discovery and caching.
//!
//! The font database is loaded from the system once and queried by family
//! name, with a generic sans-serif fallback when the requested family is
//! not installed. Loaded faces are cached per family so repeated requests
//! do not re-parse font files.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use ab_glyph::FontVec;
use fontdb::{Database, Family, Query};
use tracing::debug;

use crate::error::ServiceError;

static DATABASE: OnceLock<Database> = OnceLock::new();
static CACHE: OnceLock<Mutex<HashMap<String, Arc<FontVec>>>> = OnceLock::new();

fn database() -> &'static Database {
    DATABASE.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "loaded system font database");
        db
    })
}

/// Resolve a font face for `family`, falling back to the system
/// sans-serif face when the family is not installed.
pub fn resolve(family: &str) -> Result<Arc<FontVec>, ServiceError> {
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    if let Ok(cached) = cache.lock() {
        if let Some(font) = cached.get(family) {
            return Ok(Arc::clone(font));
        }
    }

    let db = database();
    let id = db
        .query(&Query {
            families: &[Family::Name(family), Family::SansSerif],
            ..Query::default()
        })
        .ok_or_else(|| ServiceError::FontUnavailable(family.to_string()))?;

    let font = db
        .with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index)
        })
        .ok_or_else(|| ServiceError::FontUnavailable(family.to_string()))?
        .map_err(|_| ServiceError::FontUnavailable(family.to_string()))?;

    let font = Arc::new(font);
    if let Ok(mut cached) = cache.lock() {
        cached.insert(family.to_string(), Arc::clone(&font));
    }
    Ok(font)
}

/// Whether any usable font can be resolved on this system. Rendering
/// tests skip themselves on hosts without installed fonts.
pub fn available() -> bool {
    resolve("sans-serif").is_ok()
}
