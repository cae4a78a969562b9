//! Field and record name sanitising

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static INVALID_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("Invalid name regex"));

/// Turn an arbitrary key into a valid schema name
pub fn sanitize_name(key: &str) -> String {
    let mut name = INVALID_NAME_CHARS.replace_all(key, "_").into_owned();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Field names handed out for one record path over a whole inference pass
///
/// A source key always maps to the same field name, and two different keys
/// never share one, even when they are first seen in different rows.
#[derive(Debug, Default)]
pub(crate) struct NameTable {
    assigned: HashMap<String, String>,
    taken: HashSet<String>,
}

impl NameTable {
    /// Field name for `key`; a new key gets its sanitised form, suffixed with
    /// `_2`, `_3`, ... if that is already taken
    pub(crate) fn assign(&mut self, key: &str) -> String {
        if let Some(name) = self.assigned.get(key) {
            return name.clone();
        }
        let base = sanitize_name(key);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        self.taken.insert(candidate.clone());
        self.assigned.insert(key.to_string(), candidate.clone());
        candidate
    }
}
