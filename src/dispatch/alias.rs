use std::collections::HashMap;

use regex::Regex;

use super::BuildError;

/// Patterns available to every route under a short name, e.g. `Rule::alias("integer")`.
const BUILTIN: &[(&str, &str)] = &[
    ("integer", r"\d+"),
    ("alpha", r"[a-zA-Z]+"),
    ("alnum", r"[a-zA-Z0-9]+"),
    ("word", r"\w+"),
    ("boolean", r"1|0|true|false"),
    ("hex", r"[a-fA-F0-9]+"),
    ("md5", r"[a-fA-F0-9]{32}"),
    ("sha1", r"[a-fA-F0-9]{40}"),
];

/// Compiles a segment pattern so that it has to match the whole segment.
pub fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

#[derive(Debug, Clone)]
pub struct AliasTable {
    aliases: HashMap<String, Regex>,
}

impl AliasTable {
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, pattern: &str) -> Result<(), regex::Error> {
        self.aliases.insert(name.into(), anchored(pattern)?);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Regex> {
        self.aliases.get(name)
    }

    /// Table holding every built-in alias.
    pub fn builtin() -> Result<Self, BuildError> {
        let mut table = Self::empty();
        for (name, pattern) in BUILTIN {
            table
                .insert(*name, pattern)
                .map_err(|source| BuildError::InvalidAlias {
                    alias: name.to_string(),
                    source,
                })?;
        }
        Ok(table)
    }
}
