use std::{fmt, sync::Arc};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{MappingError, Result},
    sheet::HeaderTable,
    transform::string_ops,
};

/// How a wanted column name is compared with header names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    Exact,
    CaseInsensitive,
    /// Both sides are converted to `snake_case`, so `First Name`,
    /// `FirstName` and `first_name` all match.
    #[default]
    Normalized,
}

impl NameMatching {
    pub fn matches(self, header: &str, wanted: &str) -> bool {
        match self {
            NameMatching::Exact => header == wanted,
            NameMatching::CaseInsensitive => header.trim().eq_ignore_ascii_case(wanted.trim()),
            NameMatching::Normalized => {
                string_ops::snake_case(header.trim()) == string_ops::snake_case(wanted.trim())
            }
        }
    }

    /// Whether `header` begins with `prefix` under this matching mode.
    pub fn matches_prefix(self, header: &str, prefix: &str) -> bool {
        match self {
            NameMatching::Exact => header.starts_with(prefix),
            NameMatching::CaseInsensitive => header
                .trim()
                .to_lowercase()
                .starts_with(prefix.trim().to_lowercase().as_str()),
            NameMatching::Normalized => string_ops::snake_case(header.trim())
                .starts_with(string_ops::snake_case(prefix.trim()).as_ref()),
        }
    }

    /// First column whose header matches `wanted`.
    pub fn find(self, header: &HeaderTable, wanted: &str) -> Option<usize> {
        if let Some(index) = header.column_index(wanted) {
            return Some(index);
        }
        if self == NameMatching::Exact {
            return None;
        }
        header
            .names()
            .iter()
            .position(|name| self.matches(name, wanted))
    }
}

/// Selects header names by pattern or by an arbitrary predicate.
#[derive(Clone)]
pub enum ColumnMatcher {
    Regex(Regex),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl ColumnMatcher {
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(ColumnMatcher::Regex)
            .map_err(|err| MappingError::Configuration(format!("invalid column pattern: {err}")))
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        ColumnMatcher::Predicate(Arc::new(predicate))
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self {
            ColumnMatcher::Regex(regex) => regex.is_match(name),
            ColumnMatcher::Predicate(predicate) => predicate(name),
        }
    }

    /// Matching column indices in header order.
    pub fn columns(&self, header: &HeaderTable) -> Vec<usize> {
        header
            .names()
            .iter()
            .enumerate()
            .filter(|(_, name)| self.is_match(name))
            .map(|(index, _)| index)
            .collect()
    }
}

impl fmt::Debug for ColumnMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnMatcher::Regex(regex) => write!(f, "columns matching /{}/", regex.as_str()),
            ColumnMatcher::Predicate(_) => f.write_str("columns matching a predicate"),
        }
    }
}
