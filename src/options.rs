//! Resolver options, loadable from YAML.
//!
//! ```yaml
//! fallback_strategy: set_to_default
//! name_matching: normalized
//! nested_naming:
//!   mode: prefixed
//!   separator: "."
//! separators: [",", ";"]
//! trim_entries: true
//! date_formats: ["%d/%m/%Y"]
//! number:
//!   decimal_separator: ","
//!   thousands_separator: "."
//! ```

use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    parse::{DEFAULT_FALSE_TOKENS, DEFAULT_TRUE_TOKENS, NumberOptions},
    reader::NameMatching,
};

/// What an empty cell becomes when the member has no explicit fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Empty cells fail the row for every non-string, non-nullable member.
    #[default]
    ThrowIfPrimitive,
    /// Empty cells take the member type's default value when it has one.
    SetToDefault,
}

/// How the columns of nested record members are named.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NestedNaming {
    /// Nested members read the same column names as top-level ones.
    #[default]
    Flat,
    /// Nested members read `{member}{separator}{nested member}`.
    Prefixed { separator: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomapOptions {
    pub fallback_strategy: FallbackStrategy,
    pub name_matching: NameMatching,
    pub nested_naming: NestedNaming,
    /// Delimiters used to split a single cell into collection elements.
    pub separators: Vec<char>,
    pub trim_entries: bool,
    pub remove_empty_entries: bool,
    pub trim_values: bool,
    /// Treat placeholder tokens such as `N/A` or `-` as empty cells.
    pub empty_placeholders: bool,
    /// Extra placeholder tokens, on top of the built-in ones.
    pub placeholders: Vec<String>,
    pub preserve_formatting: bool,
    pub date_formats: Vec<String>,
    pub datetime_formats: Vec<String>,
    pub time_formats: Vec<String>,
    pub true_tokens: Vec<String>,
    pub false_tokens: Vec<String>,
    pub number: NumberOptions,
    pub enum_ignore_case: bool,
}

impl Default for AutomapOptions {
    fn default() -> Self {
        Self {
            fallback_strategy: FallbackStrategy::default(),
            name_matching: NameMatching::default(),
            nested_naming: NestedNaming::default(),
            separators: vec![','],
            trim_entries: true,
            remove_empty_entries: false,
            trim_values: false,
            empty_placeholders: false,
            placeholders: Vec::new(),
            preserve_formatting: false,
            date_formats: Vec::new(),
            datetime_formats: Vec::new(),
            time_formats: Vec::new(),
            true_tokens: DEFAULT_TRUE_TOKENS.iter().map(|t| t.to_string()).collect(),
            false_tokens: DEFAULT_FALSE_TOKENS.iter().map(|t| t.to_string()).collect(),
            number: NumberOptions::default(),
            enum_ignore_case: true,
        }
    }
}

impl AutomapOptions {
    pub fn with_fallback_strategy(mut self, strategy: FallbackStrategy) -> Self {
        self.fallback_strategy = strategy;
        self
    }

    pub fn with_nested_naming(mut self, naming: NestedNaming) -> Self {
        self.nested_naming = naming;
        self
    }

    pub fn with_name_matching(mut self, matching: NameMatching) -> Self {
        self.name_matching = matching;
        self
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).context("Parsing automap options")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = read_to_string(path)?;
        Self::from_yaml_str(&raw).with_context(|| format!("Reading options from {path:?}"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_string(path, &self.to_yaml_string()?)
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Opening YAML file {path:?}"))?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_string(path: &Path, contents: &str) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Creating YAML file {path:?}"))?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(())
}
