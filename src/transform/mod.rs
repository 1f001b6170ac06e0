//! String preprocessing applied to a cell before any mapper sees it.
//!
//! Transformers run in registration order. Returning `None` turns the cell
//! into an empty one, which routes it to the member's empty fallback.

pub mod string_ops;

use std::{borrow::Cow, fmt};

use regex::Regex;

pub trait CellTransformer: Send + Sync {
    fn transform<'a>(&self, value: Cow<'a, str>) -> Option<Cow<'a, str>>;
}

fn rewrite<'a>(value: Cow<'a, str>, op: impl for<'b> Fn(&'b str) -> Cow<'b, str>) -> Cow<'a, str> {
    match value {
        Cow::Borrowed(s) => op(s),
        Cow::Owned(s) => Cow::Owned(op(&s).into_owned()),
    }
}

/// Runs `transformers` over `raw`, stopping at the first one that drops the
/// value.
pub fn apply_transformers<'a>(
    transformers: &[Box<dyn CellTransformer>],
    raw: &'a str,
) -> Option<Cow<'a, str>> {
    let mut current = Cow::Borrowed(raw);
    for transformer in transformers {
        current = transformer.transform(current)?;
    }
    Some(current)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrimTransformer;

impl CellTransformer for TrimTransformer {
    fn transform<'a>(&self, value: Cow<'a, str>) -> Option<Cow<'a, str>> {
        Some(rewrite(value, string_ops::trim))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseTransformer;

impl CellTransformer for LowercaseTransformer {
    fn transform<'a>(&self, value: Cow<'a, str>) -> Option<Cow<'a, str>> {
        Some(rewrite(value, string_ops::lowercase))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UppercaseTransformer;

impl CellTransformer for UppercaseTransformer {
    fn transform<'a>(&self, value: Cow<'a, str>) -> Option<Cow<'a, str>> {
        Some(rewrite(value, string_ops::uppercase))
    }
}

/// Replaces a cell whose whole content equals `from`.
#[derive(Debug, Clone)]
pub struct ReplaceTransformer {
    pub from: String,
    pub to: Option<String>,
}

impl ReplaceTransformer {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: Some(to.into()),
        }
    }

    /// Treats cells equal to `from` as empty.
    pub fn clearing(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: None,
        }
    }
}

impl CellTransformer for ReplaceTransformer {
    fn transform<'a>(&self, value: Cow<'a, str>) -> Option<Cow<'a, str>> {
        if value.as_ref() != self.from {
            return Some(value);
        }
        self.to.as_ref().map(|to| Cow::Owned(to.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct RegexReplaceTransformer {
    regex: Regex,
    replacement: String,
}

impl RegexReplaceTransformer {
    pub fn new(regex: Regex, replacement: impl Into<String>) -> Self {
        Self {
            regex,
            replacement: replacement.into(),
        }
    }
}

impl CellTransformer for RegexReplaceTransformer {
    fn transform<'a>(&self, value: Cow<'a, str>) -> Option<Cow<'a, str>> {
        Some(rewrite(value, |s| {
            string_ops::regex_replace(s, &self.regex, &self.replacement)
        }))
    }
}

/// Drops placeholder tokens (`NA`, `N/A`, `null`, ...) plus any extra tokens
/// configured by the caller.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderTransformer {
    extra_tokens: Vec<String>,
}

impl PlaceholderTransformer {
    pub fn with_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra_tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

impl CellTransformer for PlaceholderTransformer {
    fn transform<'a>(&self, value: Cow<'a, str>) -> Option<Cow<'a, str>> {
        let trimmed = value.trim();
        if string_ops::is_placeholder_token(trimmed)
            || self
                .extra_tokens
                .iter()
                .any(|token| token.eq_ignore_ascii_case(trimmed))
        {
            return None;
        }
        Some(value)
    }
}

/// Adapts a closure into a transformer.
pub struct FnTransformer<F>(pub F);

impl<F> CellTransformer for FnTransformer<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn transform<'a>(&self, value: Cow<'a, str>) -> Option<Cow<'a, str>> {
        (self.0)(value.as_ref()).map(Cow::Owned)
    }
}

impl<F> fmt::Debug for FnTransformer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnTransformer")
    }
}
