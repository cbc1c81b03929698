//! Positional placeholder substitution - `${1}`, `${2}`, ...
//!
//! Placeholder N refers to the N-th incoming edge of the node (1-based,
//! edge-list order). `${0}` and any index past the end render as an empty
//! string. Substitution is single-pass: text inserted for one placeholder
//! is never scanned for further placeholders.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::sanitize::{escape_prompt_value, escape_shell_value};

/// Pre-compiled regex for `${N}`
static INDEXED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{(\d+)\}").unwrap());

/// How substituted values are escaped before insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaping {
    /// Backslashes, then `${` (CLI commands)
    Shell,
    /// `${` only (LLM prompts)
    Prompt,
    /// Insert values as-is
    None,
}

impl Escaping {
    fn apply<'s>(&self, value: &'s str) -> Cow<'s, str> {
        match self {
            Escaping::Shell => escape_shell_value(value),
            Escaping::Prompt => escape_prompt_value(value),
            Escaping::None => Cow::Borrowed(value),
        }
    }
}

/// Replace every `${N}` with `inputs[N - 1]`
///
/// Returns `Cow::Borrowed` when the template has no placeholder.
pub fn replace_indexed_inputs<'t, S: AsRef<str>>(template: &'t str, inputs: &[S]) -> Cow<'t, str> {
    if !template.contains("${") {
        return Cow::Borrowed(template);
    }

    INDEXED_RE.replace_all(template, |caps: &Captures<'_>| {
        caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| inputs.get(i))
            .map(|s| s.as_ref().to_string())
            .unwrap_or_default()
    })
}

/// Escape each input, then substitute
pub fn render<S: AsRef<str>>(template: &str, inputs: &[S], escaping: Escaping) -> String {
    let escaped: Vec<Cow<'_, str>> = inputs.iter().map(|s| escaping.apply(s.as_ref())).collect();
    replace_indexed_inputs(template, &escaped).into_owned()
}
