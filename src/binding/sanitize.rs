//! Command and value sanitization
//!
//! Order used by the CLI executor:
//! 1. escape each parent output ([`escape_shell_value`])
//! 2. substitute placeholders
//! 3. [`sanitize_command`] on the rendered command (`~/` expansion, quotes)
//! 4. approval, then [`denied_prefix`] on the final command

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `~/` at the start of the command or after whitespace
static HOME_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\s)~/").unwrap());

/// Commands refused regardless of approval (case-sensitive prefix match)
pub const DEFAULT_DENIED_COMMANDS: &[&str] = &[
    "rm",
    "chmod",
    "shutdown",
    "history",
    "user",
    "sudo",
    "su",
    "passwd",
    "chown",
    "chgrp",
    "kill",
    "reboot",
    "poweroff",
    "init",
    "systemctl",
    "journalctl",
    "dmesg",
    "lsblk",
    "lsmod",
    "modprobe",
    "insmod",
    "rmmod",
    "lsusb",
    "lspci",
];

/// Escape a value substituted into a shell command: `\` first, then `${`
pub fn escape_shell_value(value: &str) -> Cow<'_, str> {
    if !value.contains('\\') && !value.contains("${") {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace('\\', r"\\").replace("${", r"\${"))
}

/// Escape a value substituted into an LLM prompt: `${` only
pub fn escape_prompt_value(value: &str) -> Cow<'_, str> {
    if !value.contains("${") {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace("${", r"\${"))
}

/// Expand `~/` to `{home}/` at the command start and after whitespace
pub fn expand_home<'c>(command: &'c str, home: &str) -> Cow<'c, str> {
    let home = home.trim_end_matches('/');
    HOME_PREFIX_RE.replace_all(command, |caps: &Captures<'_>| {
        format!("{}{}/", &caps[1], home)
    })
}

/// Turn every `"` not preceded by an odd run of backslashes into `'`
pub fn convert_unescaped_double_quotes(command: &str) -> Cow<'_, str> {
    if !command.contains('"') {
        return Cow::Borrowed(command);
    }

    let mut out = String::with_capacity(command.len());
    let mut backslashes = 0usize;
    for ch in command.chars() {
        match ch {
            '\\' => {
                backslashes += 1;
                out.push(ch);
            }
            '"' if backslashes % 2 == 0 => {
                backslashes = 0;
                out.push('\'');
            }
            _ => {
                backslashes = 0;
                out.push(ch);
            }
        }
    }
    Cow::Owned(out)
}

/// Home expansion then quote conversion; `home = None` skips expansion
pub fn sanitize_command(command: &str, home: Option<&str>) -> String {
    let expanded = match home {
        Some(home) => expand_home(command, home),
        None => Cow::Borrowed(command),
    };
    convert_unescaped_double_quotes(&expanded).into_owned()
}

/// First denylist entry the trimmed command starts with
pub fn denied_prefix<'d, S: AsRef<str>>(command: &str, denied: &'d [S]) -> Option<&'d str> {
    let command = command.trim_start();
    denied
        .iter()
        .map(AsRef::as_ref)
        .find(|prefix| !prefix.is_empty() && command.starts_with(prefix))
}
