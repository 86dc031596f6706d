mod args;

use serde::{Deserialize, Serialize};
use std::ops::Index;

pub use args::*;

/// One phase's worth of action sequence lines, in authoring order.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Script(pub(crate) Vec<String>);

impl Script {
    pub fn new(lines: Vec<String>) -> Self {
        Self(lines)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Index<usize> for Script {
    type Output = String;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for Script {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A script line split into an upper-cased opcode name and its arguments.
///
/// The name is everything before the first colon. The clause after it is
/// split on commas with each argument trimmed; a missing or blank clause
/// yields no arguments.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    /// The original line, trimmed. Some opcodes read operands from it rather
    /// than from the argument list.
    pub line: String,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (name, clause) = match line.split_once(':') {
            Some((name, clause)) => (name, clause),
            None => (line, ""),
        };

        let args = if clause.trim().is_empty() {
            Vec::new()
        } else {
            clause.split(',').map(|a| a.trim().to_string()).collect()
        };

        Self {
            name: collapse_spaces(name).to_uppercase(),
            args,
            line: line.to_string(),
        }
    }

    /// The argument at `index`, if present and not blank.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .filter(|a| !a.is_empty())
    }

    /// The argument at `index`, upper-cased.
    pub fn arg_upper(&self, index: usize) -> Option<String> {
        self.arg(index).map(str::to_uppercase)
    }

    /// Whether any argument equals `flag`, ignoring case.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a.eq_ignore_ascii_case(flag))
    }
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_name_and_args() {
        let command = Command::parse("  hp +50%: target,  Show ");
        assert_eq!(command.name, "HP +50%");
        assert_eq!(command.args, vec!["target".to_string(), "Show".to_string()]);
        assert!(command.has_flag("SHOW"));
        assert_eq!(command.arg(2), None);
    }

    #[test]
    fn test_parse_without_clause() {
        let command = Command::parse("death break");
        assert_eq!(command.name, "DEATH BREAK");
        assert!(command.args.is_empty());

        let command = Command::parse("wait for animation:");
        assert_eq!(command.name, "WAIT FOR ANIMATION");
        assert!(command.args.is_empty());
    }

    #[test]
    fn test_parse_splits_on_first_colon() {
        let command = Command::parse("se: Bell3, 80:, 100");
        assert_eq!(command.name, "SE");
        assert_eq!(command.args, vec!["Bell3", "80:", "100"]);
    }

    #[test]
    fn test_blank_args_are_absent() {
        let command = Command::parse("action animation: , mirror");
        assert_eq!(command.arg(0), None);
        assert_eq!(command.arg_upper(1), Some("MIRROR".to_string()));
    }

    #[test]
    fn test_script_collects_lines() {
        let script: Script = ["wait: 10", "death break"].into_iter().collect();
        assert_eq!(script.len(), 2);
        assert_eq!(script.get(1), Some("death break"));
        assert_eq!(script.get(2), None);
        assert_eq!(&script[0], "wait: 10");
    }
}
