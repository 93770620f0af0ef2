use std::fmt;

use crate::error::{DiffError, ParseError};
use crate::value::Value;

/// A single argument within an expression.
///
/// For example in:
///
/// ```text
/// set telnet router-id=100.127.0.1
/// ```
///
/// `telnet` is a positional argument (no value) and
/// `router-id=100.127.0.1` is a key-value argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub key: String,
    pub value: Option<Value>,
    /// Common comparators are `=` and `~`
    pub comparator: String,
}

impl Argument {
    /// A positional argument: a bare key with no value.
    pub fn positional(key: impl Into<String>) -> Self {
        Argument {
            key: key.into(),
            value: None,
            comparator: "=".to_string(),
        }
    }

    /// A standard `key=value` argument.
    pub fn keyed(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Argument {
            key: key.into(),
            value: Some(value.into()),
            comparator: "=".to_string(),
        }
    }

    /// A `key<comparator>value` argument, e.g. `comment~"ID:3"`.
    pub fn with_comparator(
        key: impl Into<String>,
        value: impl Into<Value>,
        comparator: impl Into<String>,
    ) -> Self {
        Argument {
            key: key.into(),
            value: Some(value.into()),
            comparator: comparator.into(),
        }
    }

    /// Parse a single argument token, either `key=value` or positional.
    pub fn parse(token: &str) -> Result<Argument, ParseError> {
        if token == "[" {
            return Err(ParseError::StrayBracket(token.to_string()));
        }
        match token.split_once('=') {
            Some((key, value)) => Ok(Argument::keyed(key, value)),
            None => Ok(Argument::positional(token)),
        }
    }

    pub fn is_positional(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_key_value(&self) -> bool {
        !self.is_positional()
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            None => write!(f, "{}", self.key),
            // Match-style comparisons always quote their value
            Some(value) if self.comparator == "~" => {
                write!(f, "{}{}\"{}\"", self.key, self.comparator, value)
            }
            Some(value) => write!(f, "{}{}{}", self.key, self.comparator, value.quoted()),
        }
    }
}

/// An ordered list of arguments.
///
/// Insertion order is preserved and duplicate keys are legal in raw input;
/// key lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentList {
    args: Vec<Argument>,
}

impl ArgumentList {
    pub fn new() -> Self {
        ArgumentList::default()
    }

    pub fn push(&mut self, arg: Argument) {
        self.args.push(arg);
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn first(&self) -> Option<&Argument> {
        self.args.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.args.iter()
    }

    /// The value for the first argument with the given key, if any.
    /// Positional arguments yield `None` even though the key is present.
    pub fn value_of(&self, key: &str) -> Option<&Value> {
        self.args
            .iter()
            .find(|arg| arg.key == key)
            .and_then(|arg| arg.value.as_ref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.args.iter().any(|arg| arg.key == key)
    }

    /// Remove every argument with the given key.
    pub fn remove_key(&mut self, key: &str) {
        self.args.retain(|arg| arg.key != key);
    }

    /// Drop a leading positional argument, if one is present.
    pub fn remove_leading_positional(&mut self) {
        if self.args.first().is_some_and(|a| a.is_positional()) {
            self.args.remove(0);
        }
    }

    /// A deterministically ordered copy: positional arguments first, then
    /// key-value arguments sorted by their rendered form.
    pub fn sorted(&self) -> ArgumentList {
        let mut positional: Vec<Argument> = self
            .args
            .iter()
            .filter(|a| a.is_positional())
            .cloned()
            .collect();
        let mut keyed: Vec<Argument> = self
            .args
            .iter()
            .filter(|a| a.is_key_value())
            .cloned()
            .collect();
        keyed.sort_by_key(|a| a.to_string());
        positional.extend(keyed);
        ArgumentList { args: positional }
    }

    /// Diff this (new) list against `old`, producing the arguments that
    /// migrate old to new.
    ///
    /// * A leading positional argument must agree on both sides and is
    ///   copied through to preserve addressing.
    /// * Keys only in `old` are cleared with an empty value, except
    ///   `disabled=yes`, whose removal re-enables the entity.
    /// * Keys only in `new`, or with changed values, carry their new value,
    ///   unless the verbose baseline already shows that exact value.
    pub fn diff(
        &self,
        old: &ArgumentList,
        old_verbose: Option<&ArgumentList>,
    ) -> Result<ArgumentList, DiffError> {
        let mut out = ArgumentList::new();

        let new_positional = self.first().is_some_and(|a| a.is_positional());
        let old_positional = old.first().is_some_and(|a| a.is_positional());
        if new_positional != old_positional {
            return Err(DiffError::ArgumentShapeMismatch {
                old: old.to_string(),
                new: self.to_string(),
            });
        }

        if new_positional {
            // Both lists are non-empty when the flags are set
            let new_key = &self.args[0].key;
            let old_key = &old.args[0].key;
            if new_key != old_key {
                return Err(DiffError::PositionalTargetMismatch {
                    old: old.to_string(),
                    new: self.to_string(),
                });
            }
            out.push(Argument::positional(new_key.clone()));
        }

        let mut cleared: Vec<&str> = Vec::new();
        for arg in old.iter() {
            if self.contains_key(&arg.key) {
                continue;
            }
            let was_disabled = arg.key == "disabled"
                && old
                    .value_of("disabled")
                    .is_some_and(|v| v.to_string() == "yes");
            if was_disabled {
                // disabled=yes has been removed, so enable the entity
                out.push(Argument::keyed("disabled", "no"));
            } else {
                cleared.push(&arg.key);
            }
        }
        for key in cleared {
            out.push(Argument::keyed(key, ""));
        }

        for arg in self.iter() {
            let new_value = self.value_of(&arg.key);
            if old.contains_key(&arg.key) && new_value == old.value_of(&arg.key) {
                continue;
            }
            if let Some(verbose) = old_verbose {
                // The device already holds this value; it is merely missing
                // from the plain export
                if new_value == verbose.value_of(&arg.key) {
                    continue;
                }
            }
            out.push(Argument {
                key: arg.key.clone(),
                value: new_value.cloned(),
                comparator: "=".to_string(),
            });
        }

        Ok(out)
    }
}

impl fmt::Display for ArgumentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

impl From<Vec<Argument>> for ArgumentList {
    fn from(args: Vec<Argument>) -> Self {
        ArgumentList { args }
    }
}

impl FromIterator<Argument> for ArgumentList {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        ArgumentList {
            args: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ArgumentList {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.args.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> ArgumentList {
        tokens
            .iter()
            .map(|t| Argument::parse(t).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_key_value() {
        let arg = Argument::parse("router-id=10.127.0.1").unwrap();
        assert_eq!(arg.key, "router-id");
        assert_eq!(arg.value, Some(Value::literal("10.127.0.1")));
        assert_eq!(arg.to_string(), "router-id=10.127.0.1");
    }

    #[test]
    fn test_parse_positional() {
        let arg = Argument::parse("telnet").unwrap();
        assert!(arg.is_positional());
        assert_eq!(arg.to_string(), "telnet");
    }

    #[test]
    fn test_parse_stray_bracket() {
        assert!(matches!(
            Argument::parse("[").unwrap_err(),
            ParseError::StrayBracket(_)
        ));
    }

    #[test]
    fn test_diff_added_and_changed() {
        let old = args(&["name=core", "router-id=10.127.0.1"]);
        let new = args(&["name=core", "router-id=10.127.0.99", "foo=bar"]);
        let diff = new.diff(&old, None).unwrap();
        assert_eq!(diff.to_string(), "router-id=10.127.0.99 foo=bar");
    }

    #[test]
    fn test_diff_cleared_key() {
        let old = args(&["name=core", "arg=value"]);
        let new = args(&["name=core"]);
        let diff = new.diff(&old, None).unwrap();
        assert_eq!(diff.to_string(), "arg=\"\"");
    }

    #[test]
    fn test_diff_disabled_removal_enables() {
        let old = args(&["telnet", "address=10.0.0.0/8", "disabled=yes"]);
        let new = args(&["telnet", "address=10.0.0.0/8"]);
        let diff = new.diff(&old, None).unwrap();
        assert_eq!(diff.to_string(), "telnet disabled=no");
    }

    #[test]
    fn test_diff_positional_mismatch() {
        let old = args(&["telnet", "disabled=yes"]);
        let new = args(&["ftp", "disabled=no"]);
        assert!(matches!(
            new.diff(&old, None).unwrap_err(),
            DiffError::PositionalTargetMismatch { .. }
        ));
    }

    #[test]
    fn test_diff_shape_mismatch() {
        let old = args(&["telnet", "disabled=yes"]);
        let new = args(&["disabled=no"]);
        assert!(matches!(
            new.diff(&old, None).unwrap_err(),
            DiffError::ArgumentShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_diff_verbose_suppression() {
        let old = args(&["name=core"]);
        let verbose = args(&["name=core", "arg=value"]);
        let new = args(&["name=core", "arg=value"]);
        let diff = new.diff(&old, Some(&verbose)).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn test_sorted_keeps_positional_first() {
        let list = args(&["telnet", "zz=1", "aa=2"]);
        assert_eq!(list.sorted().to_string(), "telnet aa=2 zz=1");
    }
}
