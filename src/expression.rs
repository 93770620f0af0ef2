use std::fmt;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

use regex::Regex;

use crate::argument::{Argument, ArgumentList};
use crate::error::{DiffError, ParseError};
use crate::lexer::{Lexer, extract_find_group};
use crate::policy::Policy;

/// Synthetic natural key used when an entity's id lives in its comment
/// field, in the form `[ ID:<token> ]`.
pub const COMMENT_ID_KEY: &str = "comment-id";

fn comment_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\s?ID:([A-Za-z0-9_-]+)\s?\]").expect("valid pattern"))
}

/// One command line of a configuration section.
///
/// Example expressions:
///
/// ```text
/// add address=1.2.3.4
/// set [ find name=core ] router-id=10.127.0.99
/// remove name=loopback
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// E.g. `/ip address`
    pub section_path: String,

    /// E.g. `add`, `set`, `remove`
    pub command: String,

    /// Present when the expression selects its target via `[ find ... ]`
    pub find: Option<Box<Expression>>,

    /// The arguments of this expression
    pub args: ArgumentList,
}

impl Expression {
    /// Parse a single expression line within the given section.
    ///
    /// ```
    /// use ros_diff::Expression;
    ///
    /// let expression =
    ///     Expression::parse("add area=core network=100.127.0.0/24", "/routing ospf area")
    ///         .unwrap();
    /// assert_eq!(expression.command, "add");
    /// ```
    pub fn parse(line: &str, section_path: &str) -> Result<Expression, ParseError> {
        let (rest, group) = extract_find_group(line)?;
        let find = match group {
            Some(inner) => {
                if !inner.starts_with("find") {
                    return Err(ParseError::NotAFindGroup(line.to_string()));
                }
                Some(Box::new(Expression::parse(&inner, section_path)?))
            }
            None => None,
        };

        let mut words = Lexer::new(&rest).words()?.into_iter();
        let command = words
            .next()
            .ok_or_else(|| ParseError::EmptyExpression(line.to_string()))?;
        if command.contains('=') {
            return Err(ParseError::InvalidCommand(command));
        }
        let args = words
            .map(|word| Argument::parse(&word))
            .collect::<Result<ArgumentList, ParseError>>()?;

        Ok(Expression {
            section_path: section_path.to_string(),
            command,
            find,
            args,
        })
    }

    /// Build a `find` clause selecting an entity by its natural identity.
    ///
    /// `comment-id` identities match by regex against the comment field;
    /// a missing key falls back to a positional selector.
    pub fn find_by(key: Option<&str>, id: &str) -> Expression {
        let args: ArgumentList = match key {
            Some(COMMENT_ID_KEY) => vec![
                Argument::positional("where"),
                Argument::with_comparator("comment", format!("ID:{}", id), "~"),
            ]
            .into(),
            Some(key) => vec![Argument::keyed(key, id)].into(),
            None => vec![Argument::positional(id)].into(),
        };
        Expression {
            section_path: String::new(),
            command: "find".to_string(),
            find: None,
            args,
        }
    }

    /// Resolve the natural identity `(key, id)` of this expression.
    ///
    /// Resolution order: comment-embedded id, the policy's natural key in
    /// the arguments, the natural key in the find clause, then a leading
    /// positional argument. Bare IPv4 ids in `/ip address` are normalized
    /// to carry a `/32` prefix, which find clauses need in order to match.
    pub fn natural_key_and_id(&self, policy: &Policy) -> (Option<String>, Option<String>) {
        let (key, id) = self.resolve_identity(policy);
        self.normalize_identity(key, id)
    }

    fn resolve_identity(&self, policy: &Policy) -> (Option<String>, Option<String>) {
        if let Some(comment) = self.args.value_of("comment") {
            if let Some(captures) = comment_id_regex().captures(&comment.to_string()) {
                return (
                    Some(COMMENT_ID_KEY.to_string()),
                    Some(captures[1].to_string()),
                );
            }
        }

        let natural_key = policy.natural_key(&self.section_path);
        if let Some(value) = self.args.value_of(natural_key) {
            return (Some(natural_key.to_string()), Some(value.to_string()));
        }
        if let Some(find) = &self.find {
            if let Some(value) = find.args.value_of(natural_key) {
                return (Some(natural_key.to_string()), Some(value.to_string()));
            }
        }

        if let Some(first) = self.args.first() {
            if first.is_positional() {
                return (None, Some(first.key.clone()));
            }
        }

        (None, None)
    }

    fn normalize_identity(
        &self,
        key: Option<String>,
        id: Option<String>,
    ) -> (Option<String>, Option<String>) {
        if self.section_path == "/ip address" && key.as_deref() == Some("address") {
            if let Some(raw) = &id {
                if !raw.contains('/') && raw.parse::<Ipv4Addr>().is_ok() {
                    return (key, Some(format!("{}/32", raw)));
                }
            }
        }
        (key, id)
    }

    /// Compare this (new) expression to `old` and return the expressions
    /// which migrate old to new.
    ///
    /// Both sides must share a section path and resolve the same natural
    /// identity. A shape conflict inside the argument diff falls back to
    /// delete + recreate; identity conflicts propagate to the caller.
    pub fn diff(
        &self,
        old: &Expression,
        old_verbose: Option<&Expression>,
        policy: &Policy,
    ) -> Result<Vec<Expression>, DiffError> {
        let (new_key, new_id) = self.natural_key_and_id(policy);
        let (old_key, old_id) = old.natural_key_and_id(policy);

        if self.section_path != old.section_path {
            return Err(DiffError::SectionPathMismatch {
                old: old.to_string(),
                new: self.to_string(),
            });
        }
        if new_key != old_key {
            return Err(DiffError::NaturalKeyMismatch {
                old: old.to_string(),
                new: self.to_string(),
            });
        }
        let new_id = match new_id {
            Some(id) => id,
            None => {
                return Err(DiffError::MissingNaturalId {
                    old: old.to_string(),
                    new: self.to_string(),
                });
            }
        };
        if old_id.as_deref() != Some(new_id.as_str()) {
            return Err(DiffError::NaturalIdMismatch {
                old: old.to_string(),
                new: self.to_string(),
            });
        }

        let verbose_args = old_verbose.map(|e| &e.args);
        let mut diffed = match self.args.diff(&old.args, verbose_args) {
            Ok(args) => args,
            // Argument shapes conflict, so replace the record wholesale
            Err(_) => {
                return Ok(old
                    .as_delete(policy)
                    .into_iter()
                    .chain(self.as_create(policy))
                    .collect());
            }
        };

        match new_key {
            None => {
                // Positional identity, e.g: set telnet disabled=no
                Ok(vec![Expression {
                    section_path: self.section_path.clone(),
                    command: "set".to_string(),
                    find: None,
                    args: diffed,
                }])
            }
            Some(key) => {
                // The natural key is implicit in the find clause
                diffed.remove_key(&key);
                diffed.remove_leading_positional();
                Ok(vec![Expression {
                    section_path: self.section_path.clone(),
                    command: "set".to_string(),
                    find: Some(Box::new(Expression::find_by(Some(&key), &new_id))),
                    args: diffed,
                }])
            }
        }
    }

    /// Render this expression as a deletion, honouring the policy.
    ///
    /// Returns `None` when deletion is disallowed for the section, or when
    /// the target is the built-in `default` record.
    pub fn as_delete(&self, policy: &Policy) -> Option<Expression> {
        if !policy.deletion_allowed(&self.section_path) {
            return None;
        }

        match self.natural_key_and_id(policy) {
            (Some(key), Some(id)) => Some(Expression {
                section_path: self.section_path.clone(),
                command: "remove".to_string(),
                find: Some(Box::new(Expression::find_by(Some(&key), &id))),
                args: ArgumentList::new(),
            }),
            (None, Some(id)) => {
                if id == "default" {
                    // Built-in records cannot be removed
                    return None;
                }
                Some(Expression {
                    section_path: self.section_path.clone(),
                    command: "remove".to_string(),
                    find: None,
                    args: vec![Argument::positional(id)].into(),
                })
            }
            // No identity at all: delete by full value match
            _ => Some(Expression {
                section_path: self.section_path.clone(),
                command: "remove".to_string(),
                find: Some(Box::new(Expression {
                    section_path: String::new(),
                    command: "find".to_string(),
                    find: None,
                    args: self.args.clone(),
                })),
                args: ArgumentList::new(),
            }),
        }
    }

    /// Render this expression as a creation, honouring the policy.
    pub fn as_create(&self, policy: &Policy) -> Option<Expression> {
        if !policy.creation_allowed(&self.section_path) {
            return None;
        }

        let command = if self.is_single_object()
            || self.args.first().is_some_and(|a| a.is_positional())
        {
            // Sections like /system identity hold exactly one entity
            "set"
        } else {
            "add"
        };

        Some(Expression {
            section_path: self.section_path.clone(),
            command: command.to_string(),
            find: None,
            args: self.args.clone(),
        })
    }

    /// Does this expression update a section holding exactly one entity
    /// (e.g. `/system identity`)?
    pub fn is_single_object(&self) -> bool {
        self.command == "set"
            && self.args.first().is_some_and(|a| a.is_key_value())
            && self.find.is_none()
    }

    /// Does this expression select its target via `find default=...`?
    pub fn finds_by_default(&self) -> bool {
        self.find
            .as_ref()
            .is_some_and(|find| find.args.first().is_some_and(|a| a.key == "default"))
    }

    /// Does this expression carry any key-value arguments?
    pub fn has_keyed_args(&self) -> bool {
        self.args.iter().any(|a| a.is_key_value())
    }

    /// A copy with deterministically ordered arguments.
    pub fn with_sorted_args(&self) -> Expression {
        Expression {
            args: self.args.sorted(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if !self.command.is_empty() {
            parts.push(self.command.clone());
        }
        if let Some(find) = &self.find {
            parts.push(format!("[ {} ]", find));
        }
        if !self.args.is_empty() {
            parts.push(self.args.to_string());
        }
        write!(f, "{}", parts.join(" "))
    }
}
