use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::argument::{Argument, ArgumentList};
use crate::error::{DiffError, ParseError};
use crate::expression::Expression;
use crate::policy::Policy;
use crate::value::Value;

// Line continuations come in two flavours: `\` followed by `\_` on the
// next line joins with a space, a plain `\` joins with nothing.
fn continuation_with_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\\n\s*\\_").expect("valid pattern"))
}

fn continuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\\n\s*").expect("valid pattern"))
}

/// A block of expressions under a single section path, e.g:
///
/// ```text
/// /routing ospf interface
/// add interface=core network-type=point-to-point
/// add interface=edge network-type=broadcast
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// E.g. `/routing ospf interface`
    pub path: String,

    /// The expression lines of the block, in order
    pub expressions: Vec<Expression>,
}

impl Section {
    pub fn empty(path: impl Into<String>) -> Self {
        Section {
            path: path.into(),
            expressions: Vec::new(),
        }
    }

    /// Parse a section block: a `/`-prefixed path line followed by
    /// expression lines. Line continuations are joined and comment lines
    /// dropped before parsing.
    pub fn parse(block: &str) -> Result<Section, ParseError> {
        let joined = continuation_with_space().replace_all(block.trim(), " ");
        let joined = continuation().replace_all(&joined, "");
        let joined = joined.trim_end_matches('\\');

        let mut lines = joined
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));

        let path = match lines.next() {
            Some(line) if line.starts_with('/') => line.to_string(),
            Some(line) => return Err(ParseError::MissingSectionPath(line.to_string())),
            None => return Err(ParseError::MissingSectionPath(String::new())),
        };

        let mut expressions = Vec::new();
        for line in lines {
            if line.starts_with('/') {
                return Err(ParseError::ExpressionStartsWithSlash(line.to_string()));
            }
            expressions.push(Expression::parse(line, &path)?);
        }

        Ok(Section { path, expressions })
    }

    /// The natural ids of the expressions, in order.
    fn natural_ids(&self, policy: &Policy) -> Vec<Option<String>> {
        self.expressions
            .iter()
            .map(|e| e.natural_key_and_id(policy).1)
            .collect()
    }

    /// Does every expression resolve a natural id? Vacuously true for an
    /// empty section.
    pub fn uses_natural_ids(&self, policy: &Policy) -> bool {
        self.natural_ids(policy).iter().all(Option::is_some)
    }

    fn find_by_id<'a>(&'a self, id: &str, policy: &Policy) -> Option<&'a Expression> {
        self.expressions
            .iter()
            .find(|e| e.natural_key_and_id(policy).1.as_deref() == Some(id))
    }

    fn is_single_object(&self) -> bool {
        !self.expressions.is_empty() && self.expressions.iter().all(|e| e.is_single_object())
    }

    fn modifies_default_only(&self) -> bool {
        !self.expressions.is_empty() && self.expressions.iter().all(|e| e.finds_by_default())
    }

    fn has_any_default_entry(&self) -> bool {
        self.expressions.iter().any(|e| e.finds_by_default())
    }

    /// Compare this (new) section to `old` and return the section of
    /// expressions which migrates old to new.
    ///
    /// The strategy is picked per section: single-object sections and
    /// default-only sections diff their lone argument lists, sections whose
    /// entities all resolve natural ids diff entity by entity, and anything
    /// else falls back to whole-value matching. A final pass annotates
    /// insertions with `place-before` where ordering matters.
    pub fn diff(
        &self,
        old: &Section,
        old_verbose: Option<&Section>,
        policy: &Policy,
    ) -> Result<Section, DiffError> {
        if self.path != old.path {
            return Err(DiffError::SectionPathMismatch {
                old: old.path.clone(),
                new: self.path.clone(),
            });
        }

        let diffed = if self.is_single_object() || old.is_single_object() {
            self.diff_single_object(old, old_verbose)?
        } else if self.modifies_default_only() && old.modifies_default_only() {
            self.diff_default_only(old, old_verbose)?
        } else if self.modifies_default_only() && old.expressions.is_empty() {
            // The old export omitted the entry because it was all defaults
            self.clone()
        } else if old.modifies_default_only() {
            if self.has_any_default_entry() {
                return Err(DiffError::MixedDefaultExpressions(self.path.clone()));
            }
            // Default entries cannot be deleted; diff as if old were empty
            self.diff(&Section::empty(&old.path), old_verbose, policy)?
        } else if self.uses_natural_ids(policy) && old.uses_natural_ids(policy) {
            self.diff_by_id(old, old_verbose, policy)?
        } else {
            self.diff_by_value(old, policy)
        };

        Ok(self.reorder(diffed, old, policy))
    }

    /// Diff for sections holding exactly one entity (e.g. `/system
    /// identity`): the two argument lists are diffed directly.
    fn diff_single_object(
        &self,
        old: &Section,
        old_verbose: Option<&Section>,
    ) -> Result<Section, DiffError> {
        if self.expressions.len() > 1 || old.expressions.len() > 1 {
            return Err(DiffError::TooManyExpressions(self.path.clone()));
        }
        let new_expression = match self.expressions.first() {
            Some(expression) => expression,
            None => return Ok(Section::empty(&self.path)),
        };

        let no_args = ArgumentList::new();
        let old_args = old
            .expressions
            .first()
            .map(|e| &e.args)
            .unwrap_or(&no_args);
        let verbose_args = old_verbose
            .and_then(|s| s.expressions.first())
            .map(|e| &e.args);

        let diffed = new_expression.args.diff(old_args, verbose_args)?;
        let expressions = if diffed.is_empty() {
            Vec::new()
        } else {
            vec![Expression {
                section_path: self.path.clone(),
                command: "set".to_string(),
                find: None,
                args: diffed,
            }]
        };
        Ok(Section {
            path: self.path.clone(),
            expressions,
        })
    }

    /// Diff for sections whose sole expression targets the built-in
    /// default entry via `[ find default=yes ]`.
    fn diff_default_only(
        &self,
        old: &Section,
        old_verbose: Option<&Section>,
    ) -> Result<Section, DiffError> {
        if self.expressions.len() > 1 || old.expressions.len() > 1 {
            return Err(DiffError::TooManyExpressions(self.path.clone()));
        }
        let (new_expression, old_expression) =
            match (self.expressions.first(), old.expressions.first()) {
                (Some(new), Some(old)) => (new, old),
                _ => return Ok(Section::empty(&self.path)),
            };

        let verbose_args = old_verbose
            .and_then(|s| s.expressions.first())
            .map(|e| &e.args);

        let diffed = new_expression.args.diff(&old_expression.args, verbose_args)?;
        let expressions = if diffed.is_empty() {
            Vec::new()
        } else {
            vec![Expression {
                args: diffed,
                ..new_expression.clone()
            }]
        };
        Ok(Section {
            path: self.path.clone(),
            expressions,
        })
    }

    /// Diff entity by entity, matching on natural ids. Removals come
    /// first, then modifications, then creations.
    fn diff_by_id(
        &self,
        old: &Section,
        old_verbose: Option<&Section>,
        policy: &Policy,
    ) -> Result<Section, DiffError> {
        let all_ids: BTreeSet<String> = self
            .natural_ids(policy)
            .into_iter()
            .chain(old.natural_ids(policy))
            .flatten()
            .collect();

        let mut removals = Vec::new();
        let mut modifications = Vec::new();
        let mut creations = Vec::new();

        for id in &all_ids {
            let new_expression = self.find_by_id(id, policy);
            let old_expression = old.find_by_id(id, policy);
            match (new_expression, old_expression) {
                (None, Some(old_expression)) => {
                    removals.extend(old_expression.as_delete(policy));
                }
                (Some(new_expression), None) => {
                    creations.extend(new_expression.as_create(policy));
                }
                (Some(new_expression), Some(old_expression)) => {
                    let verbose = old_verbose.and_then(|s| s.find_by_id(id, policy));
                    modifications.extend(new_expression.diff(old_expression, verbose, policy)?);
                }
                (None, None) => {}
            }
        }

        // Modifications which only restate the find clause change nothing
        modifications.retain(|e| e.has_keyed_args());

        let mut expressions = removals;
        expressions.extend(modifications);
        expressions.extend(creations);
        Ok(Section {
            path: self.path.clone(),
            expressions,
        })
    }

    /// Fallback diff: expressions match only when their full canonical
    /// rendering agrees. Anything present on one side only is deleted or
    /// created wholesale.
    fn diff_by_value(&self, old: &Section, policy: &Policy) -> Section {
        let old_rendered: Vec<String> = old
            .expressions
            .iter()
            .map(|e| e.with_sorted_args().to_string())
            .collect();
        let new_rendered: Vec<String> = self
            .expressions
            .iter()
            .map(|e| e.with_sorted_args().to_string())
            .collect();
        let old_set: HashSet<&str> = old_rendered.iter().map(String::as_str).collect();
        let new_set: HashSet<&str> = new_rendered.iter().map(String::as_str).collect();

        let mut expressions = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for (canonical, expression) in old_rendered.iter().zip(&old.expressions) {
            if new_set.contains(canonical.as_str()) || !seen.insert(canonical.as_str()) {
                continue;
            }
            let is_disabled = expression
                .args
                .value_of("disabled")
                .is_some_and(|v| v.to_string() == "yes");
            if is_disabled {
                // Already inert, removing it would change nothing
                continue;
            }
            expressions.extend(expression.as_delete(policy));
        }
        seen.clear();
        for (canonical, expression) in new_rendered.iter().zip(&self.expressions) {
            if old_set.contains(canonical.as_str()) || !seen.insert(canonical.as_str()) {
                continue;
            }
            expressions.extend(expression.as_create(policy));
        }

        Section {
            path: self.path.clone(),
            expressions,
        }
    }

    /// Annotate insertions with `place-before` in order-sensitive
    /// sections. When identities are unreliable the whole section is wiped
    /// and rebuilt in the new order instead.
    fn reorder(&self, diffed: Section, old: &Section, policy: &Policy) -> Section {
        if !policy.order_important(&self.path) || diffed.expressions.is_empty() {
            return diffed;
        }

        if !(self.uses_natural_ids(policy) && old.uses_natural_ids(policy)) {
            let wipe = Expression {
                section_path: self.path.clone(),
                command: "remove".to_string(),
                find: Some(Box::new(Expression {
                    section_path: String::new(),
                    command: "find".to_string(),
                    find: None,
                    args: ArgumentList::new(),
                })),
                args: ArgumentList::new(),
            };
            let mut expressions = vec![wipe];
            expressions.extend(self.expressions.iter().cloned());
            return Section {
                path: self.path.clone(),
                expressions,
            };
        }

        let old_ids: HashSet<String> = old.natural_ids(policy).into_iter().flatten().collect();
        let mut expressions = Vec::with_capacity(diffed.expressions.len());
        for mut expression in diffed.expressions {
            let id = expression.natural_key_and_id(policy).1;
            let inserted = id.as_ref().is_some_and(|id| !old_ids.contains(id));
            if inserted {
                if let Some(anchor) = self.insertion_anchor(id.as_deref(), &old_ids, policy) {
                    expression
                        .args
                        .push(Argument::keyed("place-before", Value::sub_expression(anchor)));
                }
            }
            expressions.push(expression);
        }
        Section {
            path: diffed.path,
            expressions,
        }
    }

    /// The find clause selecting the nearest element after `id` in the new
    /// section which already exists in the old one. `None` for an append.
    fn insertion_anchor(
        &self,
        id: Option<&str>,
        old_ids: &HashSet<String>,
        policy: &Policy,
    ) -> Option<Expression> {
        let position = self
            .expressions
            .iter()
            .position(|e| e.natural_key_and_id(policy).1.as_deref() == id)?;
        self.expressions[position + 1..].iter().find_map(|e| {
            let (key, eid) = e.natural_key_and_id(policy);
            let eid = eid?;
            old_ids
                .contains(&eid)
                .then(|| Expression::find_by(key.as_deref(), &eid))
        })
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.path)?;
        for expression in &self.expressions {
            writeln!(f, "{}", expression)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let section = Section::parse("/routing ospf interface\nadd interface=core\n").unwrap();
        assert_eq!(section.path, "/routing ospf interface");
        assert_eq!(section.expressions.len(), 1);
    }

    #[test]
    fn test_parse_joins_continuations() {
        let section =
            Section::parse("/ip firewall nat\nadd chain=a \\\n    action=accept\n").unwrap();
        assert_eq!(
            section.expressions[0].to_string(),
            "add chain=a action=accept"
        );
    }

    #[test]
    fn test_parse_joins_continuations_with_space() {
        let section = Section::parse(
            "/ip firewall nat\nadd comment=\"[\\\n    \\_ID:mgmt ]\" chain=a\n",
        )
        .unwrap();
        assert_eq!(
            section.expressions[0].to_string(),
            "add comment=\"[ ID:mgmt ]\" chain=a"
        );
    }

    #[test]
    fn test_parse_skips_comment_lines() {
        let section =
            Section::parse("/ip address\n# managed by provisioning\nadd address=10.0.0.1/24\n")
                .unwrap();
        assert_eq!(section.expressions.len(), 1);
    }

    #[test]
    fn test_parse_requires_path() {
        assert!(matches!(
            Section::parse("add address=10.0.0.1/24\n").unwrap_err(),
            ParseError::MissingSectionPath(_)
        ));
    }
}
