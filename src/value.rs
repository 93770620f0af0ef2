use std::cmp::Ordering;
use std::fmt;

use crate::expression::Expression;

/// Characters that force a value to be wrapped in double quotes on render.
const SPECIALS: &[char] = &[
    '\\', ' ', '$', '(', ')', '[', ']', '{', '}', ';', '=', '`', '~', '/',
];

/// Quote a raw value for use in a rendered expression.
///
/// An empty string renders as `""`. The format has no escape mechanism
/// for a literal double quote, so such values are unrepresentable;
/// passing one panics. Parsed input never contains one (the lexer
/// consumes quotes), which leaves only programmatically built values.
///
/// # Panics
///
/// Panics if `raw` contains a `"`.
pub fn quote(raw: &str) -> String {
    assert!(
        !raw.contains('"'),
        "value contains an unrepresentable double quote: {}",
        raw
    );
    if raw.is_empty() {
        return "\"\"".to_string();
    }
    if raw.contains(SPECIALS) {
        format!("\"{}\"", raw)
    } else {
        raw.to_string()
    }
}

/// The right-hand side of an argument.
///
/// In the expression:
///
/// ```text
/// add chain=b place-before=[ find where comment~"ID:3" ]
/// ```
///
/// `b` is a literal value and `[ find where comment~"ID:3" ]` is a nested
/// sub-expression value.
#[derive(Debug, Clone)]
pub enum Value {
    /// A plain string value, e.g. `core` or `10.127.0.88`
    Literal(String),

    /// A bracketed sub-expression value, e.g. `[ find default=yes ]`
    SubExpression(Box<Expression>),
}

impl Value {
    pub fn literal(raw: impl Into<String>) -> Self {
        Value::Literal(raw.into())
    }

    pub fn sub_expression(expression: Expression) -> Self {
        Value::SubExpression(Box::new(expression))
    }

    /// Render this value in its quoted form, ready for an export script.
    pub fn quoted(&self) -> String {
        match self {
            Value::Literal(raw) => quote(raw),
            Value::SubExpression(expression) => format!("[ {} ]", expression),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Literal(raw) => write!(f, "{}", raw),
            Value::SubExpression(expression) => write!(f, "{}", expression),
        }
    }
}

impl From<&str> for Value {
    fn from(raw: &str) -> Self {
        Value::Literal(raw.to_string())
    }
}

impl From<String> for Value {
    fn from(raw: String) -> Self {
        Value::Literal(raw)
    }
}

// Values compare by their rendered string form, across variants.

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Literal(a), Value::Literal(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

#[test]
fn test_quote_plain() {
    assert_eq!(quote("core"), "core");
    assert_eq!(quote("10.127.0.1"), "10.127.0.1");
}

#[test]
fn test_quote_specials() {
    assert_eq!(quote("10.100.0.1/24"), "\"10.100.0.1/24\"");
    assert_eq!(quote("a b"), "\"a b\"");
    assert_eq!(quote(""), "\"\"");
}

#[test]
#[should_panic(expected = "unrepresentable double quote")]
fn test_quote_rejects_literal_double_quote() {
    quote("say \"hi\"");
}
