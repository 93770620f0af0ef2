use std::fmt;

/// Fatal errors raised while parsing an export script.
///
/// Parsing aborts on the first malformed construct; every variant carries
/// the offending line (or value) so the failure can be located in the
/// original export.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// An expression line contains more than one `[ ... ]` group
    MultipleFindGroups(String),

    /// Brackets on an expression line do not pair up
    UnbalancedBrackets(String),

    /// A bracket group that does not contain a `find` sub-expression
    NotAFindGroup(String),

    /// A double-quoted value is never closed
    UnterminatedQuote(String),

    /// An expression line with no command token
    EmptyExpression(String),

    /// The command token contains `=`, so it is not actually a command
    InvalidCommand(String),

    /// An expression line starting with `/` (section paths are block headers)
    ExpressionStartsWithSlash(String),

    /// A section block whose first line is not a `/`-prefixed path
    MissingSectionPath(String),

    /// A bare `[` survived tokenization; the find-group scan missed it
    StrayBracket(String),

    /// A header comment matching `# ... by RouterOS ...` that cannot be parsed
    InvalidHeader(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MultipleFindGroups(line) => {
                write!(f, "Too many sub-expressions, cannot parse: {}", line)
            }
            ParseError::UnbalancedBrackets(line) => {
                write!(f, "Unbalanced brackets in line: {}", line)
            }
            ParseError::NotAFindGroup(line) => {
                write!(f, "Bracket group is not a find expression: {}", line)
            }
            ParseError::UnterminatedQuote(line) => {
                write!(f, "Unterminated double quote in line: {}", line)
            }
            ParseError::EmptyExpression(line) => {
                write!(f, "Expression has no command: {}", line)
            }
            ParseError::InvalidCommand(command) => write!(
                f,
                "Not a valid command: {}. It looks like this expression does not start with a command.",
                command
            ),
            ParseError::ExpressionStartsWithSlash(line) => {
                write!(f, "Expression must not start with a '/'. It was: {}", line)
            }
            ParseError::MissingSectionPath(line) => {
                write!(f, "Section path must start with a '/'. It was: {}", line)
            }
            ParseError::StrayBracket(line) => write!(
                f,
                "Something went wrong, failed to detect find expression correctly: {}",
                line
            ),
            ParseError::InvalidHeader(line) => {
                write!(f, "Cannot parse header comment: {}", line)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Structural mismatches encountered while diffing two configurations.
///
/// These mean no principled correspondence between new and old elements
/// could be established. At the expression-argument level the caller
/// recovers by falling back to delete + recreate; above that the error
/// propagates and the whole diff is considered failed.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffError {
    /// The two expressions/sections belong to different section paths
    SectionPathMismatch { old: String, new: String },

    /// A config contains the same section path twice
    DuplicateSections(String),

    /// One argument list starts with a positional argument, the other does not
    ArgumentShapeMismatch { old: String, new: String },

    /// Both lists are positional but address different targets
    PositionalTargetMismatch { old: String, new: String },

    /// The expressions resolve different natural keys
    NaturalKeyMismatch { old: String, new: String },

    /// The new expression resolves no natural id at all
    MissingNaturalId { old: String, new: String },

    /// The expressions resolve different natural ids
    NaturalIdMismatch { old: String, new: String },

    /// A single-object or default-only section holds more than one expression
    TooManyExpressions(String),

    /// A section mixes default-selecting and ordinary expressions
    MixedDefaultExpressions(String),
}

impl DiffError {
    fn details(old: &str, new: &str) -> String {
        format!("\n    Old: {}\n    New: {}", old, new)
    }
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffError::SectionPathMismatch { old, new } => write!(
                f,
                "Section paths do not match.{}",
                DiffError::details(old, new)
            ),
            DiffError::DuplicateSections(which) => {
                write!(f, "Duplicate section names present in {} config", which)
            }
            DiffError::ArgumentShapeMismatch { old, new } => write!(
                f,
                "Diffing arguments in different formats. One has a positional starting \
                 argument and the other does not.{}",
                DiffError::details(old, new)
            ),
            DiffError::PositionalTargetMismatch { old, new } => write!(
                f,
                "Initial positional arguments do not match, so they are explicitly \
                 trying to modify different things.{}",
                DiffError::details(old, new)
            ),
            DiffError::NaturalKeyMismatch { old, new } => write!(
                f,
                "Cannot diff expressions with mismatched natural keys.{}",
                DiffError::details(old, new)
            ),
            DiffError::MissingNaturalId { old, new } => write!(
                f,
                "Cannot diff expressions which lack a natural ID.{}",
                DiffError::details(old, new)
            ),
            DiffError::NaturalIdMismatch { old, new } => write!(
                f,
                "Cannot diff expressions with mismatched natural IDs.{}",
                DiffError::details(old, new)
            ),
            DiffError::TooManyExpressions(path) => write!(
                f,
                "Section {} can only contain one expression for this diff strategy",
                path
            ),
            DiffError::MixedDefaultExpressions(path) => write!(
                f,
                "Cannot handle section {} which contains a mix of default-setting and \
                 non-default-setting expressions",
                path
            ),
        }
    }
}

impl std::error::Error for DiffError {}
