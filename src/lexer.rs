use crate::error::ParseError;

/// Splits one expression line into shell-style words.
///
/// Double quotes group words together and are consumed in the process.
/// There is no escape mechanism, so a literal double quote cannot appear
/// inside a value; an unclosed quote is a fatal error.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: String,
}

impl Lexer {
    pub fn new(line: &str) -> Self {
        Lexer {
            input: line.chars().collect(),
            position: 0,
            line: line.to_string(),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self) -> Result<String, ParseError> {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            match ch {
                c if c.is_whitespace() => break,
                '"' => {
                    self.advance();
                    loop {
                        match self.current_char() {
                            Some('"') => {
                                self.advance();
                                break;
                            }
                            Some(c) => {
                                result.push(c);
                                self.advance();
                            }
                            None => {
                                return Err(ParseError::UnterminatedQuote(self.line.clone()));
                            }
                        }
                    }
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }
        Ok(result)
    }

    /// Consume the whole line and return its words.
    pub fn words(mut self) -> Result<Vec<String>, ParseError> {
        let mut words = Vec::new();
        loop {
            self.skip_whitespace();
            if self.current_char().is_none() {
                break;
            }
            words.push(self.read_word()?);
        }
        Ok(words)
    }
}

/// Extract the single bracketed `[ ... ]` group from an expression line.
///
/// Returns the line with the group removed, plus the group's inner text if
/// one was present. Brackets inside double-quoted values do not count. More
/// than one group, a nested group, or unbalanced brackets are fatal.
pub fn extract_find_group(line: &str) -> Result<(String, Option<String>), ParseError> {
    let mut rest = String::new();
    let mut inner = String::new();
    let mut in_quotes = false;
    let mut in_group = false;
    let mut seen_group = false;

    for ch in line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            if in_group {
                inner.push(ch);
            } else {
                rest.push(ch);
            }
            continue;
        }
        if !in_quotes && ch == '[' {
            if in_group || seen_group {
                return Err(ParseError::MultipleFindGroups(line.to_string()));
            }
            in_group = true;
            seen_group = true;
            continue;
        }
        if !in_quotes && ch == ']' {
            if !in_group {
                return Err(ParseError::UnbalancedBrackets(line.to_string()));
            }
            in_group = false;
            continue;
        }
        if in_group {
            inner.push(ch);
        } else {
            rest.push(ch);
        }
    }

    if in_group {
        return Err(ParseError::UnbalancedBrackets(line.to_string()));
    }
    if in_quotes {
        return Err(ParseError::UnterminatedQuote(line.to_string()));
    }

    if seen_group {
        Ok((rest, Some(inner.trim().to_string())))
    } else {
        Ok((rest, None))
    }
}

#[test]
fn test_words_plain() {
    let words = Lexer::new("add name=core router-id=10.127.0.1").words().unwrap();
    assert_eq!(words, vec!["add", "name=core", "router-id=10.127.0.1"]);
}

#[test]
fn test_words_quoted() {
    let words = Lexer::new("add comment=\"Just a comment [ID:123]\" x=1")
        .words()
        .unwrap();
    assert_eq!(words, vec!["add", "comment=Just a comment [ID:123]", "x=1"]);
}

#[test]
fn test_words_unterminated_quote() {
    let err = Lexer::new("add comment=\"oops").words().unwrap_err();
    assert!(matches!(err, ParseError::UnterminatedQuote(_)));
}

#[test]
fn test_extract_find_group() {
    let (rest, group) =
        extract_find_group("set [ find default-name=ether1 ] name=ether1-core").unwrap();
    assert_eq!(group.as_deref(), Some("find default-name=ether1"));
    assert_eq!(rest, "set  name=ether1-core");
}

#[test]
fn test_extract_find_group_ignores_quoted_brackets() {
    let (rest, group) = extract_find_group("add comment=\"[ ID:1 ]\" chain=a").unwrap();
    assert_eq!(group, None);
    assert_eq!(rest, "add comment=\"[ ID:1 ]\" chain=a");
}

#[test]
fn test_extract_find_group_rejects_multiple() {
    let err = extract_find_group("set [ find a=1 ] [ find b=2 ]").unwrap_err();
    assert!(matches!(err, ParseError::MultipleFindGroups(_)));
}

#[test]
fn test_extract_find_group_rejects_unbalanced() {
    assert!(matches!(
        extract_find_group("set [ find a=1 name=x").unwrap_err(),
        ParseError::UnbalancedBrackets(_)
    ));
    assert!(matches!(
        extract_find_group("set find a=1 ] name=x").unwrap_err(),
        ParseError::UnbalancedBrackets(_)
    ));
}
