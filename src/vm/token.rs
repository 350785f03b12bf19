//! Tokenizing (§4.7 "Tokens are whitespace-separated"). This pass only
//! splits raw program text into token strings, honoring single-quoted
//! string literals (which may contain whitespace); classification into
//! literals/variables/keywords happens in `compiler`, after macro and
//! word expansion have had a chance to rewrite the token stream.

use crate::error::{Error, Result};

/// Splits `source` into whitespace-delimited tokens, keeping `'...'`
/// string literals (including their quotes) intact as one token.
pub fn tokenize_raw(source: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut current = String::new();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c == '\'' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            let mut literal = String::from("'");
            chars.next();
            let mut closed = false;
            for c in chars.by_ref() {
                literal.push(c);
                if c == '\'' {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err(Error::EvalFailure { code: "unterminated string literal".to_string(), position: tokens.len() });
            }
            tokens.push(literal);
            continue;
        }
        current.push(c);
        chars.next();
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokenize_raw("$1 $2 +").unwrap(), vec!["$1", "$2", "+"]);
    }

    #[test]
    fn keeps_string_literal_with_embedded_space() {
        let tokens = tokenize_raw("'hello world' str").unwrap();
        assert_eq!(tokens, vec!["'hello world'", "str"]);
    }

    #[test]
    fn rejects_unterminated_literal() {
        assert!(tokenize_raw("'oops").is_err());
    }
}
