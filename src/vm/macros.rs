//! Macro and word expansion (§4.7 "Macros... expand textually before
//! tokenization" / "Words: `: name body ;`... calls inline the body").
//! Both passes work purely on the token stream produced by
//! `token::tokenize_raw`, rewriting invocations in place before the
//! classifying compiler ever sees them.

use std::collections::HashMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct MacroDef {
    params: Vec<String>,
    body: Vec<String>,
}

fn parse_macro_header(token: &str) -> Option<(String, Vec<String>)> {
    let open = token.find('(')?;
    if !token.ends_with(')') {
        return None;
    }
    let name = &token[..open];
    if name.is_empty() || !name.chars().next().unwrap().is_alphabetic() {
        return None;
    }
    let inner = &token[open + 1..token.len() - 1];
    let params = if inner.is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(|s| s.trim().to_string()).collect()
    };
    Some((name.to_string(), params))
}

fn collect_braced(tokens: &[String], start: usize) -> Result<(Vec<String>, usize)> {
    let mut depth = 1usize;
    let mut body = Vec::new();
    let mut i = start;
    while i < tokens.len() {
        match tokens[i].as_str() {
            "{" => depth += 1,
            "}" => {
                depth -= 1;
                if depth == 0 {
                    return Ok((body, i + 1));
                }
            }
            _ => {}
        }
        body.push(tokens[i].clone());
        i += 1;
    }
    Err(Error::EvalFailure { code: "unterminated macro/block body (missing '}')".to_string(), position: start })
}

/// Separates macro and word *definitions* from the rest of the program,
/// returning the remaining (definition-free) token stream plus the two
/// lookup tables.
fn extract_definitions(tokens: &[String]) -> Result<(Vec<String>, HashMap<String, MacroDef>, HashMap<String, Vec<String>>)> {
    let mut macros = HashMap::new();
    let mut words = HashMap::new();
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let t = tokens[i].as_str();
        if t == ":" {
            let name = tokens
                .get(i + 1)
                .cloned()
                .ok_or_else(|| Error::EvalFailure { code: "word definition missing a name".to_string(), position: i })?;
            let mut j = i + 2;
            let mut body = Vec::new();
            while j < tokens.len() && tokens[j] != ";" {
                body.push(tokens[j].clone());
                j += 1;
            }
            if j >= tokens.len() {
                return Err(Error::EvalFailure { code: format!("word {name:?} missing terminating ';'"), position: i });
            }
            words.insert(name, body);
            i = j + 1;
            continue;
        }
        if let Some((name, params)) = parse_macro_header(t) {
            if tokens.get(i + 1).map(String::as_str) == Some("{") {
                let (body, next) = collect_braced(tokens, i + 2)?;
                macros.insert(name, MacroDef { params, body });
                i = next;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    Ok((out, macros, words))
}

fn parse_invocation(token: &str) -> Option<(String, Vec<String>)> {
    let open = token.find('(')?;
    if !token.ends_with(')') {
        return None;
    }
    let name = token[..open].to_string();
    let inner = &token[open + 1..token.len() - 1];
    let args = if inner.is_empty() { Vec::new() } else { inner.split(',').map(|s| s.trim().to_string()).collect() };
    Some((name, args))
}

fn substitute_once(
    tokens: &[String],
    macros: &HashMap<String, MacroDef>,
    words: &HashMap<String, Vec<String>>,
) -> Result<(Vec<String>, bool)> {
    let mut out = Vec::new();
    let mut changed = false;
    for token in tokens {
        if let Some((name, args)) = parse_invocation(token) {
            if let Some(def) = macros.get(&name) {
                if def.params.len() != args.len() {
                    return Err(Error::EvalFailure {
                        code: format!("macro {name:?} expects {} argument(s), got {}", def.params.len(), args.len()),
                        position: 0,
                    });
                }
                for body_token in &def.body {
                    match def.params.iter().position(|p| p == body_token) {
                        Some(idx) => {
                            let expanded = crate::vm::token::tokenize_raw(&args[idx])?;
                            out.extend(expanded);
                        }
                        None => out.push(body_token.clone()),
                    }
                }
                changed = true;
                continue;
            }
        }
        if let Some(body) = words.get(token.as_str()) {
            out.extend(body.iter().cloned());
            changed = true;
            continue;
        }
        out.push(token.clone());
    }
    Ok((out, changed))
}

/// Runs definition extraction once, then iterates substitution to a fixed
/// point (bounded, since a self-referential macro/word would otherwise
/// expand forever — the original spec doesn't describe recursive macros,
/// so a bound here is a safety net, not a feature).
pub fn expand(tokens: Vec<String>) -> Result<Vec<String>> {
    let (mut current, macros, words) = extract_definitions(&tokens)?;
    for _ in 0..16 {
        let (next, changed) = substitute_once(&current, &macros, &words)?;
        current = next;
        if !changed {
            break;
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::token::tokenize_raw;

    #[test]
    fn macro_expands_with_argument_substitution() {
        let tokens = tokenize_raw("double(x) { x x + } double(5)").unwrap();
        let expanded = expand(tokens).unwrap();
        assert_eq!(expanded, vec!["5", "5", "+"]);
    }

    #[test]
    fn word_definition_inlines_at_call_site() {
        let tokens = tokenize_raw(": square dup * ; 3 square").unwrap();
        let expanded = expand(tokens).unwrap();
        assert_eq!(expanded, vec!["3", "dup", "*"]);
    }

    #[test]
    fn plain_program_without_definitions_is_unchanged() {
        let tokens = tokenize_raw("$1 $2 +").unwrap();
        assert_eq!(expand(tokens).unwrap(), vec!["$1", "$2", "+"]);
    }
}
