/// Static analysis over expression lists
///
/// Used by the session before any rows are fetched: which fields a query
/// needs from its source, and whether a select list is made only of
/// aggregates.
use super::ast::AggregateFunction;
use super::lexer::{Lexer, Token};
use crate::error::Result;

/// Field names referenced by `expressions`, in first-seen order.
///
/// A lone `*` anywhere in the list short-circuits to `["*"]`.
pub fn extract_fields<S: AsRef<str>>(expressions: &[S]) -> Result<Vec<String>> {
    if expressions.iter().any(|e| e.as_ref().trim() == "*") {
        return Ok(vec!["*".to_string()]);
    }
    let mut fields: Vec<String> = Vec::new();
    for expression in expressions {
        let tokens = Lexer::new(expression.as_ref()).tokenize()?;
        for (i, token) in tokens.iter().enumerate() {
            if let Some(name) = bare_identifier(&tokens, i, token) {
                if !fields.iter().any(|f| f == name) {
                    fields.push(name.to_string());
                }
            }
        }
    }
    Ok(fields)
}

/// Whether every expression reduces to aggregates and constants.
///
/// Aggregate calls are skipped whole, nested calls included; any bare
/// identifier left over means a per-row value is needed. At least one
/// aggregate call must appear.
pub fn is_all_aggregate<S: AsRef<str>>(expressions: &[S]) -> Result<bool> {
    let mut saw_aggregate = false;
    for expression in expressions {
        if expression.as_ref().trim() == "*" {
            return Ok(false);
        }
        let tokens = Lexer::new(expression.as_ref()).tokenize()?;
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            if let Token::Identifier(name) = token {
                if AggregateFunction::from_name(name).is_some()
                    && tokens.get(i + 1) == Some(&Token::LeftParen)
                {
                    saw_aggregate = true;
                    i = closing_paren(&tokens, i + 1);
                    continue;
                }
            }
            if bare_identifier(&tokens, i, token).is_some() {
                return Ok(false);
            }
            i += 1;
        }
    }
    Ok(saw_aggregate)
}

/// The name of an identifier token that refers to a field: not a function
/// name, an assignment target, or a collation name.
fn bare_identifier<'t>(tokens: &'t [Token], i: usize, token: &'t Token) -> Option<&'t str> {
    let Token::Identifier(name) = token else {
        return None;
    };
    if matches!(
        tokens.get(i + 1),
        Some(Token::LeftParen) | Some(Token::Assign)
    ) {
        return None;
    }
    if i > 0 && tokens[i - 1] == Token::Collate {
        return None;
    }
    Some(name)
}

/// Index just past the parenthesis closing the one at `open`.
fn closing_paren(tokens: &[Token], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_short_circuits() {
        assert_eq!(extract_fields(&["*", "a+b"]).unwrap(), vec!["*"]);
    }

    #[test]
    fn test_extract_fields() {
        let fields = extract_fields(&["a+b", "b-c"]).unwrap();
        assert_eq!(fields, vec!["a", "b", "c"]);
        let fields =
            extract_fields(&["concat(name, 'x y', `full name`)", "count(*)"]).unwrap();
        assert_eq!(fields, vec!["name", "full name"]);
        let fields = extract_fields(&["x := lower(s) collate utf8_bin"]).unwrap();
        assert_eq!(fields, vec!["s"]);
    }

    #[test]
    fn test_all_aggregate() {
        assert!(is_all_aggregate(&["avg(mycount+5)"]).unwrap());
        assert!(!is_all_aggregate(&["avg(mycount+5)+secondcount"]).unwrap());
        assert!(is_all_aggregate(&["count(*)", "max(a) - min(a)", "1"]).unwrap());
        assert!(!is_all_aggregate(&["1"]).unwrap());
        assert!(!is_all_aggregate(&["*"]).unwrap());
        assert!(!is_all_aggregate(&["lower(name)"]).unwrap());
    }
}
