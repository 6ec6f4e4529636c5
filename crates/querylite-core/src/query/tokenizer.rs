/// Query tokenizer
///
/// Splits raw query text into whitespace-separated tokens while keeping
/// quoted literals and parenthesised spans intact, so `concat(a, b)` or
/// `'hello world'` each come out as a single token.
use crate::error::{Error, Result};

/// Quote and bracket aware query tokenizer
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
}

impl Tokenizer {
    /// Create a new tokenizer from query text
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the whole input, preserving the original text of each token
    pub fn tokenize(&mut self) -> Result<Vec<String>> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut quote: Option<char> = None;
        let mut depth = 0usize;

        while self.position < self.input.len() {
            let ch = self.current_char();
            self.advance();

            if let Some(q) = quote {
                current.push(ch);
                if ch == '\\' {
                    if self.position < self.input.len() {
                        current.push(self.current_char());
                        self.advance();
                    }
                } else if ch == q {
                    quote = None;
                }
                continue;
            }

            match ch {
                '\'' | '"' | '`' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                '(' => {
                    depth += 1;
                    current.push(ch);
                }
                ')' => {
                    if depth == 0 {
                        return Err(Error::Syntax(format!(
                            "unmatched ')' at position {}",
                            self.position - 1
                        )));
                    }
                    depth -= 1;
                    current.push(ch);
                }
                c if c.is_whitespace() && depth == 0 => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            }
        }

        if quote.is_some() {
            return Err(Error::Syntax("unterminated string literal".to_string()));
        }
        if depth > 0 {
            return Err(Error::Syntax("unclosed '('".to_string()));
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        Ok(tokens)
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn advance(&mut self) {
        self.position += 1;
    }
}

/// Tokenizes `input` in one call.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    Tokenizer::new(input).tokenize()
}
