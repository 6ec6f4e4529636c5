/// Lexer for expression text
///
/// Converts a clause-level expression (`a * (b - c) > 3`, `name like 'A%'`)
/// into a stream of tokens. String literals are read whole before any
/// operator matching, so operator characters inside quotes never split them.
use crate::error::{Error, Result};
use std::fmt;

/// Token types produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer literal
    Integer(i64),
    /// Float literal
    Float(f64),
    /// Quoted string, escapes resolved
    String(String),
    /// `true` or `false`
    Boolean(bool),
    /// `null`
    Null,

    /// Field or function name
    Identifier(String),

    // Symbol operators
    /// `!`
    Bang,
    /// `~`
    Tilde,
    /// `^`
    Caret,
    /// `*`
    Asterisk,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `=`
    Eq,
    /// `<=>`
    NullSafeEq,
    /// `!=` or `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `:=`
    Assign,

    // Word operators
    /// `div`
    Div,
    /// `mod`
    Mod,
    /// `is`
    Is,
    /// `like`
    Like,
    /// `regexp`
    Regexp,
    /// `in`
    In,
    /// `between`
    Between,
    /// `not`
    Not,
    /// `and`
    And,
    /// `xor`
    Xor,
    /// `or`
    Or,
    /// `interval`
    Interval,
    /// `binary`
    Binary,
    /// `collate`
    Collate,

    // CASE
    /// `case`
    Case,
    /// `when`
    When,
    /// `then`
    Then,
    /// `else`
    Else,
    /// `end`
    End,

    // Punctuation
    /// `,`
    Comma,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,

    // End of input
    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(i) => write!(f, "{}", i),
            Token::Float(fl) => write!(f, "{}", fl),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Boolean(b) => write!(f, "{}", b),
            Token::Null => write!(f, "NULL"),
            Token::Identifier(id) => write!(f, "{}", id),
            Token::Bang => write!(f, "!"),
            Token::Tilde => write!(f, "~"),
            Token::Caret => write!(f, "^"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Shl => write!(f, "<<"),
            Token::Shr => write!(f, ">>"),
            Token::Ampersand => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Eq => write!(f, "="),
            Token::NullSafeEq => write!(f, "<=>"),
            Token::Ne => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Assign => write!(f, ":="),
            Token::Div => write!(f, "DIV"),
            Token::Mod => write!(f, "MOD"),
            Token::Is => write!(f, "IS"),
            Token::Like => write!(f, "LIKE"),
            Token::Regexp => write!(f, "REGEXP"),
            Token::In => write!(f, "IN"),
            Token::Between => write!(f, "BETWEEN"),
            Token::Not => write!(f, "NOT"),
            Token::And => write!(f, "AND"),
            Token::Xor => write!(f, "XOR"),
            Token::Or => write!(f, "OR"),
            Token::Interval => write!(f, "INTERVAL"),
            Token::Binary => write!(f, "BINARY"),
            Token::Collate => write!(f, "COLLATE"),
            Token::Case => write!(f, "CASE"),
            Token::When => write!(f, "WHEN"),
            Token::Then => write!(f, "THEN"),
            Token::Else => write!(f, "ELSE"),
            Token::End => write!(f, "END"),
            Token::Comma => write!(f, ","),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Eof => write!(f, "end of expression"),
        }
    }
}

/// Multi-character operators, longest first so matching is greedy
const SYMBOLS: &[(&str, Token)] = &[
    ("<=>", Token::NullSafeEq),
    ("<=", Token::Le),
    ("<>", Token::Ne),
    ("<<", Token::Shl),
    (">=", Token::Ge),
    (">>", Token::Shr),
    ("!=", Token::Ne),
    ("&&", Token::AndAnd),
    ("||", Token::OrOr),
    (":=", Token::Assign),
    ("!", Token::Bang),
    ("~", Token::Tilde),
    ("^", Token::Caret),
    ("*", Token::Asterisk),
    ("/", Token::Slash),
    ("%", Token::Percent),
    ("+", Token::Plus),
    ("-", Token::Minus),
    ("&", Token::Ampersand),
    ("|", Token::Pipe),
    ("=", Token::Eq),
    ("<", Token::Lt),
    (">", Token::Gt),
    (",", Token::Comma),
    ("(", Token::LeftParen),
    (")", Token::RightParen),
];

/// Lexer state
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Create a new lexer from input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        if self.position >= self.input.len() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();

        if ch == '\'' || ch == '"' {
            return self.read_string(ch);
        }
        if ch == '`' {
            return self.read_quoted_identifier();
        }
        if ch.is_ascii_digit()
            || (ch == '.' && self.peek_char().is_some_and(|c| c.is_ascii_digit()))
        {
            return self.read_number();
        }
        if ch.is_alphabetic() || ch == '_' {
            return Ok(self.read_identifier_or_keyword());
        }

        for (text, token) in SYMBOLS {
            if self.starts_with(text) {
                self.position += text.chars().count();
                return Ok(token.clone());
            }
        }

        Err(Error::Syntax(format!("unexpected character '{}'", ch)))
    }

    /// Tokenize entire input into vector of tokens, ending with `Eof`
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn starts_with(&self, text: &str) -> bool {
        let mut pos = self.position;
        for c in text.chars() {
            if self.input.get(pos) != Some(&c) {
                return false;
            }
            pos += 1;
        }
        true
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let start = self.position;
        let mut has_dot = false;

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let num_str: String = self.input[start..self.position].iter().collect();

        if has_dot {
            num_str
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| Error::Syntax(format!("invalid number '{}'", num_str)))
        } else {
            num_str
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| Error::Syntax(format!("invalid number '{}'", num_str)))
        }
    }

    /// Reads a quoted literal. `\%` and `\_` keep their backslash so LIKE
    /// patterns can still tell them apart from wildcards.
    fn read_string(&mut self, quote: char) -> Result<Token> {
        self.advance(); // skip opening quote
        let mut string = String::new();

        loop {
            if self.position >= self.input.len() {
                return Err(Error::Syntax("unterminated string literal".to_string()));
            }
            let ch = self.current_char();
            self.advance();
            if ch == quote {
                break;
            }
            if ch != '\\' {
                string.push(ch);
                continue;
            }
            if self.position >= self.input.len() {
                return Err(Error::Syntax("unterminated string literal".to_string()));
            }
            let escaped = self.current_char();
            self.advance();
            match escaped {
                'n' => string.push('\n'),
                't' => string.push('\t'),
                'r' => string.push('\r'),
                '0' => string.push('\0'),
                '%' | '_' => {
                    string.push('\\');
                    string.push(escaped);
                }
                other => string.push(other),
            }
        }

        Ok(Token::String(string))
    }

    fn read_quoted_identifier(&mut self) -> Result<Token> {
        self.advance(); // skip opening backtick
        let start = self.position;

        while self.position < self.input.len() && self.current_char() != '`' {
            self.advance();
        }

        if self.position >= self.input.len() {
            return Err(Error::Syntax("unterminated quoted identifier".to_string()));
        }

        let name: String = self.input[start..self.position].iter().collect();
        self.advance(); // skip closing backtick
        Ok(Token::Identifier(name))
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let start = self.position;

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.input[start..self.position].iter().collect();
        keyword(&text).unwrap_or(Token::Identifier(text))
    }
}

/// Reserved words, matched case-insensitively
pub fn keyword(text: &str) -> Option<Token> {
    let token = match text.to_ascii_lowercase().as_str() {
        "div" => Token::Div,
        "mod" => Token::Mod,
        "is" => Token::Is,
        "like" => Token::Like,
        "regexp" => Token::Regexp,
        "in" => Token::In,
        "between" => Token::Between,
        "not" => Token::Not,
        "and" => Token::And,
        "xor" => Token::Xor,
        "or" => Token::Or,
        "interval" => Token::Interval,
        "binary" => Token::Binary,
        "collate" => Token::Collate,
        "case" => Token::Case,
        "when" => Token::When,
        "then" => Token::Then,
        "else" => Token::Else,
        "end" => Token::End,
        "true" => Token::Boolean(true),
        "false" => Token::Boolean(false),
        "null" => Token::Null,
        _ => return None,
    };
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            lex("a * (b - a_b)"),
            vec![
                Token::Identifier("a".to_string()),
                Token::Asterisk,
                Token::LeftParen,
                Token::Identifier("b".to_string()),
                Token::Minus,
                Token::Identifier("a_b".to_string()),
                Token::RightParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_greedy_operators() {
        assert_eq!(
            lex("<=> <= <> != && || := << >> < >"),
            vec![
                Token::NullSafeEq,
                Token::Le,
                Token::Ne,
                Token::Ne,
                Token::AndAnd,
                Token::OrOr,
                Token::Assign,
                Token::Shl,
                Token::Shr,
                Token::Lt,
                Token::Gt,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_operators_inside_strings_stay_literal() {
        assert_eq!(
            lex("c = 'a + b, (c)'"),
            vec![
                Token::Identifier("c".to_string()),
                Token::Eq,
                Token::String("a + b, (c)".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            lex("x NOT Like 'A%' And y iS null"),
            vec![
                Token::Identifier("x".to_string()),
                Token::Not,
                Token::Like,
                Token::String("A%".to_string()),
                Token::And,
                Token::Identifier("y".to_string()),
                Token::Is,
                Token::Null,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("42 3.5"),
            vec![Token::Integer(42), Token::Float(3.5), Token::Eof]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            lex(r#""it\'s" '50\%'"#),
            vec![
                Token::String("it's".to_string()),
                Token::String(r"50\%".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new("'open").tokenize().is_err());
        assert!(Lexer::new("a # b").tokenize().is_err());
    }
}
