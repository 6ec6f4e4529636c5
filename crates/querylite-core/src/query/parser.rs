/// Clause parser
///
/// Splits a tokenized query into its clauses and builds a [`Session`].
/// Clause bodies stay as expression text; they are compiled when the
/// session runs, once the source's fields are known.
use super::ordering::OrderDirection;
use super::session::{Session, Source};
use super::tokenizer::tokenize;
use crate::error::{Error, Result};
use tracing::debug;

/// Deepest chain of `FROM (select ...)` sources a query may contain
pub const MAX_NESTING_DEPTH: usize = 64;

/// Query clauses in their canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Clause {
    Select,
    From,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
}

impl Clause {
    fn from_keyword(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "select" => Some(Clause::Select),
            "from" => Some(Clause::From),
            "where" => Some(Clause::Where),
            "group" => Some(Clause::GroupBy),
            "having" => Some(Clause::Having),
            "order" => Some(Clause::OrderBy),
            "limit" => Some(Clause::Limit),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Clause::Select => "SELECT",
            Clause::From => "FROM",
            Clause::Where => "WHERE",
            Clause::GroupBy => "GROUP BY",
            Clause::Having => "HAVING",
            Clause::OrderBy => "ORDER BY",
            Clause::Limit => "LIMIT",
        }
    }
}

/// Parser for query text
pub struct Parser {
    tokens: Vec<String>,
    position: usize,
    depth: usize,
}

impl Parser {
    /// Create a new parser from query text
    pub fn new(input: &str) -> Result<Self> {
        Ok(Self::from_tokens(tokenize(input)?))
    }

    /// Create a parser over already tokenized text
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    fn nested(tokens: Vec<String>, depth: usize) -> Result<Self> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::Syntax("sub-queries nested too deeply".to_string()));
        }
        Ok(Self {
            tokens,
            position: 0,
            depth,
        })
    }

    /// Parse the query into a session
    pub fn parse(&mut self) -> Result<Session> {
        let clauses = self.split_clauses()?;

        let mut fields = Vec::new();
        let mut source = None;
        let mut condition = None;
        let mut group_by = Vec::new();
        let mut having = None;
        let mut order_by = Vec::new();
        let mut limit = None;

        for (clause, body) in clauses {
            if body.is_empty() {
                return Err(Error::Syntax(format!("empty {} clause", clause.name())));
            }
            match clause {
                Clause::Select => {
                    fields = split_items(&body.join(" "))?;
                    if fields.len() > 1 && fields.iter().any(|f| f == "*") {
                        return Err(Error::Syntax(
                            "'*' cannot be combined with other fields".to_string(),
                        ));
                    }
                }
                Clause::From => source = Some(parse_source(&body, self.depth)?),
                Clause::Where => condition = Some(body.join(" ")),
                Clause::GroupBy => group_by = split_items(&body.join(" "))?,
                Clause::Having => having = Some(body.join(" ")),
                Clause::OrderBy => {
                    order_by = split_items(&body.join(" "))?
                        .iter()
                        .map(|item| parse_order_item(item))
                        .collect::<Result<Vec<_>>>()?;
                }
                Clause::Limit => limit = Some(parse_limit(&body)?),
            }
        }

        let source =
            source.ok_or_else(|| Error::Syntax("missing FROM clause".to_string()))?;
        let session = Session {
            fields,
            source,
            condition,
            group_by,
            having,
            order_by,
            limit,
        };
        debug!(
            fields = ?session.fields,
            condition = ?session.condition,
            group_by = ?session.group_by,
            limit = ?session.limit,
            "parsed query"
        );
        Ok(session)
    }

    /// Groups tokens under the clause keyword that introduces them.
    fn split_clauses(&mut self) -> Result<Vec<(Clause, Vec<String>)>> {
        let first = self
            .current_token()
            .ok_or_else(|| Error::Syntax("empty query".to_string()))?;
        match Clause::from_keyword(first) {
            Some(Clause::Select) => {}
            Some(_) => {
                return Err(Error::Syntax(format!(
                    "query must start with SELECT, found '{}'",
                    first
                )))
            }
            None => {
                return Err(Error::NotImplemented(format!(
                    "unsupported command '{}'",
                    first
                )))
            }
        }
        self.advance();

        let mut clauses = vec![(Clause::Select, Vec::new())];
        while let Some(token) = self.current_token().map(str::to_string) {
            self.advance();
            let Some(clause) = Clause::from_keyword(&token) else {
                if let Some((_, body)) = clauses.last_mut() {
                    body.push(token);
                }
                continue;
            };
            if matches!(clause, Clause::GroupBy | Clause::OrderBy) {
                let has_by = self
                    .current_token()
                    .is_some_and(|t| t.eq_ignore_ascii_case("by"));
                if !has_by {
                    return Err(Error::Syntax(format!(
                        "expected {} after '{}'",
                        clause.name(),
                        token
                    )));
                }
                self.advance();
            }
            if let Some((previous, _)) = clauses.last() {
                if clause <= *previous {
                    return Err(Error::Syntax(format!(
                        "{} clause is duplicated or out of order",
                        clause.name()
                    )));
                }
            }
            clauses.push((clause, Vec::new()));
        }
        Ok(clauses)
    }

    fn current_token(&self) -> Option<&str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Parses query text in one call.
pub fn parse(input: &str) -> Result<Session> {
    Parser::new(input)?.parse()
}

/// Splits a clause body on commas that sit outside string literals and
/// outside parentheses.
pub fn split_items(text: &str) -> Result<Vec<String>> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == '\\' {
                if let Some(next) = chars.next() {
                    current.push(next);
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
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => items.push(take_item(&mut current)?),
            c => current.push(c),
        }
    }
    items.push(take_item(&mut current)?);
    Ok(items)
}

fn take_item(current: &mut String) -> Result<String> {
    let item = current.trim().to_string();
    current.clear();
    if item.is_empty() {
        return Err(Error::Syntax("empty item in list".to_string()));
    }
    Ok(item)
}

fn parse_source(body: &[String], depth: usize) -> Result<Source> {
    if split_items(&body.join(" "))?.len() > 1 {
        return Err(Error::NotImplemented("multi-source joins".to_string()));
    }
    let [token] = body else {
        return Err(Error::Syntax(format!(
            "unexpected tokens after source '{}'",
            body[0]
        )));
    };
    if let Some(inner) = token.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        let tokens = tokenize(inner)?;
        let is_query = tokens
            .first()
            .is_some_and(|t| t.eq_ignore_ascii_case("select"));
        if !is_query {
            return Err(Error::Syntax(
                "expected a sub-query inside parentheses".to_string(),
            ));
        }
        let session = Parser::nested(tokens, depth + 1)?.parse()?;
        return Ok(Source::Query(Box::new(session)));
    }
    Ok(Source::Label(token.clone()))
}

fn parse_order_item(item: &str) -> Result<(String, OrderDirection)> {
    let mut tokens = tokenize(item)?;
    let direction = match tokens.last().map(|t| t.to_ascii_lowercase()) {
        Some(d) if d == "asc" => OrderDirection::Asc,
        Some(d) if d == "desc" => OrderDirection::Desc,
        _ => return Ok((tokens.join(" "), OrderDirection::Asc)),
    };
    tokens.pop();
    let doubled = tokens
        .last()
        .is_some_and(|t| t.eq_ignore_ascii_case("asc") || t.eq_ignore_ascii_case("desc"));
    if tokens.is_empty() || doubled {
        return Err(Error::Syntax(format!("malformed ORDER BY item '{}'", item)));
    }
    Ok((tokens.join(" "), direction))
}

fn parse_limit(body: &[String]) -> Result<u64> {
    match body {
        [n] => n.parse::<u64>().map_err(|_| {
            Error::Syntax(format!("LIMIT expects a non-negative integer, found '{}'", n))
        }),
        _ => Err(Error::Syntax(
            "LIMIT expects a single non-negative integer".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let session = parse("SELECT name, description FROM abseil.repos").unwrap();
        assert_eq!(session.fields, vec!["name", "description"]);
        assert_eq!(session.source, Source::Label("abseil.repos".to_string()));
        assert_eq!(session.condition, None);
        assert_eq!(session.limit, None);
    }

    #[test]
    fn test_all_clauses() {
        let session = parse(
            "select g, count(*) from t where a > 1 and b = 'x, y' group by g \
             having count(*) > 1 order by g desc, count(*) limit 5",
        )
        .unwrap();
        assert_eq!(session.fields, vec!["g", "count(*)"]);
        assert_eq!(session.condition.as_deref(), Some("a > 1 and b = 'x, y'"));
        assert_eq!(session.group_by, vec!["g"]);
        assert_eq!(session.having.as_deref(), Some("count(*) > 1"));
        assert_eq!(
            session.order_by,
            vec![
                ("g".to_string(), OrderDirection::Desc),
                ("count(*)".to_string(), OrderDirection::Asc),
            ]
        );
        assert_eq!(session.limit, Some(5));
    }

    #[test]
    fn test_comma_split_respects_quotes_and_parens() {
        assert_eq!(
            split_items("concat(a,b), \"a,b\", c").unwrap(),
            vec!["concat(a,b)", "\"a,b\"", "c"]
        );
        assert!(matches!(split_items("a,,b"), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_wildcard() {
        assert_eq!(parse("select * from t").unwrap().fields, vec!["*"]);
        assert!(matches!(
            parse("select *, a from t"),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn test_nested_source() {
        let session = parse("select a from (select a, b from t where b > 2) limit 1").unwrap();
        match session.source {
            Source::Query(inner) => {
                assert_eq!(inner.fields, vec!["a", "b"]);
                assert_eq!(inner.source, Source::Label("t".to_string()));
                assert_eq!(inner.condition.as_deref(), Some("b > 2"));
            }
            other => panic!("expected a sub-query, got {:?}", other),
        }
    }

    #[test]
    fn test_leading_keyword() {
        assert!(matches!(
            parse("insert into t values (1)"),
            Err(Error::NotImplemented(_))
        ));
        assert!(matches!(parse("from t select a"), Err(Error::Syntax(_))));
        assert!(matches!(parse(""), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_clause_order() {
        assert!(matches!(
            parse("select a from t limit 1 where a > 1"),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(
            parse("select a from t where a > 1 where a < 3"),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(
            parse("select a from t group g"),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(parse("select a"), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_order_directions() {
        assert!(matches!(
            parse("select a from t order by a asc desc"),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(
            parse("select a from t order by desc"),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn test_limit_and_source_errors() {
        assert!(matches!(
            parse("select a from t limit -1"),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(
            parse("select a from t limit 1 2"),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(
            parse("select a from t, u"),
            Err(Error::NotImplemented(_))
        ));
        assert!(matches!(
            parse("select a from t u"),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn test_sub_query_nesting_limit() {
        let nested = |levels: usize| {
            format!(
                "{}select a from t{}",
                "select a from (".repeat(levels),
                ")".repeat(levels)
            )
        };
        assert!(parse(&nested(MAX_NESTING_DEPTH)).is_ok());
        assert!(matches!(
            parse(&nested(MAX_NESTING_DEPTH + 1)),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(parse(&nested(3000)), Err(Error::Syntax(_))));
    }
}
