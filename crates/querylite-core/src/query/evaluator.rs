/// Expression evaluator
///
/// Walks a compiled [`Expression`] once per row of a table. Field names are
/// resolved to column indices before the first row is touched, so an unknown
/// field fails even on an empty table. Aggregate calls reduce over every row
/// in scope the first time they are reached and the result is reused for all
/// other rows.
use super::ast::{AggregateFunction, BinaryOperator, Node, NodeId, UnaryOperator};
use super::compiler::Expression;
use super::functions;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;
use regex::Regex;
use std::collections::HashMap;

impl Expression {
    /// One value per row of `table`.
    pub fn evaluate(&self, table: &Table) -> Result<Vec<Value>> {
        let all: Vec<usize> = (0..table.len()).collect();
        self.evaluate_scoped(table, &all)
    }

    /// One value per listed row; aggregates reduce over exactly these rows.
    pub fn evaluate_scoped(&self, table: &Table, rows: &[usize]) -> Result<Vec<Value>> {
        if let Some(column) = table.field_index(self.text()) {
            return Ok(rows.iter().map(|&r| table.rows()[r][column].clone()).collect());
        }
        let mut evaluator = Evaluator::new(self, table, rows)?;
        rows.iter().map(|&r| evaluator.value_at(Some(r))).collect()
    }

    /// A single value for a group of rows, read at the group's first row.
    ///
    /// An empty group still evaluates aggregates (`count(*)` is 0); bare
    /// field references there yield null.
    pub fn evaluate_group(&self, table: &Table, rows: &[usize]) -> Result<Value> {
        if let Some(column) = table.field_index(self.text()) {
            return Ok(rows
                .first()
                .map_or(Value::Null, |&r| table.rows()[r][column].clone()));
        }
        let mut evaluator = Evaluator::new(self, table, rows)?;
        evaluator.value_at(rows.first().copied())
    }

    /// Evaluates the expression as a predicate over the listed rows.
    pub fn evaluate_predicate(&self, table: &Table, rows: &[usize]) -> Result<Vec<bool>> {
        self.evaluate_scoped(table, rows)?
            .iter()
            .map(truth)
            .collect()
    }
}

/// Compiles `text` and evaluates it against every row of `table`.
pub fn evaluate(table: &Table, text: &str) -> Result<Vec<Value>> {
    Expression::compile(text)?.evaluate(table)
}

/// Compiles `text` and evaluates it as a predicate against every row.
pub fn evaluate_predicate(table: &Table, text: &str) -> Result<Vec<bool>> {
    let all: Vec<usize> = (0..table.len()).collect();
    Expression::compile(text)?.evaluate_predicate(table, &all)
}

/// Truth value of a predicate result; null counts as false.
pub fn truth(value: &Value) -> Result<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Null => Ok(false),
        other => Err(Error::TypeMismatch(format!(
            "expected a boolean condition, got {}",
            other.type_name()
        ))),
    }
}

struct Evaluator<'a> {
    expression: &'a Expression,
    table: &'a Table,
    scope: &'a [usize],
    columns: HashMap<&'a str, usize>,
    aggregates: HashMap<NodeId, Value>,
    patterns: HashMap<(String, bool), Regex>,
}

impl<'a> Evaluator<'a> {
    fn new(expression: &'a Expression, table: &'a Table, scope: &'a [usize]) -> Result<Self> {
        let mut columns = HashMap::new();
        for node in expression.nodes() {
            if let Node::Field(name) = node {
                let index = table
                    .field_index(name)
                    .ok_or_else(|| Error::UnknownField(name.clone()))?;
                columns.insert(name.as_str(), index);
            }
        }
        Ok(Self {
            expression,
            table,
            scope,
            columns,
            aggregates: HashMap::new(),
            patterns: HashMap::new(),
        })
    }

    fn value_at(&mut self, row: Option<usize>) -> Result<Value> {
        self.eval(self.expression.root(), row)
    }

    fn eval(&mut self, id: NodeId, row: Option<usize>) -> Result<Value> {
        let expression: &'a Expression = self.expression;
        match expression.node(id) {
            Node::Literal(value) => Ok(value.clone()),
            Node::Field(name) => {
                let column = self
                    .columns
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| Error::UnknownField(name.clone()))?;
                Ok(row.map_or(Value::Null, |r| self.table.rows()[r][column].clone()))
            }
            Node::Star => Err(Error::Syntax("'*' is only valid in count(*)".to_string())),
            Node::List(_) => Err(Error::Syntax("unexpected list".to_string())),
            Node::Unary { op, operand } => {
                let value = self.eval(*operand, row)?;
                unary(*op, value)
            }
            Node::Binary { op, left, right } => {
                let l = self.eval(*left, row)?;
                let r = self.eval(*right, row)?;
                match op {
                    BinaryOperator::Like
                    | BinaryOperator::NotLike
                    | BinaryOperator::Regexp
                    | BinaryOperator::NotRegexp => self.pattern_match(*op, l, r),
                    _ => binary(*op, l, r),
                }
            }
            Node::Between {
                negated,
                expr,
                low,
                high,
            } => {
                let value = self.eval(*expr, row)?;
                let low = self.eval(*low, row)?;
                let high = self.eval(*high, row)?;
                match (value.compare(&low)?, value.compare(&high)?) {
                    (Some(lo), Some(hi)) => Ok(Value::Boolean((lo.is_ge() && hi.is_le()) != *negated)),
                    _ => Ok(Value::Null),
                }
            }
            Node::InList {
                negated,
                expr,
                list,
            } => {
                let value = self.eval(*expr, row)?;
                if value.is_null() {
                    return Ok(Value::Null);
                }
                let mut saw_null = false;
                for item in list {
                    let candidate = self.eval(*item, row)?;
                    if candidate.is_null() {
                        saw_null = true;
                    } else if value.equals(&candidate)? {
                        return Ok(Value::Boolean(!*negated));
                    }
                }
                Ok(if saw_null {
                    Value::Null
                } else {
                    Value::Boolean(*negated)
                })
            }
            Node::Call { name, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(*arg, row))
                    .collect::<Result<Vec<_>>>()?;
                functions::call(name, values)
            }
            Node::Aggregate { function, arg } => self.aggregate(id, *function, *arg),
            Node::Case {
                operand,
                branches,
                otherwise,
            } => {
                let subject = match operand {
                    Some(op) => Some(self.eval(*op, row)?),
                    None => None,
                };
                for (when, then) in branches {
                    let candidate = self.eval(*when, row)?;
                    let hit = match &subject {
                        Some(s) => !s.is_null() && s.equals(&candidate)?,
                        None => truth(&candidate)?,
                    };
                    if hit {
                        return self.eval(*then, row);
                    }
                }
                match otherwise {
                    Some(e) => self.eval(*e, row),
                    None => Ok(Value::Null),
                }
            }
            Node::Assign { value, .. } => self.eval(*value, row),
        }
    }

    fn aggregate(&mut self, id: NodeId, function: AggregateFunction, arg: NodeId) -> Result<Value> {
        if let Some(cached) = self.aggregates.get(&id) {
            return Ok(cached.clone());
        }
        let scope = self.scope;
        let result = if matches!(self.expression.node(arg), Node::Star) {
            Value::Integer(scope.len() as i64)
        } else {
            let mut values = Vec::with_capacity(scope.len());
            for &r in scope {
                let value = self.eval(arg, Some(r))?;
                if !value.is_null() {
                    values.push(value);
                }
            }
            reduce(function, values)?
        };
        self.aggregates.insert(id, result.clone());
        Ok(result)
    }

    fn pattern_match(&mut self, op: BinaryOperator, value: Value, pattern: Value) -> Result<Value> {
        let (subject, pattern) = match (value, pattern) {
            (Value::Null, _) | (_, Value::Null) => return Ok(Value::Null),
            (Value::String(s), Value::String(p)) => (s, p),
            (a, b) => {
                return Err(Error::TypeMismatch(format!(
                    "{} expects strings, got {} and {}",
                    op,
                    a.type_name(),
                    b.type_name()
                )))
            }
        };
        let like = matches!(op, BinaryOperator::Like | BinaryOperator::NotLike);
        let negated = matches!(op, BinaryOperator::NotLike | BinaryOperator::NotRegexp);
        let key = (pattern, like);
        if !self.patterns.contains_key(&key) {
            let source = if like {
                like_to_regex(&key.0)
            } else {
                format!("(?:{})$", key.0)
            };
            let regex = Regex::new(&source).map_err(|e| {
                Error::Syntax(format!("invalid pattern '{}': {}", key.0, e))
            })?;
            self.patterns.insert(key.clone(), regex);
        }
        let matched = self
            .patterns
            .get(&key)
            .is_some_and(|regex| regex.is_match(&subject));
        Ok(Value::Boolean(matched != negated))
    }
}

/// Translates a LIKE pattern into an anchored regular expression.
fn like_to_regex(pattern: &str) -> String {
    let mut out = String::from("(?s)^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('%') | Some('_')) => {
                if let Some(escaped) = chars.next() {
                    out.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

fn reduce(function: AggregateFunction, values: Vec<Value>) -> Result<Value> {
    if function == AggregateFunction::Count {
        return Ok(Value::Integer(values.len() as i64));
    }
    if values.is_empty() {
        return Ok(Value::Null);
    }
    match function {
        AggregateFunction::Sum | AggregateFunction::Avg => {
            if let Some(bad) = values.iter().find(|v| !v.is_numeric()) {
                return Err(Error::TypeMismatch(format!(
                    "{} expects numbers, got {}",
                    function,
                    bad.type_name()
                )));
            }
            let all_integer = values.iter().all(|v| matches!(v, Value::Integer(_)));
            if function == AggregateFunction::Sum && all_integer {
                let mut total: i64 = 0;
                for v in &values {
                    if let Value::Integer(i) = v {
                        total = total
                            .checked_add(*i)
                            .ok_or_else(|| Error::Domain("integer overflow in SUM".to_string()))?;
                    }
                }
                return Ok(Value::Integer(total));
            }
            let total: f64 = values.iter().filter_map(Value::as_f64).sum();
            if function == AggregateFunction::Sum {
                Ok(Value::Float(total))
            } else {
                Ok(Value::Float(total / values.len() as f64))
            }
        }
        AggregateFunction::Min | AggregateFunction::Max => {
            let mut iter = values.into_iter();
            let mut best = iter.next().unwrap_or(Value::Null);
            for value in iter {
                let ordering = value.compare(&best)?;
                let better = match function {
                    AggregateFunction::Min => ordering.is_some_and(|o| o.is_lt()),
                    _ => ordering.is_some_and(|o| o.is_gt()),
                };
                if better {
                    best = value;
                }
            }
            Ok(best)
        }
        AggregateFunction::Count => Ok(Value::Null),
    }
}

fn unary(op: UnaryOperator, value: Value) -> Result<Value> {
    match (op, value) {
        (_, Value::Null) => Ok(Value::Null),
        (UnaryOperator::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (UnaryOperator::Negate, Value::Integer(i)) => i
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| Error::Domain("integer overflow".to_string())),
        (UnaryOperator::Negate, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOperator::BitNot, Value::Integer(i)) => Ok(Value::Integer(!i)),
        (UnaryOperator::Binary, v) => Ok(Value::String(v.to_string())),
        (op, v) => Err(Error::TypeMismatch(format!(
            "cannot apply {} to {}",
            op,
            v.type_name()
        ))),
    }
}

fn binary(op: BinaryOperator, l: Value, r: Value) -> Result<Value> {
    use BinaryOperator::*;
    match op {
        Add | Sub | Mul | Div | IntDiv | Mod => arithmetic(op, l, r),
        BitXor | BitAnd | BitOr | Shl | Shr => bitwise(op, l, r),
        Eq | NullSafeEq => Ok(Value::Boolean(l.equals(&r)?)),
        Ne => Ok(Value::Boolean(!l.equals(&r)?)),
        Lt | Le | Gt | Ge => Ok(match l.compare(&r)? {
            None => Value::Null,
            Some(o) => Value::Boolean(match op {
                Lt => o.is_lt(),
                Le => o.is_le(),
                Gt => o.is_gt(),
                _ => o.is_ge(),
            }),
        }),
        Is => Ok(Value::Boolean(l == r)),
        IsNot => Ok(Value::Boolean(l != r)),
        And | Or | Xor => logical(op, &l, &r),
        Like | NotLike | Regexp | NotRegexp => Err(Error::InvalidOperation(format!(
            "{} needs a pattern cache",
            op
        ))),
    }
}

fn arithmetic(op: BinaryOperator, l: Value, r: Value) -> Result<Value> {
    use BinaryOperator::*;
    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }
    let (a, b) = match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(Error::TypeMismatch(format!(
                "cannot apply '{}' to {} and {}",
                op,
                l.type_name(),
                r.type_name()
            )))
        }
    };
    let overflow = || Error::Domain(format!("integer overflow in '{}'", op));
    match (op, &l, &r) {
        (Div, ..) => {
            if b == 0.0 {
                return Err(Error::Domain("division by zero".to_string()));
            }
            Ok(Value::Float(a / b))
        }
        (IntDiv, Value::Integer(x), Value::Integer(y)) => {
            if *y == 0 {
                return Err(Error::Domain("division by zero".to_string()));
            }
            x.checked_div(*y).map(Value::Integer).ok_or_else(overflow)
        }
        (IntDiv, ..) => {
            if b == 0.0 {
                return Err(Error::Domain("division by zero".to_string()));
            }
            Ok(Value::Integer((a / b).trunc() as i64))
        }
        (Mod, Value::Integer(x), Value::Integer(y)) => {
            if *y == 0 {
                return Err(Error::Domain("modulo by zero".to_string()));
            }
            x.checked_rem(*y).map(Value::Integer).ok_or_else(overflow)
        }
        (Mod, ..) => {
            if b == 0.0 {
                return Err(Error::Domain("modulo by zero".to_string()));
            }
            Ok(Value::Float(a % b))
        }
        (Add, Value::Integer(x), Value::Integer(y)) => {
            x.checked_add(*y).map(Value::Integer).ok_or_else(overflow)
        }
        (Sub, Value::Integer(x), Value::Integer(y)) => {
            x.checked_sub(*y).map(Value::Integer).ok_or_else(overflow)
        }
        (Mul, Value::Integer(x), Value::Integer(y)) => {
            x.checked_mul(*y).map(Value::Integer).ok_or_else(overflow)
        }
        (Add, ..) => Ok(Value::Float(a + b)),
        (Sub, ..) => Ok(Value::Float(a - b)),
        _ => Ok(Value::Float(a * b)),
    }
}

fn bitwise(op: BinaryOperator, l: Value, r: Value) -> Result<Value> {
    let (a, b) = match (&l, &r) {
        (Value::Null, _) | (_, Value::Null) => return Ok(Value::Null),
        (Value::Integer(a), Value::Integer(b)) => (*a, *b),
        _ => {
            return Err(Error::TypeMismatch(format!(
                "'{}' expects integers, got {} and {}",
                op,
                l.type_name(),
                r.type_name()
            )))
        }
    };
    let shift = |x: i64, left: bool| -> i64 {
        if !(0..64).contains(&b) {
            return 0;
        }
        if left {
            x << b
        } else {
            x >> b
        }
    };
    Ok(Value::Integer(match op {
        BinaryOperator::BitXor => a ^ b,
        BinaryOperator::BitAnd => a & b,
        BinaryOperator::BitOr => a | b,
        BinaryOperator::Shl => shift(a, true),
        _ => shift(a, false),
    }))
}

fn logical(op: BinaryOperator, l: &Value, r: &Value) -> Result<Value> {
    let as_bool = |v: &Value| -> Result<Option<bool>> {
        match v {
            Value::Boolean(b) => Ok(Some(*b)),
            Value::Null => Ok(None),
            other => Err(Error::TypeMismatch(format!(
                "{} expects booleans, got {}",
                op,
                other.type_name()
            ))),
        }
    };
    let (a, b) = (as_bool(l)?, as_bool(r)?);
    let result = match op {
        BinaryOperator::And => match (a, b) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BinaryOperator::Or => match (a, b) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        _ => match (a, b) {
            (Some(x), Some(y)) => Some(x != y),
            _ => None,
        },
    };
    Ok(result.map_or(Value::Null, Value::Boolean))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            ["a", "b", "name"],
            vec![
                vec![1.into(), 10.into(), "CCC".into()],
                vec![2.into(), 20.into(), "CC".into()],
                vec![3.into(), Value::Null, "A".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_one_value_per_row() {
        let table = sample();
        let values = evaluate(&table, "a * 2 + 1").unwrap();
        assert_eq!(values, vec![3.into(), 5.into(), 7.into()]);
    }

    #[test]
    fn test_aggregates_broadcast() {
        let table = sample();
        let values = evaluate(&table, "sum(a)").unwrap();
        assert_eq!(values, vec![6.into(), 6.into(), 6.into()]);
        let values = evaluate(&table, "a + max(a)").unwrap();
        assert_eq!(values, vec![4.into(), 5.into(), 6.into()]);
        assert_eq!(evaluate(&table, "count(b)").unwrap()[0], 2.into());
        assert_eq!(evaluate(&table, "count(*)").unwrap()[0], 3.into());
        assert_eq!(evaluate(&table, "avg(a)").unwrap()[0], Value::Float(2.0));
    }

    #[test]
    fn test_like_patterns() {
        let table = sample();
        assert_eq!(
            evaluate_predicate(&table, "name like '%'").unwrap(),
            vec![true, true, true]
        );
        assert_eq!(
            evaluate_predicate(&table, "name like 'A'").unwrap(),
            vec![false, false, true]
        );
        assert_eq!(
            evaluate_predicate(&table, "name like 'C_C'").unwrap(),
            vec![true, false, false]
        );
        assert_eq!(
            evaluate_predicate(&table, "name not like 'C%'").unwrap(),
            vec![false, false, true]
        );
    }

    #[test]
    fn test_like_escapes() {
        assert_eq!(like_to_regex(r"100\%"), "(?s)^100%$");
        assert_eq!(like_to_regex("a.b"), r"(?s)^a\.b$");
    }

    #[test]
    fn test_regexp_anchored_at_end() {
        let table = sample();
        assert_eq!(
            evaluate_predicate(&table, "name regexp 'C'").unwrap(),
            vec![true, true, false]
        );
        assert_eq!(
            evaluate_predicate(&table, "name regexp 'C$'").unwrap(),
            vec![true, true, false]
        );
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        let table = sample();
        assert!(matches!(evaluate(&table, "a / 0"), Err(Error::Domain(_))));
        assert!(matches!(evaluate(&table, "a % 0"), Err(Error::Domain(_))));
        assert!(matches!(evaluate(&table, "a div 0"), Err(Error::Domain(_))));
        assert_eq!(evaluate(&table, "a / 2").unwrap()[0], Value::Float(0.5));
        assert_eq!(evaluate(&table, "7 div 2").unwrap()[0], 3.into());
    }

    #[test]
    fn test_unknown_field_and_type_errors() {
        let table = sample();
        assert!(matches!(
            evaluate(&table, "nope + 1"),
            Err(Error::UnknownField(_))
        ));
        assert!(matches!(
            evaluate(&table, "name + 1"),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            evaluate_predicate(&table, "a + 1"),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_null_logic() {
        let table = sample();
        assert_eq!(
            evaluate(&table, "b > 5").unwrap(),
            vec![true.into(), true.into(), Value::Null]
        );
        assert_eq!(
            evaluate_predicate(&table, "b > 15 or a = 3").unwrap(),
            vec![false, true, true]
        );
        assert_eq!(
            evaluate_predicate(&table, "b is null").unwrap(),
            vec![false, false, true]
        );
    }

    #[test]
    fn test_in_between_case() {
        let table = sample();
        assert_eq!(
            evaluate_predicate(&table, "a in (1, 3)").unwrap(),
            vec![true, false, true]
        );
        assert_eq!(
            evaluate_predicate(&table, "a not between 2 and 3").unwrap(),
            vec![true, false, false]
        );
        assert_eq!(
            evaluate(&table, "case when a > 1 then 'big' else 'small' end").unwrap(),
            vec!["small".into(), "big".into(), "big".into()]
        );
        assert_eq!(
            evaluate(&table, "case a when 1 then 'one' end").unwrap(),
            vec!["one".into(), Value::Null, Value::Null]
        );
    }

    #[test]
    fn test_precedence_and_bitwise() {
        let table = sample();
        assert_eq!(evaluate(&table, "2 + 3 * 4").unwrap()[0], 14.into());
        assert_eq!(evaluate(&table, "(2 + 3) * 4").unwrap()[0], 20.into());
        assert_eq!(evaluate(&table, "1 << 2 | 1").unwrap()[0], 5.into());
        assert_eq!(evaluate(&table, "-a").unwrap()[2], (-3).into());
        assert_eq!(
            evaluate(&table, "true xor false").unwrap()[0],
            true.into()
        );
    }

    #[test]
    fn test_group_scope() {
        let table = sample();
        let expr = Expression::compile("sum(a)").unwrap();
        assert_eq!(expr.evaluate_group(&table, &[0, 2]).unwrap(), 4.into());
        assert_eq!(expr.evaluate_group(&table, &[]).unwrap(), Value::Null);
        let count = Expression::compile("count(*)").unwrap();
        assert_eq!(count.evaluate_group(&table, &[]).unwrap(), 0.into());
    }

    #[test]
    fn test_function_calls() {
        let table = sample();
        assert_eq!(
            evaluate(&table, "concat(name, '-', a)").unwrap()[0],
            "CCC-1".into()
        );
        assert_eq!(
            evaluate(&table, "lower(name) collate utf8_bin").unwrap()[1],
            "cc".into()
        );
    }

    #[test]
    fn test_null_safe_and_is_not() {
        let table = sample();
        assert_eq!(
            evaluate(&table, "b <=> null").unwrap(),
            vec![false.into(), false.into(), true.into()]
        );
        assert_eq!(
            evaluate(&table, "b <=> 20").unwrap(),
            vec![false.into(), true.into(), false.into()]
        );
        assert_eq!(
            evaluate_predicate(&table, "b is not null").unwrap(),
            vec![true, true, false]
        );
    }

    #[test]
    fn test_assignment_yields_its_value() {
        let table = sample();
        assert_eq!(
            evaluate(&table, "total := a + b").unwrap(),
            vec![11.into(), 22.into(), Value::Null]
        );
    }

    #[test]
    fn test_binary_and_bit_not() {
        let table = sample();
        assert_eq!(
            evaluate(&table, "binary a").unwrap(),
            vec!["1".into(), "2".into(), "3".into()]
        );
        assert_eq!(
            evaluate(&table, "~a").unwrap(),
            vec![(-2).into(), (-3).into(), (-4).into()]
        );
        assert_eq!(evaluate(&table, "~b").unwrap()[2], Value::Null);
    }

    #[test]
    fn test_symbolic_logical_operators() {
        let table = sample();
        assert_eq!(
            evaluate_predicate(&table, "a > 1 && name like 'C%'").unwrap(),
            vec![false, true, false]
        );
        assert_eq!(
            evaluate_predicate(&table, "a = 1 || b is null").unwrap(),
            vec![true, false, true]
        );
    }

    #[test]
    fn test_not_regexp() {
        let table = sample();
        assert_eq!(
            evaluate_predicate(&table, "name not regexp 'C'").unwrap(),
            vec![false, false, true]
        );
    }

    #[test]
    fn test_in_list_with_fields() {
        let table = sample();
        assert_eq!(
            evaluate(&table, "a in (b, 1)").unwrap(),
            vec![true.into(), false.into(), Value::Null]
        );
        assert_eq!(
            evaluate(&table, "a not in (b, 1)").unwrap(),
            vec![false.into(), true.into(), Value::Null]
        );
    }

    #[test]
    fn test_string_functions_in_expressions() {
        let table = sample();
        assert_eq!(
            evaluate(&table, "insert(name, 2, 1, 'xy')").unwrap(),
            vec!["CxyC".into(), "Cxy".into(), "A".into()]
        );
        assert_eq!(
            evaluate(&table, "locate('C', name, 2)").unwrap(),
            vec![2.into(), 2.into(), 0.into()]
        );
        assert_eq!(
            evaluate(&table, "locate('bar', 'foobarbar', a + 4)").unwrap(),
            vec![7.into(), 7.into(), 7.into()]
        );
    }
}
