/// Scalar function library
///
/// String positions are 1-based and counted in characters, following the
/// usual SQL argument order (`substring(str, pos, len)`, `left(str, n)`).
/// A null argument makes the result null, except in `concat_ws`, which
/// skips null values.
use crate::error::{Error, Result};
use crate::value::Value;
use std::cmp::Ordering;

/// Longest string, in bytes, a function may build. Larger results are null.
pub const MAX_RESULT_LENGTH: usize = 16 * 1024 * 1024;

/// Accepted argument counts of a scalar function: (min, max).
fn arity(name: &str) -> Option<(usize, Option<usize>)> {
    let bounds = match name {
        "concat" => (1, None),
        "concat_ws" => (2, None),
        "length" | "char_length" | "upper" | "ucase" | "lower" | "lcase" | "ascii" | "trim"
        | "ltrim" | "rtrim" | "reverse" | "abs" => (1, Some(1)),
        "left" | "right" | "instr" | "find_in_set" | "repeat" | "strcmp" => (2, Some(2)),
        "substring" | "substr" | "mid" | "locate" => (2, Some(3)),
        "replace" => (3, Some(3)),
        "insert" => (4, Some(4)),
        _ => return None,
    };
    Some(bounds)
}

/// Checks that `name` is a known scalar function taking `count` arguments.
pub fn check_arity(name: &str, count: usize) -> Result<()> {
    let (min, max) =
        arity(name).ok_or_else(|| Error::UnknownFunction(name.to_string()))?;
    if count < min || max.is_some_and(|m| count > m) {
        let expected = match max {
            Some(m) if m == min => format!("exactly {}", min),
            Some(m) => format!("{} to {}", min, m),
            None => format!("at least {}", min),
        };
        return Err(Error::Arity {
            function: name.to_string(),
            expected,
            found: count,
        });
    }
    Ok(())
}

/// Applies scalar function `name` to already evaluated arguments.
pub fn call(name: &str, args: Vec<Value>) -> Result<Value> {
    check_arity(name, args.len())?;

    if name == "concat_ws" {
        if args[0].is_null() {
            return Ok(Value::Null);
        }
        let separator = text(&args[0]);
        let parts: Vec<String> = args[1..]
            .iter()
            .filter(|v| !v.is_null())
            .map(text)
            .collect();
        return Ok(Value::String(parts.join(&separator)));
    }
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }

    let value = match name {
        "concat" => Value::String(args.iter().map(text).collect()),
        "length" => Value::Integer(text(&args[0]).len() as i64),
        "char_length" => Value::Integer(text(&args[0]).chars().count() as i64),
        "upper" | "ucase" => Value::String(text(&args[0]).to_uppercase()),
        "lower" | "lcase" => Value::String(text(&args[0]).to_lowercase()),
        "trim" => Value::String(text(&args[0]).trim_matches(' ').to_string()),
        "ltrim" => Value::String(text(&args[0]).trim_start_matches(' ').to_string()),
        "rtrim" => Value::String(text(&args[0]).trim_end_matches(' ').to_string()),
        "reverse" => Value::String(text(&args[0]).chars().rev().collect()),
        "ascii" => Value::Integer(text(&args[0]).bytes().next().map_or(0, i64::from)),
        "abs" => match &args[0] {
            Value::Integer(i) => Value::Integer(
                i.checked_abs()
                    .ok_or_else(|| Error::Domain("integer overflow in abs".to_string()))?,
            ),
            Value::Float(f) => Value::Float(f.abs()),
            other => return Err(mismatch(name, other)),
        },
        "left" => {
            let n = int(name, &args[1])?;
            Value::String(text(&args[0]).chars().take(n.max(0) as usize).collect())
        }
        "right" => {
            let s = text(&args[0]);
            let n = int(name, &args[1])?.max(0) as usize;
            let count = s.chars().count();
            Value::String(s.chars().skip(count.saturating_sub(n)).collect())
        }
        "substring" | "substr" | "mid" => {
            let len = match args.get(2) {
                Some(v) => Some(int(name, v)?),
                None => None,
            };
            Value::String(substring(&text(&args[0]), int(name, &args[1])?, len))
        }
        "replace" => {
            let (s, from, to) = (text(&args[0]), text(&args[1]), text(&args[2]));
            if from.is_empty() {
                Value::String(s)
            } else {
                let grown = s
                    .matches(from.as_str())
                    .count()
                    .checked_mul(to.len())
                    .and_then(|extra| extra.checked_add(s.len()));
                match grown {
                    Some(len) if len <= MAX_RESULT_LENGTH => Value::String(s.replace(&from, &to)),
                    _ => Value::Null,
                }
            }
        }
        "instr" => Value::Integer(position(&text(&args[0]), &text(&args[1]), 0)),
        "locate" => {
            let start = match args.get(2) {
                Some(v) => int(name, v)?,
                None => 1,
            };
            if start < 1 {
                Value::Integer(0)
            } else {
                Value::Integer(position(
                    &text(&args[1]),
                    &text(&args[0]),
                    (start - 1) as usize,
                ))
            }
        }
        "find_in_set" => {
            let (needle, list) = (text(&args[0]), text(&args[1]));
            let found = if needle.contains(',') || list.is_empty() {
                0
            } else {
                list.split(',')
                    .position(|item| item == needle)
                    .map_or(0, |i| i as i64 + 1)
            };
            Value::Integer(found)
        }
        "insert" => Value::String(insert(
            &text(&args[0]),
            int(name, &args[1])?,
            int(name, &args[2])?,
            &text(&args[3]),
        )),
        "repeat" => {
            let s = text(&args[0]);
            let n = usize::try_from(int(name, &args[1])?.max(0)).unwrap_or(usize::MAX);
            match s.len().checked_mul(n) {
                Some(len) if len <= MAX_RESULT_LENGTH => Value::String(s.repeat(n)),
                _ => Value::Null,
            }
        }
        "strcmp" => Value::Integer(match text(&args[0]).cmp(&text(&args[1])) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }),
        other => return Err(Error::UnknownFunction(other.to_string())),
    };
    Ok(value)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn int(function: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Float(f) => Ok(f.round() as i64),
        other => Err(mismatch(function, other)),
    }
}

fn mismatch(function: &str, value: &Value) -> Error {
    Error::TypeMismatch(format!(
        "{} does not accept a {} argument",
        function,
        value.type_name()
    ))
}

/// `pos` counts from 1; a negative `pos` counts back from the end, 0 yields "".
fn substring(s: &str, pos: i64, len: Option<i64>) -> String {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len() as i64;
    let start = match pos.cmp(&0) {
        Ordering::Greater => pos - 1,
        Ordering::Less => n + pos,
        Ordering::Equal => return String::new(),
    };
    if start < 0 || start >= n {
        return String::new();
    }
    let end = match len {
        None => n,
        Some(l) if l <= 0 => return String::new(),
        Some(l) => start.saturating_add(l).min(n),
    };
    chars[start as usize..end as usize].iter().collect()
}

/// 1-based character position of `needle` in `haystack` at or after
/// character offset `from`, or 0.
fn position(haystack: &str, needle: &str, from: usize) -> i64 {
    let byte_start = match haystack.char_indices().nth(from) {
        Some((b, _)) => b,
        None if from == haystack.chars().count() && needle.is_empty() => haystack.len(),
        None => return 0,
    };
    match haystack[byte_start..].find(needle) {
        Some(b) => haystack[..byte_start + b].chars().count() as i64 + 1,
        None => 0,
    }
}

fn insert(s: &str, pos: i64, len: i64, new: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len() as i64;
    if pos < 1 || pos > n {
        return s.to_string();
    }
    let start = pos - 1;
    let end = if len < 0 || start.saturating_add(len) > n {
        n
    } else {
        start + len
    };
    let mut out: String = chars[..start as usize].iter().collect();
    out.push_str(new);
    out.extend(&chars[end as usize..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn test_concat_family() {
        assert_eq!(
            call("concat", vec![s("a"), Value::Integer(1), s("b")]).unwrap(),
            s("a1b")
        );
        assert_eq!(call("concat", vec![s("a"), Value::Null]).unwrap(), Value::Null);
        assert_eq!(
            call("concat_ws", vec![s(","), s("a"), Value::Null, s("b")]).unwrap(),
            s("a,b")
        );
    }

    #[test]
    fn test_substring_positions() {
        assert_eq!(
            call("substring", vec![s("Quadratically"), Value::Integer(5)]).unwrap(),
            s("ratically")
        );
        assert_eq!(
            call(
                "substr",
                vec![s("Quadratically"), Value::Integer(5), Value::Integer(6)]
            )
            .unwrap(),
            s("ratica")
        );
        assert_eq!(
            call("mid", vec![s("Sakila"), Value::Integer(-3)]).unwrap(),
            s("ila")
        );
        assert_eq!(
            call("substring", vec![s("abc"), Value::Integer(0)]).unwrap(),
            s("")
        );
    }

    #[test]
    fn test_left_right() {
        assert_eq!(
            call("left", vec![s("foobarbar"), Value::Integer(5)]).unwrap(),
            s("fooba")
        );
        assert_eq!(
            call("right", vec![s("foobarbar"), Value::Integer(4)]).unwrap(),
            s("rbar")
        );
    }

    #[test]
    fn test_search_functions() {
        assert_eq!(
            call("instr", vec![s("foobarbar"), s("bar")]).unwrap(),
            Value::Integer(4)
        );
        assert_eq!(
            call("locate", vec![s("bar"), s("foobarbar"), Value::Integer(5)]).unwrap(),
            Value::Integer(7)
        );
        assert_eq!(
            call("locate", vec![s("xbar"), s("foobar")]).unwrap(),
            Value::Integer(0)
        );
        assert_eq!(
            call("find_in_set", vec![s("b"), s("a,b,c,d")]).unwrap(),
            Value::Integer(2)
        );
    }

    #[test]
    fn test_editing_functions() {
        assert_eq!(
            call(
                "insert",
                vec![s("Quadratic"), Value::Integer(3), Value::Integer(4), s("What")]
            )
            .unwrap(),
            s("QuWhattic")
        );
        assert_eq!(
            call(
                "insert",
                vec![s("Quadratic"), Value::Integer(-1), Value::Integer(4), s("What")]
            )
            .unwrap(),
            s("Quadratic")
        );
        assert_eq!(
            call("replace", vec![s("www.mysql.com"), s("w"), s("Ww")]).unwrap(),
            s("WwWwWw.mysql.com")
        );
        assert_eq!(
            call("repeat", vec![s("ab"), Value::Integer(3)]).unwrap(),
            s("ababab")
        );
    }

    #[test]
    fn test_misc() {
        assert_eq!(
            call("strcmp", vec![s("text"), s("text2")]).unwrap(),
            Value::Integer(-1)
        );
        assert_eq!(call("ascii", vec![s("dx")]).unwrap(), Value::Integer(100));
        assert_eq!(call("ascii", vec![s("")]).unwrap(), Value::Integer(0));
        assert_eq!(call("length", vec![s("é")]).unwrap(), Value::Integer(2));
        assert_eq!(call("char_length", vec![s("é")]).unwrap(), Value::Integer(1));
        assert_eq!(call("ucase", vec![s("abc")]).unwrap(), s("ABC"));
        assert_eq!(call("abs", vec![Value::Integer(-4)]).unwrap(), Value::Integer(4));
    }

    #[test]
    fn test_arity_and_unknown() {
        assert!(matches!(
            check_arity("left", 1),
            Err(Error::Arity { found: 1, .. })
        ));
        assert!(matches!(
            check_arity("frobnicate", 1),
            Err(Error::UnknownFunction(_))
        ));
        assert!(check_arity("concat", 5).is_ok());
        assert!(matches!(
            call("left", vec![s("abc"), s("x")]),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_oversized_results_are_null() {
        assert_eq!(
            call("repeat", vec![s("ab"), Value::Integer(i64::MAX)]).unwrap(),
            Value::Null
        );
        assert_eq!(
            call("repeat", vec![s("ab"), Value::Integer(10_000_000_000)]).unwrap(),
            Value::Null
        );
        assert_eq!(
            call("repeat", vec![s("ab"), Value::Integer(3)]).unwrap(),
            s("ababab")
        );
        assert_eq!(
            call("repeat", vec![s(""), Value::Integer(i64::MAX)]).unwrap(),
            s("")
        );

        let many = "a".repeat(4096);
        let long = "b".repeat(8192);
        assert_eq!(
            call("replace", vec![s(&many), s("a"), s(&long)]).unwrap(),
            Value::Null
        );
    }
}
