/// Tests for GROUP BY, HAVING, and aggregate functions
use querylite::{Engine, Error, MemoryFetcher, Table, Value};

fn engine() -> Engine<MemoryFetcher> {
    let commits = Table::from_rows(
        ["author", "repo", "additions", "deletions"],
        vec![
            vec!["ana".into(), "core".into(), 120.into(), 30.into()],
            vec!["bo".into(), "core".into(), 15.into(), Value::Null],
            vec!["ana".into(), "docs".into(), 40.into(), 2.into()],
            vec!["cy".into(), "docs".into(), 5.into(), 5.into()],
            vec!["ana".into(), "core".into(), 60.into(), 10.into()],
        ],
    )
    .unwrap();
    let points = Table::from_rows(
        ["a", "g"],
        vec![
            vec![1.into(), "x".into()],
            vec![2.into(), "x".into()],
            vec![5.into(), "y".into()],
        ],
    )
    .unwrap();
    Engine::new(
        MemoryFetcher::new()
            .with_table("commits", commits)
            .with_table("points", points),
    )
}

#[test]
fn test_group_sum_in_first_seen_order() {
    let table = engine()
        .query("select g, sum(a) from points group by g")
        .unwrap();
    assert_eq!(table.fields(), &["g", "sum(a)"]);
    assert_eq!(
        table.rows(),
        &[
            vec![Value::from("x"), Value::from(3)],
            vec![Value::from("y"), Value::from(5)],
        ]
    );
}

#[test]
fn test_aggregate_only_select_is_one_row() {
    let table = engine()
        .query("select count(*), count(deletions), sum(additions), min(author), max(additions) from commits")
        .unwrap();
    assert_eq!(
        table.rows(),
        &[vec![
            Value::from(5),
            Value::from(4),
            Value::from(240),
            Value::from("ana"),
            Value::from(120),
        ]]
    );
}

#[test]
fn test_avg_is_float() {
    let table = engine().query("select avg(a) from points").unwrap();
    assert_eq!(table.rows()[0][0], Value::Float(8.0 / 3.0));
}

#[test]
fn test_aggregate_over_expression() {
    let table = engine()
        .query("select avg(additions + 5) from commits where repo = 'docs'")
        .unwrap();
    assert_eq!(table.rows()[0][0], Value::Float(27.5));
}

#[test]
fn test_aggregate_over_filtered_empty_set() {
    let table = engine()
        .query("select count(*), sum(a) from points where a > 100")
        .unwrap();
    assert_eq!(table.rows(), &[vec![Value::from(0), Value::Null]]);
}

#[test]
fn test_having_filters_groups() {
    let table = engine()
        .query(
            "select author, count(*), sum(additions) from commits group by author \
             having count(*) > 1",
        )
        .unwrap();
    assert_eq!(
        table.rows(),
        &[vec![Value::from("ana"), Value::from(3), Value::from(220)]]
    );
}

#[test]
fn test_multi_key_grouping_with_order() {
    let table = engine()
        .query(
            "select repo, author, sum(additions - deletions) from commits \
             group by repo, author order by repo desc, author",
        )
        .unwrap();
    assert_eq!(
        table.rows(),
        &[
            vec![Value::from("docs"), Value::from("ana"), Value::from(38)],
            vec![Value::from("docs"), Value::from("cy"), Value::from(0)],
            vec![Value::from("core"), Value::from("ana"), Value::from(140)],
            vec![Value::from("core"), Value::from("bo"), Value::Null],
        ]
    );
}

#[test]
fn test_order_by_aggregate_label() {
    let table = engine()
        .query("select repo, count(*) from commits group by repo order by count(*) desc limit 1")
        .unwrap();
    assert_eq!(table.rows(), &[vec![Value::from("core"), Value::from(3)]]);
}

#[test]
fn test_aggregate_broadcast_in_row_projection() {
    let table = engine()
        .query("select a, a * 100 / sum(a) from points")
        .unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(
        table.get_vals("a * 100 / sum(a)").unwrap(),
        vec![
            Value::Float(12.5),
            Value::Float(25.0),
            Value::Float(62.5),
        ]
    );
}

#[test]
fn test_having_requires_grouping() {
    assert!(matches!(
        engine().query("select a from points having a > 1"),
        Err(Error::InvalidOperation(_))
    ));
}

#[test]
fn test_sum_of_strings_fails() {
    assert!(matches!(
        engine().query("select sum(author) from commits"),
        Err(Error::TypeMismatch(_))
    ));
}
