use querylite::{Engine, MemoryFetcher, OutputFormat, Table, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== QueryLite Query Demo ===\n");

    let repos = Table::from_rows(
        ["name", "language", "stars", "forks"],
        vec![
            vec!["abseil-cpp".into(), "C++".into(), Value::from(14000), Value::from(2400)],
            vec!["abseil-py".into(), "Python".into(), Value::from(2300), Value::from(250)],
            vec!["abseil-go".into(), "Go".into(), Value::from(800), Value::from(90)],
            vec!["abseil.github.io".into(), "HTML".into(), Value::from(800), Value::from(120)],
        ],
    )?;
    let engine = Engine::new(MemoryFetcher::new().with_table("abseil.repos", repos));

    let queries = [
        "select name, stars from abseil.repos order by stars desc limit 2",
        "select name, forks * 100 / stars from abseil.repos where name like 'abseil-%'",
        "select stars, count(*), concat_ws(',', min(name), max(name)) from abseil.repos group by stars",
        "select count(*), avg(stars), max(forks) from abseil.repos",
        "select name from (select name, language from abseil.repos where stars < 5000) \
         where language in ('Go', 'HTML')",
    ];

    for sql in queries {
        println!("> {}", sql);
        let outcome = engine.query_timed(sql)?;
        println!("{}", outcome.table);
        println!("{}\n", outcome);
    }

    let table = engine.query("select name, language from abseil.repos limit 2")?;
    for format in [OutputFormat::Csv, OutputFormat::Html] {
        println!("--- {} ---", format);
        println!("{}\n", engine.render(&table, format));
    }

    Ok(())
}
