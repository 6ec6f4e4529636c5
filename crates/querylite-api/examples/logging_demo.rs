use querylite::logging::LogConfig;
use querylite::{Engine, MemoryFetcher, Table, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Debug level shows parsed clauses, source fetches and per-stage row counts
    let _guard = LogConfig::debug().init()?;

    println!("=== QueryLite Logging Demo ===\n");

    let stars = Table::from_rows(
        ["repo", "stars"],
        vec![
            vec![Value::from("core"), Value::from(120)],
            vec![Value::from("docs"), Value::from(8)],
        ],
    )?;
    let engine = Engine::new(MemoryFetcher::new().with_table("stars", stars));

    println!("1. A successful query...");
    let outcome = engine.query_timed("select repo from stars where stars > 10")?;
    println!("{}\n{}\n", outcome.table, outcome);

    println!("2. A failing query (logged at warn level)...");
    if let Err(e) = engine.query("select repo / 0 from stars") {
        println!("error: {}", e);
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
