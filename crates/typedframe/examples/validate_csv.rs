//! Example: coerce a CSV file into a table type from a schema file.
//!
//! Usage:
//!   cargo run --example validate_csv -- <schemas.json> <table> <file.csv>
//!
//! Set `RUST_LOG=debug` to see resolution and validation logs.

use std::env;

use typedframe::input::CsvReader;
use typedframe::{SchemaRegistry, TableBackend, Validator};

fn main() -> typedframe::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: cargo run --example validate_csv -- <schemas.json> <table> <file.csv>");
        std::process::exit(1);
    }

    let registry = SchemaRegistry::from_file(&args[1])?;
    let Some(table) = registry.get(&args[2]) else {
        eprintln!("Unknown table '{}'. Declared tables:", args[2]);
        for name in registry.names() {
            eprintln!("  {name}");
        }
        std::process::exit(1);
    };

    println!("Resolution chain: {}", table.chain_names().join(" -> "));
    let schema = table.effective_schema();
    for (name, dtype) in &schema.full {
        let kind = if schema.required.contains_key(name) { "required" } else { "optional" };
        println!("  {name}: {dtype} ({kind})");
    }

    let df = CsvReader::new().read_file(&args[3])?;
    println!("\nLoaded {} rows x {} columns", df.height(), df.width());

    let validator: Validator<TableBackend> = Validator::default();
    match validator.convert(&table, &df, true) {
        Ok(typed) => {
            println!("\nConverted to '{}':", typed.table().name());
            for (name, dtype) in typed.frame().dtypes() {
                println!("  {name}: {dtype}");
            }
        }
        Err(e) => {
            eprintln!("\n{e}");
            std::process::exit(2);
        }
    }

    Ok(())
}
