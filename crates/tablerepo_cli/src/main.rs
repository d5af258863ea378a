//! CLI smoke entry point.
//!
//! # Responsibility
//! - Run one create/get/update/filter/count/delete pass through
//!   `tablerepo_core` against a throwaway table.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `tablerepo_cli [DB_PATH]`. Without a path the database lives in
//! memory. Set `TABLEREPO_LOG_DIR` to an absolute directory to enable file
//! logging.

use log::info;
use rusqlite::types::Value;
use rusqlite::Row;
use std::error::Error;
use tablerepo_core::{
    core_version, init_logging, open_db, open_db_in_memory, ColumnEq, FieldChanges,
    FilterOptions, LogConfig, Record, Repository, Sort, SqliteRepository,
};

const SMOKE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS smoke_contacts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    house TEXT NOT NULL
);
";

#[derive(Debug)]
struct Contact {
    id: i64,
    name: String,
    house: String,
}

impl Contact {
    fn new(name: &str, house: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            house: house.to_string(),
        }
    }
}

impl Record for Contact {
    const COLUMNS: &'static [&'static str] = &["name", "house"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            house: row.get("house")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.house.clone()),
        ]
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if let Some(dir) = std::env::var_os("TABLEREPO_LOG_DIR") {
        init_logging(&LogConfig::new(dir))?;
    }

    let handle = match std::env::args_os().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    handle.execute_batch(SMOKE_SCHEMA)?;
    let repo = SqliteRepository::<Contact>::try_new(&handle, "smoke_contacts")?;

    let arya = repo.create(&Contact::new("Arya", "Stark"))?;
    repo.create(&Contact::new("Sansa", "Stark"))?;
    let tyrion = repo.create(&Contact::new("Tyrion", "Lannister"))?;
    let loaded = repo.get(arya)?;
    println!("created id={} name={} house={}", loaded.id, loaded.name, loaded.house);

    repo.update(arya, &FieldChanges::<Contact>::new().set("name", "Jon".to_string()))?;
    println!("updated id={arya} name={}", repo.get(arya)?.name);

    let starks = ColumnEq::new("house", "Stark".to_string());
    let listed = repo.filter(
        Some(&starks),
        &[FilterOptions::limit(10).with_sort(Sort::asc("name"))],
    )?;
    let names: Vec<_> = listed.iter().map(|contact| contact.name.as_str()).collect();
    println!("filter house=Stark names={}", names.join(","));
    println!("count house=Stark {}", repo.count(Some(&starks))?);

    repo.delete(tyrion)?;
    println!(
        "deleted id={tyrion} not_found={}",
        repo.get(tyrion).is_err_and(|err| err.is_not_found())
    );

    info!("event=cli_smoke module=cli status=ok");
    println!("tablerepo_core version={}", core_version());
    Ok(())
}
