//! CLI walkthrough of the mapper lifecycle.
//!
//! # Responsibility
//! - Run one create/get/update/delete pass against SQLite and print each step.
//! - Keep output deterministic apart from generated timestamps.
//!
//! Usage: `swiftmap_cli [db-path] [log-level]`. Without a path the database
//! lives in memory; logs go to stderr.

use log::info;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use swiftmap_core::{
    init_logging, Adapter, Field, FieldMapping, FieldType, LogTarget, ResourceService, Scheme,
    SqliteDriver, SqliteOptions, Value,
};

fn now_ms() -> Value {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default();
    Value::Timestamp(millis)
}

fn user_scheme() -> Result<Arc<Scheme>, Box<dyn std::error::Error>> {
    Ok(Scheme::new(
        "users",
        vec![
            Field::new("id", FieldType::Integer).serial(),
            Field::new("name", FieldType::Text),
            Field::new("email", FieldType::Text),
            Field::new("active", FieldType::Boolean).default_value(true),
            Field::new("created", FieldType::Timestamp).default_with(now_ms),
            Field::new("optional", FieldType::Text).default_value("woot"),
        ],
    )?)
}

fn run(db_path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let options = match db_path {
        Some(path) => SqliteOptions::file(path),
        None => SqliteOptions::in_memory(),
    }
    .with_trace(true);

    let users = user_scheme()?;
    let driver = SqliteDriver::open(&options)?;
    driver.migrate(&users)?;
    let adapter = Adapter::new(driver);
    let service = ResourceService::new(&adapter, Arc::clone(&users));

    let apple = service.create(
        FieldMapping::new()
            .with("name", "Apple Arthurton")
            .with("email", "apple@arthurton.local"),
    )?;
    let benny = service.create(
        FieldMapping::new()
            .with("name", "Benny Arthurton")
            .with("email", "benny@arthurton.local"),
    )?;
    println!("created {apple:?}");
    println!("created {benny:?}");

    let id = apple.get("id").cloned().ok_or("serial id was not assigned")?;
    let loaded = service
        .get(&FieldMapping::new().with("id", id.clone()))?
        .ok_or("created user not found")?;
    println!("loaded  {loaded:?}");

    let mut updated = service.update(loaded, FieldMapping::new().with("name", "Jimmy Arthurton"))?;
    println!("updated {updated:?}");

    let removed = service.destroy(&mut updated)?;
    println!("deleted removed={removed} state={:?}", updated.state());
    println!(
        "after delete get={:?}",
        service.get(&FieldMapping::new().with("id", id))?
    );

    info!(
        "event=cli_run module=cli status=ok cached_statements={}",
        adapter.cached_statements()
    );
    Ok(())
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let db_path = args.next();
    let level = args
        .next()
        .unwrap_or_else(|| swiftmap_core::default_log_level().to_string());

    if let Err(err) = init_logging(&level, LogTarget::Stderr) {
        eprintln!("logging disabled: {err}");
    }
    println!("swiftmap_core version={}", swiftmap_core::core_version());

    match run(db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
