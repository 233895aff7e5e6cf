// Catalog database module

pub mod migrations;
pub mod schema;

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::error::{MapperError, Result};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Open an existing catalog database
pub fn open_db(db_path: &Path) -> Result<Connection> {
    if !db_path.is_file() {
        return Err(MapperError::CatalogUnavailable(format!(
            "database not found: {}",
            db_path.display()
        )));
    }

    let conn = Connection::open(db_path)
        .map_err(|e| MapperError::CatalogUnavailable(format!("{}: {}", db_path.display(), e)))?;
    prepare_connection(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare_connection(&conn)?;
    Ok(conn)
}

fn prepare_connection(conn: &Connection) -> Result<()> {
    // Enable foreign keys (must be done per connection)
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    register_regexp(conn)?;

    migrations::run_migrations(conn)
        .map_err(|e| MapperError::CatalogUnavailable(e.to_string()))?;

    Ok(())
}

/// `x REGEXP y` calls regexp(y, x)
fn register_regexp(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            // Compiled once per statement, then reused for every row
            let regex: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> std::result::Result<_, BoxError> {
                Ok(Regex::new(vr.as_str()?)?)
            })?;
            let text: Option<String> = ctx.get(1)?;
            Ok(text.map_or(false, |t| regex.is_match(&t)))
        },
    )?;
    Ok(())
}
