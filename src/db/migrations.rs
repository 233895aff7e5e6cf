// Catalog database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.

use rusqlite::Connection;
use anyhow::Result;

/// All migrations in order. Each migration is a SQL string.
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS studios (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS performers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        url TEXT,
        disambiguation TEXT,
        gender TEXT CHECK (gender IS NULL OR gender IN
            ('MALE', 'FEMALE', 'TRANSGENDER_MALE', 'TRANSGENDER_FEMALE', 'INTERSEX', 'NON_BINARY')),
        birthdate TEXT,
        death_date TEXT,
        ethnicity TEXT,
        country TEXT,
        eye_color TEXT,
        hair_color TEXT,
        height TEXT,
        weight TEXT,
        measurements TEXT,
        fake_tits TEXT,
        career_length TEXT,
        tattoos TEXT,
        piercings TEXT,
        aliases TEXT,
        twitter TEXT,
        instagram TEXT,
        details TEXT,
        image TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS scenes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        path TEXT NOT NULL UNIQUE,
        title TEXT,
        date TEXT,
        url TEXT,
        details TEXT,
        studio_id INTEGER REFERENCES studios(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS scene_performers (
        scene_id INTEGER NOT NULL REFERENCES scenes(id) ON DELETE CASCADE,
        performer_id INTEGER NOT NULL REFERENCES performers(id) ON DELETE CASCADE,
        PRIMARY KEY (scene_id, performer_id)
    );

    CREATE TABLE IF NOT EXISTS scene_tags (
        scene_id INTEGER NOT NULL REFERENCES scenes(id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (scene_id, tag_id)
    );

    CREATE INDEX IF NOT EXISTS idx_performers_name ON performers(name);
    CREATE INDEX IF NOT EXISTS idx_performers_url ON performers(url);
    CREATE INDEX IF NOT EXISTS idx_scene_performers_performer ON scene_performers(performer_id);
    CREATE INDEX IF NOT EXISTS idx_scene_tags_tag ON scene_tags(tag_id);
    "#,
];

/// Get current schema version from database
fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row(
        "PRAGMA user_version",
        [],
        |row| row.get(0)
    )?;
    Ok(version)
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    // Refuse to open a catalog created by a newer build
    if current_version > target_version {
        anyhow::bail!(
            "Catalog schema version {} is newer than this build supports (max {})",
            current_version,
            target_version
        );
    }

    if current_version == target_version {
        return Ok(());
    }

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        conn.execute_batch(migration)?;
        conn.execute_batch(&format!("PRAGMA user_version = {}", migration_version))?;

        log::info!("Applied catalog migration {}", migration_version);
    }

    Ok(())
}
