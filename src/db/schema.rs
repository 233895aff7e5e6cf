// Catalog schema types and query helpers

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::catalog::{NewPerformer, SceneUpdate};
use crate::error::Result;

// ----- Performers -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformerRow {
    pub id: i64,
    pub name: String,
    pub url: Option<String>,
    pub disambiguation: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
}

const PERFORMER_COLUMNS: &str = "id, name, url, disambiguation, gender, birthdate";

fn performer_from_row(row: &Row<'_>) -> rusqlite::Result<PerformerRow> {
    Ok(PerformerRow {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        disambiguation: row.get(3)?,
        gender: row.get(4)?,
        birthdate: row.get(5)?,
    })
}

pub fn insert_performer(conn: &Connection, p: &NewPerformer) -> Result<i64> {
    conn.execute(
        "INSERT INTO performers (name, url, disambiguation, gender, birthdate, death_date,
                ethnicity, country, eye_color, hair_color, height, weight, measurements,
                fake_tits, career_length, tattoos, piercings, aliases, twitter, instagram,
                details, image)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                 ?17, ?18, ?19, ?20, ?21, ?22)",
        params![
            p.name,
            p.url,
            p.disambiguation,
            p.gender,
            p.birthdate,
            p.death_date,
            p.ethnicity,
            p.country,
            p.eye_color,
            p.hair_color,
            p.height,
            p.weight,
            p.measurements,
            p.fake_tits,
            p.career_length,
            p.tattoos,
            p.piercings,
            p.aliases,
            p.twitter,
            p.instagram,
            p.details,
            p.image,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Exact name match; the oldest record wins when names collide
pub fn find_performer_by_name(conn: &Connection, name: &str) -> Result<Option<PerformerRow>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM performers WHERE name = ?1 ORDER BY id LIMIT 1", PERFORMER_COLUMNS),
        params![name],
        performer_from_row,
    ).optional()?;
    Ok(result)
}

pub fn find_performer_by_url(conn: &Connection, url: &str) -> Result<Option<PerformerRow>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM performers WHERE url = ?1 ORDER BY id LIMIT 1", PERFORMER_COLUMNS),
        params![url],
        performer_from_row,
    ).optional()?;
    Ok(result)
}

pub fn count_performers(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM performers", [], |row| row.get(0))?;
    Ok(count)
}

// ----- Scenes -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRow {
    pub id: i64,
    pub path: String,
    pub title: Option<String>,
    pub date: Option<String>,
    pub url: Option<String>,
    pub details: Option<String>,
    pub studio_id: Option<i64>,
}

const SCENE_COLUMNS: &str = "id, path, title, date, url, details, studio_id";

fn scene_from_row(row: &Row<'_>) -> rusqlite::Result<SceneRow> {
    Ok(SceneRow {
        id: row.get(0)?,
        path: row.get(1)?,
        title: row.get(2)?,
        date: row.get(3)?,
        url: row.get(4)?,
        details: row.get(5)?,
        studio_id: row.get(6)?,
    })
}

pub fn insert_scene(conn: &Connection, path: &str) -> Result<i64> {
    conn.execute("INSERT INTO scenes (path) VALUES (?1)", params![path])?;
    Ok(conn.last_insert_rowid())
}

pub fn get_scene(conn: &Connection, id: i64) -> Result<Option<SceneRow>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM scenes WHERE id = ?1", SCENE_COLUMNS),
        params![id],
        scene_from_row,
    ).optional()?;
    Ok(result)
}

/// Scenes whose path matches a regex (via the registered REGEXP function)
pub fn find_scenes_by_path_regex(conn: &Connection, pattern: &str) -> Result<Vec<SceneRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM scenes WHERE path REGEXP ?1 ORDER BY id",
        SCENE_COLUMNS
    ))?;
    let scenes = stmt
        .query_map(params![pattern], scene_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(scenes)
}

/// Apply only the fields present in `update`
pub fn update_scene(conn: &Connection, id: i64, update: &SceneUpdate) -> Result<()> {
    let studio_id = match &update.studio_id {
        Some(s) => Some(parse_id(s)?),
        None => None,
    };

    conn.execute(
        "UPDATE scenes SET
            title = COALESCE(?1, title),
            date = COALESCE(?2, date),
            url = COALESCE(?3, url),
            details = COALESCE(?4, details),
            studio_id = COALESCE(?5, studio_id),
            updated_at = datetime('now')
         WHERE id = ?6",
        params![update.title, update.date, update.url, update.details, studio_id, id],
    )?;
    Ok(())
}

pub fn list_scene_performer_ids(conn: &Connection, scene_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT performer_id FROM scene_performers WHERE scene_id = ?1 ORDER BY performer_id",
    )?;
    let ids = stmt
        .query_map(params![scene_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(ids)
}

pub fn add_scene_performer(conn: &Connection, scene_id: i64, performer_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO scene_performers (scene_id, performer_id) VALUES (?1, ?2)",
        params![scene_id, performer_id],
    )?;
    Ok(())
}

pub fn list_scene_tag_names(conn: &Connection, scene_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name FROM scene_tags st JOIN tags t ON st.tag_id = t.id
         WHERE st.scene_id = ?1 ORDER BY t.name",
    )?;
    let names = stmt
        .query_map(params![scene_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

pub fn add_scene_tag(conn: &Connection, scene_id: i64, tag_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO scene_tags (scene_id, tag_id) VALUES (?1, ?2)",
        params![scene_id, tag_id],
    )?;
    Ok(())
}

// ----- Tags -----

pub fn get_tag_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let result = conn.query_row(
        "SELECT id FROM tags WHERE name = ?1",
        params![name],
        |row| row.get(0),
    ).optional()?;
    Ok(result)
}

pub fn get_or_create_tag(conn: &Connection, name: &str) -> Result<i64> {
    if let Some(id) = get_tag_id(conn, name)? {
        return Ok(id);
    }
    conn.execute("INSERT INTO tags (name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

// ----- Studios -----

pub fn insert_studio(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO studios (name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

pub fn get_studio_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let result = conn.query_row(
        "SELECT id FROM studios WHERE name = ?1",
        params![name],
        |row| row.get(0),
    ).optional()?;
    Ok(result)
}

/// Catalog ids travel as strings; the local store keys on integers
pub fn parse_id(id: &str) -> Result<i64> {
    id.parse::<i64>()
        .map_err(|_| crate::error::MapperError::Catalog(format!("invalid id: {}", id)))
}
