// SQLite-backed catalog
// Reads and writes the catalog database directly. Scraping needs a remote
// source, so it is delegated to an optional attached scraper.

use std::path::Path;

use rusqlite::Connection;

use super::{
    Catalog, CatalogId, NewPerformer, Performer, PerformerScraper, Scene, SceneUpdate,
    ScrapedPerformer, Studio, Tag,
};
use crate::db::{self, schema};
use crate::error::Result;

pub struct LocalCatalog {
    conn: Connection,
    scraper: Option<Box<dyn PerformerScraper>>,
}

impl LocalCatalog {
    /// Open an existing catalog database
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::from_connection(db::open_db(db_path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn, scraper: None }
    }

    pub fn with_scraper(mut self, scraper: Box<dyn PerformerScraper>) -> Self {
        self.scraper = Some(scraper);
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn scene_from_row(&self, row: schema::SceneRow) -> Result<Scene> {
        let performer_ids = schema::list_scene_performer_ids(&self.conn, row.id)?
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        Ok(Scene {
            id: row.id.to_string(),
            path: row.path,
            title: row.title,
            performer_ids,
        })
    }
}

fn to_performer(row: schema::PerformerRow) -> Performer {
    Performer {
        id: row.id.to_string(),
        name: row.name,
        url: row.url.filter(|u| !u.is_empty()),
    }
}

impl Catalog for LocalCatalog {
    fn find_performer_by_name(&self, name: &str) -> Result<Option<Performer>> {
        Ok(schema::find_performer_by_name(&self.conn, name)?.map(to_performer))
    }

    fn find_performer_by_url(&self, url: &str) -> Result<Option<Performer>> {
        Ok(schema::find_performer_by_url(&self.conn, url)?.map(to_performer))
    }

    fn create_performer(&self, performer: &NewPerformer) -> Result<CatalogId> {
        let id = schema::insert_performer(&self.conn, performer)?;
        Ok(id.to_string())
    }

    fn find_scenes_by_path(&self, path_pattern: &str) -> Result<Vec<Scene>> {
        schema::find_scenes_by_path_regex(&self.conn, path_pattern)?
            .into_iter()
            .map(|row| self.scene_from_row(row))
            .collect()
    }

    fn update_scene(&self, scene_id: &str, update: &SceneUpdate) -> Result<()> {
        schema::update_scene(&self.conn, schema::parse_id(scene_id)?, update)
    }

    fn attach_performers_to_scene(&self, scene_id: &str, performer_ids: &[CatalogId]) -> Result<()> {
        let scene_id = schema::parse_id(scene_id)?;
        let tx = self.conn.unchecked_transaction()?;
        for performer_id in performer_ids {
            schema::add_scene_performer(&tx, scene_id, schema::parse_id(performer_id)?)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn attach_tags_to_scene(&self, scene_id: &str, tag_ids: &[CatalogId]) -> Result<()> {
        let scene_id = schema::parse_id(scene_id)?;
        let tx = self.conn.unchecked_transaction()?;
        for tag_id in tag_ids {
            schema::add_scene_tag(&tx, scene_id, schema::parse_id(tag_id)?)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn find_or_create_tag(&self, name: &str) -> Result<Tag> {
        let id = schema::get_or_create_tag(&self.conn, name)?;
        Ok(Tag {
            id: id.to_string(),
            name: name.to_string(),
        })
    }

    fn find_studio_by_name(&self, name: &str) -> Result<Option<Studio>> {
        Ok(schema::get_studio_id(&self.conn, name)?.map(|id| Studio {
            id: id.to_string(),
            name: name.to_string(),
        }))
    }

    fn scrape_performer_from_url(&self, url: &str) -> Result<Option<ScrapedPerformer>> {
        match &self.scraper {
            Some(scraper) => scraper.scrape_performer_from_url(url),
            None => {
                log::debug!("no scraper attached to local catalog, skipping {}", url);
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for LocalCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCatalog")
            .field("has_scraper", &self.scraper.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_lookup_is_regex_with_escaping() {
        let catalog = LocalCatalog::in_memory().unwrap();
        schema::insert_scene(catalog.connection(), "/media/clip (1).mp4").unwrap();
        schema::insert_scene(catalog.connection(), "/media/clip 1.mp4").unwrap();

        let escaped = regex::escape("/media/clip (1).mp4");
        let scenes = catalog.find_scenes_by_path(&escaped).unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].path, "/media/clip (1).mp4");

        // Unescaped, the parens are a group and match the other file
        let scenes = catalog.find_scenes_by_path("/media/clip (1).mp4").unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].path, "/media/clip 1.mp4");
    }

    #[test]
    fn test_attach_is_union() {
        let catalog = LocalCatalog::in_memory().unwrap();
        let conn = catalog.connection();
        let scene_id = schema::insert_scene(conn, "/m/a.mp4").unwrap().to_string();
        let a = catalog.create_performer(&NewPerformer { name: "A".into(), ..Default::default() }).unwrap();
        let b = catalog.create_performer(&NewPerformer { name: "B".into(), ..Default::default() }).unwrap();

        catalog.attach_performers_to_scene(&scene_id, &[a.clone()]).unwrap();
        catalog.attach_performers_to_scene(&scene_id, &[a.clone(), b.clone()]).unwrap();

        let scene = catalog.find_scenes_by_path(&regex::escape("/m/a.mp4")).unwrap().remove(0);
        assert_eq!(scene.performer_ids, vec![a, b]);
    }

    #[test]
    fn test_sparse_update_keeps_other_fields() {
        let catalog = LocalCatalog::in_memory().unwrap();
        let conn = catalog.connection();
        let id = schema::insert_scene(conn, "/m/a.mp4").unwrap();

        let first = SceneUpdate { title: Some("T".into()), date: Some("2020-01-01".into()), ..Default::default() };
        catalog.update_scene(&id.to_string(), &first).unwrap();
        let second = SceneUpdate { url: Some("https://s/1".into()), ..Default::default() };
        catalog.update_scene(&id.to_string(), &second).unwrap();

        let row = schema::get_scene(conn, id).unwrap().unwrap();
        assert_eq!(row.title.as_deref(), Some("T"));
        assert_eq!(row.date.as_deref(), Some("2020-01-01"));
        assert_eq!(row.url.as_deref(), Some("https://s/1"));
    }

    #[test]
    fn test_find_or_create_tag_reuses_existing() {
        let catalog = LocalCatalog::in_memory().unwrap();
        let first = catalog.find_or_create_tag("outdoor").unwrap();
        let second = catalog.find_or_create_tag("outdoor").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scrape_without_scraper_is_none() {
        let catalog = LocalCatalog::in_memory().unwrap();
        assert!(catalog.scrape_performer_from_url("https://x/p").unwrap().is_none());
    }
}
