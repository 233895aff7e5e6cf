// Catalog collaborator
//
// The reconciliation engine only ever talks to the catalog through this
// trait. Two implementations ship: a local SQLite store and a GraphQL client
// for a running catalog server.

pub mod local;
pub mod remote;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub use local::LocalCatalog;
pub use remote::{RemoteCatalog, ServerConnection};

/// Catalog ids are opaque strings (GraphQL `ID`)
pub type CatalogId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performer {
    pub id: CatalogId,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: CatalogId,
    pub path: String,
    pub title: Option<String>,
    pub performer_ids: Vec<CatalogId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Studio {
    pub id: CatalogId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: CatalogId,
    pub name: String,
}

/// Sparse scene update: only `Some` fields change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio_id: Option<CatalogId>,
}

impl SceneUpdate {
    pub fn is_empty(&self) -> bool {
        *self == SceneUpdate::default()
    }
}

/// Normalized performer record used for creation.
/// Only allow-listed fields exist here; see `reconcile::performer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerformer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hair_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fake_tits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tattoos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piercings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Raw scraped performer payload, unvalidated
pub type ScrapedPerformer = Map<String, Value>;

/// External source of performer data keyed by profile URL
pub trait PerformerScraper {
    fn scrape_performer_from_url(&self, url: &str) -> Result<Option<ScrapedPerformer>>;
}

/// Operations the mapper needs from the catalog
pub trait Catalog {
    fn find_performer_by_name(&self, name: &str) -> Result<Option<Performer>>;

    fn find_performer_by_url(&self, url: &str) -> Result<Option<Performer>>;

    fn create_performer(&self, performer: &NewPerformer) -> Result<CatalogId>;

    /// `path_pattern` is a regex; callers escape literal paths
    fn find_scenes_by_path(&self, path_pattern: &str) -> Result<Vec<Scene>>;

    fn update_scene(&self, scene_id: &str, update: &SceneUpdate) -> Result<()>;

    /// Union semantics: already attached performers are left as they are
    fn attach_performers_to_scene(&self, scene_id: &str, performer_ids: &[CatalogId]) -> Result<()>;

    /// Union semantics, like performers
    fn attach_tags_to_scene(&self, scene_id: &str, tag_ids: &[CatalogId]) -> Result<()>;

    fn find_or_create_tag(&self, name: &str) -> Result<Tag>;

    fn find_studio_by_name(&self, name: &str) -> Result<Option<Studio>>;

    fn scrape_performer_from_url(&self, url: &str) -> Result<Option<ScrapedPerformer>>;
}
