// Remote catalog over the server's GraphQL API

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    Catalog, CatalogId, NewPerformer, Performer, PerformerScraper, Scene, SceneUpdate,
    ScrapedPerformer, Studio, Tag,
};
use crate::constants::{GRAPHQL_PATH, HTTP_TIMEOUT_SECS};
use crate::error::{MapperError, Result};

/// Connection details, as handed over by the host when running as a plugin
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConnection {
    #[serde(rename = "Scheme", default)]
    pub scheme: Option<String>,
    #[serde(rename = "Host", default)]
    pub host: Option<String>,
    #[serde(rename = "Port", default)]
    pub port: Option<u16>,
    #[serde(rename = "SessionCookie", default)]
    pub session_cookie: Option<SessionCookie>,
    #[serde(rename = "ApiKey", default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionCookie {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: Option<String>,
}

impl ServerConnection {
    pub fn base_url(&self) -> String {
        let scheme = self.scheme.as_deref().unwrap_or("http");
        let host = match self.host.as_deref() {
            // The server binds 0.0.0.0; connect locally
            None | Some("") | Some("0.0.0.0") => "localhost",
            Some(h) => h,
        };
        match self.port {
            Some(port) => format!("{}://{}:{}", scheme, host, port),
            None => format!("{}://{}", scheme, host),
        }
    }
}

const PERFORMER_FIELDS: &str = "id name url";
const SCENE_FIELDS: &str = "id title files { path } performers { id }";

pub struct RemoteCatalog {
    agent: ureq::Agent,
    endpoint: String,
    api_key: Option<String>,
    cookie: Option<String>,
}

impl RemoteCatalog {
    pub fn new(server_url: &str, api_key: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .timeout_read(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .timeout_write(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build();

        let base = server_url.trim_end_matches('/');
        let endpoint = if base.ends_with(GRAPHQL_PATH) {
            base.to_string()
        } else {
            format!("{}{}", base, GRAPHQL_PATH)
        };

        Self {
            agent,
            endpoint,
            api_key: api_key.filter(|k| !k.is_empty()),
            cookie: None,
        }
    }

    pub fn from_connection(conn: &ServerConnection) -> Self {
        let mut client = Self::new(&conn.base_url(), conn.api_key.clone());
        if let Some(cookie) = &conn.session_cookie {
            if let Some(value) = cookie.value.as_deref().filter(|v| !v.is_empty()) {
                let name = cookie.name.as_deref().unwrap_or("session");
                client.cookie = Some(format!("{}={}", name, value));
            }
        }
        client
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Cheap round trip to fail fast before any entry is processed
    pub fn check_connection(&self) -> Result<()> {
        self.query("query { version { version } }", json!({}))
            .map(|_| ())
            .map_err(|e| MapperError::CatalogUnavailable(format!("{}: {}", self.endpoint, e)))
    }

    fn query(&self, query: &str, variables: Value) -> Result<Value> {
        let mut request = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.set("ApiKey", key);
        }
        if let Some(cookie) = &self.cookie {
            request = request.set("Cookie", cookie);
        }

        let response = request.send_json(json!({ "query": query, "variables": variables }));
        let body: Value = match response {
            Ok(resp) => resp.into_json()?,
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                return Err(MapperError::Catalog(format!("graphql status {}: {}", code, text)));
            }
            Err(err) => return Err(MapperError::Catalog(format!("graphql request failed: {}", err))),
        };

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect();
                return Err(MapperError::Catalog(format!("graphql error: {}", messages.join("; "))));
            }
        }

        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }

    fn find_performer(&self, modifier_field: &str, value: &str) -> Result<Option<Performer>> {
        let query = format!(
            "query FindPerformers($filter: PerformerFilterType) {{
                findPerformers(performer_filter: $filter, filter: {{ per_page: 1 }}) {{
                    performers {{ {} }}
                }}
            }}",
            PERFORMER_FIELDS
        );
        let variables = json!({
            "filter": { modifier_field: { "value": value, "modifier": "EQUALS" } }
        });
        let data = self.query(&query, variables)?;
        let first = data
            .pointer("/findPerformers/performers/0")
            .cloned()
            .filter(|v| !v.is_null());
        first.map(parse_performer).transpose()
    }
}

#[derive(Debug, Deserialize)]
struct RawPerformer {
    id: String,
    name: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawScene {
    id: String,
    title: Option<String>,
    #[serde(default)]
    files: Vec<RawFile>,
    #[serde(default)]
    performers: Vec<RawId>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    path: String,
}

#[derive(Debug, Deserialize)]
struct RawId {
    id: String,
}

fn parse_performer(value: Value) -> Result<Performer> {
    let raw: RawPerformer = serde_json::from_value(value)?;
    Ok(Performer {
        id: raw.id,
        name: raw.name,
        url: raw.url.filter(|u| !u.is_empty()),
    })
}

fn parse_scene(value: Value) -> Result<Scene> {
    let raw: RawScene = serde_json::from_value(value)?;
    Ok(Scene {
        id: raw.id,
        path: raw.files.into_iter().next().map(|f| f.path).unwrap_or_default(),
        title: raw.title,
        performer_ids: raw.performers.into_iter().map(|p| p.id).collect(),
    })
}

fn id_at(data: &Value, pointer: &str) -> Result<CatalogId> {
    data.pointer(pointer)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| MapperError::Catalog(format!("response missing {}", pointer)))
}

impl Catalog for RemoteCatalog {
    fn find_performer_by_name(&self, name: &str) -> Result<Option<Performer>> {
        self.find_performer("name", name)
    }

    fn find_performer_by_url(&self, url: &str) -> Result<Option<Performer>> {
        self.find_performer("url", url)
    }

    fn create_performer(&self, performer: &NewPerformer) -> Result<CatalogId> {
        let data = self.query(
            "mutation PerformerCreate($input: PerformerCreateInput!) {
                performerCreate(input: $input) { id }
            }",
            json!({ "input": performer }),
        )?;
        id_at(&data, "/performerCreate/id")
    }

    fn find_scenes_by_path(&self, path_pattern: &str) -> Result<Vec<Scene>> {
        let query = format!(
            "query FindScenes($filter: SceneFilterType) {{
                findScenes(scene_filter: $filter, filter: {{ per_page: -1 }}) {{
                    scenes {{ {} }}
                }}
            }}",
            SCENE_FIELDS
        );
        let variables = json!({
            "filter": { "path": { "value": path_pattern, "modifier": "MATCHES_REGEX" } }
        });
        let data = self.query(&query, variables)?;
        let scenes = data
            .pointer("/findScenes/scenes")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        scenes.into_iter().map(parse_scene).collect()
    }

    fn update_scene(&self, scene_id: &str, update: &SceneUpdate) -> Result<()> {
        let mut input = serde_json::to_value(update)?;
        if let Value::Object(map) = &mut input {
            map.insert("id".to_string(), Value::String(scene_id.to_string()));
        }
        self.query(
            "mutation SceneUpdate($input: SceneUpdateInput!) {
                sceneUpdate(input: $input) { id }
            }",
            json!({ "input": input }),
        )?;
        Ok(())
    }

    fn attach_performers_to_scene(&self, scene_id: &str, performer_ids: &[CatalogId]) -> Result<()> {
        self.query(
            "mutation BulkSceneUpdate($input: BulkSceneUpdateInput!) {
                bulkSceneUpdate(input: $input) { id }
            }",
            json!({ "input": {
                "ids": [scene_id],
                "performer_ids": { "ids": performer_ids, "mode": "ADD" }
            }}),
        )?;
        Ok(())
    }

    fn attach_tags_to_scene(&self, scene_id: &str, tag_ids: &[CatalogId]) -> Result<()> {
        self.query(
            "mutation BulkSceneUpdate($input: BulkSceneUpdateInput!) {
                bulkSceneUpdate(input: $input) { id }
            }",
            json!({ "input": {
                "ids": [scene_id],
                "tag_ids": { "ids": tag_ids, "mode": "ADD" }
            }}),
        )?;
        Ok(())
    }

    fn find_or_create_tag(&self, name: &str) -> Result<Tag> {
        let data = self.query(
            "query FindTags($filter: TagFilterType) {
                findTags(tag_filter: $filter, filter: { per_page: 1 }) { tags { id name } }
            }",
            json!({ "filter": { "name": { "value": name, "modifier": "EQUALS" } } }),
        )?;
        if let Some(tag) = data.pointer("/findTags/tags/0").filter(|v| !v.is_null()) {
            return Ok(serde_json::from_value(tag.clone())?);
        }

        let data = self.query(
            "mutation TagCreate($input: TagCreateInput!) { tagCreate(input: $input) { id name } }",
            json!({ "input": { "name": name } }),
        )?;
        let tag = data
            .pointer("/tagCreate")
            .cloned()
            .ok_or_else(|| MapperError::Catalog("response missing /tagCreate".to_string()))?;
        Ok(serde_json::from_value(tag)?)
    }

    fn find_studio_by_name(&self, name: &str) -> Result<Option<Studio>> {
        let data = self.query(
            "query FindStudios($filter: StudioFilterType) {
                findStudios(studio_filter: $filter, filter: { per_page: 1 }) { studios { id name } }
            }",
            json!({ "filter": { "name": { "value": name, "modifier": "EQUALS" } } }),
        )?;
        data.pointer("/findStudios/studios/0")
            .filter(|v| !v.is_null())
            .map(|v| serde_json::from_value(v.clone()).map_err(MapperError::from))
            .transpose()
    }

    fn scrape_performer_from_url(&self, url: &str) -> Result<Option<ScrapedPerformer>> {
        PerformerScraper::scrape_performer_from_url(self, url)
    }
}

impl PerformerScraper for RemoteCatalog {
    fn scrape_performer_from_url(&self, url: &str) -> Result<Option<ScrapedPerformer>> {
        let data = self.query(
            "query ScrapePerformerURL($url: String!) {
                scrapePerformerURL(url: $url) {
                    name disambiguation gender url twitter instagram birthdate death_date
                    ethnicity country eye_color hair_color height weight measurements
                    fake_tits career_length tattoos piercings aliases details images
                }
            }",
            json!({ "url": url }),
        )?;
        match data.get("scrapePerformerURL") {
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            _ => Ok(None),
        }
    }
}

impl std::fmt::Debug for RemoteCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCatalog")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
