// Reconciliation engine
//
// Walks a mapping document in order and, per entry:
//   scene lookup -> scene field push -> identity resolution -> performer attach
// Every step is failable on its own. A failure is logged and counted, and the
// loop moves on to the next field or entry.

pub mod performer;


use std::path::Path;

use crate::catalog::{Catalog, CatalogId, Scene, SceneUpdate};
use crate::error::{MapperError, Result};
use crate::mapping::{MappingDocument, PerformerEntry, SceneRecord};
use crate::report::Reporter;

pub use performer::create_performer_from_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Fill empty urls by exact performer name lookup
    pub url_from_name: bool,
    /// Create performers for urls the catalog does not know
    pub create_performers: bool,
    /// Write the document back after the pass
    pub update_mapfile: bool,
    /// Push scene fields and performer links into the catalog
    pub update_stash: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            url_from_name: false,
            create_performers: false,
            update_mapfile: true,
            update_stash: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub entries: usize,
    pub scenes_matched: usize,
    pub scenes_updated: usize,
    pub urls_filled: usize,
    pub performers_matched: usize,
    pub performers_created: usize,
    pub performers_failed: usize,
    pub performers_attached: usize,
    pub field_failures: usize,
}

/// What identity resolution did for one performer entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing to resolve (placeholder, or a name with lookups disabled)
    Skipped,
    UrlFilled,
    NoMatch,
    Matched(CatalogId),
    Created(CatalogId),
    Failed,
}

impl Resolution {
    fn performer_id(&self) -> Option<&CatalogId> {
        match self {
            Resolution::Matched(id) | Resolution::Created(id) => Some(id),
            _ => None,
        }
    }
}

/// Load `mapfile`, reconcile it, and save to `outfile` (or back in place)
/// when `update_mapfile` is set.
pub fn process_mapping(
    mapfile: &Path,
    outfile: Option<&Path>,
    catalog: &dyn Catalog,
    reporter: &dyn Reporter,
    options: &ProcessOptions,
) -> Result<ProcessSummary> {
    if !mapfile.is_file() {
        return Err(MapperError::SourceUnreadable(format!(
            "mapping file not found: {}",
            mapfile.display()
        )));
    }

    let mut doc = MappingDocument::load(mapfile)?;
    let summary = reconcile(&mut doc, catalog, reporter, options);

    if options.update_mapfile {
        let target = outfile.unwrap_or(mapfile);
        doc.save(target)?;
        reporter.info(&format!("saved mapping {}", target.display()));
    }

    reporter.info(&format!(
        "processed {} entries: {} scenes matched, {} urls filled, {} performers matched, {} created, {} failed, {} attached",
        summary.entries,
        summary.scenes_matched,
        summary.urls_filled,
        summary.performers_matched,
        summary.performers_created,
        summary.performers_failed,
        summary.performers_attached
    ));

    Ok(summary)
}

/// One in-memory pass over the document. Catalog failures never abort it.
pub fn reconcile(
    doc: &mut MappingDocument,
    catalog: &dyn Catalog,
    reporter: &dyn Reporter,
    options: &ProcessOptions,
) -> ProcessSummary {
    let mut summary = ProcessSummary::default();
    let total = doc.len();

    for (index, (path, entry)) in doc.iter_mut().enumerate() {
        summary.entries += 1;
        reporter.debug(&format!("processing {}", path));

        let scene = lookup_scene(catalog, path, reporter);
        if scene.is_some() {
            summary.scenes_matched += 1;
        }

        if let (Some(scene), Some(record), true) = (&scene, entry.scene(), options.update_stash) {
            push_scene_fields(catalog, scene, record, reporter, &mut summary);
        }

        let mut performer_ids: Vec<CatalogId> = Vec::new();
        for performer in entry.performers_mut().iter_mut() {
            let resolution = resolve_identity(catalog, performer, options, reporter);
            match &resolution {
                Resolution::UrlFilled => summary.urls_filled += 1,
                Resolution::Matched(_) => summary.performers_matched += 1,
                Resolution::Created(_) => summary.performers_created += 1,
                Resolution::Failed => summary.performers_failed += 1,
                Resolution::Skipped | Resolution::NoMatch => {}
            }
            if let Some(id) = resolution.performer_id() {
                if !performer_ids.contains(id) {
                    performer_ids.push(id.clone());
                }
            }
        }

        if let (Some(scene), true) = (&scene, options.update_stash) {
            summary.performers_attached += attach_performers(catalog, scene, &performer_ids, reporter);
        }

        reporter.progress((index + 1) as f64 / total as f64);
    }

    summary
}

/// Anchored so `/m/a.mp4` never matches `/backup/m/a.mp4` or `/m/a.mp4.part`
fn exact_path_pattern(path: &str) -> String {
    format!("^{}$", regex::escape(path))
}

fn lookup_scene(catalog: &dyn Catalog, path: &str, reporter: &dyn Reporter) -> Option<Scene> {
    match catalog.find_scenes_by_path(&exact_path_pattern(path)) {
        Ok(scenes) => {
            if scenes.len() > 1 {
                reporter.debug(&format!("{} scenes match {}, using the first", scenes.len(), path));
            }
            scenes.into_iter().next()
        }
        Err(e) => {
            reporter.warn(&format!("scene lookup failed for {}: {}", path, e));
            None
        }
    }
}

/// Push non-empty document fields to the matched scene. Studio and tags are
/// resolved by name; each that fails is skipped on its own.
fn push_scene_fields(
    catalog: &dyn Catalog,
    scene: &Scene,
    record: &SceneRecord,
    reporter: &dyn Reporter,
    summary: &mut ProcessSummary,
) {
    let mut update = SceneUpdate {
        title: non_empty(&record.title),
        date: non_empty(&record.date),
        url: non_empty(&record.url),
        details: record.details.as_deref().and_then(non_empty),
        studio_id: None,
    };

    if let Some(studio) = record.studio.as_deref().map(str::trim).and_then(non_empty) {
        match catalog.find_studio_by_name(&studio) {
            Ok(Some(found)) => update.studio_id = Some(found.id),
            Ok(None) => {
                let err = MapperError::CatalogFieldUnresolvable(format!("studio '{}' not found", studio));
                reporter.warn(&format!("{}: {}", scene.path, err));
                summary.field_failures += 1;
            }
            Err(e) => {
                reporter.warn(&format!("{}: studio lookup failed: {}", scene.path, e));
                summary.field_failures += 1;
            }
        }
    }

    if !update.is_empty() {
        match catalog.update_scene(&scene.id, &update) {
            Ok(()) => {
                reporter.info(&format!("updated scene {} ({})", scene.id, scene.path));
                summary.scenes_updated += 1;
            }
            Err(e) => {
                reporter.warn(&format!("{}: scene update failed: {}", scene.path, e));
                summary.field_failures += 1;
            }
        }
    }

    let tags = record.tags.as_deref().unwrap_or_default();
    let mut tag_ids: Vec<CatalogId> = Vec::new();
    for name in tags.iter().filter_map(|t| non_empty(t.trim())) {
        match catalog.find_or_create_tag(&name) {
            Ok(tag) => tag_ids.push(tag.id),
            Err(e) => {
                let err = MapperError::CatalogFieldUnresolvable(format!("tag '{}': {}", name, e));
                reporter.warn(&format!("{}: {}", scene.path, err));
                summary.field_failures += 1;
            }
        }
    }
    if !tag_ids.is_empty() {
        if let Err(e) = catalog.attach_tags_to_scene(&scene.id, &tag_ids) {
            reporter.warn(&format!("{}: tag attach failed: {}", scene.path, e));
            summary.field_failures += 1;
        }
    }
}

/// Resolve one performer entry against the catalog, mutating it in place
pub fn resolve_identity(
    catalog: &dyn Catalog,
    performer: &mut PerformerEntry,
    options: &ProcessOptions,
    reporter: &dyn Reporter,
) -> Resolution {
    if performer.url.is_empty() {
        if performer.name.is_empty() || !options.url_from_name {
            return Resolution::Skipped;
        }
        return match catalog.find_performer_by_name(&performer.name) {
            Ok(Some(found)) => match found.url {
                Some(url) => {
                    reporter.info(&format!("found url for {}: {}", performer.name, url));
                    performer.url = url;
                    Resolution::UrlFilled
                }
                None => {
                    reporter.debug(&format!("performer {} has no url in the catalog", performer.name));
                    Resolution::NoMatch
                }
            },
            Ok(None) => {
                reporter.debug(&format!("no performer named {}", performer.name));
                Resolution::NoMatch
            }
            Err(e) => {
                reporter.warn(&format!("name lookup failed for {}: {}", performer.name, e));
                Resolution::Failed
            }
        };
    }

    match catalog.find_performer_by_url(&performer.url) {
        Ok(Some(found)) => {
            if found.name != performer.name {
                reporter.info(&format!(
                    "performer at {} is named '{}' (was '{}')",
                    performer.url, found.name, performer.name
                ));
                performer.name = found.name;
            }
            Resolution::Matched(found.id)
        }
        Ok(None) if options.create_performers => {
            let name_override = (!performer.name.is_empty()).then_some(performer.name.as_str());
            match create_performer_from_url(catalog, &performer.url, name_override, reporter) {
                Ok((id, record)) => {
                    performer.name = record.name;
                    Resolution::Created(id)
                }
                Err(e) => {
                    reporter.error(&format!("could not create performer from {}: {}", performer.url, e));
                    Resolution::Failed
                }
            }
        }
        Ok(None) => {
            reporter.debug(&format!("no performer with url {}", performer.url));
            Resolution::NoMatch
        }
        Err(e) => {
            reporter.warn(&format!("url lookup failed for {}: {}", performer.url, e));
            Resolution::Failed
        }
    }
}

/// Attach resolved performers that are not linked yet; returns how many were new
fn attach_performers(
    catalog: &dyn Catalog,
    scene: &Scene,
    performer_ids: &[CatalogId],
    reporter: &dyn Reporter,
) -> usize {
    let new_ids: Vec<CatalogId> = performer_ids
        .iter()
        .filter(|id| !scene.performer_ids.contains(id))
        .cloned()
        .collect();
    if new_ids.is_empty() {
        return 0;
    }

    match catalog.attach_performers_to_scene(&scene.id, &new_ids) {
        Ok(()) => {
            reporter.info(&format!("attached {} performer(s) to {}", new_ids.len(), scene.path));
            new_ids.len()
        }
        Err(e) => {
            reporter.warn(&format!("{}: performer attach failed: {}", scene.path, e));
            0
        }
    }
}

/// Blank means unset; anything else is pushed exactly as written
fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
