// Directory workflows
//
// map_directory: one mapping file per media directory, generated on the
// first run and processed on every run after that.
// map_performer_directories: a root whose subdirectories are named after
// performers, kept as a performer-only mapping.

use std::path::Path;

use crate::catalog::Catalog;
use crate::error::{MapperError, Result};
use crate::mapping::generate::{generate, GenerateOptions, GenerateSummary};
use crate::mapping::source::{list_subdirectories, Source};
use crate::mapping::{MappingDocument, MappingEntry, PerformerEntry};
use crate::reconcile::{create_performer_from_url, process_mapping, ProcessOptions, ProcessSummary};
use crate::report::Reporter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryOutcome {
    Generated(GenerateSummary),
    Processed(ProcessSummary),
}

/// Generate `<dir>/<mapping_filename>` if it is missing, otherwise process it
/// in place. The catalog is only connected when there is something to process.
pub fn map_directory<F>(
    dir: &Path,
    mapping_filename: &str,
    generate_options: &GenerateOptions,
    process_options: &ProcessOptions,
    connect: F,
    reporter: &dyn Reporter,
) -> Result<DirectoryOutcome>
where
    F: FnOnce() -> Result<Box<dyn Catalog>>,
{
    if !dir.is_dir() {
        return Err(MapperError::SourceUnreadable(format!("invalid directory: {}", dir.display())));
    }

    let mapfile = dir.join(mapping_filename);
    if !mapfile.exists() {
        reporter.info(&format!("no mapping in {}, generating", dir.display()));
        let summary = generate(&Source::Directory(dir.to_path_buf()), &mapfile, generate_options, reporter)?;
        return Ok(DirectoryOutcome::Generated(summary));
    }

    let catalog = connect()?;
    let summary = process_mapping(&mapfile, None, catalog.as_ref(), reporter, process_options)?;
    Ok(DirectoryOutcome::Processed(summary))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformerDirSummary {
    pub added: usize,
    pub urls_filled: usize,
    pub created: usize,
    pub failed: usize,
    pub mismatched: usize,
}

/// Keep a performer-only mapping of `root`'s subdirectories in sync with the
/// catalog. Catalog names never overwrite the folder names here; a mismatch
/// is only reported.
pub fn map_performer_directories(
    root: &Path,
    mapping_filename: &str,
    catalog: &dyn Catalog,
    reporter: &dyn Reporter,
) -> Result<PerformerDirSummary> {
    let mapfile = root.join(mapping_filename);
    let mut doc = MappingDocument::load(&mapfile)?;
    let mut summary = PerformerDirSummary::default();

    for dir in list_subdirectories(root)? {
        let key = dir.to_string_lossy().to_string();
        reporter.info(&key);

        if !doc.contains(&key) {
            let dirname = dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            doc.insert_new(key, MappingEntry::PerformerOnly(vec![PerformerEntry::named(dirname)]));
            summary.added += 1;
            continue;
        }
        let Some(entry) = doc.get_mut(&key) else { continue };

        for performer in entry.performers_mut().iter_mut() {
            sync_performer(catalog, performer, reporter, &mut summary);
            reporter.debug(&format!("\t{} {}", performer.name, performer.url));
        }
    }

    doc.save(&mapfile)?;
    Ok(summary)
}

fn sync_performer(
    catalog: &dyn Catalog,
    performer: &mut PerformerEntry,
    reporter: &dyn Reporter,
    summary: &mut PerformerDirSummary,
) {
    if performer.name.is_empty() {
        return;
    }

    if performer.url.is_empty() {
        match catalog.find_performer_by_name(&performer.name) {
            Ok(Some(found)) => {
                if let Some(url) = found.url {
                    performer.url = url;
                    summary.urls_filled += 1;
                }
            }
            Ok(None) => {}
            Err(e) => reporter.warn(&format!("name lookup failed for {}: {}", performer.name, e)),
        }
        return;
    }

    match catalog.find_performer_by_url(&performer.url) {
        Ok(Some(found)) => {
            if found.name != performer.name {
                reporter.warn(&format!(
                    "existing performer name mismatch {} {}",
                    performer.name, found.name
                ));
                summary.mismatched += 1;
            }
        }
        Ok(None) => {
            reporter.debug(&format!("creating missing performer {}", performer.url));
            match create_performer_from_url(catalog, &performer.url, Some(performer.name.as_str()), reporter) {
                Ok(_) => summary.created += 1,
                Err(e) => {
                    reporter.warn(&format!("failed to create performer {}: {}", performer.url, e));
                    summary.failed += 1;
                }
            }
        }
        Err(e) => {
            reporter.warn(&format!("url lookup failed for {}: {}", performer.url, e));
            summary.failed += 1;
        }
    }
}
