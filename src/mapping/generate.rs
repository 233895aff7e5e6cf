// Mapping generation
// Seeds mapping entries for new media paths and merges them into an existing
// document without touching what an operator already edited.

use std::path::Path;

use super::source::{is_skipped_extension, Source};
use super::{MappingDocument, MappingEntry, PerformerEntry, SceneRecord};
use crate::error::Result;
use crate::parser::{FilenameParser, ParsedFilename};
use crate::report::Reporter;

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// New entries hold only a performer list
    pub performer_only: bool,
    pub parse_filenames: bool,
    pub filename_pattern: Option<String>,
    /// Fill still-empty fields of existing entries from the parser
    pub fill_blanks: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub added: usize,
    pub existing: usize,
    pub skipped: usize,
    pub refreshed: usize,
}

/// Enumerate `source` and merge into the document at `outfile`.
/// Nothing is written if the source cannot be enumerated.
pub fn generate(
    source: &Source,
    outfile: &Path,
    options: &GenerateOptions,
    reporter: &dyn Reporter,
) -> Result<GenerateSummary> {
    let parser = build_parser(options)?;
    let paths = source.enumerate()?;
    let mut doc = MappingDocument::load(outfile)?;

    let summary = merge_paths(&mut doc, &paths, parser.as_ref(), options, reporter);

    doc.save(outfile)?;
    reporter.info(&format!(
        "generated mapping {} ({} new, {} existing, {} skipped)",
        outfile.display(),
        summary.added,
        summary.existing,
        summary.skipped
    ));

    Ok(summary)
}

fn build_parser(options: &GenerateOptions) -> Result<Option<FilenameParser>> {
    if !options.parse_filenames {
        return Ok(None);
    }
    Ok(Some(FilenameParser::new(options.filename_pattern.as_deref())?))
}

/// Merge candidate paths into `doc`. Existing entries are kept as they are
/// unless `fill_blanks` asks for empty fields to be filled.
pub fn merge_paths(
    doc: &mut MappingDocument,
    paths: &[String],
    parser: Option<&FilenameParser>,
    options: &GenerateOptions,
    reporter: &dyn Reporter,
) -> GenerateSummary {
    let mut summary = GenerateSummary::default();

    for filepath in paths {
        let path = Path::new(filepath);
        if !path.is_file() || is_skipped_extension(path) {
            reporter.debug(&format!("skipping {}", filepath));
            summary.skipped += 1;
            continue;
        }

        let parsed = parser.and_then(|p| {
            let stem = path.file_stem()?.to_str()?;
            let parsed = p.parse(stem);
            reporter.debug(&format!("{}: {:?}", stem, parsed));
            parsed
        });

        if let Some(existing) = doc.get_mut(filepath) {
            summary.existing += 1;
            if options.fill_blanks {
                if let Some(parsed) = &parsed {
                    if fill_blanks(existing, parsed) {
                        summary.refreshed += 1;
                    }
                }
            }
            continue;
        }

        reporter.info(filepath);
        doc.insert_new(filepath.clone(), seed_entry(parsed.as_ref(), options.performer_only));
        summary.added += 1;
    }

    summary
}

/// New entry for a path, seeded from parsed filename fields when present
pub fn seed_entry(parsed: Option<&ParsedFilename>, performer_only: bool) -> MappingEntry {
    let mut performers: Vec<PerformerEntry> = parsed
        .map(|p| p.performers.iter().map(PerformerEntry::named).collect())
        .unwrap_or_default();

    if performers.is_empty() {
        performers.push(PerformerEntry::placeholder());
    }

    if performer_only {
        return MappingEntry::PerformerOnly(performers);
    }

    let mut record = SceneRecord::with_performers(performers);
    if let Some(parsed) = parsed {
        record.title = parsed.title.clone().unwrap_or_default();
        record.date = parsed.date.clone().unwrap_or_default();
    }
    MappingEntry::Scene(record)
}

/// Fill empty title/date and an all-placeholder performer list.
/// Never overwrites a non-empty value. Returns whether anything changed.
fn fill_blanks(entry: &mut MappingEntry, parsed: &ParsedFilename) -> bool {
    let mut changed = false;

    if let MappingEntry::Scene(record) = entry {
        if record.title.is_empty() {
            if let Some(title) = &parsed.title {
                record.title = title.clone();
                changed = true;
            }
        }
        if record.date.is_empty() {
            if let Some(date) = &parsed.date {
                record.date = date.clone();
                changed = true;
            }
        }
    }

    let performers = entry.performers_mut();
    if !parsed.performers.is_empty() && performers.iter().all(PerformerEntry::is_placeholder) {
        *performers = parsed.performers.iter().map(PerformerEntry::named).collect();
        changed = true;
    }

    changed
}
