// Generate command

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{MapperError, Result};
use crate::mapping::generate::{generate, GenerateOptions, GenerateSummary};
use crate::mapping::source::Source;
use crate::report::Reporter;

/// Parameters for mapping generation. Exactly one source must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateParams {
    pub directory: Option<PathBuf>,
    pub input_zip: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub performer_only: bool,
    pub parse_filenames: bool,
    pub filename_pattern: Option<String>,
    pub fill_blanks: bool,
}

impl GenerateParams {
    pub fn source(&self) -> Result<Source> {
        let sources: Vec<Source> = [
            self.directory.clone().map(Source::Directory),
            self.input_zip.clone().map(Source::ExportArchive),
            self.input_dir.clone().map(Source::ExportDirectory),
        ]
        .into_iter()
        .flatten()
        .collect();

        match <[Source; 1]>::try_from(sources) {
            Ok([source]) => Ok(source),
            Err(found) if found.is_empty() => Err(MapperError::Config(
                "no source given (directory, input zip or input dir)".to_string(),
            )),
            Err(_) => Err(MapperError::Config("only one source may be given".to_string())),
        }
    }

    pub fn options(&self) -> GenerateOptions {
        GenerateOptions {
            performer_only: self.performer_only,
            parse_filenames: self.parse_filenames,
            filename_pattern: self.filename_pattern.clone().filter(|p| !p.trim().is_empty()),
            fill_blanks: self.fill_blanks,
        }
    }
}

/// Resolve source and output, then generate. Returns the file written.
pub fn run_generate(
    params: &GenerateParams,
    mapping_filename: &str,
    reporter: &dyn Reporter,
) -> Result<(PathBuf, GenerateSummary)> {
    let source = params.source()?;
    let outfile = params
        .output
        .clone()
        .unwrap_or_else(|| source.default_output(mapping_filename));

    reporter.debug(&format!("generating {} from {}", outfile.display(), source.location().display()));
    let summary = generate(&source, &outfile, &params.options(), reporter)?;
    Ok((outfile, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::RecordingReporter;
    use tempfile::TempDir;

    #[test]
    fn test_source_requires_exactly_one() {
        let none = GenerateParams::default();
        assert!(matches!(none.source(), Err(MapperError::Config(_))));

        let two = GenerateParams {
            directory: Some("/a".into()),
            input_zip: Some("/b.zip".into()),
            ..Default::default()
        };
        assert!(matches!(two.source(), Err(MapperError::Config(_))));

        let one = GenerateParams { input_zip: Some("/b.zip".into()), ..Default::default() };
        assert_eq!(one.source().unwrap(), Source::ExportArchive("/b.zip".into()));
    }

    #[test]
    fn test_default_output_lands_in_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("clip.mp4"), b"").unwrap();
        let reporter = RecordingReporter::default();

        let params = GenerateParams { directory: Some(tmp.path().to_path_buf()), ..Default::default() };
        let (outfile, summary) = run_generate(&params, "mapping.yaml", &reporter).unwrap();

        assert_eq!(outfile, tmp.path().join("mapping.yaml"));
        assert!(outfile.is_file());
        assert_eq!(summary.added, 1);
    }
}
