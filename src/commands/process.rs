// Process command

use std::path::PathBuf;

use serde::Deserialize;

use crate::catalog::Catalog;
use crate::error::{MapperError, Result};
use crate::reconcile::{process_mapping, ProcessOptions, ProcessSummary};
use crate::report::Reporter;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessParams {
    pub mapfile: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub url_from_name: bool,
    pub create_performers: bool,
    pub update_mapfile: bool,
    pub update_stash: bool,
}

impl Default for ProcessParams {
    fn default() -> Self {
        let options = ProcessOptions::default();
        Self {
            mapfile: None,
            output: None,
            url_from_name: options.url_from_name,
            create_performers: options.create_performers,
            update_mapfile: options.update_mapfile,
            update_stash: options.update_stash,
        }
    }
}

impl ProcessParams {
    pub fn options(&self) -> ProcessOptions {
        ProcessOptions {
            url_from_name: self.url_from_name,
            create_performers: self.create_performers,
            update_mapfile: self.update_mapfile,
            update_stash: self.update_stash,
        }
    }
}

pub fn run_process(
    params: &ProcessParams,
    catalog: &dyn Catalog,
    reporter: &dyn Reporter,
) -> Result<ProcessSummary> {
    let mapfile = params
        .mapfile
        .as_deref()
        .ok_or_else(|| MapperError::Config("no mapping file given".to_string()))?;

    process_mapping(mapfile, params.output.as_deref(), catalog, reporter, &params.options())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_only_update_mapfile() {
        let params: ProcessParams = serde_json::from_str(r#"{"mapfile": "/m/mapping.yaml"}"#).unwrap();
        assert_eq!(params.options(), ProcessOptions::default());
        assert!(params.options().update_mapfile);
        assert!(!params.options().update_stash);
    }

    #[test]
    fn test_missing_mapfile_is_config_error() {
        let catalog = crate::catalog::LocalCatalog::in_memory().unwrap();
        let reporter = crate::report::LogReporter;
        let err = run_process(&ProcessParams::default(), &catalog, &reporter).unwrap_err();
        assert!(matches!(err, MapperError::Config(_)));
    }
}
