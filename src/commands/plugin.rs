// Host plugin entry point
//
// The host writes one JSON object to stdin and reads one JSON result from
// stdout. Logging goes to stderr through the framed PluginReporter.

use std::io::{Read, Write};

use serde::Deserialize;
use serde_json::json;

use super::generate::{run_generate, GenerateParams};
use super::process::{run_process, ProcessParams};
use crate::catalog::{RemoteCatalog, ServerConnection};
use crate::config::Config;
use crate::error::Result;
use crate::report::Reporter;

#[derive(Debug, Deserialize)]
pub struct PluginInput {
    #[serde(default)]
    pub server_connection: Option<ServerConnection>,
    pub args: PluginArgs,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PluginArgs {
    Generate(GenerateParams),
    Process(ProcessParams),
}

/// Read the request from `input`, run it, and write the result to `output`.
/// Failures of the operation itself are reported in the result, not returned.
pub fn run_plugin<R: Read, W: Write>(
    input: R,
    mut output: W,
    config: &Config,
    reporter: &dyn Reporter,
) -> Result<()> {
    let result = serde_json::from_reader::<_, PluginInput>(input)
        .map_err(Into::into)
        .and_then(|request| dispatch(request, config, reporter));

    let response = match result {
        Ok(()) => {
            reporter.info("done");
            json!({ "output": "ok" })
        }
        Err(e) => {
            reporter.error(&e.to_string());
            json!({ "error": e.to_string() })
        }
    };

    writeln!(output, "{}", response)?;
    output.flush()?;
    Ok(())
}

fn dispatch(request: PluginInput, config: &Config, reporter: &dyn Reporter) -> Result<()> {
    match request.args {
        PluginArgs::Generate(params) => {
            reporter.info("mode: generate");
            run_generate(&params, &config.mapping_filename, reporter)?;
        }
        PluginArgs::Process(params) => {
            reporter.info("mode: process");
            let remote = request.server_connection.as_ref().map(RemoteCatalog::from_connection);
            let catalog = config.connect_catalog_with(remote)?;
            run_process(&params, catalog.as_ref(), reporter)?;
        }
    }
    Ok(())
}
