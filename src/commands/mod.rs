// Mapper - Commands Module
// Operation entry points, organized by workflow. Front ends (CLI, plugin)
// collect parameters into these structs and call in.

pub mod directory;
pub mod generate;
pub mod plugin;
pub mod process;

pub use directory::{map_directory, map_performer_directories, DirectoryOutcome, PerformerDirSummary};
pub use generate::{run_generate, GenerateParams};
pub use plugin::{run_plugin, PluginInput};
pub use process::{run_process, ProcessParams};
