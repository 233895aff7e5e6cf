// Metadata Mapper CLI binary

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};

use metadata_mapper::commands::{
    map_directory, map_performer_directories, run_generate, run_plugin, run_process,
    DirectoryOutcome, GenerateParams, ProcessParams,
};
use metadata_mapper::config::Config;
use metadata_mapper::mapping::generate::{GenerateOptions, GenerateSummary};
use metadata_mapper::reconcile::{ProcessOptions, ProcessSummary};
use metadata_mapper::report::{LogLevel, LogReporter, PluginReporter};

#[derive(Parser)]
#[command(name = "mapper")]
#[command(about = "Map media files to scenes and performers in a catalog", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, 1 (trace) to 5 (error)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate or extend a mapping file from a source
    Generate(GenerateArgs),

    /// Reconcile a mapping file against the catalog
    Process {
        /// Mapping file to process
        mapfile: PathBuf,
        /// Write the processed mapping here instead of in place
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        catalog: CatalogArgs,
        #[command(flatten)]
        flags: ProcessFlags,
    },

    /// Generate a directory's mapping on first run, process it afterwards
    MapDir {
        dir: PathBuf,
        #[command(flatten)]
        seed: SeedArgs,
        #[command(flatten)]
        catalog: CatalogArgs,
        #[command(flatten)]
        flags: ProcessFlags,
    },

    /// Sync a root of per-performer directories with the catalog
    Performers {
        root: PathBuf,
        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Run as a host plugin (JSON request on stdin)
    Plugin,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["directory", "input_zip", "input_dir"])
))]
struct GenerateArgs {
    /// Directory of media files
    #[arg(long)]
    directory: Option<PathBuf>,
    /// Catalog export archive
    #[arg(long)]
    input_zip: Option<PathBuf>,
    /// Unpacked catalog export
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Mapping file to write (defaults to mapping.yaml beside the source)
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[command(flatten)]
    seed: SeedArgs,
}

#[derive(Args)]
struct SeedArgs {
    /// New entries hold only performers
    #[arg(long)]
    performer_only: bool,
    /// Seed entries from structured filenames
    #[arg(long)]
    parse_filenames: bool,
    /// Regex with named groups studio, performers, title, date
    #[arg(long)]
    filename_pattern: Option<String>,
    /// Fill empty fields of existing entries from parsed filenames
    #[arg(long)]
    fill_blanks: bool,
}

impl SeedArgs {
    fn options(&self) -> GenerateOptions {
        GenerateOptions {
            performer_only: self.performer_only,
            parse_filenames: self.parse_filenames,
            filename_pattern: self.filename_pattern.clone(),
            fill_blanks: self.fill_blanks,
        }
    }
}

#[derive(Args)]
struct CatalogArgs {
    /// Local catalog database
    #[arg(long)]
    db_path: Option<PathBuf>,
    /// Catalog server url
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    api_key: Option<String>,
}

impl CatalogArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(p) = &self.db_path {
            config.db_path = Some(p.clone());
        }
        if let Some(u) = &self.server_url {
            config.server_url = Some(u.clone());
        }
        if let Some(k) = &self.api_key {
            config.api_key = Some(k.clone());
        }
    }
}

#[derive(Args)]
struct ProcessFlags {
    /// Fill empty urls from performer names
    #[arg(long)]
    url_from_name: bool,
    /// Create performers for unknown urls
    #[arg(long)]
    create_performers: bool,
    /// Write titles, dates, studio, tags and performers to matched scenes
    #[arg(long)]
    update_stash: bool,
    /// Leave the mapping file untouched
    #[arg(long)]
    no_update_mapfile: bool,
}

impl ProcessFlags {
    fn options(&self) -> ProcessOptions {
        ProcessOptions {
            url_from_name: self.url_from_name,
            create_performers: self.create_performers,
            update_mapfile: !self.no_update_mapfile,
            update_stash: self.update_stash,
        }
    }
}

fn init_logger(level: LogLevel) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.to_filter());
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_logger(config.log_level);

    match cli.command {
        Commands::Generate(args) => cmd_generate(&config, args),
        Commands::Process { mapfile, output, catalog, flags } => {
            catalog.apply(&mut config);
            cmd_process(&config, mapfile, output, &flags)
        }
        Commands::MapDir { dir, seed, catalog, flags } => {
            catalog.apply(&mut config);
            cmd_map_dir(&config, dir, &seed, &flags)
        }
        Commands::Performers { root, catalog } => {
            catalog.apply(&mut config);
            cmd_performers(&config, root)
        }
        Commands::Plugin => cmd_plugin(&config),
    }
}

fn cmd_generate(config: &Config, args: GenerateArgs) -> Result<()> {
    let options = args.seed.options();
    let params = GenerateParams {
        directory: args.directory,
        input_zip: args.input_zip,
        input_dir: args.input_dir,
        output: args.output,
        performer_only: options.performer_only,
        parse_filenames: options.parse_filenames,
        filename_pattern: options.filename_pattern,
        fill_blanks: options.fill_blanks,
    };

    let (outfile, summary) = run_generate(&params, &config.mapping_filename, &LogReporter)?;
    println!("Wrote {}", outfile.display());
    print_generate_summary(&summary);
    Ok(())
}

fn cmd_process(config: &Config, mapfile: PathBuf, output: Option<PathBuf>, flags: &ProcessFlags) -> Result<()> {
    let catalog = config.connect_catalog()?;
    let options = flags.options();
    let params = ProcessParams {
        mapfile: Some(mapfile),
        output,
        url_from_name: options.url_from_name,
        create_performers: options.create_performers,
        update_mapfile: options.update_mapfile,
        update_stash: options.update_stash,
    };

    let summary = run_process(&params, catalog.as_ref(), &LogReporter)?;
    print_process_summary(&summary);
    Ok(())
}

fn cmd_map_dir(config: &Config, dir: PathBuf, seed: &SeedArgs, flags: &ProcessFlags) -> Result<()> {
    let outcome = map_directory(
        &dir,
        &config.mapping_filename,
        &seed.options(),
        &flags.options(),
        || config.connect_catalog(),
        &LogReporter,
    )?;

    match outcome {
        DirectoryOutcome::Generated(summary) => {
            println!("Generated {}", dir.join(&config.mapping_filename).display());
            print_generate_summary(&summary);
        }
        DirectoryOutcome::Processed(summary) => print_process_summary(&summary),
    }
    Ok(())
}

fn cmd_performers(config: &Config, root: PathBuf) -> Result<()> {
    let catalog = config.connect_catalog()?;
    let summary = map_performer_directories(&root, &config.mapping_filename, catalog.as_ref(), &LogReporter)?;

    println!("Performer directories in {}:", root.display());
    println!("  New entries:  {}", summary.added);
    println!("  Urls filled:  {}", summary.urls_filled);
    println!("  Created:      {}", summary.created);
    println!("  Failed:       {}", summary.failed);
    println!("  Mismatched:   {}", summary.mismatched);
    Ok(())
}

fn cmd_plugin(config: &Config) -> Result<()> {
    let reporter = PluginReporter::stderr(config.log_level);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_plugin(stdin.lock(), stdout.lock(), config, &reporter)?;
    Ok(())
}

fn print_generate_summary(summary: &GenerateSummary) {
    println!("  Added:        {}", summary.added);
    println!("  Existing:     {}", summary.existing);
    println!("  Refreshed:    {}", summary.refreshed);
    println!("  Skipped:      {}", summary.skipped);
}

fn print_process_summary(summary: &ProcessSummary) {
    println!("Processed {} entries", summary.entries);
    println!("  Scenes matched:      {}", summary.scenes_matched);
    println!("  Scenes updated:      {}", summary.scenes_updated);
    println!("  Urls filled:         {}", summary.urls_filled);
    println!("  Performers matched:  {}", summary.performers_matched);
    println!("  Performers created:  {}", summary.performers_created);
    println!("  Performers failed:   {}", summary.performers_failed);
    println!("  Attached:            {}", summary.performers_attached);
    if summary.field_failures > 0 {
        println!("  Field failures:      {}", summary.field_failures);
    }
}
