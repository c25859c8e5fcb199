//! sh3 exporter CLI
//!
//! Exports a scene dump to engine data, and inspects string ids and
//! material graphs.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use sh3_core::config::{find_game_data_root, ENV_GAME_DATA, ENV_PROJECT, ENV_RESOURCES};
use sh3_core::{ExportConfig, StringId};
use sh3_export::logging::{init_with_config, TracingConfig};
use sh3_export::{
    describe_graph, ExportOptions, ExportProgress, Exporter, MaterialPolicy, PostprocessRegistry,
    ProgressCallback, ToolKind,
};
use sh3_source::{load_scene_dump, SceneSource};

/// sh3 scene exporter
#[derive(Parser)]
#[command(name = "sh3-export")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for reports
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every collection of a scene dump
    Export(ExportArgs),

    /// Print the 64-bit id of one or more strings
    Hash(HashArgs),

    /// Print the shader graph of each material in a scene dump
    Graph(GraphArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Scene dump written by the authoring tool
    scene: PathBuf,

    /// Resources (authoring) root
    #[arg(long, env = ENV_RESOURCES)]
    resources: PathBuf,

    /// Game data (output) root; looked up from project-config.json when unset
    #[arg(long, env = ENV_GAME_DATA)]
    game_data: Option<PathBuf>,

    /// Project root holding the conversion tools
    #[arg(long, env = ENV_PROJECT)]
    project: PathBuf,

    /// Use the legacy per-chunk mesh tool instead of the scene tool
    #[arg(long)]
    mesh_tool: bool,

    /// Explicit conversion tool executable
    #[arg(long)]
    tool: Option<PathBuf>,

    /// Ask the scene tool to compress its output
    #[arg(long)]
    compress: bool,

    /// Keep payload files after the tool ran
    #[arg(long)]
    keep_data: bool,

    /// Skip objects with unusable materials instead of failing
    #[arg(long)]
    skip_bad_materials: bool,

    /// Write scene descriptions only, do not run the conversion tool
    #[arg(long)]
    no_tool: bool,
}

#[derive(Args)]
struct HashArgs {
    /// Strings to hash
    #[arg(required = true)]
    strings: Vec<String>,
}

#[derive(Args)]
struct GraphArgs {
    /// Scene dump written by the authoring tool
    scene: PathBuf,

    /// Only print this material
    #[arg(short, long)]
    material: Option<String>,
}

fn setup_logging(verbosity: u8) {
    init_with_config(TracingConfig::from_verbosity(verbosity));
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Export(args) => cmd_export(args, cli.format),
        Commands::Hash(args) => cmd_hash(&args, cli.format),
        Commands::Graph(args) => cmd_graph(&args, cli.format),
    }
}

fn build_config(args: &ExportArgs) -> Result<ExportConfig> {
    let game_data = match &args.game_data {
        Some(path) => path.clone(),
        None => find_game_data_root(&args.resources).with_context(|| {
            format!("{ENV_GAME_DATA} is not set and no project config was found")
        })?,
    };

    let config = ExportConfig::new(&args.resources, game_data, &args.project)
        .context("Invalid export configuration")?;

    Ok(match &args.tool {
        Some(tool) => config.with_tool(tool),
        None => config,
    })
}

fn cmd_export(args: ExportArgs, format: OutputFormat) -> Result<()> {
    let config = build_config(&args)?;
    info!(
        resources = %config.resources_root().display(),
        game_data = %config.game_data_root().display(),
        "Configuration loaded"
    );

    let project = load_scene_dump(&args.scene)?;

    let options = ExportOptions {
        tool: if args.mesh_tool {
            ToolKind::MeshTool
        } else {
            ToolKind::SceneTool
        },
        use_compression: args.compress,
        keep_data: args.keep_data,
        material_policy: if args.skip_bad_materials {
            MaterialPolicy::SkipObject
        } else {
            MaterialPolicy::Fail
        },
        run_tool: !args.no_tool,
    };

    let exporter = Exporter::new(&config, options, PostprocessRegistry::builtin());
    let progress: ProgressCallback = Box::new(|progress: ExportProgress| {
        if let Some(current) = &progress.current {
            info!(
                "[{:>3.0}%] {}",
                progress.percentage() * 100.0,
                current
            );
        }
    });

    let summary = exporter
        .run(&project, Some(progress))
        .with_context(|| format!("Export of {} failed", args.scene.display()))?;

    if summary.scenes_written.is_empty() {
        warn!("No collection was exported");
    }

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "scenes": summary.scenes_written,
                "chunks": summary.chunks,
                "skipped_collections": summary.skipped_collections,
                "skipped_objects": summary.skipped_objects,
                "payloads": summary.payload_paths,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            for path in &summary.scenes_written {
                println!("wrote    {}", path.display());
            }
            for name in &summary.skipped_collections {
                println!("skipped  collection {name}");
            }
            for name in &summary.skipped_objects {
                println!("skipped  object {name}");
            }
            for path in &summary.payload_paths {
                println!("payload  {}", path.display());
            }
        }
    }

    Ok(())
}

fn cmd_hash(args: &HashArgs, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = args
                .strings
                .iter()
                .map(|s| (s.clone(), StringId::new(s).value().into()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Text => {
            for s in &args.strings {
                println!("{:>20}  {s}", StringId::new(s).value());
            }
        }
    }
    Ok(())
}

fn cmd_graph(args: &GraphArgs, format: OutputFormat) -> Result<()> {
    let project = load_scene_dump(&args.scene)?;

    let materials: Vec<_> = match &args.material {
        Some(name) => match project.material(name) {
            Some(material) => vec![material],
            None => bail!("Material not found: {name}"),
        },
        None => project.materials.iter().collect(),
    };

    let mut report = serde_json::Map::new();
    for material in materials {
        let graph = match &material.node_tree {
            Some(tree) => match tree.active_output() {
                Some(output) => describe_graph(tree, output),
                None => "(no output node)\n".to_string(),
            },
            None => "(no nodes)\n".to_string(),
        };

        match format {
            OutputFormat::Json => {
                report.insert(material.name.clone(), graph.into());
            }
            OutputFormat::Text => {
                println!("{} [{}]", material.name, material.blend_method);
                print!("{graph}");
            }
        }
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
