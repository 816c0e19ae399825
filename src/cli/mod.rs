//! CLI subcommands: init, validate, synth, diff, list.

use crate::core::graph::StackGraph;
use crate::core::{assets, definition, environment, parser, planner, resolver, state, synth, types};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter stack.yaml and sample data directory
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate stack.yaml and the resource graph without writing anything
    Validate {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,
    },

    /// Synthesize the template and assembly
    Synth {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,

        /// Assembly output directory
        #[arg(short, long, default_value = "out")]
        out: PathBuf,

        /// Print the template instead of writing the assembly
        #[arg(long)]
        stdout: bool,
    },

    /// Show what changed since the last synthesis
    Diff {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,

        /// Assembly directory of the previous synthesis
        #[arg(short, long, default_value = "out")]
        out: PathBuf,
    },

    /// List resources in deployment order
    List {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Synth { file, out, stdout } => cmd_synth(&file, &out, stdout),
        Commands::Diff { file, out } => cmd_diff(&file, &out),
        Commands::List { file } => cmd_list(&file),
    }
}

const STARTER_CONFIG: &str = r#"version: "1.0"
name: s3-athena-workflow
base_name: athena_tests

# Pin the target environment, or leave unset to use CDK_DEFAULT_ACCOUNT /
# CDK_DEFAULT_REGION (and provider pseudo parameters when those are unset).
env: {}

tags:
  environment: dev
  source: s3-athena-workflow

catalog:
  schema: products
  skip_header: true

assets:
  source: sample_data
  # Upload bucket for the staged zip (default: the bootstrap assets bucket)
  # staging_bucket: my-assets-bucket
"#;

const STARTER_DATA: &str = "\
price,owner,title,reviews,color,availability,datetime,views,url
19.99,alice,Desk Lamp,4.5,black,In Stock,2024-01-12 10:15:00,120,https://example.com/p/1
5.49,bob,Notebook,4.1,blue,Out of Stock,2024-01-13 08:02:00,57,https://example.com/p/2
";

fn cmd_init(path: &Path) -> Result<(), String> {
    let config_path = path.join("stack.yaml");
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()));
    }

    let data_dir = path.join("sample_data");
    std::fs::create_dir_all(&data_dir)
        .map_err(|e| format!("cannot create {}: {}", data_dir.display(), e))?;
    let data_file = data_dir.join("products.csv");
    if !data_file.exists() {
        std::fs::write(&data_file, STARTER_DATA)
            .map_err(|e| format!("cannot write {}: {}", data_file.display(), e))?;
    }
    std::fs::write(&config_path, STARTER_CONFIG)
        .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;

    println!("Initialized stack at {}", path.display());
    println!("  Created: {}", config_path.display());
    println!("  Created: {}/", data_dir.display());
    Ok(())
}

/// A validated config and its resolved graph.
struct Build {
    config: types::StackConfig,
    graph: StackGraph,
    order: Vec<String>,
}

/// Parse, validate, fingerprint the asset, define and resolve the stack.
fn build(file: &Path) -> Result<Build, String> {
    let config = parser::load_config(file)?;
    let env = environment::resolve_from_process(&config.env)?;
    let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
    let asset = assets::fingerprint(base_dir, &config.assets.source)?;
    let graph = definition::define_stack(&config, &env, &asset)?;
    let order = resolver::resolve(&graph)?;
    Ok(Build {
        config,
        graph,
        order,
    })
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let b = build(file)?;
    println!(
        "OK: {} ({} resources, {} outputs, {} asset(s), schema {})",
        b.config.name,
        b.graph.len(),
        b.graph.outputs().len(),
        b.graph.assets().len(),
        b.config.catalog.schema
    );
    Ok(())
}

fn cmd_synth(file: &Path, out: &Path, to_stdout: bool) -> Result<(), String> {
    let b = build(file)?;
    if to_stdout {
        let template = synth::render_template(&b.graph);
        println!("{}", synth::to_json(&template)?);
        return Ok(());
    }

    let result = synth::write_assembly(&b.graph, out)?;
    println!("Synthesized: {} → {}", b.config.name, out.display());
    println!("  Template: {}", result.manifest.template_file);
    for asset in &result.manifest.assets {
        println!(
            "  Asset:    {} ({} → s3://{})",
            asset.file, asset.source_path, asset.bucket
        );
    }
    println!(
        "{} resources, {} asset(s) in {:.3}s",
        result.execution_order.len(),
        result.manifest.assets.len(),
        result.duration.as_secs_f64()
    );
    Ok(())
}

fn cmd_diff(file: &Path, out: &Path) -> Result<(), String> {
    let b = build(file)?;
    let template = synth::render_template(&b.graph);
    let previous = state::load_previous_template(out)?;
    if previous.is_none() {
        println!("No previous assembly in {}", out.display());
    }
    let plan = planner::plan(&template, &b.config.name, &b.order, previous.as_ref())?;
    print_plan(&plan);
    Ok(())
}

/// Display a plan to stdout.
fn print_plan(plan: &types::DiffPlan) {
    println!("Diff: {} ({} resources)", plan.stack_name, plan.changes.len());
    println!();
    for change in &plan.changes {
        let symbol = match change.action {
            types::PlanAction::Create => "+",
            types::PlanAction::Update => "~",
            types::PlanAction::Destroy => "-",
            types::PlanAction::NoOp => " ",
        };
        println!("  {} {}", symbol, change.description);
    }
    println!();
    if plan.has_changes() {
        println!(
            "Diff: {} to add, {} to change, {} to destroy, {} unchanged.",
            plan.to_create, plan.to_update, plan.to_destroy, plan.unchanged
        );
    } else {
        println!("No changes. {} unchanged.", plan.unchanged);
    }
}

fn cmd_list(file: &Path) -> Result<(), String> {
    let b = build(file)?;
    println!("{} ({} resources)", b.config.name, b.order.len());
    for (i, id) in b.order.iter().enumerate() {
        let Some(resource) = b.graph.get(id) else {
            continue;
        };
        if resource.depends_on.is_empty() {
            println!("  {:>2}. {} [{}]", i + 1, id, resource.resource_type);
        } else {
            println!(
                "  {:>2}. {} [{}] after {}",
                i + 1,
                id,
                resource.resource_type,
                resource.depends_on.join(", ")
            );
        }
    }
    Ok(())
}
