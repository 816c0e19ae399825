//! Template rendering and assembly output.
//!
//! Rendering is pure: graph in, [`Template`] out, with the stack tag set
//! applied to every taggable resource. Writing an assembly validates the graph
//! first, so a broken graph never leaves files behind.

use super::assets::AssetFingerprint;
use super::graph::StackGraph;
use super::resolver;
use super::state;
use super::types::*;
use crate::provenance::eventlog;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;

/// Render the graph into a template, tags applied.
pub fn render_template(graph: &StackGraph) -> Template {
    let resources = graph
        .resources()
        .iter()
        .map(|(id, resource)| {
            let mut resource = resource.clone();
            if resource.resource_type.is_taggable() {
                apply_tags(&mut resource, &graph.tags);
            }
            (id.clone(), resource)
        })
        .collect();

    Template {
        format_version: TEMPLATE_FORMAT_VERSION.to_string(),
        description: graph.description.clone(),
        resources,
        outputs: graph.outputs().clone(),
    }
}

/// Merge `tags` into the resource's `Tags` list. Stack tags win over tags
/// already present with the same key; the result is sorted by key.
pub fn apply_tags(resource: &mut Resource, tags: &IndexMap<String, String>) {
    if tags.is_empty() {
        return;
    }
    let Value::Object(ref mut props) = resource.properties else {
        return;
    };

    let mut merged: IndexMap<String, Value> = IndexMap::new();
    if let Some(Value::Array(existing)) = props.get("Tags") {
        for tag in existing {
            if let (Some(Value::String(k)), Some(v)) = (tag.get("Key"), tag.get("Value")) {
                merged.insert(k.clone(), v.clone());
            }
        }
    }
    for (k, v) in tags {
        merged.insert(k.clone(), Value::String(v.clone()));
    }
    merged.sort_keys();

    let list: Vec<Value> = merged
        .into_iter()
        .map(|(k, v)| json!({"Key": k, "Value": v}))
        .collect();
    props.insert("Tags".to_string(), Value::Array(list));
}

/// Pretty JSON for a template.
pub fn to_json(template: &Template) -> Result<String, String> {
    serde_json::to_string_pretty(template).map_err(|e| format!("serialize error: {}", e))
}

/// Outcome of writing an assembly.
#[derive(Debug, Clone)]
pub struct SynthResult {
    pub manifest: AssemblyManifest,
    pub execution_order: Vec<String>,
    pub duration: std::time::Duration,
}

/// Write the full assembly for `graph` into `out_dir`: staged assets, the
/// template, the manifest, and the event log.
pub fn write_assembly(graph: &StackGraph, out_dir: &Path) -> Result<SynthResult, String> {
    let start = Instant::now();

    // Fail before touching the filesystem
    let execution_order = resolver::resolve(graph)?;
    let template = render_template(graph);

    let run_id = eventlog::generate_run_id();
    eventlog::append_event(
        out_dir,
        SynthEvent::SynthStarted {
            stack: graph.stack_name.clone(),
            run_id: run_id.clone(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
        },
    )?;

    match write_files(graph, &template, out_dir) {
        Ok(manifest) => {
            for (id, resource) in &template.resources {
                let _ = eventlog::append_event(
                    out_dir,
                    SynthEvent::ResourceDeclared {
                        stack: graph.stack_name.clone(),
                        logical_id: id.clone(),
                        resource_type: resource.resource_type.to_string(),
                    },
                );
            }
            let duration = start.elapsed();
            let _ = eventlog::append_event(
                out_dir,
                SynthEvent::SynthCompleted {
                    stack: graph.stack_name.clone(),
                    run_id,
                    resources: template.resources.len() as u32,
                    assets: manifest.assets.len() as u32,
                    total_seconds: duration.as_secs_f64(),
                },
            );
            Ok(SynthResult {
                manifest,
                execution_order,
                duration,
            })
        }
        Err(e) => {
            let _ = eventlog::append_event(
                out_dir,
                SynthEvent::SynthFailed {
                    stack: graph.stack_name.clone(),
                    run_id,
                    error: e.clone(),
                },
            );
            Err(e)
        }
    }
}

fn write_files(
    graph: &StackGraph,
    template: &Template,
    out_dir: &Path,
) -> Result<AssemblyManifest, String> {
    let mut entries = Vec::new();
    for source in graph.assets() {
        stage_asset(graph, &source.fingerprint, out_dir)?;
        entries.push(
            source
                .fingerprint
                .manifest_entry(&source.consumer, &source.bucket),
        );
    }

    let mut manifest = AssemblyManifest {
        version: state::ASSEMBLY_SCHEMA.to_string(),
        stack_name: graph.stack_name.clone(),
        template_file: state::template_file_name(&graph.stack_name),
        template_hash: String::new(),
        environment: graph.environment.to_manifest(),
        tags: graph.tags.clone(),
        assets: entries,
        generated_at: eventlog::now_iso8601(),
        generator: format!("s3-athena-workflow {}", env!("CARGO_PKG_VERSION")),
    };
    state::save_assembly(out_dir, template, &mut manifest)?;

    let keep: Vec<String> = manifest.assets.iter().map(|a| a.file.clone()).collect();
    state::prune_assets(out_dir, &keep)?;
    Ok(manifest)
}

fn stage_asset(
    graph: &StackGraph,
    asset: &AssetFingerprint,
    out_dir: &Path,
) -> Result<(), String> {
    let path = super::assets::stage(asset, out_dir)?;
    let _ = eventlog::append_event(
        out_dir,
        SynthEvent::AssetStaged {
            stack: graph.stack_name.clone(),
            asset_hash: asset.hash.clone(),
            file: path.display().to_string(),
        },
    );
    Ok(())
}
