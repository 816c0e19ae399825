//! Reference validation and deployment order.
//!
//! Edges come from two places: explicit `depends_on` and the `Ref` /
//! `Fn::GetAtt` references inside each resource's properties. The order is a
//! topological sort (Kahn's algorithm) with alphabetical tie-breaking for
//! determinism.

use super::graph::StackGraph;
use super::intrinsic::collect_references;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Every dependency of every resource: explicit edges and referenced IDs,
/// deduplicated and sorted.
pub fn dependency_edges(graph: &StackGraph) -> IndexMap<String, Vec<String>> {
    let mut edges = IndexMap::new();
    for (id, resource) in graph.resources() {
        let mut refs = Vec::new();
        collect_references(&resource.properties, &mut refs);
        let deps: BTreeSet<String> = resource
            .depends_on
            .iter()
            .cloned()
            .chain(refs)
            .filter(|dep| dep != id)
            .collect();
        edges.insert(id.clone(), deps.into_iter().collect());
    }
    edges
}

/// Check that every explicit dependency and every reference (in resources
/// and outputs) names a declared resource. Returns all problems at once.
pub fn validate_references(graph: &StackGraph) -> Result<(), String> {
    let mut errors = Vec::new();
    let resources = graph.resources();

    for (id, resource) in resources {
        for dep in &resource.depends_on {
            if dep == id {
                errors.push(format!("resource '{}' depends on itself", id));
            } else if !resources.contains_key(dep) {
                errors.push(format!(
                    "resource '{}' depends on unknown resource '{}'",
                    id, dep
                ));
            }
        }
        let mut refs = Vec::new();
        collect_references(&resource.properties, &mut refs);
        for r in refs {
            if !resources.contains_key(&r) {
                errors.push(format!("resource '{}' references unknown resource '{}'", id, r));
            }
        }
    }

    for (name, output) in graph.outputs() {
        let mut refs = Vec::new();
        collect_references(&output.value, &mut refs);
        for r in refs {
            if !resources.contains_key(&r) {
                errors.push(format!("output '{}' references unknown resource '{}'", name, r));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

/// Topological deployment order over [`dependency_edges`].
pub fn build_deployment_order(graph: &StackGraph) -> Result<Vec<String>, String> {
    let edges = dependency_edges(graph);
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for id in edges.keys() {
        in_degree.insert(id.as_str(), 0);
        dependents.insert(id.as_str(), Vec::new());
    }

    for (id, deps) in &edges {
        for dep in deps {
            let Some(list) = dependents.get_mut(dep.as_str()) else {
                return Err(format!("resource '{}' depends on unknown '{}'", id, dep));
            };
            list.push(id.as_str());
            *in_degree.entry(id.as_str()).or_insert(0) += 1;
        }
    }

    let mut ready: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(id, _)| *id)
        .collect();
    ready.sort_unstable();
    let mut queue: VecDeque<&str> = ready.into_iter().collect();

    let mut order = Vec::with_capacity(edges.len());
    while let Some(current) = queue.pop_front() {
        order.push(current.to_string());

        let mut next_ready = Vec::new();
        if let Some(children) = dependents.get(current) {
            for child in children {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        next_ready.push(*child);
                    }
                }
            }
        }
        next_ready.sort_unstable();
        queue.extend(next_ready);
    }

    if order.len() != edges.len() {
        let mut stuck: Vec<&str> = edges
            .keys()
            .map(String::as_str)
            .filter(|id| !order.iter().any(|o| o == id))
            .collect();
        stuck.sort_unstable();
        return Err(format!(
            "dependency cycle detected involving: {}",
            stuck.join(", ")
        ));
    }

    Ok(order)
}

/// Validate references, then compute the deployment order.
pub fn resolve(graph: &StackGraph) -> Result<Vec<String>, String> {
    validate_references(graph)?;
    build_deployment_order(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environment::Environment;
    use crate::core::intrinsic::Expr;
    use crate::core::types::{Resource, ResourceType};
    use serde_json::json;

    fn graph_with(resources: &[(&str, serde_json::Value, &[&str])]) -> StackGraph {
        let mut g = StackGraph::new("test", Environment::agnostic());
        for (id, props, deps) in resources {
            let mut r = Resource::new(ResourceType::S3Bucket, props.clone());
            r.depends_on = deps.iter().map(|d| d.to_string()).collect();
            g.add(id, r).unwrap();
        }
        g
    }

    #[test]
    fn test_order_linear_explicit() {
        let g = graph_with(&[
            ("Query", json!({}), &["Workgroup"]),
            ("Workgroup", json!({}), &["Bucket"]),
            ("Bucket", json!({}), &[]),
        ]);
        assert_eq!(
            build_deployment_order(&g).unwrap(),
            vec!["Bucket", "Workgroup", "Query"]
        );
    }

    #[test]
    fn test_order_alphabetical_tie_break() {
        let g = graph_with(&[("Beta", json!({}), &[]), ("Alpha", json!({}), &[])]);
        assert_eq!(build_deployment_order(&g).unwrap(), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_order_from_references() {
        let g = graph_with(&[
            ("Policy", json!({"Bucket": {"Ref": "Bucket"}}), &[]),
            ("Bucket", json!({"CatalogId": {"Ref": "AWS::AccountId"}}), &[]),
        ]);
        assert_eq!(build_deployment_order(&g).unwrap(), vec!["Bucket", "Policy"]);
    }

    #[test]
    fn test_order_diamond() {
        let g = graph_with(&[
            ("Top", json!({}), &[]),
            ("Right", json!({}), &["Top"]),
            ("Left", json!({"Arn": {"Fn::GetAtt": ["Top", "Arn"]}}), &[]),
            ("Bottom", json!({}), &["Left", "Right"]),
        ]);
        assert_eq!(
            build_deployment_order(&g).unwrap(),
            vec!["Top", "Left", "Right", "Bottom"]
        );
    }

    #[test]
    fn test_cycle_detected() {
        let g = graph_with(&[
            ("A", json!({"X": {"Ref": "B"}}), &[]),
            ("B", json!({}), &["A"]),
            ("C", json!({}), &[]),
        ]);
        let err = build_deployment_order(&g).unwrap_err();
        assert!(err.contains("cycle"));
        assert!(err.contains("A, B"));
        assert!(!err.contains('C'));
    }

    #[test]
    fn test_dependency_edges_dedup() {
        let g = graph_with(&[
            ("Bucket", json!({}), &[]),
            ("Policy", json!({"Bucket": {"Ref": "Bucket"}, "Arn": {"Fn::GetAtt": ["Bucket", "Arn"]}}), &["Bucket"]),
        ]);
        assert_eq!(dependency_edges(&g)["Policy"], vec!["Bucket"]);
    }

    #[test]
    fn test_validate_unknown_reference() {
        let g = graph_with(&[("Policy", json!({"Bucket": {"Ref": "Ghost"}}), &[])]);
        let err = validate_references(&g).unwrap_err();
        assert!(err.contains("references unknown resource 'Ghost'"));
    }

    #[test]
    fn test_validate_unknown_output_reference() {
        let mut g = graph_with(&[("Bucket", json!({}), &[])]);
        g.add_output("RoleArn", "role", &Expr::get_att("GlueS3Role", "Arn"))
            .unwrap();
        let err = resolve(&g).unwrap_err();
        assert!(err.contains("output 'RoleArn'"));
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let g = graph_with(&[
            ("A", json!({"X": {"Ref": "Ghost1"}}), &["Ghost2"]),
            ("B", json!({}), &["B"]),
        ]);
        let err = validate_references(&g).unwrap_err();
        assert!(err.contains("Ghost1"));
        assert!(err.contains("Ghost2"));
        assert!(err.contains("depends on itself"));
    }
}
