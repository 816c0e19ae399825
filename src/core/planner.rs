//! Diff a freshly rendered template against the previous assembly.

use super::types::*;
use crate::provenance::hasher;

/// Compare `desired` with the template written by the previous synthesis.
/// Changes follow `execution_order`; resources that disappear are destroyed
/// last, in reverse of their previous registration order.
pub fn plan(
    desired: &Template,
    stack_name: &str,
    execution_order: &[String],
    previous: Option<&Template>,
) -> Result<DiffPlan, String> {
    let mut changes = Vec::new();
    let mut to_create = 0u32;
    let mut to_update = 0u32;
    let mut to_destroy = 0u32;
    let mut unchanged = 0u32;

    for logical_id in execution_order {
        let Some(resource) = desired.resources.get(logical_id) else {
            return Err(format!("'{}' is in the order but not in the template", logical_id));
        };

        let action = match previous.and_then(|p| p.resources.get(logical_id)) {
            None => PlanAction::Create,
            Some(old) => {
                if hash_resource(old)? == hash_resource(resource)? {
                    PlanAction::NoOp
                } else {
                    PlanAction::Update
                }
            }
        };

        match action {
            PlanAction::Create => to_create += 1,
            PlanAction::Update => to_update += 1,
            PlanAction::Destroy => to_destroy += 1,
            PlanAction::NoOp => unchanged += 1,
        }

        changes.push(PlannedChange {
            logical_id: logical_id.clone(),
            resource_type: resource.resource_type,
            description: describe_action(logical_id, resource.resource_type, &action),
            action,
        });
    }

    if let Some(prev) = previous {
        for (logical_id, old) in prev.resources.iter().rev() {
            if desired.resources.contains_key(logical_id) {
                continue;
            }
            to_destroy += 1;
            changes.push(PlannedChange {
                logical_id: logical_id.clone(),
                resource_type: old.resource_type,
                description: describe_action(logical_id, old.resource_type, &PlanAction::Destroy),
                action: PlanAction::Destroy,
            });
        }
    }

    Ok(DiffPlan {
        stack_name: stack_name.to_string(),
        changes,
        to_create,
        to_update,
        to_destroy,
        unchanged,
    })
}

/// Hash of everything the provider sees for one resource.
pub fn hash_resource(resource: &Resource) -> Result<String, String> {
    hasher::hash_json(resource)
}

/// Human-readable description of a planned action.
fn describe_action(logical_id: &str, resource_type: ResourceType, action: &PlanAction) -> String {
    match action {
        PlanAction::Create => format!("{}: create {}", logical_id, resource_type),
        PlanAction::Update => format!("{}: update {}", logical_id, resource_type),
        PlanAction::Destroy => format!("{}: destroy {}", logical_id, resource_type),
        PlanAction::NoOp => format!("{}: no changes", logical_id),
    }
}
