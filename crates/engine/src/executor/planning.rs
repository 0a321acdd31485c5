//! Step ordering and dependency planning.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use renderflow_types::WorkflowDefinition;

use crate::error::EngineError;

/// Builds the execution order as indices into `workflow.steps`.
///
/// Steps are ordered by a topological sort of the dependency graph; ties
/// between independent steps are broken by definition order — at every
/// selection point the ready step with the smallest definition index runs
/// first, so the order is fully deterministic. Errors on duplicate step
/// identifiers, unknown dependencies, self-dependencies, and cycles.
pub(crate) fn order_steps(workflow: &WorkflowDefinition) -> Result<Vec<usize>, EngineError> {
    let steps = &workflow.steps;

    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        if index_of.insert(step.id.as_str(), index).is_some() {
            return Err(EngineError::DuplicateStep(step.id.clone()));
        }
    }

    let mut in_degrees = vec![0usize; steps.len()];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];

    for (index, step) in steps.iter().enumerate() {
        let mut seen = HashSet::new();
        for dependency in &step.depends_on {
            let Some(&dependency_index) = index_of.get(dependency.as_str()) else {
                return Err(EngineError::UnknownDependency {
                    step_id: step.id.clone(),
                    dependency: dependency.clone(),
                });
            };
            if dependency_index == index {
                return Err(EngineError::SelfDependency(step.id.clone()));
            }
            if !seen.insert(dependency_index) {
                continue;
            }
            in_degrees[index] += 1;
            adjacency[dependency_index].push(index);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degrees
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut ordered = Vec::with_capacity(steps.len());
    while let Some(Reverse(index)) = ready.pop() {
        ordered.push(index);
        for &child in &adjacency[index] {
            in_degrees[child] -= 1;
            if in_degrees[child] == 0 {
                ready.push(Reverse(child));
            }
        }
    }

    if ordered.len() != steps.len() {
        let mut remaining: Vec<&str> = in_degrees
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree > 0)
            .map(|(index, _)| steps[index].id.as_str())
            .collect();
        remaining.sort_unstable();
        return Err(EngineError::DependencyCycle(remaining.join(", ")));
    }

    Ok(ordered)
}
