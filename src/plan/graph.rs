//! Dependency resolution: a total execution order over plan steps.

use std::collections::HashMap;

use crate::error::PlanError;
use crate::plan::step::ExecutionStep;

#[derive(Debug, Clone, Copy, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Topologically order `steps` so every step appears after all of its
/// dependencies.
///
/// Depth-first from each step in plan order, dependencies first.
/// Independent steps keep first-seen plan order, so the result is
/// deterministic for identical input. Dangling references and cycles are
/// reported as plan errors, never unwound at runtime.
pub fn execution_order(steps: &[ExecutionStep]) -> Result<Vec<String>, PlanError> {
    let index: HashMap<&str, &ExecutionStep> =
        steps.iter().map(|step| (step.id.as_str(), step)).collect();

    let mut states: HashMap<&str, VisitState> = HashMap::with_capacity(steps.len());
    let mut order = Vec::with_capacity(steps.len());

    for step in steps {
        if states.contains_key(step.id.as_str()) {
            continue;
        }
        visit(step, &index, &mut states, &mut order)?;
    }

    Ok(order)
}

/// Exhaust the dependency subtree under `root`, appending finished steps
/// to `order` dependencies-first.
///
/// Iterative with an explicit frame stack: plan depth is planner output
/// and must not be limited by the call stack. Each frame tracks how many
/// of its step's dependencies have been resolved so far.
fn visit<'a>(
    root: &'a ExecutionStep,
    index: &HashMap<&'a str, &'a ExecutionStep>,
    states: &mut HashMap<&'a str, VisitState>,
    order: &mut Vec<String>,
) -> Result<(), PlanError> {
    let mut stack: Vec<(&ExecutionStep, usize)> = vec![(root, 0)];
    states.insert(root.id.as_str(), VisitState::Visiting);

    while let Some(frame) = stack.last_mut() {
        let step = frame.0;
        let Some(dependency) = step.depends_on.get(frame.1) else {
            states.insert(step.id.as_str(), VisitState::Visited);
            order.push(step.id.clone());
            stack.pop();
            continue;
        };
        frame.1 += 1;

        let Some(&dep_step) = index.get(dependency.as_str()) else {
            return Err(PlanError::UnknownDependency {
                id: step.id.clone(),
                dependency: dependency.clone(),
            });
        };
        match states.get(dep_step.id.as_str()) {
            Some(VisitState::Visited) => {}
            Some(VisitState::Visiting) => {
                // Close the loop in the reported path: a -> b -> a.
                let mut path: Vec<&str> =
                    stack.iter().map(|(entry, _)| entry.id.as_str()).collect();
                path.push(dep_step.id.as_str());
                let start = path
                    .iter()
                    .position(|id| *id == dep_step.id.as_str())
                    .unwrap_or(0);
                return Err(PlanError::Cycle {
                    path: path[start..].join(" -> "),
                });
            }
            None => {
                states.insert(dep_step.id.as_str(), VisitState::Visiting);
                stack.push((dep_step, 0));
            }
        }
    }
    Ok(())
}
