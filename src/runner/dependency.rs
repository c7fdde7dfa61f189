//! Dependency graph for graph scheduling.
//!
//! Built from the catalog's `depends_on` edges. Every ordered view follows
//! catalog order, so a wave lists its steps the way the catalog does.

use std::collections::{HashMap, HashSet};

use crate::error::{BatonError, Result};

/// Steps and the steps each one waits for.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    dependencies: HashMap<String, Vec<String>>,
    order: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

impl DependencyGraph {
    /// Create a new dependency graph builder.
    pub fn builder() -> DependencyGraphBuilder {
        DependencyGraphBuilder::new()
    }

    /// Direct dependencies of a step, in declaration order.
    pub fn dependencies_of(&self, step: &str) -> Option<&[String]> {
        self.dependencies.get(step).map(Vec::as_slice)
    }

    /// All step ids in insertion order.
    pub fn steps(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// A dependency cycle, if any, as a path that starts and ends on the
    /// same step.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();

        for step in &self.order {
            if !marks.contains_key(step.as_str()) {
                if let Some(cycle) = self.walk(step, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn walk<'a>(
        &'a self,
        step: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        marks.insert(step, Mark::OnPath);
        path.push(step);

        for dep in self.dependencies.get(step).into_iter().flatten() {
            match marks.get(dep.as_str()) {
                Some(Mark::OnPath) => {
                    let start = path.iter().position(|s| *s == dep.as_str()).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|s| s.to_string()).collect();
                    cycle.push(dep.clone());
                    return Some(cycle);
                }
                Some(Mark::Done) => {}
                None => {
                    if let Some(cycle) = self.walk(dep, marks, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        path.pop();
        marks.insert(step, Mark::Done);
        None
    }

    /// Steps whose dependencies are all completed, skipping `started`
    /// (steps already running or finished).
    pub fn ready_steps(
        &self,
        completed: &HashSet<String>,
        started: &HashSet<String>,
    ) -> Vec<String> {
        self.order
            .iter()
            .filter(|s| !started.contains(*s) && self.is_ready(s, completed))
            .cloned()
            .collect()
    }

    /// Whether every dependency of `step` is completed.
    pub fn is_ready(&self, step: &str, completed: &HashSet<String>) -> bool {
        self.dependencies
            .get(step)
            .map_or(true, |deps| deps.iter().all(|d| completed.contains(d)))
    }

    /// The waves a full graph run starts, in order.
    ///
    /// Fails on a cycle.
    pub fn waves(&self) -> Result<Vec<Vec<String>>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(BatonError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let mut waves = Vec::new();
        let mut done: HashSet<String> = HashSet::new();
        loop {
            let wave = self.ready_steps(&done, &done);
            if wave.is_empty() {
                return Ok(waves);
            }
            done.extend(wave.iter().cloned());
            waves.push(wave);
        }
    }
}

/// Builder for constructing a DependencyGraph.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    graph: DependencyGraph,
}

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step with its dependencies. Adding a step again appends to
    /// its dependencies and keeps its first position.
    pub fn add_step(mut self, id: impl Into<String>, depends_on: Vec<String>) -> Self {
        let id = id.into();
        if !self.graph.dependencies.contains_key(&id) {
            self.graph.order.push(id.clone());
        }
        let deps = self.graph.dependencies.entry(id).or_default();
        for dep in depends_on {
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        self
    }

    /// Build the graph, rejecting dependencies on steps never added.
    pub fn build(self) -> Result<DependencyGraph> {
        for step in &self.graph.order {
            for dep in self.graph.dependencies_of(step).unwrap_or_default() {
                if !self.graph.dependencies.contains_key(dep) {
                    return Err(BatonError::ConfigValidationError {
                        message: format!("Step '{}' depends on unknown step '{}'", step, dep),
                    });
                }
            }
        }
        Ok(self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        edges
            .iter()
            .fold(DependencyGraph::builder(), |b, (id, deps)| {
                b.add_step(*id, deps.iter().map(|d| d.to_string()).collect())
            })
            .build()
            .unwrap()
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_builder() {
        assert!(DependencyGraph::builder().build().unwrap().is_empty());
    }

    #[test]
    fn re_adding_a_step_keeps_its_position() {
        let g = graph(&[("zeta", &[]), ("alpha", &[]), ("zeta", &["alpha", "alpha"])]);

        assert_eq!(g.steps(), ["zeta", "alpha"]);
        assert_eq!(g.dependencies_of("zeta").unwrap(), ["alpha"]);
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let err = DependencyGraph::builder()
            .add_step("report", vec!["ledger".to_string()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ledger"));
    }

    #[test]
    fn acyclic_graph_has_no_cycle() {
        assert!(graph(&[("a", &[]), ("b", &["a"])]).find_cycle().is_none());
    }

    #[test]
    fn cycle_path_closes_on_itself() {
        let g = graph(&[("x", &[]), ("a", &["c"]), ("b", &["a"]), ("c", &["b"])]);
        let cycle = g.find_cycle().unwrap();
        assert_eq!(cycle.len(), 4);
        assert_eq!(cycle.first(), cycle.last());
        assert!(!cycle.contains(&"x".to_string()));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let g = graph(&[("a", &["a"])]);
        assert_eq!(g.find_cycle().unwrap(), ["a", "a"]);
        assert!(g.waves().is_err());
    }

    #[test]
    fn ready_steps_follow_insertion_order() {
        let g = graph(&[("c", &[]), ("a", &[]), ("b", &["c"])]);
        assert_eq!(g.ready_steps(&set(&[]), &set(&[])), ["c", "a"]);
        assert_eq!(g.ready_steps(&set(&["c"]), &set(&["c", "a"])), ["b"]);
    }

    #[test]
    fn is_ready_needs_every_dependency() {
        let g = graph(&[("a", &[]), ("b", &[]), ("c", &["a", "b"])]);
        assert!(!g.is_ready("c", &set(&["a"])));
        assert!(g.is_ready("c", &set(&["a", "b"])));
    }

    #[test]
    fn diamond_waves() {
        let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
        assert_eq!(
            g.waves().unwrap(),
            vec![vec!["a"], vec!["b", "c"], vec!["d"]]
        );
    }
}
