//! Dependency planning over declared job inputs and outputs.
//!
//! The graph has one node per job (node index == job position) and an edge
//! `consumer -> producer` for every declared input that some other job
//! declares as an output. Planning a set of targets is a depth-first closure
//! over those edges, returned in the original authoring order.

mod ranges;

pub use ranges::parse_job_ranges;

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use thiserror::Error;

use crate::job::Job;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
  #[error("unresolved job reference '{0}'")]
  UnresolvedToken(String),

  #[error("job position {position} out of range (build has {len} jobs)")]
  PositionOutOfRange { position: usize, len: usize },

  #[error("invalid job range '{0}'")]
  InvalidRange(String),

  #[error("job '{0}' cannot be both forced and skipped")]
  ForcedAndSkipped(String),

  #[error("dependency cycle between jobs: {}", .0.join(" -> "))]
  CycleDetected(Vec<String>),
}

/// Producer/consumer graph of a job list.
pub struct BuildPlanner {
  graph: DiGraph<String, ()>,
}

impl BuildPlanner {
  /// Index the jobs' outputs and link every consumer to its producers.
  ///
  /// Fails if the declarations form a cycle.
  pub fn new(jobs: &[Job]) -> Result<Self, PlanError> {
    let mut graph = DiGraph::new();
    for job in jobs {
      graph.add_node(job.name().to_string());
    }

    let mut producers: HashMap<PathBuf, BTreeSet<usize>> = HashMap::new();
    for (position, job) in jobs.iter().enumerate() {
      for output in job.declared_outputs().relative_paths() {
        producers.entry(output.to_path_buf()).or_default().insert(position);
      }
    }

    for (consumer, job) in jobs.iter().enumerate() {
      let mut seen = BTreeSet::new();
      for input in job.declared_inputs().relative_paths() {
        let Some(owners) = producers.get(input) else {
          continue;
        };
        for &producer in owners {
          if producer != consumer && seen.insert(producer) {
            graph.add_edge(NodeIndex::new(consumer), NodeIndex::new(producer), ());
          }
        }
      }
    }

    let planner = Self { graph };
    planner.verify_acyclic()?;
    Ok(planner)
  }

  fn verify_acyclic(&self) -> Result<(), PlanError> {
    let Err(cycle) = toposort(&self.graph, None) else {
      return Ok(());
    };
    let start = cycle.node_id();
    let mut members = tarjan_scc(&self.graph)
      .into_iter()
      .find(|component| component.contains(&start))
      .unwrap_or_else(|| vec![start]);
    members.sort();
    Err(PlanError::CycleDetected(
      members.into_iter().map(|idx| self.graph[idx].clone()).collect(),
    ))
  }

  /// Direct producers of the job at `position`.
  pub fn producers_of(&self, position: usize) -> BTreeSet<usize> {
    self
      .graph
      .neighbors(NodeIndex::new(position))
      .map(|idx| idx.index())
      .collect()
  }

  /// Every job needed to produce `targets`, targets included, in position order.
  pub fn closure(&self, targets: &BTreeSet<usize>) -> BTreeSet<usize> {
    let mut visited = BTreeSet::new();
    let mut dfs = Dfs::empty(&self.graph);
    for &target in targets {
      if target >= self.graph.node_count() {
        continue;
      }
      dfs.move_to(NodeIndex::new(target));
      while let Some(node) = dfs.next(&self.graph) {
        visited.insert(node.index());
      }
    }
    visited
  }
}
