//! Build graph module
//!
//! Nodes live in an arena owned by [`BuildGraph`] and are addressed by
//! [`NodeId`] handles. Edges point from a node to the nodes it depends on.
//! The graph is built once, then executed once, in dependency order.

pub mod reachability;

pub use reachability::is_reachable;

use crate::error::FetchError;
use crate::system::{Invocation, System};
use crate::utils::path::absolutize;
use anyhow::Result;
use core::fmt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Stable handle of a node inside one [`BuildGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the graph's node table
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ambient state shared by every node of one build invocation
///
/// The environment is captured once, when the build starts; executable
/// lookups and spawned processes all see this same snapshot.
#[derive(Debug, Clone)]
pub struct BuildContext {
    build_root: PathBuf,
    env: BTreeMap<String, String>,
}

impl BuildContext {
    /// Create a context from an absolute build root and an environment
    #[must_use]
    #[inline]
    pub const fn new(build_root: PathBuf, env: BTreeMap<String, String>) -> Self {
        Self { build_root, env }
    }

    /// Capture the environment of `system` and anchor `build_root` to its
    /// current directory
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined
    #[inline]
    pub fn from_system(system: &dyn System, build_root: &Path) -> Result<Self, FetchError> {
        let current_dir = system
            .current_dir()
            .map_err(|e| FetchError::filesystem(format!("Cannot get current directory: {e}")))?;

        Ok(Self {
            build_root: absolutize(build_root, &current_dir),
            env: system.env_vars(),
        })
    }

    #[must_use]
    #[inline]
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    #[must_use]
    #[inline]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Look up a variable in the captured environment
    ///
    /// Variable names are case-insensitive on Windows.
    #[must_use]
    #[inline]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        if cfg!(windows) {
            self.env
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.as_str())
        } else {
            self.env.get(key).map(String::as_str)
        }
    }
}

/// Everything a node needs while it executes
pub struct StepRun<'run> {
    pub graph: &'run BuildGraph,
    pub node: NodeId,
    pub context: &'run BuildContext,
    pub system: &'run dyn System,
}

/// The executable part of a build node
pub trait Action: Send + Sync {
    /// Perform the node's work
    ///
    /// # Errors
    ///
    /// Returns an error if the work fails; the build stops at the first error
    fn make(&self, run: &StepRun<'_>) -> Result<()>;

    /// The processes `make` would spawn, without spawning them
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be computed
    fn plan(&self, _run: &StepRun<'_>) -> Result<Vec<Invocation>> {
        Ok(Vec::new())
    }
}

/// One node of the build graph
pub struct BuildNode {
    name: String,
    dependencies: Vec<NodeId>,
    action: Arc<dyn Action>,
}

impl BuildNode {
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nodes this node depends on, in declaration order
    #[must_use]
    #[inline]
    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }
}

impl fmt::Debug for BuildNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildNode")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Arena of build nodes and their dependency edges
#[derive(Debug, Default)]
pub struct BuildGraph {
    nodes: Vec<BuildNode>,
}

impl BuildGraph {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node and return its handle
    #[inline]
    pub fn add_node<S: Into<String>>(&mut self, name: S, action: Arc<dyn Action>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(BuildNode {
            name: name.into(),
            dependencies: Vec::new(),
            action,
        });
        id
    }

    /// Declare that `node` depends on `dependency`
    ///
    /// Declaring the same edge twice has no effect.
    ///
    /// # Errors
    ///
    /// Returns an error if either handle does not belong to this graph
    #[inline]
    pub fn depend_on(&mut self, node: NodeId, dependency: NodeId) -> Result<(), FetchError> {
        if dependency.index() >= self.nodes.len() {
            return Err(FetchError::configuration(format!(
                "Dependency {dependency} does not belong to this build graph"
            )));
        }
        let entry = self.nodes.get_mut(node.index()).ok_or_else(|| {
            FetchError::configuration(format!("Node {node} does not belong to this build graph"))
        })?;

        if !entry.dependencies.contains(&dependency) {
            entry.dependencies.push(dependency);
        }
        Ok(())
    }

    /// Get a node by handle
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different graph and is out of range
    #[must_use]
    #[inline]
    pub fn node(&self, id: NodeId) -> &BuildNode {
        &self.nodes[id.index()]
    }

    /// Find a node by name
    #[must_use]
    #[inline]
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node handles in registration order
    #[inline]
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Every node, each after all of its dependencies
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains a cycle
    #[inline]
    pub fn execution_order(&self) -> Result<Vec<NodeId>, FetchError> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut walk = reachability::Walk::new(self);

        for id in self.node_ids() {
            walk.visit(id, |done| order.push(done))?;
        }

        Ok(order)
    }

    /// Execute every node once, dependencies first
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The graph contains a cycle (nothing is executed)
    /// - A node fails (later nodes are not executed)
    #[inline]
    pub fn make(&self, context: &BuildContext, system: &dyn System) -> Result<()> {
        let order = self.execution_order()?;
        info!("Executing {} build step(s)", order.len());

        for id in order {
            debug!("Making step '{}'", self.node(id).name);
            let run = StepRun {
                graph: self,
                node: id,
                context,
                system,
            };
            self.node(id).action.make(&run)?;
        }

        Ok(())
    }

    /// The processes each node would spawn, in execution order
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains a cycle or a plan fails
    #[inline]
    pub fn plan(
        &self,
        context: &BuildContext,
        system: &dyn System,
    ) -> Result<Vec<(NodeId, Vec<Invocation>)>> {
        let order = self.execution_order()?;
        let mut plans = Vec::with_capacity(order.len());

        for id in order {
            let run = StepRun {
                graph: self,
                node: id,
                context,
                system,
            };
            plans.push((id, self.node(id).action.plan(&run)?));
        }

        Ok(plans)
    }
}
