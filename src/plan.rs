//! Resolution plans
//!
//! A [`ResolutionPlan`] is what the code-emission side consumes: a DAG with one
//! node per distinct (source, resolution) pair reachable from the requested
//! root. Edges into the same node from inside one resolution mean "use the
//! same instance" when the node is [`Scope::InstancePerResolution`]; an
//! [`Scope::InstancePerDependency`] node is instantiated once per edge.

use crate::{InstanceSource, ResolutionRequest, Scope, TypeKey};
use std::fmt;
use std::sync::Arc;

/// Identifies one resolution: the root request, one single-instance
/// computation, or one delegate body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolutionId(pub(crate) u32);

impl ResolutionId {
    /// The resolution started by the root request.
    pub const ROOT: ResolutionId = ResolutionId(0);

    #[inline]
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ResolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resolution-{}", self.0)
    }
}

/// Index of a node in a [`ResolutionPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One argument of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEdge {
    Node(NodeId),
    /// Optional parameter with no source; the default value is passed
    Default(TypeKey),
}

/// One source instantiated in one resolution.
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub source: Arc<InstanceSource>,
    pub resolution: ResolutionId,
    pub scope: Scope,
    /// This node's own step must be awaited
    pub is_async: bool,
    /// Something in this node's subtree, up to delegate boundaries, must be awaited
    pub requires_async: bool,
    pub dependencies: Vec<PlanEdge>,
}

impl PlanNode {
    #[inline]
    pub fn of_type(&self) -> &TypeKey {
        self.source.of_type()
    }
}

/// A validated construction plan for one root request.
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    request: ResolutionRequest,
    root: NodeId,
    nodes: Vec<PlanNode>,
}

impl ResolutionPlan {
    pub(crate) fn new(request: ResolutionRequest, root: NodeId, nodes: Vec<PlanNode>) -> Self {
        Self {
            request,
            root,
            nodes,
        }
    }

    #[inline]
    pub fn request(&self) -> &ResolutionRequest {
        &self.request
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn root_node(&self) -> &PlanNode {
        &self.nodes[self.root.0]
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &PlanNode {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids the given node depends on, skipping default-valued arguments.
    pub fn dependencies(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).dependencies.iter().filter_map(|edge| match edge {
            PlanEdge::Node(dep) => Some(*dep),
            PlanEdge::Default(_) => None,
        })
    }

    /// Every node bound to `ty`, in creation order.
    pub fn find(&self, ty: &TypeKey) -> impl Iterator<Item = NodeId> + '_ {
        let ty = ty.clone();
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.of_type() == &ty)
            .map(|(index, _)| NodeId(index))
    }

    /// Whether the plan requires awaiting anywhere outside delegate bodies.
    #[inline]
    pub fn is_async(&self) -> bool {
        self.root_node().requires_async
    }
}
