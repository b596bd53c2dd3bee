//! Skeleton node and branch records

use crate::core::types::Vec3;

/// One joint of the skeleton graph
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    pub position: Vec3,
    /// Unit growth direction leaving this node
    pub direction: Vec3,
    pub radius: f32,
    /// Hierarchy level, 0 = trunk
    pub level: u32,
    /// Index of the branch this node belongs to
    pub branch: usize,
    /// Previous node along the run; the attach node for a branch's first node
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Normalized position along the owning branch
    pub branch_position: f32,
    /// Normalized path depth in the tree: 0 at the trunk base, 1 at the farthest tip.
    /// Root nodes are normalized over the root system only.
    pub depth: f32,
    pub is_root: bool,
}

/// Where a branch leaves its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attachment {
    /// Parent-branch node at or below the attach point
    pub node: usize,
    /// Next parent-branch node, if the attach point lies inside a segment
    pub next: Option<usize>,
    /// Position between `node` and `next`, `[0, 1]`
    pub fraction: f32,
    /// Normalized position along the parent branch
    pub along: f32,
}

/// A run of nodes grown from one spawn
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub level: u32,
    /// Node indices from base to tip
    pub nodes: Vec<usize>,
    pub parent: Option<usize>,
    pub attachment: Option<Attachment>,
    pub children: Vec<usize>,
    pub length: f32,
    pub segment_length: f32,
    pub is_root: bool,
}

impl Branch {
    pub fn base_node(&self) -> usize {
        self.nodes[0]
    }

    pub fn tip_node(&self) -> usize {
        self.nodes[self.nodes.len() - 1]
    }
}
