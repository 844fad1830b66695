use serde::{Deserialize, Serialize};

use crate::Point;
use crate::game_move::Move;
use crate::setup::BoardSetup;
use crate::zobrist::PositionHash;

pub type NodeId = usize;

/// The root node always exists. It never carries a move.
pub const ROOT: NodeId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionValuation {
    Even,
    GoodForBlack,
    VeryGoodForBlack,
    GoodForWhite,
    VeryGoodForWhite,
    Unclear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveValuation {
    Good,
    VeryGood,
    Bad,
    VeryBad,
    Interesting,
    Doubtful,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAnnotation {
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub position_valuation: Option<PositionValuation>,
    pub move_valuation: Option<MoveValuation>,
    /// Positive favors Black.
    pub estimated_score: Option<f32>,
    #[serde(default)]
    pub hotspot: bool,
}

impl NodeAnnotation {
    pub fn is_empty(&self) -> bool {
        *self == NodeAnnotation::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupSymbol {
    Circle,
    Square,
    Triangle,
    Cross,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    Arrow,
    Line,
}

/// Per-node drawing hints. Each point carries at most one symbol and one
/// label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMarkup {
    symbols: Vec<(Point, MarkupSymbol)>,
    connections: Vec<(Point, Point, ConnectionKind)>,
    labels: Vec<(Point, String)>,
    dimmed: Vec<Point>,
}

impl NodeMarkup {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
            && self.connections.is_empty()
            && self.labels.is_empty()
            && self.dimmed.is_empty()
    }

    pub fn symbols(&self) -> &[(Point, MarkupSymbol)] {
        &self.symbols
    }

    pub fn connections(&self) -> &[(Point, Point, ConnectionKind)] {
        &self.connections
    }

    pub fn labels(&self) -> &[(Point, String)] {
        &self.labels
    }

    pub fn dimmed(&self) -> &[Point] {
        &self.dimmed
    }

    pub fn set_symbol(&mut self, point: Point, symbol: Option<MarkupSymbol>) {
        self.symbols.retain(|(p, _)| *p != point);
        if let Some(symbol) = symbol {
            self.symbols.push((point, symbol));
        }
    }

    /// Replaces any connection between the same two points.
    pub fn set_connection(&mut self, from: Point, to: Point, kind: Option<ConnectionKind>) {
        self.connections.retain(|(a, b, _)| (*a, *b) != (from, to));
        if let Some(kind) = kind {
            self.connections.push((from, to, kind));
        }
    }

    pub fn set_label(&mut self, point: Point, label: Option<String>) {
        self.labels.retain(|(p, _)| *p != point);
        if let Some(label) = label {
            self.labels.push((point, label));
        }
    }

    pub fn set_dimmed(&mut self, point: Point, dimmed: bool) {
        self.dimmed.retain(|&p| p != point);
        if dimmed {
            self.dimmed.push(point);
        }
    }
}

/// Tree element. Only the parent, first child and next sibling links are
/// stored; everything else is derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub mv: Option<Move>,
    pub setup: Option<BoardSetup>,
    pub annotation: Option<NodeAnnotation>,
    pub markup: Option<NodeMarkup>,
    /// Hash of the position after this node. Valid once the node has been
    /// applied at least once.
    #[serde(default)]
    pub hash: PositionHash,
    #[serde(default)]
    removed: bool,
}

/// Arena of nodes. Removed nodes leave an unlinked slot behind so ids stay
/// stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTree {
    nodes: Vec<TreeNode>,
}

impl GameTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::default()],
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|node| !node.removed)
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        match self.nodes.get(id) {
            Some(node) if !node.removed => node,
            _ => panic!("node {id} is not part of the tree"),
        }
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        match self.nodes.get_mut(id) {
            Some(node) if !node.removed => node,
            _ => panic!("node {id} is not part of the tree"),
        }
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| !node.removed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Appends a node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mv: Option<Move>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            parent: Some(parent),
            mv,
            ..TreeNode::default()
        });
        match self.children(parent).last() {
            Some(&last) => self.node_mut(last).next_sibling = Some(id),
            None => self.node_mut(parent).first_child = Some(id),
        }
        id
    }

    /// A child of `parent` carrying the same ply as `mv`.
    pub fn find_child(&self, parent: NodeId, mv: &Move) -> Option<NodeId> {
        self.children(parent).into_iter().find(|&child| {
            self.node(child)
                .mv
                .as_ref()
                .is_some_and(|existing| existing.same_ply(mv))
        })
    }

    // -- Derived navigation --

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = Vec::new();
        let mut next = self.node(id).first_child;
        while let Some(child) = next {
            children.push(child);
            next = self.node(child).next_sibling;
        }
        children
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let mut current = self.node(parent).first_child?;
        if current == id {
            return None;
        }
        while let Some(next) = self.node(current).next_sibling {
            if next == id {
                return Some(current);
            }
            current = next;
        }
        None
    }

    /// Is `ancestor` a proper ancestor of `id`?
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.node(parent).parent;
        }
        false
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.is_ancestor_of(ancestor, id)
    }

    /// Nodes from the root down to `id`, both included.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.node(parent).parent;
        }
        path.reverse();
        path
    }

    /// The root has depth 0.
    pub fn depth(&self, id: NodeId) -> usize {
        self.path_to(id).len() - 1
    }

    /// `id` followed by first children down to a leaf.
    pub fn main_line_from(&self, id: NodeId) -> Vec<NodeId> {
        let mut line = vec![id];
        let mut next = self.node(id).first_child;
        while let Some(child) = next {
            line.push(child);
            next = self.node(child).first_child;
        }
        line
    }

    /// Root to `id`, then first children down to a leaf.
    pub fn line_through(&self, id: NodeId) -> Vec<NodeId> {
        let mut line = self.path_to(id);
        line.extend(self.main_line_from(id).into_iter().skip(1));
        line
    }

    /// Unlinks `id` and everything below it. The root cannot be removed.
    pub fn remove_subtree(&mut self, id: NodeId) {
        let parent = match self.node(id).parent {
            Some(parent) => parent,
            None => panic!("the root node cannot be removed"),
        };
        let next = self.node(id).next_sibling;
        match self.previous_sibling(id) {
            Some(previous) => self.node_mut(previous).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            pending.extend(self.children(current));
            let node = self.node_mut(current);
            node.parent = None;
            node.first_child = None;
            node.next_sibling = None;
            node.removed = true;
        }
    }
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new()
    }
}
