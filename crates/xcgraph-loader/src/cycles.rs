//! Three-color cycle detection for the loader's depth-first build

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a node on the build path: a target in its project, or a
/// precompiled artifact keyed by its path and file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleNode {
    pub path: PathBuf,
    pub name: String,
}

impl CycleNode {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        CycleNode {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Key of a precompiled artifact.
    pub fn artifact(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        CycleNode::new(path, name)
    }
}

impl fmt::Display for CycleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// DFS colors. Unvisited nodes have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// On the current DFS path.
    Gray,
    /// Fully processed.
    Black,
}

/// Tracks the current DFS path while the loader walks declarations.
#[derive(Debug, Default)]
pub struct CycleDetector {
    colors: HashMap<CycleNode, Color>,
    path: Vec<CycleNode>,
}

impl CycleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `node` onto the DFS path.
    ///
    /// Returns `Ok(false)` when the node was already fully processed and must
    /// not be walked again. Reaching a node that is still on the path is a
    /// back-edge: the error holds the path from that node to itself.
    pub fn enter(&mut self, node: &CycleNode) -> Result<bool, Vec<CycleNode>> {
        match self.colors.get(node) {
            Some(Color::Black) => Ok(false),
            Some(Color::Gray) => {
                let start = self.path.iter().position(|n| n == node).unwrap_or(0);
                let mut cycle = self.path[start..].to_vec();
                cycle.push(node.clone());
                Err(cycle)
            }
            None => {
                self.colors.insert(node.clone(), Color::Gray);
                self.path.push(node.clone());
                Ok(true)
            }
        }
    }

    /// Pop the most recently entered node and mark it processed.
    pub fn exit(&mut self) {
        if let Some(node) = self.path.pop() {
            self.colors.insert(node, Color::Black);
        }
    }

    /// Current DFS depth.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// `A (path) → B (path) → A (path)`
pub fn format_cycle(cycle: &[CycleNode]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" → ")
}
