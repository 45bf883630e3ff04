//! Topological ordering of pass nodes.
//!
//! The sorter walks the producer→consumer edges with an iterative post-order
//! depth-first traversal: a node is appended to the result only after every
//! node reachable from it has been appended, and the result is reversed so
//! producers precede consumers. The stack is explicit to keep deep graphs
//! away from recursion limits.
//!
//! Each node moves through three states, `NotProcessed` → `Visited` →
//! `Added`, and never back. A producer feeding several consumers is
//! finalized once; reaching a node that is `Visited` but not yet `Added`
//! means the traversal found a back edge, so the graph has a cycle and the
//! sort fails instead of looping.

use crate::error::FrameGraphError;

use super::node::{Node, NodeHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeStatus {
    NotProcessed,
    Visited,
    Added,
}

/// Order all enabled nodes so every producer precedes its consumers.
///
/// Disabled nodes are never roots and never appear in the result.
pub(crate) fn sort_nodes(nodes: &[Node]) -> Result<Vec<NodeHandle>, FrameGraphError> {
    let mut reverse_sorted: Vec<NodeHandle> = Vec::with_capacity(nodes.len());
    let mut status = vec![NodeStatus::NotProcessed; nodes.len()];
    let mut to_process: Vec<usize> = Vec::with_capacity(nodes.len());

    for root in 0..nodes.len() {
        if !nodes[root].enabled {
            continue;
        }

        to_process.push(root);

        while let Some(&index) = to_process.last() {
            match status[index] {
                // A producer feeding multiple consumers lands on the stack
                // more than once; only the first finalization counts.
                NodeStatus::Added => {
                    to_process.pop();
                }
                // All children were processed since this node was expanded,
                // so it can be finalized.
                NodeStatus::Visited => {
                    status[index] = NodeStatus::Added;
                    reverse_sorted.push(NodeHandle::new(index as u32));
                    to_process.pop();
                }
                NodeStatus::NotProcessed => {
                    status[index] = NodeStatus::Visited;

                    for &edge in &nodes[index].edges {
                        match status[edge.index()] {
                            NodeStatus::NotProcessed => to_process.push(edge.index()),
                            // An expanded-but-unfinalized node is an ancestor
                            // on the current traversal path: back edge.
                            NodeStatus::Visited => {
                                return Err(FrameGraphError::DependencyCycle {
                                    from: nodes[index].name.clone(),
                                    to: nodes[edge.index()].name.clone(),
                                });
                            }
                            NodeStatus::Added => {}
                        }
                    }
                }
            }
        }
    }

    Ok(reverse_sorted.into_iter().rev().collect())
}
