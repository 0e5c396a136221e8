//! Optional reverse Cuthill-McKee vertex reordering.
//!
//! Not requested by name in the counting method itself, but cheap,
//! independently testable, and a natural complement to the partitioned
//! SpMV/SpMM kernels: RCM tends to shrink a graph's bandwidth, which packs
//! a vertex's neighbors closer together in `row_idx` and improves cache
//! locality inside each partition. Off by default; enabled with `--reorder`.
//! Grounded on `original_source/SpMP/Permute.cpp`'s BFS-by-ascending-degree
//! ordering, expressed here without its in-place CSR mutation.

use crate::graph::CscGraph;
use std::collections::VecDeque;

/// compute the RCM vertex permutation: `result[v]` is the id `v` is
/// relabeled to. Apply it with [`CscGraph::permuted`].
pub fn rcm_order(graph: &CscGraph) -> Vec<u32> {
    let n = graph.vertex_num();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    let mut by_degree: Vec<usize> = (0..n).collect();
    by_degree.sort_by_key(|&v| graph.degree(v));

    for &start in &by_degree {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        order.push(start);
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(u) = queue.pop_front() {
            let mut neighbors: Vec<usize> =
                graph.column(u).iter().map(|&r| r as usize).filter(|&v| !visited[v]).collect();
            neighbors.sort_by_key(|&v| graph.degree(v));
            for v in neighbors {
                if !visited[v] {
                    visited[v] = true;
                    order.push(v);
                    queue.push_back(v);
                }
            }
        }
    }

    order.reverse();
    let mut new_id = vec![0u32; n];
    for (new, &old) in order.iter().enumerate() {
        new_id[old] = new as u32;
    }
    new_id
}
