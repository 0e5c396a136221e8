//! Host graph ingest and CSC storage (component C1 / data model §3).
//!
//! `CscGraph` is built once from a raw edge list and is read-only for the
//! rest of the run: the counting driver never mutates `col_ptr`/`row_idx`,
//! only the partitioned copy in `partition.rs` is consulted during SpMV/SpMM.

use crate::error::CountError;
use crate::util::VertexNum;

/// undirected, simple host graph in compressed-sparse-column form.
///
/// Invariant: the graph is symmetric (an edge `(u, v)` produces both
/// `row_idx` entries `u` in column `v` and `v` in column `u`), and every
/// value in `vals` is `1.0` (multiplicity-one edges), matching
/// `original_source/CSCGraph.hpp`.
#[derive(Debug, Clone)]
pub struct CscGraph {
    vertex_num: VertexNum,
    /// number of edges in the original (non-doubled) edge list
    num_edges: usize,
    /// degree of each vertex, parallel to `col_ptr`
    deg_list: Vec<u32>,
    /// length `vertex_num + 1`, monotone, `col_ptr[vertex_num] == nnz`
    col_ptr: Vec<u32>,
    /// length `nnz`, row ids sorted ascending within each column
    row_idx: Vec<u32>,
    /// length `nnz`, all `1.0`
    vals: Vec<f32>,
}

impl CscGraph {
    /// Build a symmetric CSC graph from a compacted edge list: `src`/`dst`
    /// must already have every id in `[0, vertex_num)` (see `io.rs` for the
    /// relabeling pass that produces that guarantee from raw input).
    ///
    /// Mirrors `original_source/CSCGraph.hpp::createFromEdgeListFile`: count
    /// degrees (symmetric, +1 per endpoint), prefix-sum into `col_ptr`,
    /// scatter into `row_idx` with a per-column cursor, then sort each
    /// column's run ascending.
    pub fn from_edge_list(vertex_num: VertexNum, src: &[u32], dst: &[u32]) -> Result<Self, CountError> {
        if src.len() != dst.len() {
            return Err(CountError::MalformedInput(
                "source and destination edge lists differ in length".to_string(),
            ));
        }
        for &v in src.iter().chain(dst.iter()) {
            if v as usize >= vertex_num {
                return Err(CountError::MalformedInput(format!(
                    "edge endpoint {v} out of range for vertex_num {vertex_num}"
                )));
            }
        }

        let num_edges = src.len();
        let mut deg_list = vec![0u32; vertex_num];
        for i in 0..num_edges {
            let (s, d) = (src[i], dst[i]);
            deg_list[d as usize] += 1;
            if s != d {
                deg_list[s as usize] += 1;
            } else {
                // a self-loop only contributes one CSC entry in this
                // undirected encoding; spec graphs are simple, so this is
                // defensive bookkeeping rather than an expected case
            }
        }

        let mut col_ptr = vec![0u32; vertex_num + 1];
        for i in 0..vertex_num {
            col_ptr[i + 1] = col_ptr[i] + deg_list[i];
        }
        let nnz = col_ptr[vertex_num] as usize;

        let mut row_idx = vec![0u32; nnz];
        let mut cursor = col_ptr.clone();
        for i in 0..num_edges {
            let (s, d) = (src[i], dst[i]);
            row_idx[cursor[d as usize] as usize] = s;
            cursor[d as usize] += 1;
            if s != d {
                row_idx[cursor[s as usize] as usize] = d;
                cursor[s as usize] += 1;
            }
        }

        for c in 0..vertex_num {
            let start = col_ptr[c] as usize;
            let end = col_ptr[c + 1] as usize;
            row_idx[start..end].sort_unstable();
        }

        let vals = vec![1.0f32; nnz];

        Ok(Self {
            vertex_num,
            num_edges,
            deg_list,
            col_ptr,
            row_idx,
            vals,
        })
    }

    #[inline]
    pub fn vertex_num(&self) -> VertexNum {
        self.vertex_num
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        *self.col_ptr.last().unwrap() as usize
    }

    #[inline]
    pub fn degree(&self, v: usize) -> u32 {
        self.deg_list[v]
    }

    #[inline]
    pub fn deg_list(&self) -> &[u32] {
        &self.deg_list
    }

    #[inline]
    pub fn col_ptr(&self) -> &[u32] {
        &self.col_ptr
    }

    #[inline]
    pub fn row_idx(&self) -> &[u32] {
        &self.row_idx
    }

    #[inline]
    pub fn vals(&self) -> &[f32] {
        &self.vals
    }

    /// row ids for column `c`, already sorted ascending
    #[inline]
    pub fn column(&self, c: usize) -> &[u32] {
        let start = self.col_ptr[c] as usize;
        let end = self.col_ptr[c + 1] as usize;
        &self.row_idx[start..end]
    }

    /// dense-graph byte footprint of `col_ptr + row_idx + vals + deg_list`,
    /// used by the peak-memory estimate in `engine.rs`
    pub fn graph_bytes(&self) -> usize {
        self.deg_list.len() * 4 + self.col_ptr.len() * 4 + self.row_idx.len() * 4 + self.vals.len() * 4
    }

    /// Construct an equivalent graph under a vertex permutation: `new_id[v]`
    /// is the id vertex `v` is relabeled to. Used by the optional RCM
    /// reordering pass (`rcm.rs`); never changes adjacency, only numbering.
    pub fn permuted(&self, new_id: &[u32]) -> Result<Self, CountError> {
        if new_id.len() != self.vertex_num {
            return Err(CountError::InvariantViolated {
                subtemplate: 0,
                detail: "permutation length does not match vertex_num".to_string(),
            });
        }
        let mut src = Vec::with_capacity(self.nnz());
        let mut dst = Vec::with_capacity(self.nnz());
        for c in 0..self.vertex_num {
            for &r in self.column(c) {
                if r >= c as u32 {
                    // undirected: emit each edge exactly once, from either side
                    src.push(new_id[r as usize]);
                    dst.push(new_id[c]);
                }
            }
        }
        Self::from_edge_list(self.vertex_num, &src, &dst)
    }
}
