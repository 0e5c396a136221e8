//! CSC partitioner and the SpMV/SpMM kernels built on top of it
//! (component C2, `spec.md` §4.2).
//!
//! Partitions are row-range-disjoint, so a thread-parallel walk over
//! partitions never has two threads write the same `y[row]` — no atomics,
//! no locks, just one mutable chunk of `y` handed to each partition.

use crate::graph::CscGraph;
use rayon::prelude::*;

/// number of dense columns processed together by one `spmm` call; one SIMD
/// register's worth of `f32` lanes on the hardware this kernel targets
pub const SPMM_BATCH: usize = 16;

/// one row-range-disjoint slice of the host graph's non-zeros, stored as
/// parallel `(col, row, val)` arrays, lexicographically grouped by column
/// within the partition (mirrors `original_source/CSCGraph.hpp::splitCSC`)
#[derive(Debug, Clone, Default)]
struct Partition {
    col: Vec<u32>,
    row: Vec<u32>,
    val: Vec<f32>,
}

/// the host graph's adjacency, split for thread-parallel SpMV/SpMM.
///
/// Contract: `spmv`/`spmm` do *not* zero their output buffer — the caller
/// must zero it first (see `engine.rs`, which zeros its scratch buffers
/// immediately before every kernel call, exactly as
/// `original_source/CountMat.cpp::countNonBottomePruned` zeros `_bufVec`
/// before invoking `spmvNaiveSplit`). Both kernels only *accumulate*.
pub struct PartitionedGraph {
    vertex_num: usize,
    per_piece: usize,
    partitions: Vec<Partition>,
}

impl PartitionedGraph {
    /// `num_partitions` should be `4 * worker_count` per `spec.md` §3; more
    /// partitions than workers keeps each worker's chunk small enough that
    /// a straggler partition doesn't stall the whole SpMV/SpMM call.
    pub fn new(graph: &CscGraph, num_partitions: usize) -> Self {
        let vertex_num = graph.vertex_num();
        let num_partitions = num_partitions.max(1);
        let per_piece = (vertex_num + num_partitions - 1) / num_partitions.max(1);
        let per_piece = per_piece.max(1);
        let num_chunks = if vertex_num == 0 { 1 } else { (vertex_num + per_piece - 1) / per_piece };

        let mut partitions: Vec<Partition> = (0..num_chunks).map(|_| Partition::default()).collect();
        for c in 0..vertex_num {
            for &r in graph.column(c) {
                let owner = ((r as usize) / per_piece).min(num_chunks - 1);
                partitions[owner].col.push(c as u32);
                partitions[owner].row.push(r);
                partitions[owner].val.push(1.0);
            }
        }

        Self {
            vertex_num,
            per_piece,
            partitions,
        }
    }

    #[inline]
    pub fn vertex_num(&self) -> usize {
        self.vertex_num
    }

    /// `y += A * x`; caller must have zeroed `y`.
    pub fn spmv(&self, x: &[f32], y: &mut [f32]) {
        debug_assert_eq!(x.len(), self.vertex_num);
        debug_assert_eq!(y.len(), self.vertex_num);
        y.par_chunks_mut(self.per_piece).enumerate().for_each(|(idx, y_chunk)| {
            let offset = idx * self.per_piece;
            let part = &self.partitions[idx];
            for i in 0..part.row.len() {
                let row = part.row[i] as usize - offset;
                let col = part.col[i] as usize;
                y_chunk[row] += part.val[i] * x[col];
            }
        });
    }

    /// `Y += A * X` for a batch of `batch` dense columns, both stored
    /// row-major with stride `batch` (`buf[v * batch + k]`). Because every
    /// non-zero value is `1.0`, the multiply is elided — pure accumulation,
    /// matching `original_source/CSCGraph.hpp::spmmSplit`'s comment that the
    /// AVX-512 path only ever adds.
    pub fn spmm(&self, x_row_major: &[f32], y_row_major: &mut [f32], batch: usize) {
        debug_assert_eq!(x_row_major.len(), self.vertex_num * batch);
        debug_assert_eq!(y_row_major.len(), self.vertex_num * batch);
        y_row_major
            .par_chunks_mut(self.per_piece * batch)
            .enumerate()
            .for_each(|(idx, y_chunk)| {
                let offset = idx * self.per_piece * batch;
                let part = &self.partitions[idx];
                for i in 0..part.row.len() {
                    let row_local = part.row[i] as usize * batch - offset;
                    let col = part.col[i] as usize * batch;
                    for k in 0..batch {
                        y_chunk[row_local + k] += x_row_major[col + k];
                    }
                }
            });
    }
}

/// `dst[v * batch + k] = src[k * n + v]`: column-major batch to row-major,
/// the layout `spmm` operates on.
pub fn to_row_major(src_col_major: &[f32], n: usize, batch: usize, dst_row_major: &mut [f32]) {
    debug_assert_eq!(src_col_major.len(), n * batch);
    debug_assert_eq!(dst_row_major.len(), n * batch);
    for k in 0..batch {
        let col = &src_col_major[k * n..(k + 1) * n];
        for v in 0..n {
            dst_row_major[v * batch + k] = col[v];
        }
    }
}

/// inverse of [`to_row_major`]
pub fn from_row_major(src_row_major: &[f32], n: usize, batch: usize, dst_col_major: &mut [f32]) {
    debug_assert_eq!(src_row_major.len(), n * batch);
    debug_assert_eq!(dst_col_major.len(), n * batch);
    for k in 0..batch {
        let col = &mut dst_col_major[k * n..(k + 1) * n];
        for v in 0..n {
            col[v] = src_row_major[v * batch + k];
        }
    }
}
