//! Dense count-table storage and the elementwise combine primitives
//! (component C5, `spec.md` §4.5).
//!
//! Every non-leaf subtemplate `s` of size `w` owns a dense `C(k, w) x n`
//! `f32` array: row `j` (a colex-ranked `w`-subset of colors) holds, for
//! every host vertex `v`, the number of colorful embeddings of `S_s`
//! rooted at `v` whose color set is exactly that subset. Leaf
//! subtemplates (`size == 1`) have no table of their own — see
//! `leaf_buf`, below — since their content never depends on which
//! template vertex the leaf nominally represents.
//!
//! Tables are allocated lazily, right before a subtemplate is first
//! written to, and released as soon as its parent has consumed it in the
//! combine phase (`engine.rs` drives this lifecycle), keeping the peak
//! resident set closer to "deepest open path" than "every subtemplate at
//! once" — the allocation discipline described in
//! `original_source/DataTableColMajor.hpp::initSubTempTable` /
//! `cleanSubTempTable`.

use crate::error::CountError;

/// dense `rows x n` table for one non-leaf subtemplate, row-major
/// (`data[row * n + v]`) so that a whole row is contiguous for SpMV/SpMM.
#[derive(Debug)]
pub struct SubtemplateTable {
    rows: usize,
    n: usize,
    data: Vec<f32>,
}

impl SubtemplateTable {
    pub fn alloc(rows: usize, n: usize) -> Result<Self, CountError> {
        let len = rows.checked_mul(n).ok_or_else(|| CountError::Oom {
            subtemplate: 0,
            detail: format!("table of {rows} rows x {n} columns overflows usize"),
        })?;
        Ok(Self { rows, n, data: vec![0.0f32; len] })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn row(&self, j: usize) -> &[f32] {
        &self.data[j * self.n..(j + 1) * self.n]
    }

    #[inline]
    pub fn row_mut(&mut self, j: usize) -> &mut [f32] {
        &mut self.data[j * self.n..(j + 1) * self.n]
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn zero_row(&mut self, j: usize) {
        self.row_mut(j).iter_mut().for_each(|x| *x = 0.0);
    }
}

/// `dst[v] += a[v] * b[v]` for every `v` — the elementwise combine used
/// when folding a `(main, aux)` split into a parent row, after the aux
/// side has already been pre-multiplied by the host adjacency (SpMV/SpMM).
#[inline]
pub fn fma(dst: &mut [f32], a: &[f32], b: &[f32]) {
    debug_assert_eq!(dst.len(), a.len());
    debug_assert_eq!(dst.len(), b.len());
    for i in 0..dst.len() {
        dst[i] += a[i] * b[i];
    }
}

/// `dst[v] += a[v] * b[v] * scale` — used exactly once, the first time an
/// `f32` overflow risk is detected, to shrink magnitudes before they climb
/// further up the chain. After that single use the run is considered
/// "scaled" for its remainder and subsequent combines fall back to plain
/// [`fma`]: every later row already carries the same scale factor, so
/// re-applying it would double-count it instead of correcting for it.
#[inline]
pub fn fma_scale(dst: &mut [f32], a: &[f32], b: &[f32], scale: f32) {
    debug_assert_eq!(dst.len(), a.len());
    debug_assert_eq!(dst.len(), b.len());
    for i in 0..dst.len() {
        dst[i] += a[i] * b[i] * scale;
    }
}

/// root-level combine into an `f64` accumulator: the last FMA of a run
/// needs more precision than the `f32` tables carry, since the final
/// estimate sums many colorings before normalization.
#[inline]
pub fn fma_last(dst: &mut [f64], a: &[f32], b: &[f32]) {
    debug_assert_eq!(dst.len(), a.len());
    debug_assert_eq!(dst.len(), b.len());
    for i in 0..dst.len() {
        dst[i] += (a[i] as f64) * (b[i] as f64);
    }
}

/// shared bottom-level storage, one dense length-`n` array per color. All
/// `size == 1` subtemplates read from this same buffer: the content of a
/// one-vertex subtree's count table is simply "is `v` colored `c`", which
/// has no dependency on which template vertex the leaf stands for.
#[derive(Debug)]
pub struct LeafBuf {
    k: usize,
    n: usize,
    data: Vec<f32>,
}

impl LeafBuf {
    pub fn new(k: usize, n: usize) -> Self {
        Self { k, n, data: vec![0.0f32; k * n] }
    }

    #[inline]
    pub fn color(&self, c: usize) -> &[f32] {
        &self.data[c * self.n..(c + 1) * self.n]
    }

    /// re-derive the leaf buffer from a fresh random coloring:
    /// `color(c)[v] = 1.0` iff `colors[v] == c`, `0.0` otherwise.
    /// Mirrors `original_source/CountMat.cpp::countCurBottom`.
    pub fn count_bottom(&mut self, colors: &[usize]) {
        debug_assert_eq!(colors.len(), self.n);
        self.data.iter_mut().for_each(|x| *x = 0.0);
        for (v, &c) in colors.iter().enumerate() {
            debug_assert!(c < self.k);
            self.data[c * self.n + v] = 1.0;
        }
    }
}
