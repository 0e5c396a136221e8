//! The counting driver (component C6, `spec.md` §4.6): ties the graph,
//! decomposition, indexer, and count tables together and runs the
//! color-coding estimator for `R` iterations.
//!
//! Per iteration: draw a fresh random coloring, seed the shared leaf
//! buffer from it, then walk the subtemplate chain bottom-up (children
//! always precede their parent, by construction of `decompose.rs`).
//! For each non-leaf subtemplate, the aux child's rows are pre-multiplied
//! by the host adjacency (SpMV for a single row, batched SpMM for many),
//! then folded into the parent row-by-row via the split table built in
//! `indexer.rs`. Each child table is released as soon as its parent has
//! consumed it (`original_source/DataTableColMajor.hpp::cleanSubTempTable`).

use crate::count_table::{fma, fma_last, fma_scale, LeafBuf, SubtemplateTable};
use crate::decompose::Decomposition;
use crate::error::CountError;
use crate::graph::CscGraph;
use crate::indexer::{CombIndexer, SplitTable};
use crate::partition::{from_row_major, to_row_major, PartitionedGraph, SPMM_BATCH};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// magnitude past which a table entry is treated as an overflow risk for
/// `f32` accumulation; triggers the one-time `1e-12` scale-down.
const SCALE_TRIGGER: f32 = 1.0e18;
const SCALE_DOWN: f32 = 1.0e-12;
const SCALE_UP: f64 = 1.0e12;

/// magnitude an `f32` table entry must stay under even after the one-time
/// `SCALE_DOWN` factor has been applied; exceeding it (or turning
/// non-finite) means the count is no longer numerically reliable
/// (`spec.md` §4.6: "if post-scaling any entry still exceeds a configured
/// maximum, treat as Saturation (fatal...)").
const SATURATION_LIMIT_F32: f32 = 1.0e30;
/// same check for the root subtemplate's f64 accumulator, which has a
/// much larger representable range but is not unbounded.
const SATURATION_LIMIT_F64: f64 = 1.0e300;

fn check_saturation_f32(row: &[f32], subtemplate: usize) -> Result<(), CountError> {
    if row.iter().any(|x| !x.is_finite() || x.abs() > SATURATION_LIMIT_F32) {
        return Err(CountError::Saturation {
            subtemplate,
            detail: format!("table entry exceeded {SATURATION_LIMIT_F32:e} after scaling"),
        });
    }
    Ok(())
}

fn check_saturation_f64(row: &[f64], subtemplate: usize) -> Result<(), CountError> {
    if row.iter().any(|x| !x.is_finite() || x.abs() > SATURATION_LIMIT_F64) {
        return Err(CountError::Saturation {
            subtemplate,
            detail: format!("root accumulator exceeded {SATURATION_LIMIT_F64:e}"),
        });
    }
    Ok(())
}

pub struct CountConfig {
    pub iterations: u64,
    /// palette size; must be `>= color_num` (`k`, the template's vertex
    /// count). Equal to `k` unless the caller asks for a larger palette to
    /// raise the per-iteration success probability at the cost of more
    /// iterations needed for the same variance.
    pub num_colors: usize,
    /// number of row-range-disjoint partitions handed to `rayon`, see
    /// `partition.rs`
    pub num_partitions: usize,
    /// batch aux pre-multiplies through `spmm` instead of one `spmv` call
    /// per row
    pub use_spmm: bool,
    /// restrict the pre-multiply phase to the aux ranks a split table
    /// actually references (`SplitTable::effective_aux`, `spec.md` §4.4),
    /// instead of every row of the aux table. Default on; `--pruned=0`
    /// (CLI) or setting this to `false` recovers the unpruned baseline for
    /// comparison, matching the original's `isPruned` flag.
    pub pruned: bool,
    /// base seed; iteration `i` draws its coloring from `seed ^ i`, which
    /// makes every run reproducible given the same seed and iteration
    /// count (`spec.md` §9 resolves the original's wall-clock seeding as
    /// an open question in favor of this deterministic scheme)
    pub seed: u64,
    /// if set, the first iteration prints the sum of this subtemplate's
    /// root row to stderr once it is filled — a debugging trace named by
    /// `spec.md` §6's `profile_trigger_subtemplate_index` CLI argument
    /// (there repurposed from a VTune trigger, which this crate has no
    /// equivalent of, into a plain accumulation trace).
    pub trace_subtemplate: Option<usize>,
}

pub struct CountEngine<'a> {
    graph: PartitionedGraph,
    host_vertex_num: usize,
    decomposition: &'a Decomposition,
    indexer: CombIndexer,
    split_tables: Vec<Option<SplitTable>>,
    automorphism_num: u64,
    config: CountConfig,
}

/// final, normalized subgraph count together with the raw per-iteration
/// average, so a caller can report both if useful for diagnostics
pub struct CountReport {
    pub estimate: u64,
    pub raw_average: f64,
    pub was_scaled: bool,
    /// set when `CountConfig::trace_subtemplate` named a valid index: the
    /// sum of that subtemplate's first row after the first iteration.
    pub trace_value: Option<f64>,
}

impl<'a> CountEngine<'a> {
    pub fn new(
        graph: &CscGraph,
        decomposition: &'a Decomposition,
        automorphism_num: u64,
        config: CountConfig,
    ) -> Result<Self, CountError> {
        if config.num_colors < decomposition.color_num {
            return Err(CountError::MalformedInput(format!(
                "palette of {} colors is smaller than the template's {} vertices",
                config.num_colors, decomposition.color_num
            )));
        }
        let indexer = CombIndexer::new(decomposition.color_num);
        let split_tables = decomposition
            .chain
            .iter()
            .map(|s| {
                if s.is_leaf() {
                    None
                } else {
                    let m = &decomposition.chain[s.main.unwrap()];
                    let a = &decomposition.chain[s.aux.unwrap()];
                    Some(SplitTable::build(&indexer, s.size, m.size, a.size))
                }
            })
            .collect();
        let partitioned = PartitionedGraph::new(graph, config.num_partitions);
        Ok(Self {
            graph: partitioned,
            host_vertex_num: graph.vertex_num(),
            decomposition,
            indexer,
            split_tables,
            automorphism_num,
            config,
        })
    }

    /// rough peak resident-set estimate: the largest subtemplate table
    /// alive at once, plus the shared leaf buffer and the partitioned
    /// graph's own storage. Reported to the caller ahead of a run so an
    /// operator can abort before committing to an allocation that won't fit.
    pub fn peak_memory_estimate_bytes(&self) -> usize {
        let n = self.host_vertex_num;
        let k = self.decomposition.color_num;
        // matches `LeafBuf::new(self.config.num_colors, n)` in `run()`.
        let leaf_bytes = self.config.num_colors * n * 4;
        let largest_table_bytes = self
            .decomposition
            .chain
            .iter()
            .filter(|s| !s.is_leaf())
            .map(|s| self.indexer.binom(k, s.size) as usize * n * 4)
            .max()
            .unwrap_or(0);
        // two tables (main + aux) plus one aux pre-multiply buffer can be
        // resident at once during a single combine
        leaf_bytes + 3 * largest_table_bytes
    }

    pub fn run(&self) -> Result<CountReport, CountError> {
        let n = self.host_vertex_num;
        let k = self.decomposition.color_num;
        // sized by the palette (`num_colors`), not `k`: a caller-supplied
        // palette larger than the template's vertex count is explicitly
        // allowed (`CountEngine::new` only rejects the opposite case), and
        // `colors[v]` is sampled from the full palette below.
        let mut leaf_buf = LeafBuf::new(self.config.num_colors, n);
        let mut tables: Vec<Option<SubtemplateTable>> = (0..self.decomposition.chain.len()).map(|_| None).collect();
        let root_idx = self.decomposition.root_index();
        if self.decomposition.chain[root_idx].is_leaf() {
            // k == 1: the template is a single vertex, so every host vertex
            // trivially embeds it regardless of coloring.
            let prob_colorful = self.probability_colorful();
            let estimate = (n as f64 / (prob_colorful * self.automorphism_num as f64)).max(0.0).round() as u64;
            return Ok(CountReport { estimate, raw_average: n as f64, was_scaled: false, trace_value: None });
        }
        let mut total = 0.0f64;
        let mut trace_value: Option<f64> = None;
        let mut was_scaled_ever = false;

        for iter in 0..self.config.iterations {
            // the scaling flag is sticky only within one iteration: each
            // coloring is an independent trial, so a scale-down triggered
            // by one iteration's magnitudes must not leak into the next
            // (`spec.md` §4.5/§9, `original_source/CountMat.cpp::colorCounting`
            // resets `_isScaled` at the top of every call).
            let mut is_scaled = false;
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed ^ iter);
            let colors: Vec<usize> = (0..n).map(|_| rng.gen_range(0..self.config.num_colors)).collect();
            leaf_buf.count_bottom(&colors);
            let mut root_dst = vec![0.0f64; n];

            for i in 0..self.decomposition.chain.len() {
                let s = &self.decomposition.chain[i];
                if s.is_leaf() {
                    continue;
                }
                let m_idx = s.main.unwrap();
                let a_idx = s.aux.unwrap();
                let m_sub = &self.decomposition.chain[m_idx];
                let a_sub = &self.decomposition.chain[a_idx];
                let split_table = self.split_tables[i].as_ref().expect("non-leaf subtemplate always has a split table");
                let rows = split_table.splits.len();
                let aux_rows = self.indexer.binom(k, a_sub.size) as usize;

                let main_table_owned = tables[m_idx].take();
                let aux_table_owned = tables[a_idx].take();

                let effective: Vec<usize> =
                    if self.config.pruned { split_table.effective_aux.clone() } else { (0..aux_rows).collect() };

                let aux_pre = {
                    let get_aux_row = |r: usize| -> &[f32] {
                        if a_sub.is_leaf() {
                            leaf_buf.color(r)
                        } else {
                            aux_table_owned.as_ref().unwrap().row(r)
                        }
                    };
                    if self.config.use_spmm {
                        self.premultiply_spmm(n, aux_rows, &effective, get_aux_row)
                    } else {
                        self.premultiply_spmv(n, aux_rows, &effective, get_aux_row)
                    }
                };

                if i == root_idx {
                    // root subtemplate (s = 0 in `spec.md`'s reverse walk):
                    // fold straight into an f64 accumulator via `fma_last`
                    // instead of the generic f32 table path, so the root's
                    // sum over many colorful splits doesn't lose precision
                    // the way an f32 accumulation would (`spec.md` §4.5/4.6.ii).
                    for &(main_rank, aux_rank) in &split_table.splits[0] {
                        let main_row = if m_sub.is_leaf() {
                            leaf_buf.color(main_rank)
                        } else {
                            main_table_owned.as_ref().unwrap().row(main_rank)
                        };
                        let aux_row = &aux_pre[aux_rank * n..(aux_rank + 1) * n];
                        fma_last(&mut root_dst, main_row, aux_row);
                    }
                    check_saturation_f64(&root_dst, i)?;
                    if iter == 0 && self.config.trace_subtemplate == Some(i) {
                        trace_value = Some(root_dst.iter().sum());
                    }
                    // main_table_owned / aux_table_owned drop here
                    continue;
                }

                let mut out = SubtemplateTable::alloc(rows, n).map_err(|_| CountError::Oom {
                    subtemplate: i,
                    detail: format!("{rows} rows x {n} columns"),
                })?;
                for j in 0..rows {
                    for &(main_rank, aux_rank) in &split_table.splits[j] {
                        let main_row = if m_sub.is_leaf() {
                            leaf_buf.color(main_rank)
                        } else {
                            main_table_owned.as_ref().unwrap().row(main_rank)
                        };
                        let aux_row = &aux_pre[aux_rank * n..(aux_rank + 1) * n];
                        if !is_scaled && aux_row.iter().any(|x| x.abs() > SCALE_TRIGGER) {
                            fma_scale(out.row_mut(j), main_row, aux_row, SCALE_DOWN);
                            is_scaled = true;
                        } else {
                            fma(out.row_mut(j), main_row, aux_row);
                        }
                    }
                }
                check_saturation_f32(out.data(), i)?;
                if iter == 0 && self.config.trace_subtemplate == Some(i) {
                    trace_value = Some(out.row(0).iter().map(|&x| x as f64).sum());
                }
                tables[i] = Some(out);
                // main_table_owned / aux_table_owned drop here: released
                // the moment their parent has consumed them
            }

            let mut iter_sum: f64 = root_dst.iter().sum();
            if is_scaled {
                iter_sum *= SCALE_UP;
                was_scaled_ever = true;
            }
            total += iter_sum;
        }

        let average = total / self.config.iterations as f64;
        let prob_colorful = self.probability_colorful();
        let normalized = average / (prob_colorful * self.automorphism_num as f64);
        let estimate = normalized.max(0.0).round() as u64;

        Ok(CountReport { estimate, raw_average: average, was_scaled: was_scaled_ever, trace_value })
    }

    /// `P[a uniform coloring with `num_colors` colors assigns `k` distinct
    /// colors to a fixed set of `k` vertices] = k! / ((num_colors-k)! * num_colors^k)`
    fn probability_colorful(&self) -> f64 {
        let k = self.decomposition.color_num;
        let c = self.config.num_colors;
        let mut num = 1.0f64;
        for i in 0..k {
            num *= (c - i) as f64;
        }
        num / (c as f64).powi(k as i32)
    }

    /// SpMV-premultiply only `indices` (rather than every row of
    /// `0..rows`); entries outside `indices` stay zero and are never read
    /// back, since a split table's `aux_rank` values are drawn from
    /// exactly that set when pruning is enabled (`SplitTable::effective_aux`).
    fn premultiply_spmv<'b>(&self, n: usize, rows: usize, indices: &[usize], get_row: impl Fn(usize) -> &'b [f32]) -> Vec<f32> {
        let mut out = vec![0.0f32; rows * n];
        for &r in indices {
            let mut y = vec![0.0f32; n];
            self.graph.spmv(get_row(r), &mut y);
            out[r * n..(r + 1) * n].copy_from_slice(&y);
        }
        out
    }

    /// batched counterpart of [`Self::premultiply_spmv`]: groups `indices`
    /// into `SPMM_BATCH`-sized chunks (not necessarily contiguous rows),
    /// runs one `spmm` call per full chunk, then scatters each column back
    /// to its original row in the `rows * n` output.
    fn premultiply_spmm<'b>(&self, n: usize, rows: usize, indices: &[usize], get_row: impl Fn(usize) -> &'b [f32]) -> Vec<f32> {
        let mut dst_col = vec![0.0f32; rows * n];
        let mut pos = 0;
        while pos + SPMM_BATCH <= indices.len() {
            let chunk = &indices[pos..pos + SPMM_BATCH];
            let mut src_col = vec![0.0f32; n * SPMM_BATCH];
            for (k, &r) in chunk.iter().enumerate() {
                src_col[k * n..(k + 1) * n].copy_from_slice(get_row(r));
            }
            let mut x_row = vec![0.0f32; n * SPMM_BATCH];
            to_row_major(&src_col, n, SPMM_BATCH, &mut x_row);
            let mut y_row = vec![0.0f32; n * SPMM_BATCH];
            self.graph.spmm(&x_row, &mut y_row, SPMM_BATCH);
            let mut y_col = vec![0.0f32; n * SPMM_BATCH];
            from_row_major(&y_row, n, SPMM_BATCH, &mut y_col);
            for (k, &r) in chunk.iter().enumerate() {
                dst_col[r * n..(r + 1) * n].copy_from_slice(&y_col[k * n..(k + 1) * n]);
            }
            pos += SPMM_BATCH;
        }
        while pos < indices.len() {
            let r = indices[pos];
            let mut y = vec![0.0f32; n];
            self.graph.spmv(get_row(r), &mut y);
            dst_col[r * n..(r + 1) * n].copy_from_slice(&y);
            pos += 1;
        }
        dst_col
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automorphism;
    use crate::decompose::decompose;
    use crate::template::Template;

    /// triangle host graph, path-of-2 (single edge) template: the estimator
    /// should recover exactly the number of edges in the host graph (each
    /// edge is matched twice, once from either endpoint, and each labeled
    /// edge embedding has `|Aut(edge)| = 2`, so the two exactly cancel).
    #[test]
    fn single_edge_template_counts_host_edges() {
        let host = CscGraph::from_edge_list(3, &[0, 1, 0], &[1, 2, 2]).unwrap(); // triangle, 3 edges
        let template = Template::path(2).unwrap();
        let decomposition = decompose(&template);
        let automorphism_num = 2; // an edge has 2 automorphisms
        let config = CountConfig {
            iterations: 200,
            num_colors: 2,
            num_partitions: 2,
            use_spmm: false,
            pruned: true,
            seed: 42,
            trace_subtemplate: None,
        };
        let engine = CountEngine::new(&host, &decomposition, automorphism_num, config).unwrap();
        let report = engine.run().unwrap();
        assert_eq!(report.estimate, 3);
    }

    #[test]
    fn rejects_palette_smaller_than_template() {
        let host = CscGraph::from_edge_list(2, &[0], &[1]).unwrap();
        let template = Template::path(3).unwrap();
        let decomposition = decompose(&template);
        let config = CountConfig {
            iterations: 1,
            num_colors: 2,
            num_partitions: 1,
            use_spmm: false,
            pruned: true,
            seed: 1,
            trace_subtemplate: None,
        };
        let err = CountEngine::new(&host, &decomposition, 2, config).unwrap_err();
        assert!(matches!(err, CountError::MalformedInput(_)));
    }

    #[test]
    fn pruned_and_unpruned_agree_on_a_petersen_like_cycle() {
        let n = 10;
        let mut src = vec![];
        let mut dst = vec![];
        for i in 0..n {
            src.push(i as u32);
            dst.push(((i + 1) % n) as u32);
        }
        let host = CscGraph::from_edge_list(n, &src, &dst).unwrap();
        let template = Template::path(4).unwrap();
        let decomposition = decompose(&template);
        let automorphism_num = 2;
        let base = CountConfig {
            iterations: 400,
            num_colors: 4,
            num_partitions: 4,
            use_spmm: false,
            pruned: true,
            seed: 7,
            trace_subtemplate: None,
        };
        let engine_pruned = CountEngine::new(&host, &decomposition, automorphism_num, base).unwrap();
        let pruned_report = engine_pruned.run().unwrap();

        let unpruned = CountConfig {
            iterations: 400,
            num_colors: 4,
            num_partitions: 4,
            use_spmm: false,
            pruned: false,
            seed: 7,
            trace_subtemplate: None,
        };
        let engine_unpruned = CountEngine::new(&host, &decomposition, automorphism_num, unpruned).unwrap();
        let unpruned_report = engine_unpruned.run().unwrap();

        // same seed, same coloring sequence -> identical raw sums regardless
        // of whether the pre-multiply phase skipped unreferenced aux rows
        assert_eq!(pruned_report.raw_average, unpruned_report.raw_average);
    }

    #[test]
    fn spmm_premultiply_matches_spmv_premultiply() {
        let host = CscGraph::from_edge_list(5, &[0, 1, 2, 3, 4], &[1, 2, 3, 4, 0]).unwrap();
        let template = Template::star(4).unwrap();
        let decomposition = decompose(&template);
        let automorphism_num = 6; // star on 4 vertices: (4-1)! = 6
        let spmv_config = CountConfig {
            iterations: 300,
            num_colors: 4,
            num_partitions: 3,
            use_spmm: false,
            pruned: true,
            seed: 99,
            trace_subtemplate: None,
        };
        let spmv_engine = CountEngine::new(&host, &decomposition, automorphism_num, spmv_config).unwrap();
        let spmv_report = spmv_engine.run().unwrap();

        let spmm_config = CountConfig {
            iterations: 300,
            num_colors: 4,
            num_partitions: 3,
            use_spmm: true,
            pruned: true,
            seed: 99,
            trace_subtemplate: None,
        };
        let spmm_engine = CountEngine::new(&host, &decomposition, automorphism_num, spmm_config).unwrap();
        let spmm_report = spmm_engine.run().unwrap();

        assert_eq!(spmv_report.raw_average, spmm_report.raw_average);
    }

    #[test]
    fn peak_memory_estimate_is_positive_for_a_nontrivial_template() {
        let host = CscGraph::from_edge_list(4, &[0, 1, 2], &[1, 2, 3]).unwrap();
        let template = Template::path(3).unwrap();
        let decomposition = decompose(&template);
        let config = CountConfig {
            iterations: 1,
            num_colors: 3,
            num_partitions: 1,
            use_spmm: false,
            pruned: true,
            seed: 1,
            trace_subtemplate: None,
        };
        let engine = CountEngine::new(&host, &decomposition, 2, config).unwrap();
        assert!(engine.peak_memory_estimate_bytes() > 0);
    }

    /// S1: triangle host, P3 template. True unordered count is 3.
    #[test]
    fn triangle_host_p3_template_matches_known_count() {
        let host = CscGraph::from_edge_list(3, &[0, 1, 0], &[1, 2, 2]).unwrap();
        let template = Template::path(3).unwrap();
        let decomposition = decompose(&template);
        let automorphism_num = automorphism::automorphism_num(&template);
        assert_eq!(automorphism_num, 2);
        let config = CountConfig {
            iterations: 200,
            num_colors: 3,
            num_partitions: 2,
            use_spmm: false,
            pruned: true,
            seed: 42,
            trace_subtemplate: None,
        };
        let engine = CountEngine::new(&host, &decomposition, automorphism_num, config).unwrap();
        let report = engine.run().unwrap();
        assert!((report.estimate as i64 - 3).abs() <= 1, "estimate={}", report.estimate);
    }

    /// S2: 4-cycle host, P3 template. True count is 4.
    #[test]
    fn four_cycle_host_p3_template_matches_known_count() {
        let host = CscGraph::from_edge_list(4, &[0, 1, 2, 3], &[1, 2, 3, 0]).unwrap();
        let template = Template::path(3).unwrap();
        let decomposition = decompose(&template);
        let automorphism_num = automorphism::automorphism_num(&template);
        let config = CountConfig {
            iterations: 200,
            num_colors: 3,
            num_partitions: 2,
            use_spmm: false,
            pruned: true,
            seed: 11,
            trace_subtemplate: None,
        };
        let engine = CountEngine::new(&host, &decomposition, automorphism_num, config).unwrap();
        let report = engine.run().unwrap();
        assert!((report.estimate as i64 - 4).abs() <= 1, "estimate={}", report.estimate);
    }

    /// S3: star K_{1,5} host, P3 template. True count is C(5,2) = 10.
    #[test]
    fn star_host_p3_template_matches_known_count() {
        let host = CscGraph::from_edge_list(6, &[0, 0, 0, 0, 0], &[1, 2, 3, 4, 5]).unwrap();
        let template = Template::path(3).unwrap();
        let decomposition = decompose(&template);
        let automorphism_num = automorphism::automorphism_num(&template);
        let config = CountConfig {
            iterations: 500,
            num_colors: 3,
            num_partitions: 4,
            use_spmm: true,
            pruned: true,
            seed: 5,
            trace_subtemplate: None,
        };
        let engine = CountEngine::new(&host, &decomposition, automorphism_num, config).unwrap();
        let report = engine.run().unwrap();
        assert!((report.estimate as i64 - 10).abs() <= 2, "estimate={}", report.estimate);
    }

    /// S4: Petersen graph host, P4 template. Known count is 120.
    #[test]
    fn petersen_host_p4_template_matches_known_count() {
        // outer 5-cycle 0..4, inner 5-cycle (pentagram) 5..9, spokes i -> i+5
        let outer: Vec<(u32, u32)> = (0..5).map(|i| (i, (i + 1) % 5)).collect();
        let inner: Vec<(u32, u32)> = (0..5).map(|i| (5 + i, 5 + (i + 2) % 5)).collect();
        let spokes: Vec<(u32, u32)> = (0..5).map(|i| (i, 5 + i)).collect();
        let mut src = vec![];
        let mut dst = vec![];
        for &(u, v) in outer.iter().chain(inner.iter()).chain(spokes.iter()) {
            src.push(u);
            dst.push(v);
        }
        let host = CscGraph::from_edge_list(10, &src, &dst).unwrap();
        assert_eq!(host.num_edges(), 15);

        let template = Template::path(4).unwrap();
        let decomposition = decompose(&template);
        let automorphism_num = automorphism::automorphism_num(&template);
        let config = CountConfig {
            iterations: 1000,
            num_colors: 4,
            num_partitions: 4,
            use_spmm: true,
            pruned: true,
            seed: 3,
            trace_subtemplate: None,
        };
        let engine = CountEngine::new(&host, &decomposition, automorphism_num, config).unwrap();
        let report = engine.run().unwrap();
        assert!((report.estimate as i64 - 120).abs() <= 12, "estimate={}", report.estimate);
    }

    #[test]
    fn trace_subtemplate_reports_a_value_only_when_requested() {
        let host = CscGraph::from_edge_list(4, &[0, 1, 2], &[1, 2, 3]).unwrap();
        let template = Template::path(3).unwrap();
        let decomposition = decompose(&template);
        let config = CountConfig {
            iterations: 2,
            num_colors: 3,
            num_partitions: 1,
            use_spmm: false,
            pruned: true,
            seed: 1,
            trace_subtemplate: Some(decomposition.root_index()),
        };
        let engine = CountEngine::new(&host, &decomposition, 2, config).unwrap();
        let report = engine.run().unwrap();
        assert!(report.trace_value.is_some());
    }

    /// a palette larger than the template's vertex count is explicitly
    /// allowed (`CountEngine::new` only rejects the opposite case); the
    /// leaf buffer must be sized to the palette, not `k`, or sampling a
    /// color `>= k` indexes past the end of its storage.
    #[test]
    fn palette_larger_than_template_does_not_panic() {
        let host = CscGraph::from_edge_list(4, &[0, 1, 2], &[1, 2, 3]).unwrap();
        let template = Template::path(3).unwrap();
        let decomposition = decompose(&template);
        let automorphism_num = automorphism::automorphism_num(&template);
        let config = CountConfig {
            iterations: 50,
            num_colors: 8, // well above k = 3
            num_partitions: 1,
            use_spmm: false,
            pruned: true,
            seed: 9,
            trace_subtemplate: None,
        };
        let engine = CountEngine::new(&host, &decomposition, automorphism_num, config).unwrap();
        let report = engine.run().unwrap();
        assert!(report.estimate <= 2);
    }

    /// a single-vertex template (`k == 1`) must not panic: every host
    /// vertex trivially embeds it.
    #[test]
    fn single_vertex_template_counts_every_host_vertex() {
        let host = CscGraph::from_edge_list(4, &[0, 1, 2], &[1, 2, 3]).unwrap();
        let template = Template::path(1).unwrap();
        let decomposition = decompose(&template);
        let config = CountConfig {
            iterations: 1,
            num_colors: 1,
            num_partitions: 1,
            use_spmm: false,
            pruned: true,
            seed: 1,
            trace_subtemplate: None,
        };
        let engine = CountEngine::new(&host, &decomposition, 1, config).unwrap();
        let report = engine.run().unwrap();
        assert_eq!(report.estimate, 4);
    }
}
