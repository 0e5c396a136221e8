//! Combination indexing (component C4, `spec.md` §4.4): binomial
//! coefficients via Pascal's triangle, colex-order rank/unrank of color
//! subsets, and per-subtemplate split tables mapping a parent subset's
//! rank to the `(main_rank, aux_rank)` pairs it can be partitioned into.
//!
//! Colex ranking is the standard combinatorial number system: a `w`-subset
//! `{c_1 < c_2 < ... < c_w}` of `[0, k)` ranks as `sum(C(c_i, i))` over
//! `i = 1..=w`. `original_source/CountMat.cpp` builds exactly these three
//! tables (`comb_table`, `main_split`, `aux_split`) once per template,
//! ahead of the counting loop.

/// Pascal's-triangle binomial coefficients up to `C(k, k)`, plus colex
/// rank/unrank of `[0, k)`-subsets.
#[derive(Debug, Clone)]
pub struct CombIndexer {
    k: usize,
    comb_table: Vec<Vec<u64>>,
}

impl CombIndexer {
    pub fn new(k: usize) -> Self {
        let mut comb_table = vec![vec![0u64; k + 1]; k + 1];
        for n in 0..=k {
            comb_table[n][0] = 1;
            for r in 1..=n {
                comb_table[n][r] = comb_table[n - 1][r - 1] + comb_table[n - 1].get(r).copied().unwrap_or(0);
            }
        }
        Self { k, comb_table }
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// `C(n, r)`, `0` when `r > n`
    #[inline]
    pub fn binom(&self, n: usize, r: usize) -> u64 {
        if r > n {
            0
        } else {
            self.comb_table[n][r]
        }
    }

    /// colex rank of a sorted-ascending subset of `[0, k)`
    pub fn rank_colex(&self, subset: &[usize]) -> usize {
        let mut rank = 0u64;
        for (i, &c) in subset.iter().enumerate() {
            rank += self.binom(c, i + 1);
        }
        rank as usize
    }

    /// inverse of [`Self::rank_colex`]: the `w`-subset of `[0, k)` with the
    /// given colex rank, sorted ascending
    pub fn unrank_colex(&self, mut rank: usize, w: usize) -> Vec<usize> {
        let mut result = vec![0usize; w];
        for i in (1..=w).rev() {
            let mut c = i - 1;
            while self.binom(c + 1, i) as usize <= rank {
                c += 1;
            }
            result[i - 1] = c;
            rank -= self.binom(c, i) as usize;
        }
        result
    }
}

/// all `w`-subsets of the index set `0..n`, as sorted ascending `Vec<usize>`
fn index_combinations(n: usize, w: usize) -> Vec<Vec<usize>> {
    if w == 0 {
        return vec![vec![]];
    }
    if w > n {
        return vec![];
    }
    let mut out = vec![];
    let mut current = vec![0usize; w];
    fn rec(start: usize, n: usize, w: usize, depth: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if depth == w {
            out.push(current.clone());
            return;
        }
        for v in start..n {
            current[depth] = v;
            rec(v + 1, n, w, depth + 1, current, out);
        }
    }
    rec(0, n, w, 0, &mut current, &mut out);
    out
}

/// for a subtemplate of size `w = w_m + w_a`, the `(main_rank, aux_rank)`
/// pairs every `w`-subset (by its own colex rank) can be split into.
#[derive(Debug, Clone)]
pub struct SplitTable {
    /// `splits[j]` holds every `(main_rank, aux_rank)` pair the `j`-th
    /// `w`-subset (colex order) decomposes into
    pub splits: Vec<Vec<(usize, usize)>>,
    /// the distinct `aux_rank` values appearing anywhere in `splits`,
    /// ascending. A parent never references an aux column outside this
    /// set, so the pre-multiply phase (`engine.rs`) can run SpMV/SpMM only
    /// over these rows when pruning is enabled (`spec.md` §4.4 "effective
    /// aux indices").
    pub effective_aux: Vec<usize>,
}

impl SplitTable {
    pub fn build(indexer: &CombIndexer, w: usize, w_m: usize, w_a: usize) -> Self {
        assert_eq!(w_m + w_a, w, "split sizes must partition the parent size");
        let total = indexer.binom(indexer.k(), w) as usize;
        let index_splits = index_combinations(w, w_m);
        let mut splits = Vec::with_capacity(total);
        let mut aux_seen = std::collections::BTreeSet::new();
        for j in 0..total {
            let subset = indexer.unrank_colex(j, w);
            let mut entry = Vec::with_capacity(index_splits.len());
            for main_positions in &index_splits {
                let mut main_subset = Vec::with_capacity(w_m);
                let mut aux_subset = Vec::with_capacity(w_a);
                for (pos, &color) in subset.iter().enumerate() {
                    if main_positions.contains(&pos) {
                        main_subset.push(color);
                    } else {
                        aux_subset.push(color);
                    }
                }
                let main_rank = indexer.rank_colex(&main_subset);
                let aux_rank = indexer.rank_colex(&aux_subset);
                aux_seen.insert(aux_rank);
                entry.push((main_rank, aux_rank));
            }
            splits.push(entry);
        }
        Self { splits, effective_aux: aux_seen.into_iter().collect() }
    }
}
