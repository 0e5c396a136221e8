//! Template decomposition (component C3, `spec.md` §4.3): splits the
//! template tree `T` into an ordered chain of `N = 2k - 1` subtemplates,
//! each a `main`/`aux` pair whose vertex sets partition their parent's.
//!
//! Grounded on `original_source/CountMat.cpp`'s decomposition pass, which
//! walks the template depth-first choosing, at each internal node, the
//! edge whose removal peels off the largest subtree no bigger than half
//! the current size — the same balanced-split rule implemented here.

use crate::template::Template;
use std::collections::HashMap;

/// one node of the decomposition chain. Leaves (`size == 1`) carry no
/// `main`/`aux` children and no count-table storage of their own: every
/// size-1 subtemplate's table content is the same formula regardless of
/// which template vertex it represents (see `count_table.rs`), so leaves
/// are bookkeeping placeholders, not allocated tables.
#[derive(Debug, Clone)]
pub struct Subtemplate {
    pub size: usize,
    /// bitmask of template-vertex ids belonging to this subtemplate
    pub vertices: u32,
    /// template-vertex id this subtemplate is rooted at
    pub root: usize,
    /// index, within the chain, of the child keeping the root's side
    pub main: Option<usize>,
    /// index, within the chain, of the child that was split off
    pub aux: Option<usize>,
}

impl Subtemplate {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.size == 1
    }
}

/// the full ordered chain: children always precede their parents, and the
/// chain is additionally stable-sorted ascending by `size` (`spec.md` §4.3
/// Testable Property), so `chain[chain.len() - 1]` is always the root
/// subtemplate (the whole template `T`).
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub chain: Vec<Subtemplate>,
    pub color_num: usize,
}

impl Decomposition {
    #[inline]
    pub fn root_index(&self) -> usize {
        self.chain.len() - 1
    }

    #[inline]
    pub fn root(&self) -> &Subtemplate {
        &self.chain[self.root_index()]
    }
}

/// Build the decomposition chain for `template`, rooted (for decomposition
/// purposes only, not a property of the template itself) at vertex `0`.
pub fn decompose(template: &Template) -> Decomposition {
    let k = template.vertex_num();
    let children = template.rooted_children(0);
    let full_mask: u32 = if k == 32 { u32::MAX } else { (1u32 << k) - 1 };

    let mut chain: Vec<Subtemplate> = Vec::with_capacity(2 * k - 1);
    build(full_mask, 0, &children, &mut chain);

    // stable sort ascending by size; every child is strictly smaller than
    // its parent (main + aux = parent, both sides nonempty), so this can
    // never move a parent ahead of one of its own children.
    let mut order: Vec<usize> = (0..chain.len()).collect();
    order.sort_by_key(|&i| chain[i].size);
    let mut old_to_new = vec![0usize; chain.len()];
    for (new_idx, &old_idx) in order.iter().enumerate() {
        old_to_new[old_idx] = new_idx;
    }
    let sorted: Vec<Subtemplate> = order
        .iter()
        .map(|&old_idx| {
            let st = &chain[old_idx];
            Subtemplate {
                size: st.size,
                vertices: st.vertices,
                root: st.root,
                main: st.main.map(|m| old_to_new[m]),
                aux: st.aux.map(|a| old_to_new[a]),
            }
        })
        .collect();

    Decomposition { chain: sorted, color_num: k }
}

/// post-order recursive build: pushes `aux`, then `main`, then the node
/// itself, so children always land at a smaller index than their parent
/// even before the final size-sort.
fn build(vertex_set: u32, root: usize, children: &[Vec<usize>], chain: &mut Vec<Subtemplate>) -> usize {
    let size = vertex_set.count_ones() as usize;
    if size == 1 {
        chain.push(Subtemplate { size: 1, vertices: vertex_set, root, main: None, aux: None });
        return chain.len() - 1;
    }

    let mut subtree_size = HashMap::new();
    compute_subtree_sizes(root, vertex_set, children, &mut subtree_size);

    let half = size / 2;
    let mut best_vertex: Option<usize> = None;
    let mut best_size = 0usize;
    for v in 0..children.len() {
        if v == root || vertex_set & (1 << v) == 0 {
            continue;
        }
        let sv = subtree_size[&v];
        if sv > half {
            continue;
        }
        if sv > best_size || (sv == best_size && best_vertex.map_or(true, |b| v < b)) {
            best_size = sv;
            best_vertex = Some(v);
        }
    }
    let aux_root = best_vertex.expect("a tree of size >= 2 always has a split with aux side <= floor(size/2)");

    let aux_set = collect_subtree(aux_root, vertex_set, children);
    let main_set = vertex_set & !aux_set;

    let aux_idx = build(aux_set, aux_root, children, chain);
    let main_idx = build(main_set, root, children, chain);

    chain.push(Subtemplate {
        size,
        vertices: vertex_set,
        root,
        main: Some(main_idx),
        aux: Some(aux_idx),
    });
    chain.len() - 1
}

fn compute_subtree_sizes(v: usize, vertex_set: u32, children: &[Vec<usize>], out: &mut HashMap<usize, usize>) -> usize {
    let mut s = 1;
    for &c in &children[v] {
        if vertex_set & (1 << c) != 0 {
            s += compute_subtree_sizes(c, vertex_set, children, out);
        }
    }
    out.insert(v, s);
    s
}

fn collect_subtree(v: usize, vertex_set: u32, children: &[Vec<usize>]) -> u32 {
    let mut mask = 1u32 << v;
    for &c in &children[v] {
        if vertex_set & (1 << c) != 0 {
            mask |= collect_subtree(c, vertex_set, children);
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_vertex_template_has_one_leaf() {
        let t = Template::path(1).unwrap();
        let d = decompose(&t);
        assert_eq!(d.chain.len(), 1);
        assert!(d.chain[0].is_leaf());
    }

    #[test]
    fn chain_length_is_2k_minus_1() {
        for k in [1usize, 2, 3, 4, 5, 7, 10] {
            let t = Template::path(k).unwrap();
            let d = decompose(&t);
            assert_eq!(d.chain.len(), 2 * k - 1, "k={k}");
        }
    }

    #[test]
    fn children_precede_parents() {
        let t = Template::star(8).unwrap();
        let d = decompose(&t);
        for (i, s) in d.chain.iter().enumerate() {
            if let Some(m) = s.main {
                assert!(m < i);
            }
            if let Some(a) = s.aux {
                assert!(a < i);
            }
        }
    }

    #[test]
    fn chain_is_sorted_ascending_by_size() {
        let t = Template::star(8).unwrap();
        let d = decompose(&t);
        for w in d.chain.windows(2) {
            assert!(w[0].size <= w[1].size);
        }
    }

    #[test]
    fn root_is_the_whole_template() {
        let t = Template::path(6).unwrap();
        let d = decompose(&t);
        assert_eq!(d.root().size, 6);
        assert_eq!(d.root().vertices.count_ones() as usize, 6);
    }

    #[test]
    fn aux_side_never_exceeds_half_of_parent() {
        let t = Template::star(9).unwrap();
        let d = decompose(&t);
        for s in &d.chain {
            if let Some(a) = s.aux {
                assert!(d.chain[a].size <= s.size / 2);
            }
        }
    }

    #[test]
    fn main_and_aux_vertices_partition_parent() {
        let t = Template::path(5).unwrap();
        let d = decompose(&t);
        for s in &d.chain {
            if let (Some(m), Some(a)) = (s.main, s.aux) {
                let main_v = d.chain[m].vertices;
                let aux_v = d.chain[a].vertices;
                assert_eq!(main_v & aux_v, 0);
                assert_eq!(main_v | aux_v, s.vertices);
            }
        }
    }

    #[test]
    fn five_vertex_path_sizes_match_expected_multiset() {
        // path 0-1-2-3-4: root splits size 5 -> aux <= 2. Deterministic
        // balanced splits on a path peel off 2-vertex chunks until a
        // residual of size 1 remains.
        let t = Template::path(5).unwrap();
        let d = decompose(&t);
        let mut sizes: Vec<usize> = d.chain.iter().map(|s| s.size).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 1, 1, 1, 1, 2, 2, 3, 5]);
    }
}
