//! Automorphism counting (component C7, `spec.md` §4.7): `|Aut(T)|`, the
//! number of vertex permutations of the template that preserve its edge
//! set. Used once, ahead of the counting loop, to normalize the final
//! estimate (every labeled embedding of `T` is counted `|Aut(T)|` times by
//! the color-coding DP).
//!
//! Grounded on `original_source/CountMat.cpp::automorphismNum` /
//! `calcAutomorphismRecursive`: a backtracking permutation search over
//! vertex images, pruned by degree and by partial adjacency agreement.
//! Templates are bounded at [`crate::template::MAX_TEMPLATE_VERTICES`], so
//! the search tree — though exponential in the worst case — stays small in
//! practice because every edge already assigned prunes a whole subtree.

use crate::template::Template;

pub fn automorphism_num(template: &Template) -> u64 {
    let k = template.vertex_num();
    let mut image = vec![0usize; k];
    let mut used = vec![false; k];
    let mut count = 0u64;
    search(0, k, template, &mut image, &mut used, &mut count);
    count
}

fn search(v: usize, k: usize, template: &Template, image: &mut [usize], used: &mut [bool], count: &mut u64) {
    if v == k {
        *count += 1;
        return;
    }
    for cand in 0..k {
        if used[cand] || template.degree(v) != template.degree(cand) {
            continue;
        }
        let consistent = (0..v).all(|u| template.has_edge(u, v) == template.has_edge(image[u], cand));
        if !consistent {
            continue;
        }
        image[v] = cand;
        used[cand] = true;
        search(v + 1, k, template, image, used, count);
        used[cand] = false;
    }
}
