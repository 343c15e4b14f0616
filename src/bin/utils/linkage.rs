// Peregrine Assembler and SHIMMER Genome Assembly Toolkit
// 2019, 2020, 2021- (c) by Jason, Chen-Shan, Chin
//
// This Source Code Form is subject to the terms of the
// Creative Commons Attribution-NonCommercial-ShareAlike 4.0 International License.
//
// You should have received a copy of the license along with this
// work. If not, see <http://creativecommons.org/licenses/by-nc-sa/4.0/>.

#![allow(dead_code)]

//
// linkage graph over path ends
//

use super::contacts::{ContactStore, FWD, REV};
use super::path::{left_end, right_end, sister, End, PathSet, Placement};
use petgraph::graphmap::DiGraphMap;
use rustc_hash::FxHashMap;

pub type LinkageGraph = DiGraphMap<End, f64>;

// the order in which orientation variants are tried, the first wins on ties
const VARIANTS: [(u8, u8); 4] = [(FWD, FWD), (FWD, REV), (REV, FWD), (REV, REV)];

pub fn insert_edge(g: &mut LinkageGraph, a: End, b: End, score: f64) {
    if let Some(w) = g.edge_weight_mut(a, b) {
        *w += score;
    } else {
        g.add_edge(a, b, score);
    }
}

// `tail` is the 3' extremity of the contig in its own orientation
fn extremity_end(p: &Placement, size: u32, tail: bool, path_len: u64) -> End {
    let pos = if tail ^ (p.strand == REV) {
        p.start + size as u64
    } else {
        p.start
    };
    if pos * 2 < path_len {
        left_end(p.path_id)
    } else {
        right_end(p.path_id)
    }
}

pub fn build_graph(store: &ContactStore, paths: &PathSet) -> LinkageGraph {
    build_graph_with_counts(store, paths).0
}

/// Map every link between two placed contigs onto a pair of path ends and
/// accumulate one unit per link on both directed edges. Links that fall inside a
/// single path are skipped. Weights are normalized by the product of the two
/// path lengths. Also returns the number of links used and skipped.
pub fn build_graph_with_counts(
    store: &ContactStore,
    paths: &PathSet,
) -> (LinkageGraph, usize, usize) {
    let mut g = LinkageGraph::new();
    let placements = paths.placements();
    let contigs = store.contigs();
    let mut n_used = 0_usize;
    let mut n_skipped = 0_usize;

    for (pair, _) in store.contacts() {
        let (i, j) = (pair.ctg0, pair.ctg1);
        if !contigs[i as usize].is_active || !contigs[j as usize].is_active {
            continue;
        }
        let (pi, pj) = match (
            placements.get(i as usize).copied().flatten(),
            placements.get(j as usize).copied().flatten(),
        ) {
            (Some(pi), Some(pj)) => (pi, pj),
            _ => continue,
        };

        let variants = VARIANTS
            .iter()
            .filter_map(|&(si, sj)| {
                store
                    .link_distances(i, j, si, sj)
                    .map(|d| (si, sj, d.as_slice()))
            })
            .collect::<Vec<(u8, u8, &[u32])>>();
        let n_links = match variants.iter().map(|v| v.2.len()).min() {
            Some(n) => n,
            None => continue,
        };

        let (size_i, size_j) = (contigs[i as usize].size, contigs[j as usize].size);
        let (len_i, len_j) = (paths.length(pi.path_id), paths.length(pj.path_id));
        for k in 0..n_links {
            let (si, sj, _) = match variants.iter().min_by_key(|v| v.2[k]) {
                Some(v) => *v,
                None => continue,
            };
            // i joins with its tail when forward, j with its head
            let a = extremity_end(&pi, size_i, si == FWD, len_i);
            let b = extremity_end(&pj, size_j, sj == REV, len_j);
            if a == b || sister(a) == b {
                n_skipped += 1;
                continue;
            }
            n_used += 1;
            insert_edge(&mut g, a, b, 1.0);
            insert_edge(&mut g, b, a, 1.0);
        }
    }

    let edges = g
        .all_edges()
        .map(|(a, b, _)| (a, b))
        .collect::<Vec<(End, End)>>();
    for (a, b) in edges {
        let la = paths.length(a >> 1).max(1) as f64;
        let lb = paths.length(b >> 1).max(1) as f64;
        if let Some(w) = g.edge_weight_mut(a, b) {
            *w /= la * lb;
        }
    }

    log::info!(
        "Graph contains {} nodes and {} edges (from {} links, {} links skipped)",
        g.node_count(),
        g.edge_count() / 2,
        n_used,
        n_skipped
    );
    (g, n_used, n_skipped)
}

/// Second largest of the two top-2 lists combined. When the two largest
/// values tie (the shared edge seen from both sides) the next value is used
/// instead, as long as it is positive.
pub fn second_largest(a: [f64; 2], b: [f64; 2]) -> f64 {
    let mut v = [a[0], a[1], b[0], b[1]];
    v.sort_by(|x, y| x.total_cmp(y));
    if v[3] == v[2] && v[1] > 0.0 {
        v[1]
    } else {
        v[2]
    }
}

fn top_two(g: &LinkageGraph, a: End) -> [f64; 2] {
    let (mut first, mut second) = (0.0_f64, 0.0_f64);
    for (_, _, &w) in g.edges(a) {
        if w > first {
            second = first;
            first = w;
        } else if w > second {
            second = w;
        }
    }
    [first, second]
}

/// Rescale every edge by the second best alternative at either of its ends
/// (in place) and keep the edges that beat it.
pub fn make_confidence_graph(g: &mut LinkageGraph) -> LinkageGraph {
    let raw: &LinkageGraph = g;
    let two_largest = raw
        .nodes()
        .map(|a| (a, top_two(raw, a)))
        .collect::<FxHashMap<End, [f64; 2]>>();

    let mut edges = g
        .all_edges()
        .map(|(a, b, _)| (a, b))
        .collect::<Vec<(End, End)>>();
    edges.sort();

    let mut cg = LinkageGraph::new();
    for (a, b) in edges {
        let ta = two_largest.get(&a).copied().unwrap_or([0.0, 0.0]);
        let tb = two_largest.get(&b).copied().unwrap_or([0.0, 0.0]);
        let denominator = second_largest(ta, tb);
        if !(denominator > 0.0) || !denominator.is_finite() {
            continue;
        }
        if let Some(w) = g.edge_weight_mut(a, b) {
            *w /= denominator;
            if *w > 1.0 {
                cg.add_edge(a, b, *w);
            }
        }
    }
    log::debug!(
        "Confidence graph contains {} nodes and {} edges",
        cg.node_count(),
        cg.edge_count()
    );
    cg
}

#[cfg(test)]
pub mod tests {
    use super::super::contacts::tests::{rec, store_with};
    use super::super::contacts::ContactStore;
    use super::*;
    use approx::assert_relative_eq;

    // a-b-c-d in a row, forward, plus two weaker skip links
    pub fn chain_store() -> ContactStore {
        let mut store = store_with(&[("a", 20_000), ("b", 20_000), ("c", 20_000), ("d", 20_000)]);
        store.record_link(&rec("a", FWD, "b", FWD, &[20_000; 10]));
        store.record_link(&rec("b", FWD, "c", FWD, &[20_000; 10]));
        store.record_link(&rec("c", FWD, "d", FWD, &[20_000; 10]));
        store.record_link(&rec("a", FWD, "c", FWD, &[40_000; 2]));
        store.record_link(&rec("b", FWD, "d", FWD, &[40_000; 2]));
        store
    }

    fn edge_set(g: &LinkageGraph) -> Vec<(End, End)> {
        let mut e = g.all_edges().map(|(a, b, _)| (a, b)).collect::<Vec<(End, End)>>();
        e.sort();
        e
    }

    #[test]
    fn test_second_largest() {
        assert_eq!(second_largest([4.0, 2.0], [3.0, 1.0]), 3.0);
        assert_eq!(second_largest([3.0, 1.0], [3.0, 2.0]), 2.0);
        // no positive fallback
        assert_eq!(second_largest([5.0, 0.0], [5.0, 0.0]), 5.0);
    }

    #[test]
    fn test_build_graph_maps_links_to_ends() {
        let store = chain_store();
        let paths = PathSet::singletons(store.contigs());
        let g = build_graph(&store, &paths);
        let len2 = 20_000.0_f64 * 20_000.0;
        // a right end to b left end
        assert_relative_eq!(*g.edge_weight(1, 2).unwrap(), 10.0 / len2);
        assert_relative_eq!(*g.edge_weight(2, 1).unwrap(), 10.0 / len2);
        assert_relative_eq!(*g.edge_weight(1, 4).unwrap(), 2.0 / len2);
        assert!(g.edge_weight(0, 2).is_none());
        assert_eq!(g.edge_count(), 10);
    }

    #[test]
    fn test_opposite_orientation_joins_tails() {
        let mut store = store_with(&[("a", 10_000), ("b", 10_000)]);
        // b reversed after a: both tails meet
        store.record_link(&rec("a", FWD, "b", REV, &[5_000; 3]));
        store.record_link(&rec("a", FWD, "b", FWD, &[15_000; 3]));
        let paths = PathSet::singletons(store.contigs());
        let g = build_graph(&store, &paths);
        assert_eq!(edge_set(&g), vec![(1, 3), (3, 1)]);
        assert_relative_eq!(*g.edge_weight(1, 3).unwrap(), 3.0 / 1e8);
    }

    #[test]
    fn test_confidence_graph_of_chain() {
        let store = chain_store();
        let paths = PathSet::singletons(store.contigs());
        let mut g = build_graph(&store, &paths);
        let cg = make_confidence_graph(&mut g);
        assert_eq!(
            edge_set(&cg),
            vec![(1, 2), (2, 1), (3, 4), (4, 3), (5, 6), (6, 5)]
        );
        for (_, _, w) in cg.all_edges() {
            assert_relative_eq!(*w, 5.0, epsilon = 1e-9);
        }
        // skip links end up exactly at the margin
        assert_relative_eq!(*g.edge_weight(1, 4).unwrap(), 1.0, epsilon = 1e-9);
        assert!(cg.edge_weight(1, 4).is_none());
    }

    #[test]
    fn test_confidence_membership_is_scale_invariant() {
        let raw = [(0, 3, 9.0), (3, 0, 9.0), (1, 2, 4.0), (2, 1, 4.0), (0, 2, 1.5), (2, 0, 1.5), (1, 4, 3.0), (4, 1, 3.0)];
        let mut g1 = LinkageGraph::new();
        let mut g7 = LinkageGraph::new();
        for &(a, b, w) in raw.iter() {
            insert_edge(&mut g1, a, b, w);
            insert_edge(&mut g7, a, b, w * 7.0);
        }
        let c1 = make_confidence_graph(&mut g1);
        let c7 = make_confidence_graph(&mut g7);
        assert!(c1.edge_count() > 0);
        assert_eq!(edge_set(&c1), edge_set(&c7));
    }

    #[test]
    fn test_zero_denominator_makes_no_edge() {
        let mut g = LinkageGraph::new();
        insert_edge(&mut g, 0, 2, 0.0);
        insert_edge(&mut g, 2, 0, 0.0);
        let cg = make_confidence_graph(&mut g);
        assert_eq!(cg.edge_count(), 0);
    }

    #[test]
    fn test_links_inside_a_path_are_skipped() {
        let store = chain_store();
        let mut paths = PathSet::singletons(store.contigs());
        // a+ b+ joined into path 4, ends 8 and 9
        let ab = vec![paths.path(0).members[0], paths.path(1).members[0]];
        assert_eq!(paths.add_path(ab), 4);

        let (g, n_used, n_skipped) = build_graph_with_counts(&store, &paths);
        // the 10 a-b links land on the right end of the merged path
        assert_eq!(n_skipped, 10);
        assert_eq!(n_used, 24);
        assert!(g.edge_weight(8, 9).is_none());
        assert!(g.edge_weight(9, 8).is_none());
        assert!(g.edge_weight(9, 9).is_none());
        assert_eq!(
            edge_set(&g),
            vec![(4, 9), (5, 6), (6, 5), (6, 9), (9, 4), (9, 6)]
        );
        // a-c and b-c both join the right end of a+b+ to the left end of c
        assert_relative_eq!(*g.edge_weight(9, 4).unwrap(), 12.0 / (40_000.0 * 20_000.0));
    }

    #[test]
    fn test_inactive_contigs_are_left_out() {
        let mut store = chain_store();
        store.contigs_mut()[1].is_active = false;
        let paths = PathSet::singletons(store.contigs());
        let g = build_graph(&store, &paths);
        // c is path 1 now, d is path 2
        assert_eq!(edge_set(&g), vec![(1, 2), (2, 1), (3, 4), (4, 3)]);
    }
}
