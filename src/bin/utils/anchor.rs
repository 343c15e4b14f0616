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
// resolve the confidence graph into linear scaffold paths
//
// a walk alternates between the sister edge of an end (weight 0, crossing a
// path) and the best confidence edge leaving it (weight > 1, joining two paths)
//

use super::contacts::ContactStore;
use super::linkage::{build_graph, make_confidence_graph, LinkageGraph};
use super::path::{end_path, is_right_end, sister, End, PathMember, PathSet};
use petgraph::Direction::Outgoing;
use rustc_hash::FxHashSet;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Edge {
    pub a: End,
    pub b: End,
    pub weight: f64,
}

impl Edge {
    pub fn is_sister(&self) -> bool {
        self.weight == 0.0
    }

    // the path is traversed right to left
    pub fn is_reverse(&self) -> bool {
        is_right_end(self.a)
    }
}

/// heaviest confidence edge leaving `a`, ties go to the lowest end handle
pub fn best_neighbor(g: &LinkageGraph, a: End) -> Option<(End, f64)> {
    if !g.contains_node(a) {
        return None;
    }
    let mut best: Option<(End, f64)> = None;
    for b in g.neighbors_directed(a, Outgoing) {
        let w = match g.edge_weight(a, b) {
            Some(w) => *w,
            None => continue,
        };
        best = match best {
            Some((bb, bw)) if bw > w || (bw == w && bb < b) => Some((bb, bw)),
            _ => Some((b, w)),
        };
    }
    best
}

/// Walk from `a`, starting with the sister edge when `visit_sister` is set.
/// Returns the edges taken and whether the walk ran into a visited end.
pub fn dfs(
    g: &LinkageGraph,
    a: End,
    visited: &mut FxHashSet<End>,
    visit_sister: bool,
) -> (Vec<Edge>, bool) {
    let mut path = Vec::<Edge>::new();
    let mut a = a;
    let mut visit_sister = visit_sister;
    loop {
        if !visited.insert(a) {
            return (path, true);
        }
        if visit_sister {
            let b = sister(a);
            path.push(Edge { a, b, weight: 0.0 });
            a = b;
            visit_sister = false;
        } else {
            match best_neighbor(g, a) {
                Some((b, weight)) => {
                    path.push(Edge { a, b, weight });
                    a = b;
                    visit_sister = true;
                }
                None => return (path, false),
            }
        }
    }
}

/// Cut a cycle at its weakest edge with weight > 1; the result starts right
/// after the cut.
pub fn break_cycle(path: &[Edge]) -> Vec<Edge> {
    let mut min_i = 0_usize;
    let mut min_weight = f64::MAX;
    for (i, e) in path.iter().enumerate() {
        if e.weight > 1.0 && e.weight < min_weight {
            min_i = i;
            min_weight = e.weight;
        }
    }
    let mut out = Vec::<Edge>::with_capacity(path.len());
    if min_i + 1 < path.len() {
        out.extend_from_slice(&path[min_i + 1..]);
    }
    out.extend_from_slice(&path[..min_i]);
    out
}

pub fn reverse_path(path: &[Edge]) -> Vec<Edge> {
    path.iter()
        .rev()
        .map(|e| Edge {
            a: e.b,
            b: e.a,
            weight: e.weight,
        })
        .collect::<Vec<Edge>>()
}

/// Concatenate the paths crossed by the sister edges into one run of contigs.
/// Paths already absorbed by an earlier merge are skipped. Returns `None` when
/// fewer than two paths take part.
pub fn merge_path(paths: &PathSet, path: &[Edge]) -> Option<Vec<PathMember>> {
    let mut seen = FxHashSet::<usize>::default();
    let mut members = Vec::<PathMember>::new();
    for e in path.iter().filter(|e| e.is_sister()) {
        let p = end_path(e.a);
        if !paths.is_live(p) || !seen.insert(p) {
            continue;
        }
        let mut run = paths.path(p).clone();
        if e.is_reverse() {
            run.reverse();
        }
        members.extend(run.members);
    }
    if seen.len() < 2 {
        None
    } else {
        Some(members)
    }
}

/// One pass of path extraction over a confidence graph. New paths are added to
/// `paths` and their contigs reassigned; returns the live path ids.
pub fn generate_path_and_cycle(paths: &mut PathSet, g: &LinkageGraph) -> Vec<usize> {
    let mut visited = FxHashSet::<End>::default();
    let mut starts = g.nodes().collect::<Vec<End>>();
    starts.sort();
    let mut n_cycles = 0_usize;
    for a in starts {
        if visited.contains(&a) {
            continue;
        }
        let (upstream, is_cycle) = dfs(g, a, &mut visited, true);
        let edges = if is_cycle {
            n_cycles += 1;
            break_cycle(&upstream)
        } else {
            visited.remove(&a);
            let (downstream, _) = dfs(g, a, &mut visited, false);
            let mut e = reverse_path(&upstream);
            e.extend(downstream);
            e
        };
        if let Some(members) = merge_path(paths, &edges) {
            paths.add_path(members);
        }
    }
    log::debug!("{} walks ended in a cycle", n_cycles);
    paths.unique_paths()
}

pub struct Anchorer<'a> {
    pub store: &'a ContactStore,
    pub paths: PathSet,
    pub max_iterations: u32,
}

impl<'a> Anchorer<'a> {
    pub fn new(store: &'a ContactStore, max_iterations: u32) -> Self {
        Anchorer {
            store,
            paths: PathSet::singletons(store.contigs()),
            max_iterations,
        }
    }

    /// Build, score and extract repeatedly, stopping once the number of paths
    /// no longer drops. Returns the live path ids.
    pub fn run(&mut self) -> Vec<usize> {
        let mut current = self.paths.unique_paths();
        for iteration in 1..=self.max_iterations {
            log::info!("Anchoring iteration {} with {} paths", iteration, current.len());
            let mut g = build_graph(self.store, &self.paths);
            let cg = make_confidence_graph(&mut g);
            let next = generate_path_and_cycle(&mut self.paths, &cg);
            let improved = next.len() < current.len();
            current = next;
            if !improved {
                break;
            }
        }
        current
    }
}
