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
// scaffold paths and their ends
//
// paths live in an arena and are never removed, a path is "live" as long as its
// contigs still point to it. path p owns two ends: 2p (left) and 2p+1 (right),
// so the sister of end h is h ^ 1 and its path is h >> 1
//

use super::contacts::{flip, ContigInfo, FWD};
use rustc_hash::FxHashSet;

pub type End = usize;

pub fn left_end(path_id: usize) -> End {
    path_id << 1
}

pub fn right_end(path_id: usize) -> End {
    (path_id << 1) | 1
}

pub fn sister(end: End) -> End {
    end ^ 1
}

pub fn end_path(end: End) -> usize {
    end >> 1
}

pub fn is_right_end(end: End) -> bool {
    end & 1 == 1
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PathMember {
    pub ctg: u32,
    pub strand: u8,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaffoldPath {
    pub members: Vec<PathMember>,
    pub length: u64,
}

impl ScaffoldPath {
    pub fn new(members: Vec<PathMember>) -> Self {
        let length = members.iter().map(|m| m.size as u64).sum();
        ScaffoldPath { members, length }
    }

    pub fn reverse(&mut self) {
        self.members.reverse();
        for m in self.members.iter_mut() {
            m.strand = flip(m.strand);
        }
    }

    // members in the order seen when the path is entered from `end`
    pub fn members_from(&self, end: End) -> Vec<PathMember> {
        if is_right_end(end) {
            let mut p = self.clone();
            p.reverse();
            p.members
        } else {
            self.members.clone()
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Where a contig currently sits: its path, its offset in the path and its strand.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Placement {
    pub path_id: usize,
    pub start: u64,
    pub strand: u8,
}

#[derive(Debug, Clone, Default)]
pub struct PathSet {
    paths: Vec<ScaffoldPath>,
    ctg2path: Vec<Option<usize>>,
}

impl PathSet {
    /// one forward singleton path per active contig
    pub fn singletons(contigs: &[ContigInfo]) -> Self {
        let mut ps = PathSet {
            paths: Vec::with_capacity(contigs.len()),
            ctg2path: vec![None; contigs.len()],
        };
        for ctg in contigs.iter().filter(|c| c.is_active) {
            ps.add_path(vec![PathMember {
                ctg: ctg.idx,
                strand: FWD,
                size: ctg.size,
            }]);
        }
        ps
    }

    /// Add a path and hand all its contigs over to it.
    pub fn add_path(&mut self, members: Vec<PathMember>) -> usize {
        let path_id = self.paths.len();
        for m in members.iter() {
            let i = m.ctg as usize;
            if i >= self.ctg2path.len() {
                self.ctg2path.resize(i + 1, None);
            }
            self.ctg2path[i] = Some(path_id);
        }
        self.paths.push(ScaffoldPath::new(members));
        path_id
    }

    pub fn path(&self, path_id: usize) -> &ScaffoldPath {
        &self.paths[path_id]
    }

    pub fn path_of(&self, ctg: u32) -> Option<usize> {
        self.ctg2path.get(ctg as usize).copied().flatten()
    }

    pub fn is_live(&self, path_id: usize) -> bool {
        match self.paths.get(path_id) {
            Some(p) => p
                .members
                .iter()
                .all(|m| self.path_of(m.ctg) == Some(path_id)),
            None => false,
        }
    }

    pub fn length(&self, path_id: usize) -> u64 {
        self.paths[path_id].length
    }

    pub fn placements(&self) -> Vec<Option<Placement>> {
        let mut out = vec![None; self.ctg2path.len()];
        for (i, p) in self.ctg2path.iter().enumerate() {
            if let Some(path_id) = *p {
                let mut start = 0_u64;
                for m in self.paths[path_id].members.iter() {
                    if m.ctg as usize == i {
                        out[i] = Some(Placement {
                            path_id,
                            start,
                            strand: m.strand,
                        });
                        break;
                    }
                    start += m.size as u64;
                }
            }
        }
        out
    }

    /// Live paths in contig order, deduplicated by path id.
    pub fn unique_paths(&self) -> Vec<usize> {
        let mut seen = FxHashSet::<usize>::default();
        let mut out = Vec::<usize>::new();
        let (mut n_singleton_contigs, mut n_complex_contigs) = (0_usize, 0_usize);
        let (mut n_singleton, mut n_complex) = (0_usize, 0_usize);
        for path_id in self.ctg2path.iter().flatten() {
            let singleton = self.paths[*path_id].is_singleton();
            if singleton {
                n_singleton_contigs += 1;
            } else {
                n_complex_contigs += 1;
            }
            if !seen.insert(*path_id) {
                continue;
            }
            if singleton {
                n_singleton += 1;
            } else {
                n_complex += 1;
            }
            out.push(*path_id);
        }
        log::info!(
            "{} paths (nComplex={} nSingleton={}), {} contigs (nComplex={} nSingleton={})",
            n_complex + n_singleton,
            n_complex,
            n_singleton,
            n_complex_contigs + n_singleton_contigs,
            n_complex_contigs,
            n_singleton_contigs
        );
        out
    }
}

/// Nx of the scaffold lengths: the length at which the running sum, longest
/// first, passes x * total.
pub fn nx(sorted_desc: &[u64], total: u64, x: f64) -> u64 {
    let mut cumsum = 0_u64;
    for l in sorted_desc.iter() {
        cumsum += l;
        if cumsum as f64 > total as f64 * x {
            return *l;
        }
    }
    0
}

/// Log total, longest, N50, N90 and the scaffold count; returns (N50, N90).
pub fn log_scaffold_summary(scaffold_lengths: Vec<(String, u64)>) -> (u64, u64) {
    let mut lengths = scaffold_lengths.iter().map(|x| x.1).collect::<Vec<u64>>();
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    let total_bases: u64 = lengths.iter().sum();
    let n50 = nx(&lengths, total_bases, 0.5);
    let n90 = nx(&lengths, total_bases, 0.9);
    log::info!("Total size: {}", total_bases);
    log::info!("Longest size: {}", lengths.first().unwrap_or(&0));
    log::info!("N50: {}", n50);
    log::info!("N90: {}", n90);
    log::info!("Number of scaffolds: {}", lengths.len());
    (n50, n90)
}
