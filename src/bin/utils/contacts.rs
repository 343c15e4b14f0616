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
// aggregate the Hi-C link evidence between contigs: one best contact per contig pair
// and one golden array (exponential distance histogram) per oriented contig pair
//

use super::stats::{golden_array, hmean_int, GArray, GRLB, GRUB};
use rustc_hash::FxHashMap;

// strand: 0 for '+', 1 for '-'
pub const FWD: u8 = 0;
pub const REV: u8 = 1;

pub fn flip(strand: u8) -> u8 {
    1 - strand
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContigInfo {
    pub idx: u32,
    pub name: String,
    pub size: u32,
    pub is_active: bool,
    // marked as "recover" in the ids file, placed with less confidence
    pub recover: bool,
}

impl ContigInfo {
    pub fn new(idx: u32, name: &str, size: u32) -> Self {
        ContigInfo {
            idx,
            name: name.to_string(),
            size,
            is_active: true,
            recover: false,
        }
    }
}

/// One line of link evidence: `ctg0<strand0> ctg1<strand1>`, the number of
/// links and the link distances assuming that joint orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub ctg0: String,
    pub strand0: u8,
    pub ctg1: String,
    pub strand1: u8,
    pub nlinks: u32,
    pub dists: Vec<u32>,
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ContigPair {
    pub ctg0: u32,
    pub ctg1: u32,
}

impl ContigPair {
    // unordered pair, always stored as (min, max)
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            ContigPair { ctg0: a, ctg1: b }
        } else {
            ContigPair { ctg0: b, ctg1: a }
        }
    }
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct OrientedPair {
    pub ctg0: u32,
    pub strand0: u8,
    pub ctg1: u32,
    pub strand1: u8,
}

impl OrientedPair {
    pub fn new(ctg0: u32, strand0: u8, ctg1: u32, strand1: u8) -> Self {
        OrientedPair {
            ctg0,
            strand0,
            ctg1,
            strand1,
        }
    }

    // the same joint arrangement read from the other contig
    pub fn reverse(&self) -> OrientedPair {
        OrientedPair {
            ctg0: self.ctg1,
            strand0: flip(self.strand1),
            ctg1: self.ctg0,
            strand1: flip(self.strand0),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Contact {
    pub strandedness: i8,
    pub nlinks: u32,
    pub mean_dist: u32,
}

pub struct ContactStore {
    contigs: Vec<ContigInfo>,
    name2idx: FxHashMap<String, u32>,
    contacts: FxHashMap<ContigPair, Contact>,
    oriented_contacts: FxHashMap<OrientedPair, GArray>,
    // raw distances kept for mapping each link onto contig ends
    link_dists: FxHashMap<OrientedPair, Vec<u32>>,
    // link count per orientation variant, under both keys
    variant_links: FxHashMap<OrientedPair, u32>,
    n_used: usize,
    n_skipped: usize,
}

impl ContactStore {
    pub fn new(contigs: Vec<ContigInfo>) -> Self {
        let mut contigs = contigs;
        let mut name2idx = FxHashMap::<String, u32>::default();
        for (i, ctg) in contigs.iter_mut().enumerate() {
            ctg.idx = i as u32;
            name2idx.insert(ctg.name.clone(), i as u32);
        }
        ContactStore {
            contigs,
            name2idx,
            contacts: FxHashMap::default(),
            oriented_contacts: FxHashMap::default(),
            link_dists: FxHashMap::default(),
            variant_links: FxHashMap::default(),
            n_used: 0,
            n_skipped: 0,
        }
    }

    /// Add one record; returns false when the record was discarded because
    /// one of its contigs is not in the contig list.
    pub fn record_link(&mut self, rec: &LinkRecord) -> bool {
        let (ai, bi) = match (self.name2idx.get(&rec.ctg0), self.name2idx.get(&rec.ctg1)) {
            (Some(ai), Some(bi)) if ai != bi => (*ai, *bi),
            _ => {
                self.n_skipped += 1;
                return false;
            }
        };

        let gdists = golden_array(&rec.dists);
        let mean_dist = hmean_int(&rec.dists, GRLB, GRUB);
        let strandedness = if rec.strand0 != rec.strand1 { -1 } else { 1 };
        let pair = ContigPair::new(ai, bi);
        let op = OrientedPair::new(ai, rec.strand0, bi, rec.strand1);

        // nlinks sums over the orientation variants, a repeated variant replaces its old count
        let previous = self.variant_links.insert(op, rec.nlinks).unwrap_or(0);
        self.variant_links.insert(op.reverse(), rec.nlinks);
        let nlinks = match self.contacts.get(&pair) {
            Some(p) => p.nlinks - previous + rec.nlinks,
            None => rec.nlinks,
        };

        // strandedness and mean_dist follow the record with the smaller mean distance,
        // ties keep the old one
        let c = match self.contacts.get(&pair) {
            Some(p) if p.mean_dist <= mean_dist => Contact { nlinks, ..*p },
            _ => Contact {
                strandedness,
                nlinks,
                mean_dist,
            },
        };
        self.contacts.insert(pair, c);

        self.oriented_contacts.insert(op, gdists);
        self.oriented_contacts.insert(op.reverse(), gdists);
        self.link_dists.insert(op, rec.dists.clone());
        self.link_dists.insert(op.reverse(), rec.dists.clone());
        self.n_used += 1;
        true
    }

    pub fn best_contact(&self, i: u32, j: u32) -> Option<&Contact> {
        self.contacts.get(&ContigPair::new(i, j))
    }

    pub fn oriented_histogram(&self, i: u32, j: u32, si: u8, sj: u8) -> Option<&GArray> {
        self.oriented_contacts.get(&OrientedPair::new(i, si, j, sj))
    }

    pub fn link_distances(&self, i: u32, j: u32, si: u8, sj: u8) -> Option<&Vec<u32>> {
        self.link_dists.get(&OrientedPair::new(i, si, j, sj))
    }

    /// All contacts sorted by contig pair.
    pub fn contacts(&self) -> Vec<(ContigPair, Contact)> {
        let mut out = self
            .contacts
            .iter()
            .map(|(k, v)| (*k, *v))
            .collect::<Vec<(ContigPair, Contact)>>();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn contigs(&self) -> &[ContigInfo] {
        &self.contigs
    }

    pub fn contigs_mut(&mut self) -> &mut [ContigInfo] {
        &mut self.contigs
    }

    pub fn contig_index(&self, name: &str) -> Option<u32> {
        self.name2idx.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn n_contacts(&self) -> usize {
        self.contacts.len()
    }

    pub fn n_used(&self) -> usize {
        self.n_used
    }

    pub fn n_skipped(&self) -> usize {
        self.n_skipped
    }
}
