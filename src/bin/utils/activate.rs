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
// select the contigs that carry enough Hi-C signal to be ordered
// deactivation is one way: a contig is never switched back on
//

use super::contacts::{ContactStore, ContigInfo};
use super::stats::outlier_cutoff;
use super::tour::{ContactMatrix, Tig, Tour};
use super::Parameters;

/// log10 of links per base for every contig; the size is capped so long
/// contigs are not penalized for a low per-base density
pub fn link_densities(store: &ContactStore, density_cap: u32) -> Vec<f64> {
    let mut densities = vec![0_u64; store.len()];
    for (pair, contact) in store.contacts() {
        densities[pair.ctg0 as usize] += contact.nlinks as u64;
        densities[pair.ctg1 as usize] += contact.nlinks as u64;
    }
    store
        .contigs()
        .iter()
        .enumerate()
        .map(|(i, ctg)| {
            let d = densities[i] as f64;
            let s = ctg.size.min(density_cap) as f64;
            (d / s).log10()
        })
        .collect::<Vec<f64>>()
}

pub fn prune_by_density(store: &mut ContactStore, parameters: &Parameters) -> usize {
    let log_densities = link_densities(store, parameters.density_cap);
    let (lb, ub) = outlier_cutoff(&log_densities);
    log::info!("Log10(link_densities) ~ [{:.5}, {:.5}]", lb, ub);
    let size_guard = parameters.min_size as u64 * 10;
    let mut invalid = 0_usize;
    for (i, ctg) in store.contigs_mut().iter_mut().enumerate() {
        if ctg.is_active && log_densities[i] < lb && (ctg.size as u64) < size_guard {
            ctg.is_active = false;
            invalid += 1;
        }
    }
    log::info!(
        "Inactivated {} tigs with log10_density < {:.5}",
        invalid,
        lb
    );
    invalid
}

pub fn prune_by_size(store: &mut ContactStore, parameters: &Parameters) -> usize {
    let mut invalid = 0_usize;
    for ctg in store.contigs_mut().iter_mut() {
        if ctg.is_active && ctg.size < parameters.min_size {
            ctg.is_active = false;
            invalid += 1;
        }
    }
    log::info!(
        "Inactivated {} tigs with size < {}",
        invalid,
        parameters.min_size
    );
    invalid
}

pub fn report_active(contigs: &[ContigInfo]) -> (usize, u64) {
    let mut active_counts = 0_usize;
    let mut sum_length = 0_u64;
    for ctg in contigs.iter().filter(|c| c.is_active) {
        active_counts += 1;
        sum_length += ctg.size as u64;
    }
    log::info!("Active tigs: {} (length={})", active_counts, sum_length);
    (active_counts, sum_length)
}

pub fn active_indices(contigs: &[ContigInfo]) -> Vec<u32> {
    contigs
        .iter()
        .filter(|c| c.is_active)
        .map(|c| c.idx)
        .collect::<Vec<u32>>()
}

/// link counts between the given contigs, M[i][j] = M[j][i] = nlinks
pub fn contact_matrix(store: &ContactStore, members: &[u32]) -> ContactMatrix {
    let mut m = ContactMatrix::new(members);
    for (pair, contact) in store.contacts() {
        m.set(pair.ctg0, pair.ctg1, contact.nlinks);
    }
    m
}

/// Run both pruning passes and seed a tour with the survivors in their
/// original order.
pub fn activate(store: &mut ContactStore, parameters: &Parameters) -> Tour {
    report_active(store.contigs());
    prune_by_density(store, parameters);
    prune_by_size(store, parameters);
    report_active(store.contigs());

    let tigs = store
        .contigs()
        .iter()
        .filter(|c| c.is_active)
        .map(|c| Tig {
            idx: c.idx,
            size: c.size,
        })
        .collect::<Vec<Tig>>();
    let members = active_indices(store.contigs());
    Tour::new(tigs, contact_matrix(store, &members))
}

#[cfg(test)]
mod tests {
    use super::super::contacts::tests::{rec, store_with};
    use super::super::contacts::FWD;
    use super::*;

    fn parameters(min_size: u32) -> Parameters {
        Parameters {
            min_size,
            ..Parameters::default()
        }
    }

    #[test]
    fn test_link_densities() {
        let mut store = store_with(&[("a", 1_000), ("b", 2_000_000), ("c", 500)]);
        store.record_link(&rec("a", FWD, "b", FWD, &[10_000; 10]));
        let d = link_densities(&store, 500_000);
        approx::assert_relative_eq!(d[0], (10.0_f64 / 1_000.0).log10());
        // capped size
        approx::assert_relative_eq!(d[1], (10.0_f64 / 500_000.0).log10());
        assert_eq!(d[2], f64::NEG_INFINITY);
    }

    #[test]
    fn test_prune_by_size_scenario() {
        let mut store = store_with(&[("A", 10_000), ("B", 10_000), ("C", 500)]);
        store.record_link(&rec("A", FWD, "B", FWD, &[20_000; 20]));
        let p = parameters(1_000);

        assert_eq!(prune_by_size(&mut store, &p), 1);
        let active = active_indices(store.contigs());
        assert_eq!(active, vec![0, 1]);

        let tour = activate(&mut store, &p);
        assert_eq!(tour.tigs.iter().map(|t| t.idx).collect::<Vec<u32>>(), vec![0, 1]);
        assert_eq!(tour.m.dim(), 2);
        assert_eq!(tour.m.get(0, 1), 20);
        assert_eq!(tour.m.get(1, 0), 20);
    }

    #[test]
    fn test_deactivation_is_monotonic() {
        let mut store = store_with(&[("a", 20_000), ("b", 20_000), ("c", 20_000), ("d", 20_000)]);
        store.record_link(&rec("a", FWD, "b", FWD, &[20_000; 10]));
        store.record_link(&rec("b", FWD, "c", FWD, &[20_000; 10]));
        store.record_link(&rec("c", FWD, "d", FWD, &[20_000; 10]));
        store.contigs_mut()[1].is_active = false;

        let p = parameters(1_000);
        prune_by_density(&mut store, &p);
        prune_by_size(&mut store, &p);
        assert!(!store.contigs()[1].is_active);
        activate(&mut store, &p);
        assert!(!store.contigs()[1].is_active);
    }

    #[test]
    fn test_large_dense_contigs_are_kept() {
        let mut store = store_with(&[
            ("a", 50_000),
            ("b", 50_000),
            ("c", 50_000),
            ("d", 50_000),
            ("e", 500_000),
        ]);
        store.record_link(&rec("a", FWD, "b", FWD, &[20_000; 50]));
        store.record_link(&rec("b", FWD, "c", FWD, &[20_000; 50]));
        store.record_link(&rec("c", FWD, "d", FWD, &[20_000; 50]));
        store.record_link(&rec("d", FWD, "a", FWD, &[20_000; 50]));
        // very sparse, but too long to be dropped on density alone
        store.record_link(&rec("e", FWD, "a", FWD, &[20_000; 1]));

        let p = parameters(10_000);
        let tour = activate(&mut store, &p);
        assert_eq!(tour.len(), 5);
        assert!(store.contigs().iter().all(|c| c.is_active));
    }
}
