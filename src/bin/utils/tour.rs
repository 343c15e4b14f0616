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
// tours (candidate contig orderings) and the leave-one-out tour pruning
//

use super::activate::report_active;
use super::contacts::ContigInfo;
use super::error::{Result, ScaffoldError};
use super::stats::{outlier_cutoff, LIMIT};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;

// deltas at or below this are treated as "removal does not help"
pub const MIN_DELTA: f64 = 1e-9;
pub const LOG10_DELTA_FLOOR: f64 = -9.0;

/// Square link count matrix over the contigs that were active when it was built.
#[derive(Debug, Clone, Default)]
pub struct ContactMatrix {
    slot: FxHashMap<u32, usize>,
    counts: Vec<Vec<u32>>,
}

impl ContactMatrix {
    pub fn new(members: &[u32]) -> Self {
        let n = members.len();
        let slot = members
            .iter()
            .enumerate()
            .map(|(i, idx)| (*idx, i))
            .collect::<FxHashMap<u32, usize>>();
        ContactMatrix {
            slot,
            counts: vec![vec![0_u32; n]; n],
        }
    }

    // symmetric assignment, pairs outside the matrix are ignored
    pub fn set(&mut self, a: u32, b: u32, nlinks: u32) {
        if let (Some(&i), Some(&j)) = (self.slot.get(&a), self.slot.get(&b)) {
            self.counts[i][j] = nlinks;
            self.counts[j][i] = nlinks;
        }
    }

    pub fn get(&self, a: u32, b: u32) -> u32 {
        match (self.slot.get(&a), self.slot.get(&b)) {
            (Some(&i), Some(&j)) => self.counts[i][j],
            _ => 0,
        }
    }

    pub fn dim(&self) -> usize {
        self.counts.len()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tig {
    pub idx: u32,
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct Tour {
    pub tigs: Vec<Tig>,
    pub m: Arc<ContactMatrix>,
}

impl Tour {
    pub fn new(tigs: Vec<Tig>, m: ContactMatrix) -> Self {
        Tour {
            tigs,
            m: Arc::new(m),
        }
    }

    pub fn len(&self) -> usize {
        self.tigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tigs.is_empty()
    }

    pub fn contains(&self, idx: u32) -> bool {
        self.tigs.iter().any(|t| t.idx == idx)
    }

    /// A copy of the tour with the member at `pos` cut out; the matrix is shared.
    pub fn without(&self, pos: usize) -> Tour {
        let mut tigs = self.tigs.clone();
        tigs.remove(pos);
        Tour {
            tigs,
            m: Arc::clone(&self.m),
        }
    }

    pub fn retain_active(&mut self, contigs: &[ContigInfo]) {
        self.tigs.retain(|t| contigs[t.idx as usize].is_active);
    }

    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.tigs.shuffle(&mut rng);
    }

    /// Hot start from a list of contig names, e.g. the last tour of an earlier run.
    /// Unknown names and inactive contigs are dropped.
    pub fn from_names(names: &[String], contigs: &[ContigInfo], m: ContactMatrix) -> Tour {
        let name2idx = contigs
            .iter()
            .map(|c| (c.name.as_str(), c.idx))
            .collect::<FxHashMap<&str, u32>>();
        let mut unknown = 0_usize;
        let mut tigs = Vec::<Tig>::with_capacity(names.len());
        for name in names.iter() {
            match name2idx.get(name.as_str()) {
                Some(&idx) => {
                    let ctg = &contigs[idx as usize];
                    if ctg.is_active {
                        tigs.push(Tig {
                            idx,
                            size: ctg.size,
                        });
                    }
                }
                None => unknown += 1,
            }
        }
        if unknown > 0 {
            log::warn!("{} contigs in the tour are not in the contig list, ignored", unknown);
        }
        Tour::new(tigs, m)
    }
}

/// Scores a tour, a higher value is a better tour. The pruning works on the
/// negated value, so a deletion helps when it raises the score. Evaluations
/// run concurrently and must not depend on anything but the tour.
pub trait TourEvaluator: Sync {
    fn evaluate(&self, tour: &Tour) -> Result<f64>;
}

impl<F> TourEvaluator for F
where
    F: Fn(&Tour) -> Result<f64> + Sync,
{
    fn evaluate(&self, tour: &Tour) -> Result<f64> {
        self(tour)
    }
}

/// Sum of links / distance between contig midpoints over all member pairs,
/// each row stops once the distance exceeds LIMIT.
pub struct LinkDistanceScore;

impl TourEvaluator for LinkDistanceScore {
    fn evaluate(&self, tour: &Tour) -> Result<f64> {
        let size = tour.len();
        let mut mid = Vec::<f64>::with_capacity(size);
        let mut cum_sum = 0_u64;
        for t in tour.tigs.iter() {
            mid.push((cum_sum + (t.size / 2) as u64) as f64);
            cum_sum += t.size as u64;
        }
        let mut s = 0.0_f64;
        for i in 0..size {
            let a = tour.tigs[i].idx;
            for j in (i + 1)..size {
                let b = tour.tigs[j].idx;
                let dist = mid[j] - mid[i];
                if dist > LIMIT {
                    break;
                }
                if dist <= 0.0 {
                    continue;
                }
                s += tour.m.get(a, b) as f64 / dist;
            }
        }
        Ok(s)
    }
}

fn checked_score<E: TourEvaluator + ?Sized>(evaluator: &E, tour: &Tour) -> Result<f64> {
    let score = -evaluator.evaluate(tour)?;
    if !score.is_finite() {
        return Err(ScaffoldError::evaluator(format!(
            "non-finite score {} for a tour of {} contigs",
            score,
            tour.len()
        )));
    }
    Ok(score)
}

/// log10 of the score gained by deleting each member, or LOG10_DELTA_FLOOR when
/// the deletion does not help. One rayon task per position; all of them finish
/// before any error is reported.
pub fn log_delta_scores<E: TourEvaluator + ?Sized>(tour: &Tour, evaluator: &E) -> Result<Vec<f64>> {
    let tour_score = checked_score(evaluator, tour)?;
    log::info!("Starting score: {:.5}", tour_score);

    let results = (0..tour.len())
        .into_par_iter()
        .map(|i| {
            let new_tour = tour.without(i);
            let new_tour_score = checked_score(evaluator, &new_tour)?;
            let delta_score = tour_score - new_tour_score;
            if delta_score > MIN_DELTA {
                Ok(delta_score.log10())
            } else {
                Ok(LOG10_DELTA_FLOOR)
            }
        })
        .collect::<Vec<Result<f64>>>();

    results.into_iter().collect::<Result<Vec<f64>>>()
}

/// Leave-one-out pruning. Members whose log10 delta falls below the outlier
/// cutoff are deactivated in `contigs` and dropped from the tour; repeats until
/// nothing is removed or `max_rounds` is reached. Returns the number removed.
pub fn prune_tour<E: TourEvaluator + ?Sized>(
    contigs: &mut [ContigInfo],
    tour: &mut Tour,
    evaluator: &E,
    max_rounds: u32,
) -> Result<usize> {
    let mut removed = 0_usize;
    for phase in 1..=max_rounds {
        if tour.is_empty() {
            break;
        }
        let log10ds = log_delta_scores(tour, evaluator)?;
        log::debug!("round {} log10 deltas: {:?}", phase, log10ds);

        let (lb, ub) = outlier_cutoff(&log10ds);
        log::info!("Log10(delta_score) ~ [{:.5}, {:.5}]", lb, ub);

        let mut invalid = 0_usize;
        for (i, tig) in tour.tigs.iter().enumerate() {
            if log10ds[i] < lb {
                contigs[tig.idx as usize].is_active = false;
                invalid += 1;
            }
        }
        if invalid == 0 {
            break;
        }
        log::info!("Inactivated {} tigs with log10ds < {:.5}", invalid, lb);
        removed += invalid;

        tour.retain_active(contigs);
        report_active(contigs);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn contigs(n: u32) -> Vec<ContigInfo> {
        (0..n)
            .map(|i| ContigInfo::new(i, &format!("ctg{}", i), 10_000))
            .collect()
    }

    fn tour_of(contigs: &[ContigInfo]) -> Tour {
        let members = contigs.iter().map(|c| c.idx).collect::<Vec<u32>>();
        let tigs = contigs
            .iter()
            .map(|c| Tig {
                idx: c.idx,
                size: c.size,
            })
            .collect::<Vec<Tig>>();
        Tour::new(tigs, ContactMatrix::new(&members))
    }

    #[test]
    fn test_contact_matrix() {
        let mut m = ContactMatrix::new(&[3, 7]);
        m.set(3, 7, 12);
        m.set(3, 5, 9);
        assert_eq!(m.dim(), 2);
        assert_eq!(m.get(7, 3), 12);
        assert_eq!(m.get(3, 5), 0);
    }

    #[test]
    fn test_without_keeps_order() {
        let ctgs = contigs(4);
        let tour = tour_of(&ctgs);
        let t = tour.without(1);
        assert_eq!(t.tigs.iter().map(|t| t.idx).collect::<Vec<u32>>(), vec![0, 2, 3]);
        assert_eq!(tour.len(), 4);
        assert!(Arc::ptr_eq(&t.m, &tour.m));
    }

    #[test]
    fn test_link_distance_score() {
        let ctgs = contigs(3);
        let mut tour = tour_of(&ctgs);
        let mut m = ContactMatrix::new(&[0, 1, 2]);
        m.set(0, 1, 100);
        m.set(0, 2, 40);
        tour.m = Arc::new(m);
        // midpoints 5000, 15000, 25000
        let s = LinkDistanceScore.evaluate(&tour).unwrap();
        assert_relative_eq!(s, 100.0 / 10_000.0 + 40.0 / 20_000.0);
    }

    #[test]
    fn test_improving_deletion_gives_positive_log_delta() {
        let ctgs = contigs(4);
        let tour = tour_of(&ctgs);
        // deleting contig 2 raises the evaluator value by 100
        let eval = |t: &Tour| -> Result<f64> {
            if t.len() < 4 && !t.contains(2) {
                Ok(100.0)
            } else {
                Ok(0.0)
            }
        };
        let log10ds = log_delta_scores(&tour, &eval).unwrap();
        assert_relative_eq!(log10ds[2], 2.0);
        assert!(log10ds[2] > 0.0);
        assert_eq!(log10ds[0], LOG10_DELTA_FLOOR);
        assert_eq!(log10ds[3], LOG10_DELTA_FLOOR);
    }

    #[test]
    fn test_link_distance_gain_gives_positive_log_delta() {
        let ctgs = contigs(3);
        let mut tour = tour_of(&ctgs);
        let mut m = ContactMatrix::new(&[0, 1, 2]);
        m.set(0, 2, 100);
        tour.m = Arc::new(m);
        // taking out the unlinked middle contig brings 0 and 2 closer:
        // the sum goes from 100 / 20000 to 100 / 10000
        let log10ds = log_delta_scores(&tour, &LinkDistanceScore).unwrap();
        assert_relative_eq!(log10ds[1], (0.005_f64).log10(), epsilon = 1e-9);
        assert_eq!(log10ds[0], LOG10_DELTA_FLOOR);
        assert_eq!(log10ds[2], LOG10_DELTA_FLOOR);
    }

    #[test]
    fn test_identical_deltas_prune_nothing() {
        let mut ctgs = contigs(5);
        let mut tour = tour_of(&ctgs);
        let eval = |t: &Tour| -> Result<f64> { Ok(t.len() as f64) };
        let removed = prune_tour(&mut ctgs, &mut tour, &eval, 2).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(tour.len(), 5);
        assert!(ctgs.iter().all(|c| c.is_active));
    }

    #[test]
    fn test_prune_tour_removes_outlier() {
        let mut ctgs = contigs(5);
        let mut tour = tour_of(&ctgs);
        // every deletion helps by 1000 except deleting contig 4
        let eval = |t: &Tour| -> Result<f64> {
            if t.len() < 5 && t.contains(4) {
                Ok(1000.0)
            } else {
                Ok(0.0)
            }
        };
        let removed = prune_tour(&mut ctgs, &mut tour, &eval, 2).unwrap();
        assert_eq!(removed, 1);
        assert!(!ctgs[4].is_active);
        assert_eq!(tour.tigs.iter().map(|t| t.idx).collect::<Vec<u32>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_evaluator_fault_is_fatal_and_prunes_nothing() {
        let mut ctgs = contigs(4);
        let mut tour = tour_of(&ctgs);
        let eval = |t: &Tour| -> Result<f64> {
            if !t.contains(1) {
                Err(ScaffoldError::evaluator("boom"))
            } else if t.len() < 4 {
                Ok(1000.0)
            } else {
                Ok(0.0)
            }
        };
        assert!(prune_tour(&mut ctgs, &mut tour, &eval, 2).is_err());
        assert!(ctgs.iter().all(|c| c.is_active));
        assert_eq!(tour.len(), 4);

        let nan = |_t: &Tour| -> Result<f64> { Ok(f64::NAN) };
        match log_delta_scores(&tour, &nan) {
            Err(ScaffoldError::Evaluator { .. }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_names_and_shuffle() {
        let mut ctgs = contigs(4);
        ctgs[2].is_active = false;
        let names = ["ctg3", "nope", "ctg2", "ctg0"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<String>>();
        let tour = Tour::from_names(&names, &ctgs, ContactMatrix::default());
        assert_eq!(tour.tigs.iter().map(|t| t.idx).collect::<Vec<u32>>(), vec![3, 0]);

        let mut a = tour_of(&contigs(6));
        let mut b = tour_of(&contigs(6));
        a.shuffle(42);
        b.shuffle(42);
        assert_eq!(a.tigs, b.tigs);
        assert_eq!(a.len(), 6);
    }
}
