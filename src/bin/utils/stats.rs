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
// small statistics helpers shared by the contact store, the contig
// activation and the tour pruning: exponential distance histograms,
// bounded harmonic means and the MAD based outlier cutoff
//

// golden array bins are floor(ln(d) / PHI) clamped into [LB, UB]
pub const LB: i32 = 18;
pub const UB: i32 = 29;
pub const BB: usize = (UB - LB + 1) as usize;
// ln of the golden ratio 1.61803398875
pub const PHI: f64 = 0.4812118250596;
// the smallest and the largest distance represented in a golden array
pub const GRLB: u32 = 5778;
pub const GRUB: u32 = 1149851;

pub const OUTLIER_THRESHOLD: f64 = 3.5;
// pairs further apart than this are ignored when a tour is scored
pub const LIMIT: f64 = 10_000_000.0;

pub type GArray = [u32; BB];

pub fn golden_array(dists: &[u32]) -> GArray {
    let mut counts = [0_u32; BB];
    for &d in dists.iter() {
        let c = if d == 0 {
            LB
        } else {
            ((d as f64).ln() / PHI).floor() as i32
        };
        let c = c.clamp(LB, UB);
        counts[(c - LB) as usize] += 1;
    }
    counts
}

/// Harmonic mean of `dists` with every value clamped into `[lb, ub]`.
/// An empty input returns `ub`, i.e. "as far as we can tell".
pub fn hmean_int(dists: &[u32], lb: u32, ub: u32) -> u32 {
    if dists.is_empty() {
        return ub;
    }
    let lb = lb.max(1);
    let s: f64 = dists
        .iter()
        .map(|&d| 1.0 / (d.clamp(lb, ub.max(lb)) as f64))
        .sum();
    (dists.len() as f64 / s) as u32
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    let n = v.len();
    if n % 2 == 1 {
        v[n / 2]
    } else {
        (v[n / 2 - 1] + v[n / 2]) / 2.0
    }
}

/// Iglewicz and Hoaglin style cutoff: median +/- OUTLIER_THRESHOLD / 0.67449 * MAD.
///
/// NaN entries are ignored. Whenever the vector is too small or too degenerate
/// to give a usable median the bounds are (-inf, +inf), and a constant vector
/// gives (m, m); in both cases nothing is strictly below the lower bound.
pub fn outlier_cutoff(values: &[f64]) -> (f64, f64) {
    let v = values
        .iter()
        .copied()
        .filter(|x| !x.is_nan())
        .collect::<Vec<f64>>();
    if v.is_empty() {
        return (f64::NEG_INFINITY, f64::INFINITY);
    }
    let m = median(&v);
    if !m.is_finite() {
        return (f64::NEG_INFINITY, f64::INFINITY);
    }
    let d = v.iter().map(|x| (x - m).abs()).collect::<Vec<f64>>();
    let mad = median(&d);
    let c = OUTLIER_THRESHOLD / 0.67449 * mad;
    if c.is_nan() {
        return (f64::NEG_INFINITY, f64::INFINITY);
    }
    (m - c, m + c)
}
