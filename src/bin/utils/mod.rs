// Peregrine Assembler and SHIMMER Genome Assembly Toolkit
// 2019, 2020, 2021- (c) by Jason, Chen-Shan, Chin
//
// This Source Code Form is subject to the terms of the
// Creative Commons Attribution-NonCommercial-ShareAlike 4.0 International License.
//
// You should have received a copy of the license along with this
// work. If not, see <http://creativecommons.org/licenses/by-nc-sa/4.0/>.

pub mod activate;
pub mod anchor;
pub mod contacts;
pub mod error;
pub mod io;
pub mod linkage;
pub mod path;
pub mod stats;
pub mod tour;
pub use libc::{getrusage, rusage, RUSAGE_SELF};

#[derive(Copy, Clone, Debug)]
pub struct Parameters {
    pub nthreads: u32,
    // contigs shorter than this are never scaffolded
    pub min_size: u32,
    pub density_cap: u32,
    // tour pruning rounds
    pub max_rounds: u32,
    // anchoring build / merge iterations
    pub max_iterations: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            nthreads: num_cpus::get_physical() as u32,
            min_size: 10_000,
            density_cap: 500_000,
            max_rounds: 2,
            max_iterations: 3,
        }
    }
}

#[allow(dead_code)]
pub fn log_resource(msg: &str) -> (u64, u64, u64) {
    let mut data: rusage = unsafe { std::mem::zeroed() };
    let _res = unsafe { getrusage(RUSAGE_SELF, &mut data) };
    log::info!(
        "{} : (maxRSS, utime, stime): {} {} {}",
        msg,
        data.ru_maxrss,
        data.ru_utime.tv_sec,
        data.ru_stime.tv_sec
    );

    (
        data.ru_maxrss as u64,
        data.ru_utime.tv_sec as u64,
        data.ru_stime.tv_sec as u64,
    )
}

/// parse an optional command line value, falling back to `default`
pub fn arg_or<T: std::str::FromStr>(
    value: Option<&str>,
    name: &str,
    default: T,
) -> error::Result<T> {
    match value {
        Some(v) => v.parse::<T>().map_err(|_| {
            error::ScaffoldError::invalid_input(format!("bad value for --{}: {}", name, v))
        }),
        None => Ok(default),
    }
}
