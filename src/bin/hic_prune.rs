// Peregrine Assembler and SHIMMER Genome Assembly Toolkit
// 2019, 2020, 2021- (c) by Jason, Chen-Shan, Chin
//
// This Source Code Form is subject to the terms of the
// Creative Commons Attribution-NonCommercial-ShareAlike 4.0 International License.
//
// You should have received a copy of the license along with this
// work. If not, see <http://creativecommons.org/licenses/by-nc-sa/4.0/>.

const VERSION_STRING: &'static str = env!("VERSION_STRING");

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::clap_app;
mod utils;
use simple_logger::SimpleLogger;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use utils::activate::{activate, active_indices, contact_matrix};
use utils::contacts::{ContactStore, ContigInfo};
use utils::error::ScaffoldError;
use utils::io::{open_reader, parse_ids, parse_tour, read_clm, tour_token, write_tour};
use utils::tour::{prune_tour, LinkDistanceScore, Tour, TourEvaluator};
use utils::{arg_or, log_resource, Parameters};

fn tour_tokens(tour: &Tour, contigs: &[ContigInfo]) -> Vec<String> {
    tour.tigs
        .iter()
        .map(|t| tour_token(&contigs[t.idx as usize].name, None))
        .collect::<Vec<String>>()
}

fn main() -> Result<(), ScaffoldError> {
    let matches = clap_app!(hic_prune =>
        (version: VERSION_STRING)
        (author: "Jason Chin <jason@omnibio.ai>")
        (about: "
hic_prune: remove contigs whose deletion improves the Hi-C score of a tour
LICENSE: http://creativecommons.org/licenses/by-nc-sa/4.0/")
        (@arg clm_file: -c --clm_file +required +takes_value "Path to the clm file (links and distances per oriented contig pair)")
        (@arg ids_file: -i --ids_file +takes_value "Path to the ids file [default: the clm path with an .ids extension]")
        (@arg output_prefix: -o --out_prefix +required +takes_value "Path to the output prefix")
        (@arg tour_file: --tour +takes_value "Start from the last tour in this tour file")
        (@arg seed: -s --seed +takes_value "Shuffle the starting tour with this seed")
        (@arg min_size: -m --min_size +takes_value "Minimum contig size to scaffold [default: 10000]")
        (@arg rounds: -r --rounds +takes_value "Maximum pruning rounds [default: 2]")
        (@arg nthreads: -t --nthreads +takes_value "Number of threads [default: number of physical cores]")
        (@arg log: --log +takes_value "log level: DBBUG or INFO (default)")
    )
    .get_matches();

    let log_level = match matches.value_of("log").unwrap_or("INFO") {
        "DEBUG" => log::LevelFilter::Debug,
        _ => log::LevelFilter::Info,
    };

    SimpleLogger::new()
        .with_level(log_level)
        .with_utc_timestamps()
        .init()
        .map_err(|e| ScaffoldError::invalid_input(e.to_string()))?;

    let clm_file = matches
        .value_of("clm_file")
        .ok_or_else(|| ScaffoldError::invalid_input("missing --clm_file"))?
        .to_string();
    let ids_file = match matches.value_of("ids_file") {
        Some(f) => f.to_string(),
        None => Path::new(&clm_file)
            .with_extension("ids")
            .to_string_lossy()
            .into_owned(),
    };
    let output_prefix = matches
        .value_of("output_prefix")
        .ok_or_else(|| ScaffoldError::invalid_input("missing --out_prefix"))?
        .to_string();

    let defaults = Parameters::default();
    let parameters = Parameters {
        nthreads: arg_or(matches.value_of("nthreads"), "nthreads", defaults.nthreads)?,
        min_size: arg_or(matches.value_of("min_size"), "min_size", defaults.min_size)?,
        max_rounds: arg_or(matches.value_of("rounds"), "rounds", defaults.max_rounds)?,
        ..defaults
    };
    let seed = match matches.value_of("seed") {
        Some(s) => Some(arg_or(Some(s), "seed", 0_u64)?),
        None => None,
    };
    log::info!("hic_prune {}", VERSION_STRING);
    log::info!("{:?}", parameters);

    rayon::ThreadPoolBuilder::new()
        .num_threads(parameters.nthreads as usize)
        .build_global()
        .map_err(|e| ScaffoldError::invalid_input(e.to_string()))?;

    let contigs = parse_ids(open_reader(&ids_file)?)?;
    let mut store = ContactStore::new(contigs);
    read_clm(open_reader(&clm_file)?, &mut store)?;
    log_resource("load clm done");

    let mut tour = activate(&mut store, &parameters);
    if let Some(tour_file) = matches.value_of("tour_file") {
        let records = parse_tour(open_reader(tour_file)?)?;
        let last = records.last().ok_or_else(|| {
            ScaffoldError::invalid_input(format!("no tour found in {}", tour_file))
        })?;
        let names = last
            .contigs
            .iter()
            .map(|c| c.0.clone())
            .collect::<Vec<String>>();
        let members = active_indices(store.contigs());
        tour = Tour::from_names(&names, store.contigs(), contact_matrix(&store, &members));
        log::info!("Hot start from `{}` ({} contigs)", last.name, tour.len());
    }
    if let Some(seed) = seed {
        tour.shuffle(seed);
    }

    let evaluator = LinkDistanceScore;
    let mut out_file = BufWriter::new(File::create(format!("{}.tour", output_prefix))?);
    write_tour(&mut out_file, "INIT", &tour_tokens(&tour, store.contigs()))?;
    log::info!("Initial score: {:.5}", evaluator.evaluate(&tour)?);

    let removed = prune_tour(
        store.contigs_mut(),
        &mut tour,
        &evaluator,
        parameters.max_rounds,
    )?;
    log::info!(
        "Pruned {} contigs, {} left, score: {:.5}",
        removed,
        tour.len(),
        evaluator.evaluate(&tour)?
    );
    write_tour(&mut out_file, "PRUNED", &tour_tokens(&tour, store.contigs()))?;
    out_file.flush()?;
    log_resource("pruning done");
    Ok(())
}
