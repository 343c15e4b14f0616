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
use utils::activate::activate;
use utils::anchor::Anchorer;
use utils::contacts::ContactStore;
use utils::error::ScaffoldError;
use utils::io::{open_reader, parse_ids, read_clm, tour_token, write_tour};
use utils::path::log_scaffold_summary;
use utils::{arg_or, log_resource, Parameters};

fn main() -> Result<(), ScaffoldError> {
    let matches = clap_app!(hic_anchor =>
        (version: VERSION_STRING)
        (author: "Jason Chin <jason@omnibio.ai>")
        (about: "
hic_anchor: order and orient contigs into scaffold paths from Hi-C contact evidence
LICENSE: http://creativecommons.org/licenses/by-nc-sa/4.0/")
        (@arg clm_file: -c --clm_file +required +takes_value "Path to the clm file (links and distances per oriented contig pair)")
        (@arg ids_file: -i --ids_file +takes_value "Path to the ids file [default: the clm path with an .ids extension]")
        (@arg output_prefix: -o --out_prefix +required +takes_value "Path to the output prefix")
        (@arg min_size: -m --min_size +takes_value "Minimum contig size to scaffold [default: 10000]")
        (@arg iterations: -n --iterations +takes_value "Maximum anchoring iterations [default: 3]")
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
        min_size: arg_or(matches.value_of("min_size"), "min_size", defaults.min_size)?,
        max_iterations: arg_or(
            matches.value_of("iterations"),
            "iterations",
            defaults.max_iterations,
        )?,
        ..defaults
    };
    log::info!("hic_anchor {}", VERSION_STRING);
    log::info!("{:?}", parameters);

    let contigs = parse_ids(open_reader(&ids_file)?)?;
    let mut store = ContactStore::new(contigs);
    read_clm(open_reader(&clm_file)?, &mut store)?;
    log_resource("load clm done");

    activate(&mut store, &parameters);

    let mut anchorer = Anchorer::new(&store, parameters.max_iterations);
    let path_ids = anchorer.run();
    log_resource("anchoring done");

    let mut out_file = BufWriter::new(File::create(format!("{}.tour", output_prefix))?);
    let mut scaffold_lengths = Vec::<(String, u64)>::new();
    for (i, path_id) in path_ids.iter().enumerate() {
        let path = anchorer.paths.path(*path_id);
        let name = format!("scaffold_{}", i + 1);
        let tokens = path
            .members
            .iter()
            .map(|m| tour_token(&store.contigs()[m.ctg as usize].name, Some(m.strand)))
            .collect::<Vec<String>>();
        write_tour(&mut out_file, &name, &tokens)?;
        scaffold_lengths.push((name, path.length));
    }
    out_file.flush()?;
    log_scaffold_summary(scaffold_lengths);
    Ok(())
}
