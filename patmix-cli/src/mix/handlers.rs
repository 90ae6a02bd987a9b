use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use patmix_core::beta::StatsPrecision;
use patmix_core::models::GenomicRegion;
use patmix_mixer::tools::{CommandMergeExecutor, Pat2BetaGenerator, ToolPaths};
use patmix_mixer::{FilterOptions, MixRequest, MixScope, Mixer, OutputTarget};

fn path_arg(matches: &ArgMatches, id: &str) -> Option<PathBuf> {
    matches.get_one::<String>(id).map(PathBuf::from)
}

/// Matches items from CLAP args into a validated request
pub fn build_request(matches: &ArgMatches) -> Result<MixRequest> {
    let sources: Vec<PathBuf> = matches
        .get_many::<String>("pat_files")
        .expect("pat files are required")
        .map(PathBuf::from)
        .collect();

    let rates: Vec<f64> = matches
        .get_many::<f64>("rates")
        .expect("rates are required")
        .copied()
        .collect();

    let labels: Option<Vec<String>> = matches
        .get_many::<String>("labels")
        .map(|labels| labels.cloned().collect());

    let genome_index = path_arg(matches, "genome_index");
    let region = match (
        matches.get_one::<String>("sites"),
        matches.get_one::<String>("region"),
    ) {
        (Some(sites), _) => match &genome_index {
            Some(index) => GenomicRegion::from_sites_with_index(sites, index)
                .with_context(|| format!("Failed to locate sites {}", sites))?,
            None => GenomicRegion::from_sites(sites)?,
        },
        (None, Some(region)) => {
            let index = genome_index.expect("genome index is required");
            GenomicRegion::from_region(region, &index)
                .with_context(|| format!("Failed to resolve region {}", region))?
        }
        (None, None) => GenomicRegion::whole(),
    };
    let scope = MixScope {
        region,
        bed_file: path_arg(matches, "bed_file"),
        bed_cov: path_arg(matches, "bed_cov"),
    };

    let output = match path_arg(matches, "prefix") {
        Some(prefix) => OutputTarget::Prefix(prefix),
        None => OutputTarget::Dir(path_arg(matches, "out_dir").expect("out_dir has a default")),
    };

    let filters = FilterOptions {
        strict: matches.get_flag("strict"),
        strip: matches.get_flag("strip"),
        min_len: matches.get_one::<u32>("min_len").copied(),
    };

    let precision = match matches.get_flag("lbeta") {
        true => StatsPrecision::LBeta,
        false => StatsPrecision::Beta,
    };

    let request = MixRequest::builder()
        .with_sources(&sources)
        .with_rates(rates)
        .with_labels(labels)
        .with_target_coverage(matches.get_one::<f64>("cov").copied())
        .with_scope(scope)
        .with_reps(*matches.get_one::<usize>("reps").expect("reps has a default"))
        .with_threads(matches.get_one::<usize>("threads").copied())
        .with_output(output)
        .with_force(matches.get_flag("force"))
        .with_filters(filters)
        .with_precision(precision)
        .with_temp_dir(path_arg(matches, "temp_dir"))
        .finish()?;

    Ok(request)
}

pub fn run_mix(matches: &ArgMatches) -> Result<()> {
    let request = build_request(matches)?;
    let tools = ToolPaths::from_env();

    let mixer = Mixer::new(request)?;
    let plan = mixer
        .prepare(&Pat2BetaGenerator::new(tools.clone()))
        .context("Failed to prepare the mix")?;
    eprintln!("{}", plan.stats);

    let report = mixer.run(&plan, &CommandMergeExecutor::new(tools))?;
    for path in report.produced() {
        info!("wrote {}", path.display());
    }

    Ok(())
}
