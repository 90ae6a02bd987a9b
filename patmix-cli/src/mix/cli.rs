use clap::{Arg, ArgAction, Command};

pub use patmix_mixer::consts::{DEFAULT_OUT_DIR, MIX_CMD};

/// Creates the mix CLI Command object
pub fn create_mix_cli() -> Command {
    Command::new(MIX_CMD)
        .about("Mix reads from K pat files at the requested rates")
        .long_about(
            "Mix reads from K different pat files.\n\n\
            Outputs one mixed pat.gz file per replicate, sorted, bgzipped and indexed, \
            with an informative name. The rates are adjusted to the coverage of each \
            source so that the output has the requested coverage.",
        )
        .arg(
            Arg::new("pat_files")
                .help("Two or more pat files")
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new("rates")
                .long("rates")
                .value_name("[0.0, 1.0]")
                .help(
                    "Rates for each of the pat files. The order matters! \
                    The rate of the last file may be omitted.",
                )
                .num_args(1..)
                .value_parser(clap::value_parser!(f64))
                .allow_negative_numbers(true)
                .required(true),
        )
        .arg(
            Arg::new("labels")
                .long("labels")
                .help(
                    "Labels for the mixed reads. Default is the basenames of the pat files, \
                    lowercased and trimmed by the first '-'",
                )
                .num_args(1..),
        )
        .arg(
            Arg::new("cov")
                .long("cov")
                .short('c')
                .help(
                    "Coverage of the output pat. Default is the coverage of the file with \
                    the highest rate. Missing beta files are generated next to the pat files.",
                )
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .short('f')
                .help("Overwrite existing files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("reps")
                .long("reps")
                .help("Number of replicates")
                .value_parser(clap::value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .short('p')
                .help("Prefix of output files")
                .conflicts_with("out_dir"),
        )
        .arg(
            Arg::new("out_dir")
                .long("out_dir")
                .short('o')
                .help("Output directory")
                .default_value(DEFAULT_OUT_DIR),
        )
        .arg(
            Arg::new("bed_cov")
                .long("bed_cov")
                .help("Calculate coverage on the regions of this blocks file only"),
        )
        .arg(
            Arg::new("sites")
                .long("sites")
                .short('s')
                .help("Site range to mix, e.g. 1000-2000 (1-based, end exclusive)")
                .conflicts_with("region"),
        )
        .arg(
            Arg::new("region")
                .long("region")
                .short('r')
                .help("Genomic region to mix, e.g. chr1:10000-20000")
                .requires("genome_index"),
        )
        .arg(
            Arg::new("genome_index")
                .long("genome_index")
                .help(
                    "Site index of the genome (chr, locus, site). Resolves --region, \
                    and names --sites by their genomic span",
                ),
        )
        .arg(
            Arg::new("bed_file")
                .long("bed_file")
                .short('L')
                .help("Blocks file. Only reads overlapping these blocks are mixed"),
        )
        .arg(
            Arg::new("lbeta")
                .long("lbeta")
                .short('l')
                .help("Use lbeta files (uint16) instead of beta (uint8)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("temp_dir")
                .long("temp_dir")
                .short('T')
                .help("Passed to 'sort -m'. Useful for merging very large pat files"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Truncate reads that start/end outside the region")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("strip")
                .long("strip")
                .help("Remove trailing dots from each read")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("min_len")
                .long("min_len")
                .help("Only keep reads covering at least this many sites")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('@')
                .help("Number of replicates to mix in parallel (default: all cores)")
                .value_parser(clap::value_parser!(usize)),
        )
}
