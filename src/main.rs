use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};

use pairmapq::alignment::ReadPair;
use pairmapq::defaults;
use pairmapq::mapq::{
    HW_MAPQ_MAX, compute_mapq, fixed_point_log2, mapq_to_score_scale, saturate_mapq,
    score_to_mapq_scale,
};
use pairmapq::pair_opt::{PairCliOptions, PairOpt};
use pairmapq::paired::{PAIR_PENALTY_TABLE, PairBuilder};

#[derive(Parser)]
#[command(name = "pairmapq")]
#[command(about = "Paired-end MAPQ and pair-penalty calculator (fixed-point hardware model)", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
    #[arg(short = 'v', long, value_name = "INT", global = true, default_value_t = defaults::VERBOSITY)]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed-point log2 (7 fractional bits) of each value
    Log2 {
        #[arg(value_name = "INT", required = true)]
        values: Vec<u32>,
    },

    /// MAPQ for a best/second-best score gap
    Mapq {
        /// Best (pair) score
        #[arg(long, value_name = "INT")]
        best: i32,

        /// Second-best (pair) score; raised to the minimum score
        #[arg(long, value_name = "INT")]
        second: i32,

        /// Average read length
        #[arg(short = 'l', long, value_name = "INT", default_value_t = 150)]
        read_len: u32,

        /// Clamp the result to the hardware MAPQ range
        #[arg(long)]
        saturate: bool,

        #[command(flatten)]
        pair: PairCliOptions,
    },

    /// Pairing penalty for an insert length (requires -I)
    Penalty {
        /// Observed insert length
        #[arg(value_name = "INT", required = true, allow_negative_numbers = true)]
        insert_lengths: Vec<i64>,

        /// Average read length
        #[arg(short = 'l', long, value_name = "INT", default_value_t = 150)]
        read_len: u32,

        #[command(flatten)]
        pair: PairCliOptions,
    },

    /// Dump a lookup table
    Table {
        #[arg(value_enum, default_value_t = TableKind::Penalty)]
        kind: TableKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TableKind {
    /// Pairing penalty ROM (phred by address)
    Penalty,
    /// log2 of 1..=256 in 7-bit fixed point
    Log2,
}

fn init_logger(verbosity: u8) {
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace, // 5+ = trace
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module path
        .init();
}

fn pair_opt(cli: &PairCliOptions) -> anyhow::Result<PairOpt> {
    let opt = PairOpt::try_from(cli).map_err(anyhow::Error::msg)?;
    if let Err(errors) = opt.validate() {
        for e in &errors {
            log::error!("{}", e);
        }
        bail!("invalid options ({} errors)", errors.len());
    }
    Ok(opt)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbosity);

    match cli.command {
        Commands::Log2 { values } => {
            for x in values {
                println!("{}\t{}", x, fixed_point_log2(x));
            }
        }

        Commands::Mapq {
            best,
            second,
            read_len,
            saturate,
            pair,
        } => {
            let opt = pair_opt(&pair)?;
            let len = opt.mapq_min_len.max(read_len) as f64;
            let second = opt.min_score.max(second);
            log::debug!(
                "snp_cost={} scale={} m2a_scale={:.6}",
                opt.snp_cost,
                score_to_mapq_scale(opt.snp_cost, len),
                mapq_to_score_scale(opt.snp_cost, len)
            );

            let mut mapq = compute_mapq(opt.snp_cost, best, second, len);
            if saturate {
                mapq = saturate_mapq(mapq, HW_MAPQ_MAX);
            }
            println!("{}", mapq);
        }

        Commands::Penalty {
            insert_lengths,
            read_len,
            pair,
        } => {
            let opt = pair_opt(&pair)?;
            let params = opt
                .insert_size_parameters()
                .context("penalty requires an insert size distribution (-I)")?;
            log::info!(
                "orientation {} mean {} sigma factor {} bounds [{}, {}]",
                params.orientation,
                params.mean,
                params.sigma_factor,
                params.min,
                params.max
            );

            let builder = PairBuilder::new(&opt);
            let read_pair = ReadPair::new(read_len, read_len);
            println!("insert\tproper\tphred\tscore");
            for insert_len in insert_lengths {
                let proper = params.is_within_bounds(insert_len);
                let phred = if proper {
                    builder.phred_pair_penalty(&params, insert_len)
                } else {
                    builder.unpaired_penalty
                };
                let score = builder.phred_to_score(read_pair.length(), phred);
                println!("{}\t{}\t{}\t{}", insert_len, proper as u8, phred, score);
            }
        }

        Commands::Table { kind } => match kind {
            TableKind::Penalty => {
                for (addr, phred) in PAIR_PENALTY_TABLE.iter().enumerate() {
                    println!("{}\t{}", addr, phred);
                }
            }
            TableKind::Log2 => {
                for x in 1..=256u32 {
                    println!("{}\t{}", x, fixed_point_log2(x));
                }
            }
        },
    }

    Ok(())
}
