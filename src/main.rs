use std::{path::PathBuf, process::ExitCode};

use backbone_graphs::{analyze, Config};
use clap::Parser;

#[derive(Parser)]
#[command(author, version, about = "Requires/excludes graphs from formula backbones")]
struct Cli {
    /// DIMACS CNF formula
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Worker threads
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    /// Output directory [default: directory of INPUT]
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Backbone detection strategy: one or without
    #[arg(short, long, default_value = "one")]
    strategy: String,

    /// Leave `aux_*` variables out of the graphs
    #[arg(short = 'a', long)]
    filter_aux: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = Config {
        input: cli.input,
        output_dir: cli.output,
        strategy: cli.strategy,
        threads: cli.threads,
        filter_auxiliary: cli.filter_aux,
    };

    match analyze(&config) {
        Ok(analysis) => {
            println!("variables: {}", analysis.var_count);
            println!("clauses: {}", analysis.clause_count);
            println!("backbone size: {}", analysis.global_backbone.len());
            println!("requires edges: {}", analysis.edges.requires.len());
            println!("excludes edges: {}", analysis.edges.excludes.len());
            for path in [
                &analysis.paths.requires,
                &analysis.paths.excludes,
                &analysis.paths.core,
                &analysis.paths.dead,
            ] {
                println!("wrote {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(2)
        }
    }
}
