// src/main.rs

use env_logger::Env;
use log::{error, info};
use num::BigInt;
use std::process;

use vqf::config::ReducerConfig;
use vqf::engine::{Reducer, ReductionStatus};

fn parse_arg(value: Option<String>) -> Option<BigInt> {
    value.and_then(|s| s.parse::<BigInt>().ok())
}

fn main() {
    let config = ReducerConfig::load().unwrap_or_default();

    // Initialize the logger
    let env = Env::default()
        .filter_or("VQF_LOG_LEVEL", config.log_level.clone())
        .write_style_or("VQF_LOG_STYLE", "always");
    env_logger::Builder::from_env(env).init();

    let mut args = std::env::args().skip(1);
    let m = match parse_arg(args.next()) {
        Some(m) if m > BigInt::from(1) => m,
        _ => {
            error!("usage: vqf <m> [true_p true_q]");
            process::exit(1);
        }
    };
    let true_p = parse_arg(args.next());
    let true_q = parse_arg(args.next());

    let reducer = Reducer::new(config);
    let reduction = match reducer.reduce(&m, true_p.as_ref(), true_q.as_ref()) {
        Ok(reduction) => reduction,
        Err(err) => {
            error!("reduction failed: {}", err);
            process::exit(1);
        }
    };

    match reduction.status {
        ReductionStatus::Solved => {
            let (p, q) = reduction.decode().expect("solved reduction decodes");
            info!("{} = {} * {}", m, p, q);
        }
        ReductionStatus::UnderDetermined => {
            let (unknowns, carry_bits) = reduction.unknown_counts();
            info!(
                "preprocessing left {} unknowns ({} carry bits) for the optimizer",
                unknowns, carry_bits
            );
            for clause in reduction.clauses.iter().filter(|c| !c.is_zero()) {
                info!("clause: {} = 0", clause);
            }
        }
    }
}
