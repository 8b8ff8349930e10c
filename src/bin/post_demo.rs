//! Load a solved problem and print summary quantities.
//!
//! Usage: post_demo <solution.ans> [config.toml]

use magpost::{BlockIntegrand, PostConfig, PostProcessor};

fn main() {
    let mut args = std::env::args().skip(1);
    let path = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("usage: post_demo <solution.ans> [config.toml]");
            std::process::exit(2);
        }
    };

    let mut proc = PostProcessor::new();
    if let Some(cfg) = args.next() {
        match PostConfig::from_file(&cfg) {
            Ok(c) => proc.config = c,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        }
    }

    if let Err(e) = proc.open(&path) {
        eprintln!("failed to load {}: {}", path, e);
        std::process::exit(1);
    }

    println!("loaded {}", path);
    println!("  problem:  {:?}, f = {} Hz", proc.problem_type(), proc.frequency());
    println!("  mesh:     {} nodes, {} elements", proc.num_nodes(), proc.num_elements());

    // whole-domain integrals
    proc.select_group(0);
    println!("  area:     {:.6e} m^2", proc.block_integral(BlockIntegrand::CrossSectionArea).re);
    println!("  volume:   {:.6e} m^3", proc.block_integral(BlockIntegrand::Volume).re);
    println!("  energy:   {:.6e} J", proc.block_integral(BlockIntegrand::MagneticEnergy).re);
    println!("  losses:   {:.6e} W", proc.block_integral(BlockIntegrand::TotalLosses).re);

    for c in 0..proc.num_circuits() {
        let v = proc.voltage_drop(c);
        let lambda = proc.flux_linkage(c);
        println!(
            "  circuit {}: V = {:.6e} + j{:.6e}, lambda = {:.6e} + j{:.6e}",
            c, v.re, v.im, lambda.re, lambda.im
        );
    }

    for name in proc.gap_names().iter().map(|s| s.to_string()).collect::<Vec<_>>() {
        match proc.gap_dc_torque(&name) {
            Ok(tq) => println!("  gap {:?}: torque = {:.6e} N m", name, tq),
            Err(e) => eprintln!("  gap {:?}: {}", name, e),
        }
    }
}
