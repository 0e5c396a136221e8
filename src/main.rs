extern crate clap;

use clap::Parser;
use colorcount::automorphism::automorphism_num;
use colorcount::cli::Cli;
use colorcount::decompose::decompose;
use colorcount::engine::{CountConfig, CountEngine, CountReport};
use colorcount::error::CountError;
use colorcount::graph::CscGraph;
use colorcount::io;
use colorcount::rcm::rcm_order;

fn run(cli: Cli) -> Result<(), CountError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.workers)
        .build_global()
        .map_err(|e| CountError::InvariantViolated { subtemplate: 0, detail: e.to_string() })?;

    let mut graph: CscGraph =
        if cli.load_binary() { io::read_binary_graph(&cli.graph)? } else { io::read_host_graph(&cli.graph)? };
    if cli.verbose {
        eprintln!("loaded host graph: {} vertices, {} edges", graph.vertex_num(), graph.num_edges());
    }

    if cli.reorder {
        let perm = rcm_order(&graph);
        graph = graph.permuted(&perm)?;
        if cli.verbose {
            eprintln!("applied RCM reordering");
        }
    }

    if cli.write_binary() {
        io::write_binary_graph(&graph, &cli.graph)?;
        if cli.verbose {
            eprintln!("wrote binary cache to {}", cli.graph);
        }
    }

    let template = io::read_template(&cli.template)?;
    let decomposition = decompose(&template);
    let automorphisms = automorphism_num(&template);
    if cli.verbose {
        eprintln!(
            "template has {} vertices, {} subtemplates, {} automorphisms",
            template.vertex_num(),
            decomposition.chain.len(),
            automorphisms
        );
    }

    let config = CountConfig {
        iterations: cli.iterations,
        num_colors: cli.colors.unwrap_or(template.vertex_num()),
        num_partitions: 4 * cli.workers.max(1),
        use_spmm: cli.use_spmm(),
        pruned: cli.pruned(),
        seed: cli.seed,
        trace_subtemplate: cli.trace_subtemplate(),
    };

    let engine = CountEngine::new(&graph, &decomposition, automorphisms, config)?;
    if cli.verbose {
        eprintln!("peak memory estimate: {} bytes", engine.peak_memory_estimate_bytes());
    }

    let mut report: Option<CountReport> = None;
    for bench_iter in 0..cli.benchmark_iterations.max(1) {
        let start = std::time::Instant::now();
        let this_report = engine.run()?;
        if cli.verbose {
            eprintln!(
                "benchmark run {bench_iter}: {:.3}s, raw average {}, scaling triggered: {}",
                start.elapsed().as_secs_f64(),
                this_report.raw_average,
                this_report.was_scaled
            );
            if let Some(trace) = this_report.trace_value {
                eprintln!("  subtemplate {} trace: {trace}", cli.profile_trigger_subtemplate_index);
            }
        }
        report = Some(this_report);
    }
    let report = report.expect("benchmark_iterations is clamped to at least 1");

    println!("Final count is {}", report.estimate);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
