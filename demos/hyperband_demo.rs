//! Hyperband over the synthetic benchmark.
//!
//! Run with:
//! ```sh
//! cargo run --example hyperband_demo
//! ```

use hyperband::prelude::*;

fn main() -> hyperband::Result<()> {
    let hb = Hyperband::builder()
        .min_budget(2.0)
        .max_budget(100.0)
        .eta(2.0)
        .build()?;

    println!(
        "s_max = {}, {} evaluations planned",
        hb.s_max(),
        hb.planned_evaluations()
    );
    for d in hb.brackets() {
        println!(
            "  bracket {} (s = {}): {:>3} configs, budgets {:?}",
            d.index,
            d.s,
            d.n_configs,
            d.rung_budgets()
        );
    }

    let benchmark = SyntheticBenchmark::with_seed(0);
    let space = SyntheticBenchmark::search_space(0);
    let brackets = hb.run(&benchmark, &space)?;

    println!();
    for (i, state) in brackets.iter().enumerate() {
        if let Some((id, config, eval)) = state.best() {
            println!(
                "bracket {i}: {} evaluations, cost {:.3}, best {id} {config} loss {:.5}",
                state.n_evaluations(),
                state.total_cost(),
                eval.loss
            );
        }
    }

    let trajectory = benchmark.results();
    println!(
        "\nincumbent {:.5} after cost {:.3}",
        trajectory.final_incumbent().unwrap_or(f64::INFINITY),
        trajectory.total_cost()
    );
    if let Some((bracket, _, config, eval)) = best_overall(&brackets) {
        println!("best overall: {config} (bracket {bracket}, loss {:.5})", eval.loss);
    }

    Ok(())
}
