use std::ops::ControlFlow;

use hyperband::{
    Configuration, ConfigurationSource, Error, Evaluation, Hyperparameter, SearchSpace,
    SuccessiveHalving, SyntheticBenchmark,
};

#[test]
fn forty_models_on_synthetic_benchmark() {
    let sh = SuccessiveHalving::new(40, 10.0, 100.0, 2.0).unwrap();
    let benchmark = SyntheticBenchmark::with_seed(0);
    let space = SyntheticBenchmark::search_space(0);

    let state = sh.run(&benchmark, &space).unwrap();

    let budgets: Vec<f64> = state.rungs().iter().map(|r| r.budget).collect();
    assert_eq!(budgets, vec![10.0, 20.0, 40.0, 80.0]);
    let sizes: Vec<usize> = state.rungs().iter().map(|r| r.evaluated.len()).collect();
    assert_eq!(sizes, vec![40, 20, 10, 5]);
    assert_eq!(state.active().len(), 2);
    assert_eq!(benchmark.n_evaluations(), 75);
    assert_eq!(state.n_evaluations(), 75);

    let spent: f64 = benchmark.history().iter().map(|e| e.cost).sum();
    assert!((state.total_cost() - spent).abs() < 1e-9);
}

#[test]
fn promoted_configurations_beat_eliminated_ones() {
    let sh = SuccessiveHalving::new(27, 1.0, 27.0, 3.0).unwrap();
    let benchmark = SyntheticBenchmark::with_seed(3);
    let state = sh
        .run(&benchmark, &SyntheticBenchmark::search_space(3))
        .unwrap();

    for rung in state.rungs() {
        let loss = |id| state.record(id).unwrap().get(rung.budget).unwrap().loss;
        let worst_promoted = rung
            .promoted
            .iter()
            .map(|&id| loss(id))
            .fold(f64::NEG_INFINITY, f64::max);
        for id in rung.evaluated.iter().filter(|id| !rung.promoted.contains(*id)) {
            assert!(loss(*id) >= worst_promoted);
        }
        // Promoted ids are ordered best first.
        let promoted: Vec<f64> = rung.promoted.iter().map(|&id| loss(id)).collect();
        assert!(promoted.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn records_hold_a_prefix_of_the_rung_budgets() {
    let sh = SuccessiveHalving::new(16, 2.0, 32.0, 2.0).unwrap();
    let budgets = sh.rung_budgets();
    let state = sh
        .run(
            &SyntheticBenchmark::with_seed(11),
            &SyntheticBenchmark::search_space(11),
        )
        .unwrap();

    for (_, _, record) in state.iter() {
        let seen: Vec<f64> = record.budgets().collect();
        assert!(!seen.is_empty());
        assert_eq!(seen, budgets[..seen.len()].to_vec());
    }
}

#[test]
fn keeps_a_single_survivor_when_eta_exceeds_pool() {
    let sh = SuccessiveHalving::new(3, 1.0, 4.0, 5.0).unwrap();
    let state = sh
        .run(
            &SyntheticBenchmark::with_seed(2),
            &SyntheticBenchmark::search_space(2),
        )
        .unwrap();
    assert_eq!(state.rungs().len(), 1);
    assert_eq!(state.rungs()[0].promoted.len(), 1);
    assert!(state.is_complete());
}

#[test]
fn works_with_a_custom_search_space() {
    let space = SearchSpace::with_seed(4)
        .add(
            "lr",
            Hyperparameter::Float {
                low: 1e-4,
                high: 1.0,
                log_scale: true,
            },
        )
        .unwrap();
    let evaluator = |config: &Configuration, budget: f64| -> Result<Evaluation, &'static str> {
        let lr = config.value("lr").ok_or("missing lr")?;
        Ok(Evaluation::new((lr - 0.01).abs() + 1.0 / budget, budget))
    };
    let sh = SuccessiveHalving::new(9, 1.0, 9.0, 3.0).unwrap();
    let state = sh.run(&evaluator, &space).unwrap();

    let (id, best, eval) = state.best().unwrap();
    assert_eq!(state.active(), &[id]);
    assert!(best.value("lr").is_some());
    assert!(eval.loss.is_finite());
    assert!(space.sample().value("lr").is_some());
}

#[test]
fn callback_sees_every_rung_in_order() {
    let sh = SuccessiveHalving::new(40, 10.0, 100.0, 2.0).unwrap();
    let mut reports = Vec::new();
    let state = sh
        .run_with_callback(
            &SyntheticBenchmark::with_seed(5),
            &SyntheticBenchmark::search_space(5),
            |report| {
                reports.push(report.clone());
                ControlFlow::Continue(())
            },
        )
        .unwrap();

    let summary: Vec<(usize, usize, usize, bool)> = reports
        .iter()
        .map(|r| (r.rung, r.n_evaluated, r.n_promoted, r.is_last))
        .collect();
    assert_eq!(
        summary,
        vec![
            (0, 40, 20, false),
            (1, 20, 10, false),
            (2, 10, 5, false),
            (3, 5, 2, true),
        ]
    );
    let (_, _, best) = state.best().unwrap();
    assert!((reports[3].best_loss - best.loss).abs() < f64::EPSILON);
}

#[test]
fn evaluator_error_names_configuration_and_budget() {
    let source = || 0_u8;
    let evaluator = |_: &u8, budget: f64| {
        if budget >= 4.0 {
            Err(format!("timed out at {budget}"))
        } else {
            Ok(Evaluation::new(1.0, budget))
        }
    };
    let sh = SuccessiveHalving::new(8, 1.0, 8.0, 2.0).unwrap();
    let err = sh.run(&evaluator, &source).map_err(Error::from).unwrap_err();
    match err {
        Error::EvaluationFailure { budget, reason, .. } => {
            assert!((budget - 4.0).abs() < f64::EPSILON);
            assert_eq!(reason, "timed out at 4");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_configuration_is_recoverable() {
    let next = std::cell::Cell::new(0_u32);
    let source = || {
        let id = next.get();
        next.set(id + 1);
        format!("config-{id}")
    };
    let evaluator = |c: &String, budget: f64| {
        if c == "config-2" && budget > 1.0 {
            Err("diverged")
        } else {
            Ok(Evaluation::new(if c == "config-2" { 0.0 } else { 1.0 }, budget))
        }
    };
    let sh = SuccessiveHalving::new(4, 1.0, 4.0, 2.0).unwrap();
    let aborted = sh.run(&evaluator, &source).unwrap_err();
    assert_eq!(aborted.failed_config().map(String::as_str), Some("config-2"));
    assert!(aborted.completed().is_empty());
    assert_eq!(aborted.failed().map(|b| b.rungs().len()), Some(1));
}
