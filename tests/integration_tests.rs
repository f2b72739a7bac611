//! End-to-end run over a small fixture fleet: two trains, one of them with a
//! missing diagnostic log, followed by lambda estimation over the results.

use std::env;
use std::fs;
use std::path::PathBuf;

use train_reliability::lambda::run_lambda_estimation;
use train_reliability::output::SkipReason;
use train_reliability::pipeline::{PipelineConfig, run_first_occurrence};

fn fixture_tree(name: &str) -> (PathBuf, PipelineConfig) {
    let base = env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&base);

    let config = PipelineConfig {
        maintenance_dir: base.join("maintenance"),
        composition_dir: base.join("composizione_treni"),
        diagnostics_dir: base.join("dati_diagnostici"),
        results_dir: base.join("results"),
    };
    fs::create_dir_all(&config.maintenance_dir).unwrap();
    fs::create_dir_all(&config.composition_dir).unwrap();
    fs::create_dir_all(&config.diagnostics_dir).unwrap();

    // ETR100: two coaches, C1 is the lead coach.
    fs::write(
        config.composition_dir.join("ETR100.csv"),
        "first,second,third\nC1,C2,\n",
    )
    .unwrap();
    fs::write(
        config.maintenance_dir.join("ETR100.csv"),
        "Descr. assem. Padre,Sede tecnica,Fine guasto\n\
         Trazione,C1,2023/05/01 10:00:00\n\
         Trazione,C1,2023/05/03 10:00:00\n\
         Trazione,C2,2023/05/02 08:00:00\n\
         Porte,C2,2023/05/02 09:00:00\n",
    )
    .unwrap();

    // Diagnostic log. Boundaries derived above: C1 -> 05/02 and 05/04,
    // C2 -> 05/03 (all at midnight).
    //
    //   1682996400000 = 2023-05-02 03:00:00 UTC  (3h after C1's first boundary)
    //   1683676800000 = 2023-05-10 00:00:00 UTC  (inside C1's unbounded tail)
    //   1683072000000 = 2023-05-03 00:00:00 UTC  (exactly on C2's boundary)
    fs::write(
        config.diagnostics_dir.join("ETR100.csv"),
        "source,name,machine_type,alert_type,ts,cod,id,id1,event_type,depot\n\
         C1,C1,MD,PDM,1682996400000,5,3,,ON,0\n\
         C1,C1,MD,PDM,1683676800000,5,3,,ON,0\n\
         C1,C2,MD,PDM,1683072000000,5,7,,ON,0\n\
         C2,C2,MD,PDM,1683072000000,5,7,,ON,0\n\
         C1,C1,MD,PDM,1682996400000,5,42,,ON,0\n\
         C1,C1,MD,PDM,1682996400000,5,3,,OFF,0\n",
    )
    .unwrap();

    // ETR200: valid composition and maintenance, no diagnostic log.
    fs::write(
        config.composition_dir.join("ETR200.csv"),
        "first\nD1\n",
    )
    .unwrap();
    fs::write(
        config.maintenance_dir.join("ETR200.csv"),
        "Descr. assem. Padre,Sede tecnica,Fine guasto\n\
         Trazione,D1,2023/05/01 10:00:00\n",
    )
    .unwrap();

    (base, config)
}

#[test]
fn test_full_pipeline() {
    let (_base, config) = fixture_tree("train_reliability_it_pipeline");

    let summary = run_first_occurrence(&config).unwrap();
    assert_eq!(summary.trains.len(), 2);

    let etr100 = &summary.trains[0];
    assert_eq!(etr100.train, "ETR100");
    assert_eq!(etr100.sheets_written, vec!["C1", "C2"]);

    let etr200 = &summary.trains[1];
    assert!(matches!(
        etr200.skip_reason,
        Some(SkipReason::MissingDiagnostics)
    ));

    let train_dir = config.results_dir.join("ETR100_prima_occorrenza");

    // C1: alarm 3 observed 3h into the first interval; the 05/10 occurrence
    // falls in the unbounded tail of the second intervention (6 days later).
    let c1 = fs::read_to_string(train_dir.join("C1.csv")).unwrap();
    let lines: Vec<_> = c1.lines().collect();
    assert_eq!(lines[0], "Fine guasto,maintenance_time,3");
    assert_eq!(lines[1], "2023/05/01 10:00:00,2023/05/02 00:00:00,3.00");
    assert_eq!(lines[2], "2023/05/03 10:00:00,2023/05/04 00:00:00,144.00");

    // C2: alarm 7 fired exactly on the boundary -> attributed to the
    // interval starting there, at 0.00 hours. The event reported by C2
    // itself is ignored (C1 is the reporting source), so no duplicate.
    let c2 = fs::read_to_string(train_dir.join("C2.csv")).unwrap();
    let lines: Vec<_> = c2.lines().collect();
    assert_eq!(lines[0], "Fine guasto,maintenance_time,7");
    assert_eq!(lines[1], "2023/05/02 08:00:00,2023/05/03 00:00:00,0.00");

    assert!(config.results_dir.join("summary.json").exists());
}

#[test]
fn test_lambda_estimation_over_pipeline_results() {
    let (base, config) = fixture_tree("train_reliability_it_lambdas");
    run_first_occurrence(&config).unwrap();

    let output = base.join("lambdas.csv");
    run_lambda_estimation(&config.results_dir, false, &output).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines[0], "alarm,lambda");

    // Alarm 3: 2 occurrences over 3.00 + 144.00 hours of exposure.
    let expected = 2.0 / 147.0;
    let (alarm, rate) = lines[1].split_once(',').unwrap();
    assert_eq!(alarm, "3");
    assert!((rate.parse::<f64>().unwrap() - expected).abs() < 1e-12);

    // Alarm 7: one occurrence at 0.00 hours -> zero exposure, undefined rate.
    assert_eq!(lines[2], "7,");
}
