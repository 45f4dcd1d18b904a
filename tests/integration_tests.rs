use approx::assert_relative_eq;
use ridership_flow::FlowError;
use ridership_flow::aggregate::{DataQualityWarning, aggregate_monthly};
use ridership_flow::config::FlowConfig;
use ridership_flow::ingest::{load_records, read_records};
use ridership_flow::layout::BandLayer;
use ridership_flow::model::{Direction, MonthKey};
use ridership_flow::output::write_chart_json;
use ridership_flow::pipeline::{build_chart, run};
use std::{env, fs, path::Path};

const FIXTURE: &[u8] = include_bytes!("fixtures/tram_weekly.csv");

fn fixture_path() -> String {
    format!(
        "{}/tests/fixtures/tram_weekly.csv",
        env!("CARGO_MANIFEST_DIR")
    )
}

#[test]
fn test_full_pipeline() {
    let chart = run(&fixture_path(), &FlowConfig::default()).expect("Failed to build chart");

    assert_eq!(chart.outbound.len(), 24);
    assert_eq!(chart.inbound.len(), 24);
    assert_eq!(chart.bands.bands.len(), 4);
    assert_eq!(chart.timeline.len(), 24);
}

#[test]
fn test_five_january_weeks_sum_into_one_month() {
    let config = FlowConfig::default();
    let records = read_records(FIXTURE, "fixture", &config).unwrap();
    let aggregation = aggregate_monthly(&records, &config).unwrap();

    let jan = aggregation.outbound.at_step(1).unwrap();
    assert_eq!(jan.month, MonthKey::new(2019, 1).unwrap());
    assert_eq!(jan.total, 500);
    assert_eq!(jan.subcategory_amount, 200);
    assert_eq!(jan.complement_amount, 300);
    assert_eq!(jan.weekly_rows, 5);
}

#[test]
fn test_other_stations_and_out_of_window_rows_are_ignored() {
    let config = FlowConfig::default();
    let records = read_records(FIXTURE, "fixture", &config).unwrap();

    assert!(records.iter().all(|r| r.station_id != "R001"));

    // The Dec 2018 and Jan 2021 rows would dominate the scale if counted.
    let chart = build_chart(&records, &config).unwrap();
    assert_eq!(chart.scale.max_total, 1000);
}

#[test]
fn test_absent_month_is_zero_at_min_thickness() {
    let chart = run(&fixture_path(), &FlowConfig::default()).unwrap();

    let feb = chart.outbound.at_step(2).unwrap();
    assert_eq!((feb.total, feb.subcategory_amount, feb.complement_amount), (0, 0, 0));
    assert!(!feb.is_observed());

    let profile = chart.bands.profile(Direction::Outbound).unwrap();
    assert_eq!(profile.half_thickness[1], 0.1);
    assert_eq!(profile.cap_thickness[1], 0.0);

    assert!(chart.warnings.contains(&DataQualityWarning::MissingMonth {
        month: MonthKey::new(2019, 2).unwrap(),
        direction: Direction::Outbound,
    }));
}

#[test]
fn test_scale_is_shared_across_directions() {
    let chart = run(&fixture_path(), &FlowConfig::default()).unwrap();

    // Outbound peaks in March, inbound in April; both reach max thickness.
    assert_eq!(chart.outbound.at_step(3).unwrap().total, 1000);
    assert_eq!(chart.inbound.at_step(4).unwrap().total, 1000);
    assert_eq!(chart.scale.max_total, 1000);
    assert_eq!(chart.scale.min_total, 0);

    let out = chart.bands.profile(Direction::Outbound).unwrap();
    let inb = chart.bands.profile(Direction::Inbound).unwrap();
    assert_relative_eq!(out.half_thickness[2], 2.0);
    assert_relative_eq!(inb.half_thickness[3], 2.0);

    // Jan: outbound 500 is half of the 1000 peak, inbound 400 is 0.4.
    assert_relative_eq!(out.half_thickness[0], 0.1 + 1.9 * 0.5);
    assert_relative_eq!(inb.half_thickness[0], 0.1 + 1.9 * 0.4);
}

#[test]
fn test_twice_the_ridership_draws_twice_as_thick() {
    let chart = run(&fixture_path(), &FlowConfig::default()).unwrap();
    let out = chart.bands.profile(Direction::Outbound).unwrap();

    // 1000 in March vs 500 in January: the width above the floor doubles.
    let floor = FlowConfig::default().thickness.min_thickness;
    assert_relative_eq!(
        out.half_thickness[2] - floor,
        2.0 * (out.half_thickness[0] - floor)
    );
}

#[test]
fn test_split_is_complete_for_every_month() {
    let chart = run(&fixture_path(), &FlowConfig::default()).unwrap();
    for direction in Direction::ALL {
        for m in chart.series(direction).entries() {
            assert_eq!(m.subcategory_amount + m.complement_amount, m.total);
        }
    }
}

#[test]
fn test_bands_are_drawn_total_first() {
    let chart = run(&fixture_path(), &FlowConfig::default()).unwrap();
    let layers: Vec<_> = chart.bands.bands.iter().map(|b| b.layer).collect();
    assert_eq!(
        layers,
        vec![
            BandLayer::Total,
            BandLayer::Total,
            BandLayer::Subcategory,
            BandLayer::Subcategory
        ]
    );
}

#[test]
fn test_only_nonzero_annotation_months_are_labelled() {
    let chart = run(&fixture_path(), &FlowConfig::default()).unwrap();
    let labels: Vec<_> = chart
        .labels
        .iter()
        .map(|l| (l.time_step, l.direction, l.text.as_str()))
        .collect();
    // Step 3 is the only annotated month with ridership, and only outbound.
    assert_eq!(labels, vec![(3, Direction::Outbound, "1,000")]);
}

#[test]
fn test_custom_config_file_drives_the_run() {
    let path = format!(
        "{}/ridership_flow_it_config.json",
        env::temp_dir().display()
    );
    fs::write(
        &path,
        r#"{
            "window": { "start": "2019-01", "months": 4 },
            "annotations": { "steps": [1], "offset": 0.25 },
            "timeline": { "events": [], "highlight_steps": [] }
        }"#,
    )
    .unwrap();

    let config = FlowConfig::load(&path).unwrap();
    let chart = run(&fixture_path(), &config).unwrap();

    assert_eq!(chart.outbound.len(), 4);
    assert_eq!(chart.timeline.len(), 4);
    assert!(chart.timeline.iter().all(|e| e.neutral));
    assert_eq!(chart.labels.len(), 2);

    fs::remove_file(&path).unwrap();
}

#[test]
fn test_bad_count_is_fatal_and_names_row_and_column() {
    let csv = "\
Remote Station ID,From Date,To Date,Full Fare,Total Ridership
R468,01/01/2019,01/07/2019,40,100
R468,01/08/2019,01/14/2019,40,n/a
";
    let err = read_records(csv.as_bytes(), "inline", &FlowConfig::default()).unwrap_err();
    match err {
        FlowError::DataFormat { row, column, value, .. } => {
            assert_eq!(row, 3);
            assert_eq!(column, "Total Ridership");
            assert_eq!(value, "n/a");
        }
        other => panic!("expected DataFormat, got {other:?}"),
    }
}

#[test]
fn test_failed_run_writes_no_output() {
    let input = format!("{}/ridership_flow_it_bad.csv", env::temp_dir().display());
    let output = format!("{}/ridership_flow_it_bad.json", env::temp_dir().display());
    let _ = fs::remove_file(&output);
    fs::write(
        &input,
        "Remote Station ID,From Date,To Date,Full Fare,Total Ridership\n\
         R469,not a date,01/07/2019,40,100\n",
    )
    .unwrap();

    let result = run(&input, &FlowConfig::default())
        .map_err(anyhow::Error::from)
        .and_then(|chart| write_chart_json(&output, &chart));

    assert!(result.is_err());
    assert!(!Path::new(&output).exists());
    assert!(!Path::new(&format!("{output}.tmp")).exists());

    fs::remove_file(&input).unwrap();
}

#[test]
fn test_missing_source_is_an_ingestion_error() {
    let err = load_records("/nonexistent/tram.csv", &FlowConfig::default()).unwrap_err();
    assert!(matches!(err, FlowError::Ingestion { .. }));
}
