use births_report::data::LoaderError;
use births_report::stats::Grouping;
use births_report::{run, MissingPopulation, PipelineConfig, PipelineError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const YEAR: i32 = 2024;

const BIRTHS: &str = "\
dobyr,sex,place_of_birth,btype
2024,1,North,Live
2024,1,North,Live
2024,2,North,Live
2024,2,South,Still birth
2024,M,South,Live
2024,F,South,Live
2024,9,South,Live
2024,F,,Live
2023,F,North,Live
2024,F,North,Miscarriage
";

const POPULATION: &str = "\
sex,age,geography,year,population
1,All ages,North,2024,1000
2,All ages,North,2024,1000
1,All ages,South,2024,1500
2,All ages,South,2024,1500
1,All ages,Unknown,2024,500
2,All ages,Unknown,2024,500
1,All ages,North,2023,999
";

fn setup(births: &str, population: &str) -> (TempDir, PipelineConfig) {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join(format!("data_{YEAR}.csv")), births).unwrap();
    fs::write(data_dir.join("pop_data.csv"), population).unwrap();

    let config = PipelineConfig {
        data_dir,
        out_dir: dir.path().join("outputs"),
        ..PipelineConfig::new(YEAR)
    };
    (dir, config)
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

fn column(rows: &[Vec<String>], name: &str) -> Vec<String> {
    let idx = rows[0].iter().position(|h| h == name).unwrap();
    rows[1..].iter().map(|r| r[idx].clone()).collect()
}

fn sum(values: &[String]) -> u64 {
    values.iter().map(|v| v.parse::<u64>().unwrap()).sum()
}

#[test]
fn writes_four_reports() {
    let (_dir, config) = setup(BIRTHS, POPULATION);
    let summary = run(&config).unwrap();

    assert_eq!(summary.outputs.len(), 4);
    for grouping in Grouping::ALL {
        let path = config.out_dir.join(format!("{}_{}.csv", YEAR, grouping.name()));
        assert!(path.exists(), "missing {}", path.display());
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    assert_eq!(summary.births.rows_read, 10);
    assert_eq!(summary.births.rows_accepted, 8);
    assert_eq!(summary.births.unrecognised_sex, 1);
    assert_eq!(summary.births.rows_rejected.get("year_mismatch"), Some(&1));
    assert_eq!(summary.births.rows_rejected.get("invalid_outcome"), Some(&1));
}

#[test]
fn report_contents_are_consistent() {
    let (_dir, config) = setup(BIRTHS, POPULATION);
    run(&config).unwrap();

    let totals = read_rows(&config.out_dir.join("2024_totals.csv"));
    assert_eq!(
        totals[0],
        vec!["live_births", "still_births", "population", "birth_rate"]
    );
    assert_eq!(column(&totals, "live_births"), vec!["7"]);
    assert_eq!(column(&totals, "still_births"), vec!["1"]);
    assert_eq!(column(&totals, "population"), vec!["6000"]);
    let rate: f64 = column(&totals, "birth_rate")[0].parse().unwrap();
    assert!((rate - 7.0 / 6000.0 * 1000.0).abs() < 1e-4);

    let by_region = read_rows(&config.out_dir.join("2024_by_region.csv"));
    assert_eq!(column(&by_region, "region"), vec!["North", "South", "Unknown"]);
    assert_eq!(sum(&column(&by_region, "live_births")), 7);
    assert_eq!(sum(&column(&by_region, "still_births")), 1);
    assert_eq!(column(&by_region, "population"), vec!["2000", "3000", "1000"]);

    // the sex code 9 birth is in totals but not in the sex breakdown
    let by_sex = read_rows(&config.out_dir.join("2024_by_sex.csv"));
    assert_eq!(column(&by_sex, "sex"), vec!["Female", "Male"]);
    assert_eq!(sum(&column(&by_sex, "live_births")), 6);

    let by_sex_region = read_rows(&config.out_dir.join("2024_by_sex_region.csv"));
    assert_eq!(
        by_sex_region[0],
        vec![
            "sex",
            "region",
            "live_births",
            "still_births",
            "population",
            "birth_rate"
        ]
    );
    assert_eq!(sum(&column(&by_sex_region, "live_births")), 6);
}

#[test]
fn rerun_is_byte_identical() {
    let (_dir, config) = setup(BIRTHS, POPULATION);
    run(&config).unwrap();
    let first: Vec<Vec<u8>> = Grouping::ALL
        .iter()
        .map(|g| fs::read(config.out_dir.join(format!("{}_{}.csv", YEAR, g.name()))).unwrap())
        .collect();

    run(&config).unwrap();
    let second: Vec<Vec<u8>> = Grouping::ALL
        .iter()
        .map(|g| fs::read(config.out_dir.join(format!("{}_{}.csv", YEAR, g.name()))).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn missing_births_file() {
    let (_dir, mut config) = setup(BIRTHS, POPULATION);
    config.year = 1999;
    let err = run(&config).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Loader(LoaderError::MissingFile(_))
    ));
}

#[test]
fn missing_required_column() {
    let births = "year,sex,birth_type\n2024,1,Live\n";
    let (_dir, config) = setup(births, POPULATION);
    match run(&config).unwrap_err() {
        PipelineError::Loader(LoaderError::SchemaError { columns, .. }) => {
            assert_eq!(columns, vec!["region"]);
        }
        other => panic!("expected schema error, got {other}"),
    }
    assert!(!config.out_dir.exists());
}

#[test]
fn missing_region_population_fails_only_region_reports() {
    let population = "\
year,geography,population
2024,North,2000
2024,South,3000
";
    let (_dir, config) = setup(BIRTHS, population);
    let err = run(&config).unwrap_err();
    match err {
        PipelineError::ReportsFailed(failures) => assert_eq!(failures.len(), 2),
        other => panic!("expected report failures, got {other}"),
    }

    assert!(config.out_dir.join("2024_totals.csv").exists());
    assert!(config.out_dir.join("2024_by_sex.csv").exists());
    assert!(!config.out_dir.join("2024_by_region.csv").exists());
    assert!(!config.out_dir.join("2024_by_sex_region.csv").exists());
}

#[test]
fn blank_population_when_allowed() {
    let population = "\
year,geography,population
2024,North,2000
2024,South,0
";
    let (_dir, mut config) = setup(BIRTHS, population);
    config.aggregate.missing_population = MissingPopulation::Blank;
    run(&config).unwrap();

    let by_region = read_rows(&config.out_dir.join("2024_by_region.csv"));
    assert_eq!(column(&by_region, "region"), vec!["North", "South", "Unknown"]);
    let rates = column(&by_region, "birth_rate");
    assert!(!rates[0].is_empty());
    assert_eq!(rates[1], "");
    assert_eq!(rates[2], "");
    assert_eq!(column(&by_region, "population"), vec!["2000", "0", ""]);
}

#[test]
fn failed_report_removes_previous_output() {
    let (_dir, config) = setup(BIRTHS, POPULATION);
    run(&config).unwrap();
    assert!(config.out_dir.join("2024_by_region.csv").exists());
    assert!(config.out_dir.join("2024_by_sex_region.csv").exists());

    let population = "\
year,geography,population
2024,North,2000
2024,South,3000
";
    fs::write(config.data_dir.join("pop_data.csv"), population).unwrap();
    assert!(matches!(run(&config), Err(PipelineError::ReportsFailed(_))));

    assert!(config.out_dir.join("2024_totals.csv").exists());
    assert!(config.out_dir.join("2024_by_sex.csv").exists());
    assert!(!config.out_dir.join("2024_by_region.csv").exists());
    assert!(!config.out_dir.join("2024_by_sex_region.csv").exists());
}
