use bakery_publish::locate::{FileLocator, FileQuery};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort();
    paths
}

#[test]
fn clean_search_includes_raw_files_but_raw_search_does_not_include_clean() {
    let dir = tempdir().unwrap();
    let clean = dir.path().join("20140101__ny__precinct.csv");
    let raw = dir.path().join("20140101__ny__precinct__raw.csv");
    fs::write(&clean, "clean").unwrap();
    fs::write(&raw, "raw").unwrap();

    let locator = FileLocator::with_results_dir(dir.path());

    let all = sorted(locator.get_filenames(&FileQuery::new("ny")));
    assert_eq!(all, sorted(vec![clean.clone(), raw.clone()]));

    let raw_only = locator.get_filenames(&FileQuery::new("ny").raw(true));
    assert_eq!(raw_only, vec![raw]);
}

#[test]
fn only_csv_and_json_for_the_jurisdiction_are_found() {
    let dir = tempdir().unwrap();
    for name in [
        "20140101__ny__precinct.csv",
        "20140101__ny__precinct.json",
        "20140101__ny__precinct.xls",
        "20140101__nyc__precinct.csv",
        "20140101__md__precinct.csv",
        "ny__precinct.csv",
    ] {
        fs::write(dir.path().join(name), "x").unwrap();
    }

    let locator = FileLocator::with_results_dir(dir.path());
    let found = sorted(locator.get_filenames(&FileQuery::new("ny")));
    assert_eq!(
        found,
        vec![
            dir.path().join("20140101__ny__precinct.csv"),
            dir.path().join("20140101__ny__precinct.json"),
        ]
    );
}

#[test]
fn six_digit_filter_is_matched_literally() {
    let dir = tempdir().unwrap();
    for name in [
        "20141104__ny__general.csv",
        "20140624__ny__primary.csv",
        "20121106__ny__general.csv",
    ] {
        fs::write(dir.path().join(name), "x").unwrap();
    }

    let locator = FileLocator::with_results_dir(dir.path());
    let found = locator.get_filenames(&FileQuery::new("ny").date_filter("201411"));
    assert!(found.is_empty(), "a 6-digit filter gets no wildcard: {found:?}");

    let found = locator.get_filenames(&FileQuery::new("ny").date_filter("20141104"));
    assert_eq!(found, vec![dir.path().join("20141104__ny__general.csv")]);

    let found = sorted(locator.get_filenames(&FileQuery::new("ny").date_filter("2014")));
    assert_eq!(
        found,
        vec![
            dir.path().join("20140624__ny__primary.csv"),
            dir.path().join("20141104__ny__general.csv"),
        ]
    );
}

#[test]
fn empty_directory_yields_no_files() {
    let dir = tempdir().unwrap();
    let locator = FileLocator::new(dir.path());
    assert!(locator.get_filenames(&FileQuery::new("ny")).is_empty());
}

#[test]
fn default_search_dir_is_bakery_under_country_dir() {
    let country = tempdir().unwrap();
    let bakery = country.path().join("bakery");
    fs::create_dir(&bakery).unwrap();
    fs::write(bakery.join("20140101__ny__precinct.csv"), "x").unwrap();
    fs::write(country.path().join("20140101__ny__stray.csv"), "x").unwrap();

    let locator = FileLocator::new(country.path());
    assert_eq!(
        locator.get_filenames(&FileQuery::new("ny")),
        vec![bakery.join("20140101__ny__precinct.csv")]
    );
}
