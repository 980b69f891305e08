use std::fs::File;
use std::io::Write;

use rstest::rstest;
use sag_config::{AnchorRow, Anchors, load_anchors_csv, load_toml};
use tempfile::tempdir;

#[rstest]
fn anchors_from_rows_in_any_order() {
    let rows = [
        AnchorRow {
            raw: 1256,
            length: 100.0,
        },
        AnchorRow {
            raw: 815,
            length: 0.0,
        },
    ];
    let a = Anchors::from_rows(&rows).unwrap();
    assert_eq!(a.raw_at_zero, 815);
    assert_eq!(a.raw_at_hundred, 1256);
}

#[rstest]
fn anchors_reject_equal_raw() {
    let rows = [
        AnchorRow {
            raw: 900,
            length: 0.0,
        },
        AnchorRow {
            raw: 900,
            length: 100.0,
        },
    ];
    let err = Anchors::from_rows(&rows).expect_err("equal raw must fail");
    assert!(format!("{err}").contains("anchors must differ"));
}

#[rstest]
#[case(vec![(815, 0.0)], "exactly two rows")]
#[case(vec![(815, 0.0), (900, 50.0), (1256, 100.0)], "exactly two rows")]
#[case(vec![(815, 10.0), (1256, 100.0)], "no row with length 0")]
#[case(vec![(815, 0.0), (1256, 90.0)], "no row with length 100")]
fn anchors_reject_bad_row_sets(#[case] rows: Vec<(u16, f32)>, #[case] needle: &str) {
    let rows: Vec<AnchorRow> = rows
        .into_iter()
        .map(|(raw, length)| AnchorRow { raw, length })
        .collect();
    let err = Anchors::from_rows(&rows).expect_err("should fail");
    assert!(format!("{err}").contains(needle), "got: {err}");
}

#[rstest]
fn load_csv_happy_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("anchors.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw,length").unwrap();
    writeln!(f, "815,0").unwrap();
    writeln!(f, "1256,100").unwrap();
    drop(f);

    let a = load_anchors_csv(&path).unwrap();
    assert_eq!(
        a,
        Anchors {
            raw_at_zero: 815,
            raw_at_hundred: 1256
        }
    );
    // CSV anchors go through the same range check as TOML ones.
    let cfg = load_toml("").unwrap();
    cfg.validate_anchors(&a).unwrap();
}

#[rstest]
fn load_csv_rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("anchors.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw,mm").unwrap();
    writeln!(f, "815,0").unwrap();
    writeln!(f, "1256,100").unwrap();
    drop(f);

    let err = load_anchors_csv(&path).expect_err("bad headers");
    assert!(format!("{err}").contains("must have headers 'raw,length'"));
}

#[rstest]
fn load_csv_reports_bad_row_number() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("anchors.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw,length").unwrap();
    writeln!(f, "815,0").unwrap();
    writeln!(f, "lots,100").unwrap();
    drop(f);

    let err = load_anchors_csv(&path).expect_err("bad row");
    assert!(format!("{err}").contains("invalid CSV row 3"));
}

#[rstest]
fn load_csv_missing_file() {
    let dir = tempdir().unwrap();
    let err = load_anchors_csv(&dir.path().join("nope.csv")).expect_err("missing file");
    assert!(format!("{err}").contains("open calibration CSV"));
}
