//! Allocation formulas and calculator over hand-written snapshot files

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use crate::common::approx;
use sheet_invest::calculator::{
    calculate_great_total, calculate_to_buy, calculate_to_play, parse_currency, parse_percentage, Calculator,
};
use sheet_invest::utils::today_key;
use sheet_invest::SheetError;

const SNAPSHOT: &str = "\
Date,Id,Name,Potential_Inv,AcumEarned,AvgRcrds,Playing
02/01/2024,1,main,$100,$50,80%,$20
02/02/2024,2,main,\"$1,000.00\",$250.50,50%,$300
02/03/2024,3,main,$0,$0,0%,$0
";

#[test]
fn test_formula_identities() {
    for &(p, a) in &[(0.0_f32, 0.0_f32), (100.0, 50.0), (1234.5, -34.5), (-10.0, -5.0)] {
        assert_eq!(calculate_great_total(p, a), p + a);
    }

    for &g in &[0.0_f32, 150.0, 1250.5] {
        assert_eq!(calculate_to_play(g, 0.0), g);
        assert_eq!(calculate_to_play(g, 1.0), 0.5 * g);
    }

    assert_eq!(calculate_to_buy(90.0, 20.0), 70.0);
}

#[test]
fn test_sheet_text_parsing() {
    assert!(approx(parse_currency("Potential_Inv", "$1,234.56").unwrap(), 1234.56));
    assert_eq!(parse_currency("Playing", "$0").unwrap(), 0.0);
    assert!(approx(parse_percentage("AvgRcrds", "73%").unwrap(), 0.73));
}

#[test]
fn test_calculator_reads_snapshot_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.csv");
    std::fs::write(&path, SNAPSHOT).unwrap();

    let calculator = Calculator::with_path(&path);

    let first = calculator.compute(Some("02/01/2024")).unwrap();
    assert!(approx(first.to_buy, 70.0));

    // 1250.5 * 0.5 + 1250.5 * 0.5 * 0.5 - 300
    let second = calculator.compute(Some("02/02/2024")).unwrap();
    assert!(approx(second.great_total, 1250.5));
    assert!(approx(second.to_play, 937.875));
    assert!(approx(second.to_buy, 637.875));

    let zero = calculator.compute(Some("2/3/2024")).unwrap();
    assert_eq!(zero.date, "02/03/2024");
    assert_eq!(zero.to_buy, 0.0);
}

#[test]
fn test_calculator_defaults_to_today() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.csv");
    let today = today_key();
    std::fs::write(
        &path,
        format!("Date,Potential_Inv,AcumEarned,AvgRcrds,Playing\n{},$10,$10,100%,$5\n", today),
    )
    .unwrap();

    let allocation = Calculator::with_path(&path).compute(None).unwrap();
    assert_eq!(allocation.date, today);
    assert!(approx(allocation.to_buy, 5.0));
}

#[test]
fn test_calculator_reports_bad_numbers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.csv");
    std::fs::write(
        &path,
        "Date,Potential_Inv,AcumEarned,AvgRcrds,Playing\n02/01/2024,$10,#REF!,80%,$5\n",
    )
    .unwrap();

    let err = Calculator::with_path(&path).compute(Some("02/01/2024")).unwrap_err();
    assert_matches!(err, SheetError::InvalidNumber { ref field, ref value } if field == "AcumEarned" && value == "#REF!");
}
