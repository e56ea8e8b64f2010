//! Build a snapshot from the mock sheet, then compute allocations from it

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use wiremock::MockServer;

use crate::common::{self, approx, logging::{init_test_logging, log_test_step}};
use sheet_invest::api::SheetsClient;
use sheet_invest::calculator::Calculator;
use sheet_invest::snapshot::{SnapshotBuilder, SnapshotTable};
use sheet_invest::SheetError;

#[tokio::test]
async fn test_snapshot_then_calculate() {
    init_test_logging();
    log_test_step("Building snapshot from mock sheet");

    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let snapshot_path = dir.path().join("snapshot.csv");
    let config = common::test_config(&server, &snapshot_path);
    common::mount_tracking_sheet(&server).await;

    let builder = SnapshotBuilder::new(SheetsClient::from_config(&config).unwrap());
    let table = builder
        .build_and_save(&common::tracking_columns(), &config.sheet_tab, &config.snapshot_path)
        .await
        .unwrap();

    assert_eq!(
        table.headers(),
        &["Date", "Id", "Name", "Potential_Inv", "AcumEarned", "AvgRcrds", "Playing"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()[..]
    );
    assert_eq!(table.len(), 2);
    assert_eq!(SnapshotTable::load(&snapshot_path).unwrap(), table);

    log_test_step("Computing allocation for 02/01/2024");
    let calculator = Calculator::new(&config);
    let allocation = calculator.compute(Some("02/01/2024")).unwrap();

    assert_eq!(allocation.great_total, 150.0);
    assert!(approx(allocation.to_play, 90.0));
    assert!(approx(allocation.to_buy, 70.0));
}

#[tokio::test]
async fn test_short_column_leaves_blank_field() {
    init_test_logging();

    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let config = common::test_config(&server, &dir.path().join("snapshot.csv"));
    common::mount_tracking_sheet(&server).await;

    let builder = SnapshotBuilder::new(SheetsClient::from_config(&config).unwrap());
    builder
        .build_and_save(&common::tracking_columns(), "dt", &config.snapshot_path)
        .await
        .unwrap();

    // Playing has no value for 02/02/2024
    let err = Calculator::new(&config).compute(Some("2/2/2024")).unwrap_err();
    assert_matches!(err, SheetError::MissingField { ref field, ref date } if field == "Playing" && date == "02/02/2024");
}

#[tokio::test]
async fn test_failed_build_keeps_previous_snapshot() {
    init_test_logging();
    log_test_step("Build with a blank column must not touch the saved snapshot");

    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let config = common::test_config(&server, &dir.path().join("snapshot.csv"));
    common::mount_tracking_sheet(&server).await;
    common::mount_empty(&server, "dt!H:H").await;

    let builder = SnapshotBuilder::new(SheetsClient::from_config(&config).unwrap());
    let saved = builder
        .build_and_save(&common::tracking_columns(), "dt", &config.snapshot_path)
        .await
        .unwrap();

    let mut columns = common::tracking_columns();
    columns.push("H".to_string());
    let err = builder
        .build_and_save(&columns, "dt", &config.snapshot_path)
        .await
        .unwrap_err();

    assert!(err.is_no_data());
    assert_eq!(SnapshotTable::load(&config.snapshot_path).unwrap(), saved);
}

#[tokio::test]
async fn test_calculate_without_snapshot() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let config = common::test_config(&server, &dir.path().join("never-built.csv"));

    let err = Calculator::new(&config).compute(None).unwrap_err();
    assert_matches!(err, SheetError::SnapshotNotFound(_));
}

#[tokio::test]
async fn test_calculate_missing_date_row() {
    init_test_logging();

    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let config = common::test_config(&server, &dir.path().join("snapshot.csv"));
    common::mount_tracking_sheet(&server).await;

    let builder = SnapshotBuilder::new(SheetsClient::from_config(&config).unwrap());
    builder
        .build_and_save(&common::tracking_columns(), "dt", &config.snapshot_path)
        .await
        .unwrap();

    let err = Calculator::new(&config).compute(Some("12/31/1999")).unwrap_err();
    assert_matches!(err, SheetError::MissingRow { ref date } if date == "12/31/1999");
}
