//! Import pipeline integration tests.
//!
//! These tests drive [`ImportService`] over in-memory CSV payloads against
//! [`MockStudentStore`], checking batch boundaries, write ordering, failure
//! handling, and the counters reported in [`ImportSummary`].

use std::num::NonZeroUsize;
use std::time::Duration;

use diemthi_core::{
    AppError, ImportConfig, ImportService, ImportStatus, ScoreRangePolicy, StudentStore, Subject,
};

use super::common::{HEADER, MockStudentStore, csv_with_rows};

fn service(store: &MockStudentStore, batch_size: usize) -> ImportService<MockStudentStore> {
    ImportService::with_config(
        store.clone(),
        ImportConfig::default().with_batch_size(batch_size),
    )
}

/// Test 1: A row without registration number is skipped, the rest imported
#[tokio::test]
async fn test_skips_row_without_id() {
    let store = MockStudentStore::new();
    let csv = "sbd,toan,ngu_van\n01000001,8.5,7\n,9,9\n";

    let summary = service(&store, 5000)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap();

    assert_eq!(summary.status, ImportStatus::Succeeded);
    assert_eq!(summary.total_records, 2);
    assert_eq!(summary.imported_count, 1);
    assert_eq!(summary.skipped_records, 1);
    assert_eq!(summary.skip_reasons.missing_id, 1);
    assert_eq!(summary.batches_committed, 1);

    let stored = store.get("01000001").unwrap();
    assert_eq!(stored.toan, Some(8.5));
    assert_eq!(stored.ngu_van, Some(7.0));
    assert_eq!(stored.gdcd, None);
}

/// Test 2: Repeated registration numbers within one batch keep the last row
#[tokio::test]
async fn test_duplicate_in_batch_last_wins() {
    let store = MockStudentStore::new();
    let csv = "sbd,toan\n01000001,5\n01000001,9\n";

    let summary = service(&store, 5000)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap();

    assert_eq!(summary.imported_count, 2);
    assert_eq!(summary.rows_affected, 1);
    assert_eq!(store.batch_sizes(), vec![1]);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("01000001").unwrap().toan, Some(9.0));
}

/// Test 3: A file larger than the batch size is written in ordered batches
#[tokio::test]
async fn test_batches_follow_batch_size() {
    let store = MockStudentStore::new();
    let csv = csv_with_rows(12_000);

    let summary = service(&store, 5000)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap();

    assert_eq!(store.batch_sizes(), vec![5000, 5000, 2000]);
    assert_eq!(summary.total_records, 12_000);
    assert_eq!(summary.imported_count, 12_000);
    assert_eq!(summary.skipped_records, 0);
    assert_eq!(summary.batches_committed, 3);
    assert_eq!(summary.rows_affected, 12_000);
    assert_eq!(store.len(), 12_000);
}

/// Test 4: Batches preserve file order across batch boundaries
#[tokio::test]
async fn test_batches_preserve_file_order() {
    let store = MockStudentStore::new();
    let csv = csv_with_rows(7);

    service(&store, 3)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap();

    let batches = store.batches.lock().unwrap().clone();
    let flattened: Vec<String> = batches.into_iter().flatten().collect();
    let expected: Vec<String> = (1..=7).map(|i| format!("{:08}", i)).collect();
    assert_eq!(flattened, expected);
    assert_eq!(store.batch_sizes(), vec![3, 3, 1]);
}

/// Test 5: A failing batch aborts the import and keeps earlier batches
#[tokio::test]
async fn test_failed_batch_aborts_import() {
    let store = MockStudentStore::failing_on(2);
    let csv = csv_with_rows(12_000);

    let err = service(&store, 5000)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap_err();

    match err {
        AppError::ImportAborted {
            committed_records,
            summary,
            source,
        } => {
            assert_eq!(committed_records, 5000);
            assert_eq!(summary.status, ImportStatus::Failed);
            assert_eq!(summary.imported_count, 5000);
            assert_eq!(summary.failed_records, 5000);
            assert_eq!(summary.batches_committed, 1);
            assert!(matches!(*source, AppError::DatabaseError(_)));
        }
        other => panic!("expected ImportAborted, got {other:?}"),
    }

    // The third batch is never attempted.
    assert_eq!(store.batch_sizes(), vec![5000, 5000]);
    assert_eq!(store.len(), 5000);
    assert!(store.get("00000001").is_some());
    assert!(store.get("00005001").is_none());
}

/// Test 6: Re-importing the same file leaves the store unchanged
#[tokio::test]
async fn test_reimport_is_idempotent() {
    let store = MockStudentStore::new();
    let csv = csv_with_rows(250);
    let service = service(&store, 100);

    service.import_bytes(Some(csv.as_bytes())).await.unwrap();
    let first = store.snapshot();

    let summary = service.import_bytes(Some(csv.as_bytes())).await.unwrap();
    assert_eq!(summary.imported_count, 250);
    assert_eq!(store.snapshot(), first);
}

/// Test 7: A later batch overwrites a row written by an earlier batch
#[tokio::test]
async fn test_later_batch_wins() {
    let store = MockStudentStore::new();
    let csv = "sbd,toan,ma_ngoai_ngu\n01000001,4,N1\n01000002,5,N1\n01000001,9.75,\n";

    service(&store, 2)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap();

    let stored = store.get("01000001").unwrap();
    assert_eq!(stored.toan, Some(9.75));
    assert_eq!(stored.ma_ngoai_ngu, None);
    assert_eq!(store.batch_sizes(), vec![2, 1]);
}

/// Test 8: Missing payload is rejected before any write
#[tokio::test]
async fn test_no_file() {
    let store = MockStudentStore::new();

    let err = service(&store, 5000).import_bytes(None).await.unwrap_err();

    assert!(matches!(err, AppError::NoFile));
    assert!(store.batch_sizes().is_empty());
}

/// Test 9: Header-only and blank files are empty
#[tokio::test]
async fn test_empty_files() {
    let store = MockStudentStore::new();
    let service = service(&store, 5000);

    for payload in [HEADER.to_string(), format!("{HEADER}\n"), "  \n\n".to_string(), String::new()] {
        let err = service.import_bytes(Some(payload.as_bytes())).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyFile), "payload {payload:?} gave {err:?}");
    }
    assert!(store.batch_sizes().is_empty());
}

/// Test 10: A header without any id column is rejected
#[tokio::test]
async fn test_missing_id_column() {
    let store = MockStudentStore::new();
    let csv = "ma,toan\n01000001,8\n";

    let err = service(&store, 5000)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::MissingIdColumn(_)));
    assert!(err.is_input_error());
    assert!(store.batch_sizes().is_empty());
}

/// Test 11: Invalid UTF-8 is rejected as an input error
#[tokio::test]
async fn test_invalid_encoding() {
    let store = MockStudentStore::new();
    let mut payload = b"sbd,toan\n01000001,".to_vec();
    payload.push(0xFF);

    let err = service(&store, 5000)
        .import_bytes(Some(&payload))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidEncoding(18)));
    assert!(store.batch_sizes().is_empty());
}

/// Test 12: Byte-order mark and quoted header names are tolerated
#[tokio::test]
async fn test_bom_and_quoted_headers() {
    let store = MockStudentStore::new();
    let csv = "\u{FEFF}\"SBD\",\"Toan\",vat_ly\n01000001,6.5,7.25\n";

    let summary = service(&store, 5000)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap();

    assert_eq!(summary.imported_count, 1);
    let stored = store.get("01000001").unwrap();
    assert_eq!(stored.toan, Some(6.5));
    assert_eq!(stored.vat_li, Some(7.25));
}

/// Test 13: Reject policy tallies out-of-range rows instead of writing them
#[tokio::test]
async fn test_reject_policy_skips_out_of_range() {
    let store = MockStudentStore::new();
    let csv = "sbd,toan\n01000001,11\n01000002,-1\n01000003,10\n";
    let service = ImportService::with_config(
        store.clone(),
        ImportConfig::default().with_score_policy(ScoreRangePolicy::Reject),
    );

    let summary = service.import_bytes(Some(csv.as_bytes())).await.unwrap();

    assert_eq!(summary.imported_count, 1);
    assert_eq!(summary.skip_reasons.score_out_of_range, 2);
    assert!(store.get("01000001").is_none());
    assert_eq!(store.get("01000003").unwrap().toan, Some(10.0));
}

/// Test 14: A store that never answers aborts the import with a timeout
#[tokio::test(start_paused = true)]
async fn test_store_timeout() {
    let store = MockStudentStore::slow(Duration::from_secs(60));
    let service = ImportService::with_config(
        store.clone(),
        ImportConfig::default().with_batch_timeout(Duration::from_secs(1)),
    );

    let err = service
        .import_bytes(Some(csv_with_rows(3).as_bytes()))
        .await
        .unwrap_err();

    match err {
        AppError::ImportAborted {
            committed_records,
            source,
            ..
        } => {
            assert_eq!(committed_records, 0);
            assert!(matches!(*source, AppError::StoreTimeout(1)));
        }
        other => panic!("expected ImportAborted, got {other:?}"),
    }
    assert_eq!(store.len(), 0);
}

/// Test 15: Imported rows are visible through the read queries
#[tokio::test]
async fn test_reads_after_import() {
    let store = MockStudentStore::new();
    let csv = "sbd,toan,vat_li,hoa_hoc\n01,9,9,9\n02,8,8,\n03,10,9,8\n04,3.5,5,6\n";

    service(&store, 2)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap();

    let top = store.top_by_group(diemthi_core::Group::A, 10).await.unwrap();
    let order: Vec<&str> = top.iter().map(|r| r.student.sbd.as_str()).collect();
    assert_eq!(order, vec!["01", "03", "04"]);
    assert_eq!(top[0].total, 27.0);

    let counts = store.count_by_level(Subject::Toan).await.unwrap();
    assert_eq!(counts.excellent, 3);
    assert_eq!(counts.weak, 1);
    assert_eq!(counts.total(), 4);
}

/// Test 16: A config built as a struct literal with the smallest batch size
/// writes one record per batch
#[tokio::test]
async fn test_struct_literal_config_smallest_batch() {
    let store = MockStudentStore::new();
    let config = ImportConfig {
        batch_size: NonZeroUsize::MIN,
        ..ImportConfig::default()
    };
    let csv = "sbd,toan\n01,5\n02,6\n03,7\n";

    let summary = ImportService::with_config(store.clone(), config)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap();

    assert_eq!(store.batch_sizes(), vec![1, 1, 1]);
    assert_eq!(summary.batches_committed, 3);
    assert_eq!(summary.imported_count, 3);
}

/// Test 17: A zero batch size from a builder is raised to one instead of
/// stalling the import
#[tokio::test]
async fn test_zero_batch_size_is_raised_to_one() {
    let store = MockStudentStore::new();
    let csv = "sbd,toan\n01,5\n02,6\n";

    let summary = service(&store, 0)
        .import_bytes(Some(csv.as_bytes()))
        .await
        .unwrap();

    assert_eq!(store.batch_sizes(), vec![1, 1]);
    assert_eq!(summary.imported_count, 2);
}
