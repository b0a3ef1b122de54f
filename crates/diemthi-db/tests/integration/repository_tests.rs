//! Integration tests for StudentRepository.
//!
//! These tests verify the repository layer against a real PostgreSQL
//! database. Each test runs in an isolated container.

use diemthi_core::traits::StudentStore;
use diemthi_core::{AppError, Group, ImportConfig, ImportService, StudentRecord, Subject};
use diemthi_db::{MAX_BATCH_ROWS, StudentRepository};

use crate::integration::common::{sample_student, sample_students, setup_test_db};

/// Test 1: Verify a batch of new candidates is inserted
#[tokio::test]
async fn test_upsert_inserts_new_rows() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool);

    let students = vec![
        sample_student("01000001", 8.0, 7.5, 9.0).with_language("N1"),
        sample_student("01000002", 5.0, 6.0, 4.25),
    ];
    let affected = repo
        .upsert_batch(&students)
        .await
        .expect("upsert should succeed");
    assert_eq!(affected, 2);

    let retrieved = repo
        .get_by_sbd("01000001")
        .await
        .expect("get should succeed")
        .expect("student should exist");
    assert_eq!(retrieved, students[0]);
}

/// Test 2: Verify ON CONFLICT replaces every column, including with NULL
#[tokio::test]
async fn test_upsert_replaces_whole_row() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool);

    let original = sample_student("01000001", 8.0, 7.5, 9.0).with_language("N1");
    repo.upsert_batch(std::slice::from_ref(&original))
        .await
        .expect("first upsert should succeed");

    let replacement = StudentRecord::new("01000001").with_score(Subject::NguVan, 6.75);
    let affected = repo
        .upsert_batch(std::slice::from_ref(&replacement))
        .await
        .expect("second upsert should succeed");
    assert_eq!(affected, 1);

    let retrieved = repo.get_by_sbd("01000001").await.unwrap().unwrap();
    assert_eq!(retrieved, replacement, "no column should survive from the first write");
}

/// Test 3: Verify writing the same batch twice leaves the same state
#[tokio::test]
async fn test_upsert_is_idempotent() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool.clone());
    let students = sample_students(50);

    repo.upsert_batch(&students).await.unwrap();
    repo.upsert_batch(&students).await.unwrap();

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 50);
    assert_eq!(repo.get_by_sbd("00000007").await.unwrap().as_ref(), Some(&students[6]));
}

/// Test 4: Verify a duplicate sbd inside one statement fails atomically
#[tokio::test]
async fn test_upsert_duplicate_in_statement_fails_atomically() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool);

    let students = vec![
        sample_student("01000001", 1.0, 1.0, 1.0),
        sample_student("01000002", 2.0, 2.0, 2.0),
        sample_student("01000001", 3.0, 3.0, 3.0),
    ];
    let err = repo.upsert_batch(&students).await.unwrap_err();

    assert!(matches!(err, AppError::DatabaseError(_)));
    assert!(repo.get_by_sbd("01000002").await.unwrap().is_none());
}

/// Test 5: Verify the largest batch fits and a larger one is rejected unsent
#[tokio::test]
async fn test_batch_size_limit() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool);

    let students = sample_students(MAX_BATCH_ROWS + 1);
    let err = repo.upsert_batch(&students).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::BatchTooLarge { rows, max } if rows == MAX_BATCH_ROWS + 1 && max == MAX_BATCH_ROWS
    ));
    assert!(repo.get_by_sbd("00000001").await.unwrap().is_none());

    let affected = repo
        .upsert_batch(&students[..MAX_BATCH_ROWS])
        .await
        .expect("a full batch should fit in one statement");
    assert_eq!(affected, MAX_BATCH_ROWS as u64);
}

/// Test 6: Verify empty batches are refused
#[tokio::test]
async fn test_upsert_empty_batch() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool);

    assert!(matches!(repo.upsert_batch(&[]).await, Err(AppError::EmptyBatch)));
}

/// Test 7: Verify get_by_sbd returns None for unknown candidates
#[tokio::test]
async fn test_get_missing_student() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool);

    assert!(repo.get_by_sbd("99999999").await.unwrap().is_none());
}

/// Test 8: Verify group ranking order, tie-break, exclusion and limit
#[tokio::test]
async fn test_top_by_group() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool);

    let mut students = vec![
        sample_student("03", 9.0, 9.0, 9.0),
        sample_student("01", 9.0, 9.0, 9.0),
        sample_student("02", 10.0, 10.0, 10.0),
        sample_student("04", 5.0, 5.0, 5.0),
        StudentRecord::new("05")
            .with_score(Subject::Toan, 10.0)
            .with_score(Subject::VatLi, 10.0),
    ];
    for i in 0..12 {
        students.push(sample_student(&format!("1{:02}", i), 1.0, 1.0, 1.0));
    }
    repo.upsert_batch(&students).await.unwrap();

    let top = repo.top_by_group(Group::A, 10).await.unwrap();
    assert_eq!(top.len(), 10);
    let order: Vec<&str> = top.iter().take(4).map(|r| r.student.sbd.as_str()).collect();
    assert_eq!(order, vec!["02", "01", "03", "04"]);
    assert_eq!(top[0].total, 30.0);
    assert!(top.iter().all(|r| r.student.sbd != "05"));
}

/// Test 9: Verify level boundaries and that nulls are not counted
#[tokio::test]
async fn test_count_by_level() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool);

    let scores = [10.0, 8.0, 7.99, 6.0, 5.5, 4.0, 3.99, 0.0];
    let mut students: Vec<StudentRecord> = scores
        .iter()
        .enumerate()
        .map(|(i, s)| StudentRecord::new(format!("{:02}", i)).with_score(Subject::Gdcd, *s))
        .collect();
    students.push(StudentRecord::new("99"));
    repo.upsert_batch(&students).await.unwrap();

    let counts = repo.count_by_level(Subject::Gdcd).await.unwrap();
    assert_eq!(counts.excellent, 2);
    assert_eq!(counts.good, 2);
    assert_eq!(counts.average, 2);
    assert_eq!(counts.weak, 2);
    assert_eq!(counts.total(), 8);
}

/// Test 10: Verify health check against a live database
#[tokio::test]
async fn test_health_check() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool);

    repo.health_check().await.expect("database should be reachable");
}

/// Test 11: Verify a full CSV import through the repository
#[tokio::test]
async fn test_import_service_end_to_end() {
    let (pool, _container) = setup_test_db().await;
    let repo = StudentRepository::new(pool);
    let service = ImportService::with_config(repo.clone(), ImportConfig::default().with_batch_size(2));

    let csv = "sbd,toan,vat_li,hoa_hoc,ma_ngoai_ngu\n\
               01,9,9,9,N1\n\
               ,5,5,5,\n\
               02,8,8,8,\n\
               01,7,7,7,N2\n";
    let summary = service.import_bytes(Some(csv.as_bytes())).await.unwrap();

    assert_eq!(summary.total_records, 4);
    assert_eq!(summary.imported_count, 3);
    assert_eq!(summary.skipped_records, 1);
    assert_eq!(summary.batches_committed, 2);

    let stored = StudentStore::get_by_sbd(&repo, "01").await.unwrap().unwrap();
    assert_eq!(stored.toan, Some(7.0));
    assert_eq!(stored.ma_ngoai_ngu.as_deref(), Some("N2"));
}
