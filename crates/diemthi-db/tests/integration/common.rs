//! Test utilities for integration tests.
//!
//! Provides helper functions to set up isolated PostgreSQL containers
//! with the `students` schema for each test.

use diemthi_core::{StudentRecord, Subject};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

/// Schema DDL shared with deployments.
const MIGRATION: &str = include_str!("../../../../migrations/202601010001_create_students.sql");

/// Sets up a PostgreSQL container and returns a connection pool.
///
/// Each call creates a fresh, isolated database container. The container is
/// automatically cleaned up when the returned `ContainerAsync` is dropped.
///
/// # Returns
///
/// A tuple of (PgPool, ContainerAsync) - keep the container alive for the test duration.
pub async fn setup_test_db() -> (PgPool, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("postgres", "16-alpine")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "postgres")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let connection_string = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

    // The server restarts once after initdb, so the first attempts may fail.
    const MAX_RETRIES: u32 = 30;
    let mut retries = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    panic!(
                        "Failed to connect to database after {} retries: {}",
                        MAX_RETRIES, e
                    );
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    };

    // Each statement separately; prepared statements cannot hold several.
    for statement in MIGRATION.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Failed to run migration");
    }

    (pool, container)
}

/// A candidate with the group A subjects set.
pub fn sample_student(sbd: &str, toan: f64, vat_li: f64, hoa_hoc: f64) -> StudentRecord {
    StudentRecord::new(sbd)
        .with_score(Subject::Toan, toan)
        .with_score(Subject::VatLi, vat_li)
        .with_score(Subject::HoaHoc, hoa_hoc)
}

/// `n` candidates `00000001..=n` with every score set.
pub fn sample_students(n: usize) -> Vec<StudentRecord> {
    (1..=n)
        .map(|i| {
            let mut student = StudentRecord::new(format!("{:08}", i)).with_language("N1");
            for subject in Subject::ALL {
                student.set_score(subject, Some((i % 11) as f64 * 0.9));
            }
            student
        })
        .collect()
}
