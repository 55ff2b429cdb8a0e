//! Tests for `error` module

use super::error::*;

#[test]
fn test_error_codes_are_unique() {
    let errors: Vec<Error> = vec![
        Error::InvalidInput("test".into()),
        Error::Database(sqlx::Error::PoolTimedOut),
        Error::batch(3, Error::Storage("copy".into())),
        Error::Config("test".into()),
        Error::Serialization(serde_json::from_str::<serde_json::Value>("{").unwrap_err()),
        Error::Io(std::io::Error::other("test")),
        Error::Storage("test".into()),
    ];

    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");

    for code in &codes {
        assert!(code.starts_with("LOGB-"), "Code {code} should start with LOGB-");
    }
}

#[test]
fn test_only_invalid_input_is_client_error() {
    assert!(Error::InvalidInput("bad enum".into()).is_client_error());
    assert!(!Error::Database(sqlx::Error::PoolTimedOut).is_client_error());
    assert!(!Error::Config("x".into()).is_client_error());
}

#[test]
fn test_batch_failure_names_batch_and_cause() {
    let err = Error::batch(7, Error::Storage("connection reset".into()));
    let msg = err.to_string();

    assert!(msg.contains("LOGB-003"));
    assert!(msg.contains("Batch 7"));
    assert!(msg.contains("connection reset"));
    assert!(std::error::Error::source(&err).is_some());
}
