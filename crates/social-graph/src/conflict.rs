//! Normalization of constraint failures raised while executing traversals
//!
//! An embedded engine raises a `fail` step synchronously as
//! [`ExecutionFailure::FailStep`]; a remote service completes the request
//! with status [`SERVER_ERROR_FAIL_STEP`] and a JSON body whose `message`
//! attribute carries the same text. Both become [`StoreError::Conflict`].

use serde::Deserialize;
use tracing::error;

use crate::data::{ExecutionFailure, StoreError, SERVER_ERROR_FAIL_STEP};

#[derive(Debug, Deserialize)]
struct FailStepPayload {
    message: String,
}

/// Maps a raw execution failure to the error an adapter reports.
///
/// Anything that is not recognizably a fail-step failure is returned
/// unchanged as [`StoreError::Execution`].
pub fn translate(failure: ExecutionFailure) -> StoreError {
    match failure {
        ExecutionFailure::FailStep { message } => {
            error!(%message, "A constraint error occurred while executing the traversal");
            StoreError::Conflict(message)
        }
        ExecutionFailure::Completion(ref response) if response.status_code == SERVER_ERROR_FAIL_STEP => {
            match serde_json::from_str::<FailStepPayload>(&response.message) {
                Ok(payload) => {
                    error!(message = %payload.message, "A constraint error occurred while executing the traversal");
                    StoreError::Conflict(payload.message)
                }
                Err(parse_error) => {
                    error!(error = %parse_error, "Failed to parse fail step response message");
                    error!(error = %failure, "Graph traversal failed");
                    StoreError::Execution(failure)
                }
            }
        }
        other => {
            error!(error = %other, "Graph traversal failed");
            StoreError::Execution(other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ResponseError;

    fn completion(status_code: u16, body: &str) -> ExecutionFailure {
        ExecutionFailure::Completion(ResponseError {
            status_code,
            message: body.to_string(),
        })
    }

    #[test]
    fn test_fail_step_becomes_conflict() {
        let error = translate(ExecutionFailure::FailStep {
            message: "User already exists by username: @ann".into(),
        });
        match error {
            StoreError::Conflict(message) => assert_eq!(message, "User already exists by username: @ann"),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_json_completion_becomes_conflict_with_extracted_message() {
        let body = r#"{"code":"ConstraintViolationException","requestId":"42","message":"User already exists by username: @ann"}"#;
        match translate(completion(SERVER_ERROR_FAIL_STEP, body)) {
            StoreError::Conflict(message) => assert_eq!(message, "User already exists by username: @ann"),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_completion_is_reraised_unchanged() {
        let failure = completion(SERVER_ERROR_FAIL_STEP, "fail step reached");
        match translate(failure.clone()) {
            StoreError::Execution(inner) => assert_eq!(inner, failure),
            other => panic!("Expected Execution, got {:?}", other),
        }

        let missing_message = completion(SERVER_ERROR_FAIL_STEP, r#"{"code":"X"}"#);
        assert!(matches!(translate(missing_message), StoreError::Execution(_)));
    }

    #[test]
    fn test_other_failures_are_not_translated() {
        let timeout = completion(598, r#"{"message":"Timed out"}"#);
        assert!(matches!(translate(timeout), StoreError::Execution(ExecutionFailure::Completion(_))));

        let engine = ExecutionFailure::Engine("Invalid regex".into());
        assert!(matches!(translate(engine), StoreError::Execution(ExecutionFailure::Engine(_))));
    }
}
