use parking_core::ServiceError;
use parking_kv::KVError;
use thiserror::Error;
use tracing::error;

/// Failures of slot registry operations.
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("slot capacity reached (max {max})")]
    CapacityExceeded { max: usize },

    #[error("no slots available")]
    NoSlotAvailable,

    #[error("slot '{0}' not found")]
    SlotNotFound(String),

    /// The slot exists but is AVAILABLE, so there is nothing to bill or release.
    #[error("slot '{0}' is not occupied")]
    SlotNotOccupied(String),

    #[error("{0}")]
    InvalidSlot(String),

    /// Concurrent writers kept replacing the record between read and write.
    #[error("slot '{0}' is being modified concurrently")]
    Contended(String),

    /// A stored record breaks the occupancy invariant.
    #[error("slot '{0}' is in an inconsistent state")]
    Corrupt(String),

    #[error("pin hashing failed: {0}")]
    PinHash(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] KVError),
}

impl From<SlotError> for ServiceError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::CapacityExceeded { .. } | SlotError::InvalidSlot(_) => {
                ServiceError::Validation(err.to_string())
            }
            SlotError::NoSlotAvailable
            | SlotError::SlotNotFound(_)
            | SlotError::SlotNotOccupied(_) => ServiceError::NotFound(err.to_string()),
            SlotError::Contended(_) => ServiceError::Conflict(err.to_string()),
            // Infrastructure detail goes to the log, not to the caller.
            SlotError::Persistence(_) => {
                error!(error = %err, "slot storage failure");
                ServiceError::Storage("storage failure".into())
            }
            SlotError::Corrupt(_) | SlotError::PinHash(_) => {
                error!(error = %err, "slot registry internal error");
                ServiceError::Internal("internal error".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn business_errors_are_client_errors() {
        let cases = [
            (SlotError::CapacityExceeded { max: 10 }, StatusCode::BAD_REQUEST),
            (SlotError::InvalidSlot("bad".into()), StatusCode::BAD_REQUEST),
            (SlotError::NoSlotAvailable, StatusCode::NOT_FOUND),
            (SlotError::SlotNotFound("x".into()), StatusCode::NOT_FOUND),
            (SlotError::SlotNotOccupied("x".into()), StatusCode::NOT_FOUND),
            (SlotError::Contended("x".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ServiceError::from(err).status_code(), status);
        }
    }

    #[test]
    fn storage_errors_do_not_leak_detail() {
        let err = SlotError::Persistence(KVError::Storage("disk /dev/sda1 on fire".into()));
        let svc = ServiceError::from(err);
        assert_eq!(svc.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(svc.to_string(), "storage failure");
    }

    #[test]
    fn capacity_message_names_the_limit() {
        let svc = ServiceError::from(SlotError::CapacityExceeded { max: 10 });
        assert_eq!(svc.to_string(), "slot capacity reached (max 10)");
    }
}
