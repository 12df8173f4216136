use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use shared::{models::CandidateId, Error, ErrorCode};
use crate::store::StoreError;

/// Failures of the synchronous vote intake path.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Invalid candidate id: {0}")]
    InvalidId(CandidateId),
    #[error("Candidate {0} not found")]
    NotFound(CandidateId),
    #[error("Failed to publish vote: {0}")]
    PublishFailure(String),
    #[error("Candidate store unavailable: {0}")]
    StoreFailure(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Candidate {0} not found")]
    NotFound(CandidateId),
    #[error("Invalid candidate id: {0}")]
    InvalidId(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Vote not accepted: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> Status {
        match self {
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::InvalidId(_) => Status::BadRequest,
            ApiError::InvalidInput(_) => Status::BadRequest,
            ApiError::Unavailable(_) => Status::ServiceUnavailable,
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    fn body(&self) -> Error {
        match self {
            ApiError::NotFound(_) => Error::new(ErrorCode::NotFound, self.to_string()),
            ApiError::InvalidId(_) => Error::new(ErrorCode::InvalidInput, self.to_string()),
            ApiError::InvalidInput(_) => Error::new(ErrorCode::ValidationFailed, self.to_string()),
            ApiError::Unavailable(details) => {
                Error::with_details(ErrorCode::Unavailable, "Vote not accepted", details.clone())
            }
            ApiError::Internal(_) => Error::new(ErrorCode::SystemError, "An internal error occurred"),
        }
    }
}

impl From<IntakeError> for ApiError {
    fn from(e: IntakeError) -> Self {
        match e {
            IntakeError::InvalidId(id) => ApiError::InvalidId(id.to_string()),
            IntakeError::NotFound(id) => ApiError::NotFound(id),
            IntakeError::PublishFailure(msg) => ApiError::Unavailable(msg),
            IntakeError::StoreFailure(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        rocket::Response::build_from(Json(self.body()).respond_to(req)?)
            .status(status)
            .ok()
    }
}
