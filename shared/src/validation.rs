use crate::models::CandidateId;

pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid candidate id: {0}")]
    InvalidCandidateId(CandidateId),
    #[error("Candidate name must not be empty")]
    EmptyName,
    #[error("Candidate name exceeds maximum length of {MAX_NAME_LENGTH}")]
    NameTooLong,
}

/// Store-assigned ids start at 1; anything else cannot name a candidate.
pub fn validate_candidate_id(id: CandidateId) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::InvalidCandidateId(id));
    }
    Ok(())
}

/// Returns the trimmed name on success.
pub fn validate_candidate_name(name: &str) -> Result<&str, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() { return Err(ValidationError::EmptyName); }
    if trimmed.chars().count() > MAX_NAME_LENGTH { return Err(ValidationError::NameTooLong); }
    Ok(trimmed)
}
