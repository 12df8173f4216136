use crate::{
    models::*,
    validation::{validate_candidate_id, validate_candidate_name, ValidationError, MAX_NAME_LENGTH},
    Error, ErrorCode,
};
use time::OffsetDateTime;

#[test]
fn test_candidate_id_validation() {
    assert!(validate_candidate_id(1).is_ok());
    assert!(validate_candidate_id(i64::MAX).is_ok());
    assert_eq!(validate_candidate_id(0), Err(ValidationError::InvalidCandidateId(0)));
    assert_eq!(validate_candidate_id(-7), Err(ValidationError::InvalidCandidateId(-7)));
}

#[test]
fn test_candidate_name_validation() {
    assert_eq!(validate_candidate_name("  Ada  "), Ok("Ada"));
    assert_eq!(validate_candidate_name("   "), Err(ValidationError::EmptyName));
    assert_eq!(validate_candidate_name(""), Err(ValidationError::EmptyName));

    let longest = "a".repeat(MAX_NAME_LENGTH);
    assert!(validate_candidate_name(&longest).is_ok());
    let too_long = "a".repeat(MAX_NAME_LENGTH + 1);
    assert_eq!(validate_candidate_name(&too_long), Err(ValidationError::NameTooLong));
}

#[test]
fn test_vote_event_wire_format() {
    let event = VoteEvent { candidate_id: 42 };
    let json = serde_json::to_string(&event).unwrap();
    assert_eq!(json, r#"{"candidateId":42}"#);

    let parsed: VoteEvent = serde_json::from_str(r#"{"candidateId":7}"#).unwrap();
    assert_eq!(parsed.candidate_id, 7);
    assert!(serde_json::from_str::<VoteEvent>(r#"{"id":7}"#).is_err());
}

#[test]
fn test_vote_ack_uses_candidate_and_fixed_message() {
    let candidate = Candidate { id: 1, name: "A".into() };
    let at = OffsetDateTime::now_utc();
    let ack = VoteAck::accepted(&candidate, at);

    assert_eq!(ack.candidate_id, 1);
    assert_eq!(ack.candidate_name, "A");
    assert_eq!(ack.timestamp, at);
    assert_eq!(ack.message, VOTE_ACK_MESSAGE);

    let value = serde_json::to_value(&ack).unwrap();
    assert_eq!(value["candidateId"], 1);
    assert_eq!(value["candidateName"], "A");
    assert_eq!(value["message"], "vote computed successfully");
    assert!(value["timestamp"].is_string());
}

#[test]
fn test_new_vote_from_event() {
    let event = VoteEvent { candidate_id: 3 };
    assert_eq!(NewVote::from(&event), NewVote { candidate_id: 3 });
}

#[test]
fn test_error_body() {
    let plain = Error::new(ErrorCode::NotFound, "Candidate 9 not found");
    assert_eq!(plain.to_string(), "Resource not found: Candidate 9 not found");
    let value = serde_json::to_value(&plain).unwrap();
    assert_eq!(value["code"], "notFound");
    assert!(value.get("details").is_none());

    let detailed = Error::with_details(ErrorCode::Unavailable, "Vote not accepted", "queue timed out");
    assert_eq!(
        detailed.to_string(),
        "Service temporarily unavailable: Vote not accepted (queue timed out)"
    );
}
