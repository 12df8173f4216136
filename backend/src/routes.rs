use std::sync::Arc;
use rocket::{State, get, post, http::Status, serde::json::Json};
use rustrict::CensorStr;
use tracing::{debug, error, info, instrument};
use shared::{models::*, validation::validate_candidate_name};
use crate::{
    config::AppConfig,
    error::{ApiError, IntakeError},
    intake::VoteIntake,
    queue::VoteQueue,
    store::{CandidateStore, VoteStore},
    tally::TallyReader,
    utils::parse_candidate_id,
};

pub struct AppState {
    pub intake: VoteIntake,
    pub tally: TallyReader,
    pub candidates: Arc<dyn CandidateStore>,
}

impl AppState {
    pub fn new(
        candidates: Arc<dyn CandidateStore>,
        votes: Arc<dyn VoteStore>,
        queue: Arc<dyn VoteQueue>,
        config: &AppConfig,
    ) -> Self {
        Self {
            intake: VoteIntake::new(Arc::clone(&candidates), queue, config.intake_timeout),
            tally: TallyReader::new(votes),
            candidates,
        }
    }
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[instrument(skip(state, request), fields(candidate_id = request.candidate_id))]
#[post("/vote", format = "json", data = "<request>")]
pub async fn submit_vote(
    state: &State<AppState>,
    request: Json<VoteRequest>,
) -> Result<Json<VoteAck>, ApiError> {
    state.intake
        .submit(request.candidate_id)
        .await
        .map(Json)
        .map_err(|e| {
            match &e {
                IntakeError::NotFound(_) | IntakeError::InvalidId(_) => debug!("vote rejected: {}", e),
                _ => error!("vote intake failed: {}", e),
            }
            ApiError::from(e)
        })
}

#[instrument(skip(state, request))]
#[post("/candidates", format = "json", data = "<request>")]
pub async fn register_candidate(
    state: &State<AppState>,
    request: Json<CreateCandidateRequest>,
) -> Result<Json<CandidateResponse>, ApiError> {
    let name = validate_candidate_name(&request.name)
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    if name.is_inappropriate() {
        return Err(ApiError::InvalidInput(format!("Possible profanity detected in name: {}", name)));
    }

    let candidate = state.candidates.create(name).await.map_err(|e| {
        error!("Failed to register candidate: {}", e);
        ApiError::from(e)
    })?;

    info!(candidate_id = candidate.id, "candidate registered");
    Ok(Json(CandidateResponse::with_tally(candidate, 0)))
}

#[get("/candidates/<id>")]
pub async fn get_candidate(state: &State<AppState>, id: &str) -> Result<Json<CandidateResponse>, ApiError> {
    let id = parse_candidate_id(id)?;
    let candidate = state.candidates
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(id))?;
    let total_votes = state.tally.tally(id).await?;

    Ok(Json(CandidateResponse::with_tally(candidate, total_votes)))
}

#[get("/candidates/<id>/tally")]
pub async fn get_tally(state: &State<AppState>, id: &str) -> Result<Json<TallyResponse>, ApiError> {
    let candidate_id = parse_candidate_id(id)?;
    let total_votes = state.tally.tally(candidate_id).await?;

    Ok(Json(TallyResponse { candidate_id, total_votes }))
}
