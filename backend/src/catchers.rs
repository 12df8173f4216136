use rocket::{Request, catch, serde::json::Json};
use shared::{Error, ErrorCode};

#[catch(400)]
pub fn bad_request(_req: &Request) -> Json<Error> {
    Json(Error::new(ErrorCode::InvalidInput, "Invalid request parameters."))
}

#[catch(404)]
pub fn not_found(req: &Request) -> Json<Error> {
    Json(Error::with_details(
        ErrorCode::NotFound,
        "The requested resource was not found.",
        req.uri().path().to_string(),
    ))
}

#[catch(422)]
pub fn unprocessable(_req: &Request) -> Json<Error> {
    Json(Error::new(ErrorCode::ValidationFailed, "Request body could not be parsed."))
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Json<Error> {
    Json(Error::new(ErrorCode::SystemError, "An internal server error occurred."))
}

#[catch(503)]
pub fn unavailable(_req: &Request) -> Json<Error> {
    Json(Error::new(ErrorCode::Unavailable, "Service temporarily unavailable."))
}
