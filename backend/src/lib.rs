pub mod catchers;
pub mod config;
pub mod cors;
pub mod error;
pub mod intake;
pub mod pg_queue;
pub mod processor;
pub mod queries;
pub mod queue;
pub mod routes;
pub mod store;
pub mod tally;
pub mod utils;
pub use shared::{models::*, Error, ErrorCode};

use rocket::{catchers, routes, Build, Rocket};
use crate::{config::AppConfig, cors::Cors, routes::AppState};

/// Assembles the HTTP surface around already-constructed collaborators.
pub fn build_rocket(state: AppState, config: &AppConfig) -> Rocket<Build> {
    rocket::build()
        .attach(Cors::new(config.allowed_origin.clone()))
        .manage(state)
        .mount(
            "/api",
            routes![
                routes::submit_vote,
                routes::register_candidate,
                routes::get_candidate,
                routes::get_tally,
                routes::all_options
            ],
        )
        .register(
            "/",
            catchers![
                catchers::bad_request,
                catchers::not_found,
                catchers::unprocessable,
                catchers::internal_error,
                catchers::unavailable
            ],
        )
}
