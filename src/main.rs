use rocket::*;

use crate::config::Config;
use crate::leaderboard::LeaderboardService;

mod config;
mod error;
mod leaderboard;
mod logging;
mod routes;
mod score;
mod store;
mod submission;
#[cfg(test)]
mod tests;

#[launch]
async fn rocket() -> _ {
    logging::init_logger();

    let config = Config::from_env();
    let service = LeaderboardService::from_config(&config);
    if service.is_configured() {
        tracing::info!(limit = config.limit, "leaderboard store configured");
    }

    build_rocket(service, &config.allow_origin)
}

/// Assembles the server around an already constructed service.
pub fn build_rocket(service: LeaderboardService, allow_origin: &str) -> Rocket<Build> {
    rocket::build()
        .mount("/", routes![routes::index, routes::preflight])
        .mount("/", routes::leaderboard_routes())
        .mount("/api", routes::leaderboard_routes())
        .register("/", catchers![routes::json_error])
        .register("/leaderboard", catchers![routes::leaderboard_fallback])
        .register("/api/leaderboard", catchers![routes::leaderboard_fallback])
        .attach(routes::Cors::new(allow_origin))
        .manage(service)
}
