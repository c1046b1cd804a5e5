use rocket::data::{Data, ToByteUnit};
use rocket::http::{Header, Method, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::{json, Json, Value};
use rocket::*;

use crate::error::{LeaderboardError, LeaderboardResult};
use crate::leaderboard::LeaderboardService;
use crate::score::ScoreEntry;
use crate::submission::{RawSubmission, MAX_BODY_BYTES};

mod cors;

pub use cors::{Cors, ALLOWED_METHODS};

/// Routes served under every mount point.
pub fn leaderboard_routes() -> Vec<Route> {
    routes![get_leaderboard, post_score]
}

#[get("/")]
pub fn index() -> RawHtml<&'static str> {
    RawHtml(
        r#"<h1>Leaderboard API</h1>
<p>GET <a href="/leaderboard">/leaderboard</a></p>
<p>POST /leaderboard {"name":"AAA","score":123}</p>"#,
    )
}

/// Answers cross-origin pre-flight requests for any path.
#[options("/<_..>")]
pub fn preflight() {}

#[get("/leaderboard")]
pub async fn get_leaderboard(
    service: &State<LeaderboardService>,
) -> LeaderboardResult<Json<Vec<ScoreEntry>>> {
    let entries = service.list_top().await?;
    Ok(Json(entries))
}

/// Accepts `{name, score}`. The body is decoded leniently, whatever the
/// content type or encoding.
#[post("/leaderboard", data = "<data>")]
pub async fn post_score(
    data: Data<'_>,
    service: &State<LeaderboardService>,
) -> LeaderboardResult<Json<ScoreEntry>> {
    let body = match data.open(MAX_BODY_BYTES.bytes()).into_bytes().await {
        Ok(body) if !body.is_complete() => return Err(LeaderboardError::PayloadTooLarge),
        Ok(body) => body.into_inner(),
        Err(err) => {
            tracing::warn!(%err, "failed to read submission body");
            Vec::new()
        }
    };

    let raw = RawSubmission::from_body(&body);
    let entry = service.submit_score(&raw.name, raw.score).await?;
    Ok(Json(entry))
}

#[derive(Responder)]
#[response(status = 405)]
pub struct MethodNotAllowed {
    message: &'static str,
    allow: Header<'static>,
}

impl MethodNotAllowed {
    fn new() -> Self {
        Self {
            message: "Method Not Allowed",
            allow: Header::new("Allow", ALLOWED_METHODS),
        }
    }
}

#[derive(Responder)]
pub enum Unrouted {
    NotAllowed(MethodNotAllowed),
    NotFound((Status, Json<Value>)),
}

fn error_body(status: Status) -> (Status, Json<Value>) {
    let reason = status.reason().unwrap_or("Error");
    (status, Json(json!({ "error": reason })))
}

/// Registered under the leaderboard path: any method without a route there is refused.
#[catch(404)]
pub fn leaderboard_fallback(request: &Request<'_>) -> Unrouted {
    match request.method() {
        Method::Get | Method::Head | Method::Post | Method::Options => {
            Unrouted::NotFound(error_body(Status::NotFound))
        }
        _ => Unrouted::NotAllowed(MethodNotAllowed::new()),
    }
}

/// Keeps error bodies JSON for everything Rocket answers on its own.
#[catch(default)]
pub fn json_error(status: Status, _request: &Request<'_>) -> (Status, Json<Value>) {
    error_body(status)
}
