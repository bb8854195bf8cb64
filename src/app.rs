use crate::handlers;
use crate::pages;
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(pages::index))
        .route("/days/:date/logs", post(pages::add_log))
        .route("/days/:date/logs/:id", post(pages::edit_log))
        .route("/days/:date/logs/:id/delete", post(pages::delete_log))
        .route("/days/:date/color", post(pages::set_color))
        .route("/days/:date/weight", post(pages::set_weight))
        .route("/days/:date/images", post(pages::add_images))
        .route("/days/:date/images/:index/delete", post(pages::delete_image))
        .route("/api/entries", get(handlers::get_entries))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/days/:date", get(handlers::get_day))
        .route("/api/days/:date/logs", post(handlers::add_log))
        .route(
            "/api/days/:date/logs/:id",
            put(handlers::edit_log).delete(handlers::delete_log),
        )
        .route("/api/days/:date/color", put(handlers::set_color))
        .route("/api/days/:date/weight", put(handlers::set_weight))
        .route("/api/days/:date/images", post(handlers::add_images))
        .route("/api/days/:date/images/:index", delete(handlers::delete_image))
        .route("/api/summary", post(handlers::summarize))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
