use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/calendar/:year/:month", get(handlers::calendar_month))
        .route("/day/status", post(handlers::update_status))
        .route("/day/:day_id", get(handlers::day_detail))
        .route("/task/complete", post(handlers::complete_task))
        .route("/plans", get(handlers::list_plans))
        .route("/plan/create", post(handlers::create_plan))
        .route("/plan/:plan_id/update", post(handlers::update_plan))
        .route("/plan/:plan_id/delete", post(handlers::delete_plan))
        .route(
            "/plan/:plan_id/daily",
            get(handlers::get_daily_plans).post(handlers::save_daily_plans),
        )
        .route("/api/summary", get(handlers::get_summary))
        .with_state(state)
}
