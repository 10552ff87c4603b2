use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/session", get(handlers::get_session))
        .route("/api/wallet/connect", post(handlers::connect_wallet))
        .route("/api/wallet/disconnect", post(handlers::disconnect_wallet))
        .route("/api/habits", get(handlers::list_habits).post(handlers::create_habit))
        .route("/api/habits/:id", put(handlers::update_habit).delete(handlers::delete_habit))
        .route("/api/habits/:id/select", post(handlers::select_habit))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/calendar/prev", post(handlers::previous_month))
        .route("/api/calendar/next", post(handlers::next_month))
        .route("/api/calendar/today", post(handlers::current_month))
        .route("/api/check-in", post(handlers::check_in))
        .route("/api/transaction", get(handlers::get_transaction))
        .route("/api/transaction/dismiss", post(handlers::dismiss_transaction))
        .with_state(state)
}
