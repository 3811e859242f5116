use axum::{extract::State, response::Html};

use crate::{state::AppState, templates};

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(templates::render_index(&state.watchlist, &state.version))
}
