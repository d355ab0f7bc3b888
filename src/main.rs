mod auth;
mod config;
mod db;
mod error;
mod maintenance;
mod pagination;
mod routes;
mod state;
mod status;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use routes::{
    editor_articles, editor_reviewers, editor_submissions, reference, reviewer_articles,
    reviewer_submissions,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redline=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(pool.as_ref()).await?;

    let state = Arc::new(state::AppState {
        pool,
        config: config.clone(),
    });

    maintenance::spawn_sweeper(state.clone());

    let app = Router::new()
        // reference data and registration
        .route("/api/scientific-activities", get(reference::scientific_activities))
        .route("/api/review-criteria", get(reference::review_criteria))
        .route("/api/reviewers", get(reference::active_reviewers))
        .route("/api/reviewers/register", post(reference::register))
        .route("/api/profile", get(reference::profile).put(reference::update_profile))
        // editor: article pipeline
        .route("/api/editor/articles", get(editor_articles::index).post(editor_articles::store))
        .route("/api/editor/articles/:id", get(editor_articles::show))
        .route("/api/editor/articles/:id/convert", post(editor_articles::convert))
        .route("/api/editor/articles/:id/edited-file", put(editor_articles::update_edited_file))
        .route("/api/editor/articles/:id/send", post(editor_articles::send_to_reviewers))
        .route("/api/editor/articles/:id/reviewers", post(editor_articles::add_reviewers))
        .route(
            "/api/editor/articles/:id/available-reviewers",
            get(editor_articles::available_reviewers),
        )
        .route("/api/editor/articles/:id/reviews", get(editor_articles::reviews))
        .route(
            "/api/editor/articles/:id/reviewers/:reviewer_id",
            get(editor_articles::reviewer_review),
        )
        .route(
            "/api/editor/articles/:id/deadline-extension",
            post(editor_articles::deadline_extension),
        )
        // editor: reviewer management
        .route("/api/editor/reviewers/pending", get(editor_reviewers::pending))
        .route("/api/editor/reviewers/approved", get(editor_reviewers::approved))
        .route("/api/editor/reviewers/archived", get(editor_reviewers::archived))
        .route("/api/editor/reviewers/archived/:id", get(editor_reviewers::show_archived))
        .route("/api/editor/reviewers/:id", get(editor_reviewers::show))
        .route("/api/editor/reviewers/:id/approve", post(editor_reviewers::approve))
        .route("/api/editor/reviewers/:id/reject", post(editor_reviewers::reject))
        // editor: submissions
        .route("/api/editor/submissions/dashboard", get(editor_submissions::dashboard))
        .route("/api/editor/submissions", get(editor_submissions::index))
        .route(
            "/api/editor/submissions/:id",
            get(editor_submissions::show).delete(editor_submissions::destroy),
        )
        .route("/api/editor/submissions/:id/assign", post(editor_submissions::assign))
        .route(
            "/api/editor/submissions/:id/assignments/:assignment_id",
            delete(editor_submissions::remove_assignment),
        )
        .route("/api/editor/submissions/:id/status", put(editor_submissions::update_status))
        // reviewer: articles
        .route("/api/reviewer/articles", get(reviewer_articles::assigned))
        .route("/api/reviewer/articles/in-progress", get(reviewer_articles::in_progress))
        .route("/api/reviewer/articles/completed", get(reviewer_articles::completed))
        .route("/api/reviewer/articles/:id", get(reviewer_articles::show))
        .route("/api/reviewer/articles/:id/status", put(reviewer_articles::update_status))
        .route("/api/reviewer/articles/:id/review", post(reviewer_articles::submit_review))
        .route(
            "/api/reviewer/articles/:id/draft",
            put(reviewer_articles::save_draft)
                .get(reviewer_articles::get_draft)
                .delete(reviewer_articles::delete_draft),
        )
        // reviewer: submissions
        .route("/api/reviewer/submissions/dashboard", get(reviewer_submissions::dashboard))
        .route("/api/reviewer/submissions", get(reviewer_submissions::index))
        .route("/api/reviewer/submissions/:id", get(reviewer_submissions::show))
        .route("/api/reviewer/submissions/:id/start", post(reviewer_submissions::start))
        .route("/api/reviewer/submissions/:id/review", post(reviewer_submissions::submit_review))
        .route("/api/reviewer/reviews/:id", put(reviewer_submissions::update_review))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Redline listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
