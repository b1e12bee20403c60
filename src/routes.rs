use axum::routing::{get, post, put};
use axum::{response::Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{analytics, auth, technology};
use crate::state::AppState;
use crate::{database, links, reports, resources};

/// Assemble the full application router. Resource and association routes are
/// generated from their registries; everything else is a static route.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Registration and sessions
        .route("/auth/send-otp", post(auth::send_otp))
        .route("/auth/resend-otp", post(auth::resend_otp))
        .route("/auth/verify-otp", post(auth::verify_otp))
        .route("/auth/login", post(auth::login))
        .route("/auth/change-password", put(auth::change_password))
        // Reporting and analytics
        .route("/reports", get(reports::handlers::reports))
        .route("/patents/analytics", get(analytics::patents))
        .route("/patents/analytics/filed", get(analytics::patents_filed))
        .route("/patents/analytics/granted", get(analytics::patents_granted))
        // Aggregated technology detail
        .route("/technologies/details/:id", get(technology::details));

    for spec in resources::RESOURCES {
        router = router.merge(resources::handlers::routes(spec));
    }
    for link in links::LINKS {
        router = router.merge(links::handlers::routes(link));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Tech Catalog API",
            "version": version,
            "endpoints": {
                "auth": "/auth/* (public registration and login)",
                "catalogue": "/technologies, /projects, /patents, /publications, /companies, /employees (public read, employee write)",
                "children": "/technology_specs, /qualification_hw, /qualification_sw, /versions (authenticated read, employee write)",
                "links": "/employee_patents, /employee_projects, /employee_publications, /project_companies",
                "reports": "/reports (filtered, sorted, paginated)",
                "analytics": "/patents/analytics[/filed|/granted]",
            }
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            // Details go to the log only; the public body stays generic.
            tracing::error!("health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now, "database": "unreachable" }
                })),
            )
        }
    }
}
