//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{documents, fines, health, returns, sessions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Athenaeum API",
        version = "1.0.0",
        description = "University Library Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Document access
        documents::check_access,
        documents::check_access_student,
        // Reading sessions
        sessions::start_session,
        sessions::end_session,
        sessions::session_stats,
        // Returns
        returns::list_pending,
        returns::verify_return,
        // Fines
        fines::list_fines,
        fines::list_my_fines,
        fines::mark_paid,
    ),
    components(
        schemas(
            // Documents
            crate::models::document::Document,
            crate::models::document::DocumentType,
            crate::models::document::SubmissionStatus,
            documents::AccessCheckResponse,
            documents::StudentAccessResponse,
            // Sessions
            crate::models::reading_session::ReadingSession,
            crate::models::reading_session::SessionWithReader,
            sessions::StartSessionResponse,
            sessions::EndSessionResponse,
            sessions::SessionStatsResponse,
            // Returns
            crate::models::request::PendingReturn,
            crate::models::request::RequestStatus,
            crate::models::reconciliation::VerifyReturnInput,
            returns::ActionResponse,
            // Fines
            crate::models::fine::BookFine,
            crate::models::fine::FineReason,
            crate::models::fine::FineStatus,
            // Books
            crate::models::book::Book,
            crate::models::book::BookStatus,
            // Users
            crate::models::user::User,
            crate::models::user::UserRole,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "documents", description = "Document access checks"),
        (name = "sessions", description = "Reading session tracking"),
        (name = "returns", description = "Book-return verification"),
        (name = "fines", description = "Fine management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
