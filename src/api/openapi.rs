//! OpenAPI documentation

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, loans, penalties, stats, users};

/// Registers the JWT bearer scheme referenced by the endpoint annotations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LendHub API",
        version = "1.0.0",
        description = "Library Lending Platform REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "LendHub Team", email = "contact@lendhub.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::search_books,
        books::available_books,
        books::list_genres,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Loans
        loans::borrow,
        loans::return_loan,
        loans::list_loans,
        loans::get_loan,
        loans::overdue_loans,
        loans::user_loans,
        loans::user_active_loans,
        // Penalties
        penalties::list_penalties,
        penalties::get_penalty,
        penalties::user_penalties,
        penalties::user_unpaid_penalties,
        penalties::user_penalty_total,
        penalties::waive_penalty,
        // Users
        users::list_users,
        users::get_user,
        users::list_patrons,
        users::suspend_user,
        users::activate_user,
        users::delete_user,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::RegisterRequest,
            crate::models::user::LoginRequest,
            crate::models::user::AuthResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookDetails,
            crate::models::book::BookEnrichment,
            crate::models::book::BookQuery,
            crate::models::book::BookSearchQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Users
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::UserStatus,
            crate::models::user::UserQuery,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanQuery,
            crate::models::loan::BorrowRequest,
            crate::models::loan::BorrowResponse,
            crate::models::loan::ReturnResponse,
            // Penalties
            crate::models::penalty::Penalty,
            crate::models::penalty::PenaltyStatus,
            crate::models::penalty::PenaltyQuery,
            crate::models::penalty::UnpaidTotal,
            // Stats
            stats::StatsResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Loan lifecycle"),
        (name = "penalties", description = "Late-return penalties"),
        (name = "users", description = "User administration"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
