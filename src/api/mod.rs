//! All API endpoint setup

use axum::Router;
use axum::routing::get;
use axum::routing::post;

pub use audit_trail::AuditTrail;
pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use request::Form;
pub use request::PathParameters;
pub use request::QueryParameters;
pub use request::parse_optional_text;
pub use request::parse_required_text;
pub use response::Error;
pub use response::Success;

mod audit_trail;
mod contacts;
mod current_user;
mod leads;
mod meetings;
mod request;
mod response;
mod users;

/// Get the Axum router for all API routes
pub fn router() -> Router {
    let users = Router::new()
        .route("/token", post(users::token))
        .route("/", get(users::list).post(users::create))
        .route("/me", get(users::me));

    let contacts = Router::new().route("/", get(contacts::list).post(contacts::create));

    let leads = Router::new().route("/", get(leads::list).post(leads::create));

    let meetings = Router::new()
        .route("/", get(meetings::list).post(meetings::create))
        .route("/delete-many", post(meetings::delete_many))
        .route(
            "/{meeting}",
            get(meetings::single).delete(meetings::delete),
        );

    Router::new()
        .nest("/users", users)
        .nest("/contacts", contacts)
        .nest("/leads", leads)
        .nest("/meetings", meetings)
}
