//! Contacts API endpoints
//!
//! Contacts are picked as attendees of meetings

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::contacts::Contact;
use crate::storage::AuditEntry;
use crate::storage::CreateContactValues;
use crate::storage::Database;
use crate::storage::Storage;
use crate::users::Role;

use super::AuditTrail;
use super::CurrentUser;
use super::Error;
use super::Form;
use super::Success;
use super::parse_optional_text;
use super::parse_required_text;

/// Contact response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub created_at: NaiveDateTime,
}

impl ContactResponse {
    fn from_contact(contact: Contact) -> Self {
        Self {
            id: contact.id,
            full_name: contact.full_name,
            email: contact.email,
            created_at: contact.created_at,
        }
    }
}

/// List all contacts
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/contacts
/// ```
pub async fn list(
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
) -> Result<Success<Vec<ContactResponse>>, Error> {
    current_user.role.is_allowed(Role::Manager)?;

    let contacts = storage
        .find_all_contacts()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(
        contacts
            .into_iter()
            .map(ContactResponse::from_contact)
            .collect(),
    ))
}

/// Create contact form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactForm {
    full_name: String,
    email: Option<String>,
}

/// Create a contact
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "fullName": "Alice Adams", "email": "alice@example.com" }' \
///     http://localhost:6000/api/contacts
/// ```
pub async fn create(
    audit_trail: AuditTrail,
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
    Form(form): Form<CreateContactForm>,
) -> Result<Success<ContactResponse>, Error> {
    current_user.role.is_allowed(Role::Manager)?;

    let full_name = parse_required_text(&form.full_name)
        .ok_or_else(|| Error::bad_request("Full name is required"))?;
    let email = parse_optional_text(form.email);

    let values = CreateContactValues {
        user: &current_user,
        full_name: &full_name,
        email: email.as_deref(),
    };

    let contact = storage
        .create_contact(&values)
        .await
        .map_err(Error::internal_server_error)?;

    audit_trail
        .register(AuditEntry::CreateContact(&contact))
        .await;

    Ok(Success::created(ContactResponse::from_contact(contact)))
}
