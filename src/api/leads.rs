//! Leads API endpoints

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::leads::Lead;
use crate::storage::AuditEntry;
use crate::storage::CreateLeadValues;
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub id: Uuid,
    pub lead_name: String,
    pub lead_email: Option<String>,
    pub created_at: NaiveDateTime,
}

impl LeadResponse {
    fn from_lead(lead: Lead) -> Self {
        Self {
            id: lead.id,
            lead_name: lead.lead_name,
            lead_email: lead.lead_email,
            created_at: lead.created_at,
        }
    }
}

/// List all leads
pub async fn list(
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
) -> Result<Success<Vec<LeadResponse>>, Error> {
    current_user.role.is_allowed(Role::Manager)?;

    let leads = storage
        .find_all_leads()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(
        leads.into_iter().map(LeadResponse::from_lead).collect(),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadForm {
    lead_name: String,
    lead_email: Option<String>,
}

/// Create a lead
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "leadName": "Acme Corp" }' \
///     http://localhost:6000/api/leads
/// ```
pub async fn create(
    audit_trail: AuditTrail,
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
    Form(form): Form<CreateLeadForm>,
) -> Result<Success<LeadResponse>, Error> {
    current_user.role.is_allowed(Role::Manager)?;

    let lead_name = parse_required_text(&form.lead_name)
        .ok_or_else(|| Error::bad_request("Lead name is required"))?;
    let lead_email = parse_optional_text(form.lead_email);

    let values = CreateLeadValues {
        user: &current_user,
        lead_name: &lead_name,
        lead_email: lead_email.as_deref(),
    };

    let lead = storage
        .create_lead(&values)
        .await
        .map_err(Error::internal_server_error)?;

    audit_trail.register(AuditEntry::CreateLead(&lead)).await;

    Ok(Success::created(LeadResponse::from_lead(lead)))
}
