//! Audit trail service

use std::net::IpAddr;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::client_ip::ClientIp;
use crate::storage::AuditEntry;
use crate::storage::Database;
use crate::storage::Storage;

use super::CurrentUser;
use super::Error;

/// Audit trail service
pub struct AuditTrail {
    /// Storage in where the trail is saved
    storage: Database,

    /// The current user for the audit trail
    current_user: CurrentUser,

    /// The IP address associated with the audit trail
    ip_address: Option<IpAddr>,
}

impl AuditTrail {
    /// Register an entry on the audit trail
    ///
    /// Failures are logged, the request itself goes on
    pub async fn register(&self, entry: AuditEntry<'_>) {
        let result = self
            .storage
            .register_audit_trail(&self.current_user, &entry, self.ip_address.as_ref())
            .await;

        if let Err(err) = result {
            tracing::error!("Could not register audit trail entry: {err}");
        }
    }
}

impl<S> FromRequestParts<S> for AuditTrail
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(storage) = parts
            .extract::<Extension<Database>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get the storage"))?;

        let current_user = CurrentUser::from_request_parts(parts, state).await?;

        let ip_address = Option::<ClientIp>::from_request_parts(parts, state)
            .await
            .ok()
            .flatten()
            .map(|ClientIp(ip_address)| ip_address);

        Ok(AuditTrail {
            storage,
            current_user,
            ip_address,
        })
    }
}
