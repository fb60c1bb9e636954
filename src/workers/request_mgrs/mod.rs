//! # Request Lifecycle Managers
//!
//! One worker per owned request status. Each manager lists only the status
//! it owns, acts on each request independently, and accumulates per-request
//! errors without aborting the batch. Every action is safe to repeat: a pass
//! that dies halfway is simply re-run from persisted state on the next tick.

pub mod accepted;
pub mod certificates;
pub mod deleting;
pub mod failed;
pub mod general;
pub mod preparing;
pub mod provisioning;
pub mod ready;
pub mod routes;

pub use accepted::AcceptedRequestManager;
pub use certificates::CertificateRequestManager;
pub use deleting::DeletingRequestManager;
pub use failed::FailedRequestManager;
pub use general::StreamRequestManager;
pub use preparing::PreparingRequestManager;
pub use provisioning::ProvisioningRequestManager;
pub use ready::ReadyRequestManager;
pub use routes::RoutesRequestManager;

use crate::error::ServiceError;
use crate::models::StreamRequest;
use crate::services::identity::IdentityService;
use crate::services::requests::RequestStore;
use crate::workers::retry::{self, RetryDecision};
use chrono::Utc;
use std::time::Duration;
use tracing::info;

/// Prefix for the service account handed to the instance itself.
pub(crate) const SERVICE_ACCOUNT_PREFIX: &str = "stream-instance";
/// Prefix for the canary service account used for continuous health probes.
pub(crate) const CANARY_ACCOUNT_PREFIX: &str = "stream-canary";

/// Apply the creation-path retry policy to a failed external action.
///
/// Always returns an error for the pass's batch: the action's own error
/// while the request is still being retried, or (once the retry window is
/// exhausted, or for client-class errors) after the request has been moved
/// to `failed` and persisted. A persistence failure takes precedence, so the
/// next pass re-evaluates from stored state.
pub(crate) async fn handle_creation_error(
    store: &dyn RequestStore,
    request: &mut StreamRequest,
    err: ServiceError,
    window: Duration,
) -> ServiceError {
    match retry::decide(&err, request.created_at, Utc::now(), window) {
        RetryDecision::Retry => err,
        RetryDecision::Fail { reason } => {
            info!(
                request_id = %request.id,
                reason = %reason,
                "marking request as failed"
            );
            request.fail(reason);
            match store.update(request).await {
                Ok(()) => err,
                Err(update_err) => update_err,
            }
        }
    }
}

/// Create-if-missing issuance of the instance and canary service accounts.
///
/// Returns whether any field changed. Existing fields are never overwritten,
/// so repeated passes are no-ops once both accounts are recorded.
pub(crate) async fn ensure_credentials(
    identity: &dyn IdentityService,
    request: &mut StreamRequest,
) -> crate::error::Result<bool> {
    let mut changed = false;

    if request.service_account_client_id.is_none() {
        let account = identity
            .ensure_service_account(SERVICE_ACCOUNT_PREFIX, &request.id)
            .await?;
        request.service_account_client_id = Some(account.client_id);
        request.service_account_secret = Some(account.secret);
        changed = true;
    }

    if request.canary_service_account_client_id.is_none() {
        let account = identity
            .ensure_service_account(CANARY_ACCOUNT_PREFIX, &request.id)
            .await?;
        request.canary_service_account_client_id = Some(account.client_id);
        request.canary_service_account_secret = Some(account.secret);
        changed = true;
    }

    Ok(changed)
}
