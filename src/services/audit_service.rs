use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::database::store::DirectoryTx;
use crate::error::Result;
use crate::models::{audit_log::NewAuditLog, user::Actor};

pub const ACTION_AUTO_APPROVED: &str = "auto_approved";
pub const ACTION_APPROVED: &str = "approved";
pub const ACTION_REJECTED: &str = "rejected";
pub const ACTION_STATUS_CHANGED: &str = "status_changed";
pub const ACTION_DELETED: &str = "deleted";
pub const ACTION_CREATED: &str = "created";

/// Writes an audit entry in the caller's unit of work, so it commits or rolls back
/// together with the change it describes.
pub async fn record(
    tx: &mut dyn DirectoryTx,
    actor: &Actor,
    action: &'static str,
    entity_type: &'static str,
    entity_id: Uuid,
    changes: Option<JsonValue>,
) -> Result<()> {
    tracing::debug!(
        actor_id = %actor.id,
        action,
        entity_type,
        entity_id = %entity_id,
        "audit"
    );
    tx.insert_audit(NewAuditLog {
        actor_id: Some(actor.id),
        action,
        entity_type,
        entity_id,
        changes,
    })
    .await?;
    Ok(())
}
