use uuid::Uuid;

use super::{ensure, not_found, WorkflowEngine};
use crate::dto::notification_dto::AnnouncementPayload;
use crate::error::Result;
use crate::models::{notification::Notification, user::Actor};
use crate::services::{
    authorization::{authorize, Action, Resource},
    notification_service::{fanout, Audience, FanoutEvent},
};

impl WorkflowEngine {
    pub async fn list_notifications(&self, actor: &Actor) -> Result<Vec<Notification>> {
        let mut tx = self.begin().await?;
        Ok(tx.list_notifications(actor.id).await?)
    }

    pub async fn unread_notification_count(&self, actor: &Actor) -> Result<i64> {
        let mut tx = self.begin().await?;
        Ok(tx.count_unread_notifications(actor.id).await?)
    }

    /// Only the recipient may mark a notification read; anyone else is told it does
    /// not exist.
    pub async fn mark_notification_read(&self, actor: &Actor, id: Uuid) -> Result<Notification> {
        let mut tx = self.begin().await?;
        let mut notification = tx
            .get_notification(id)
            .await?
            .ok_or_else(|| not_found("Notification"))?;
        let resource = Resource::Notification {
            recipient: notification.recipient_id,
        };
        if !authorize(actor, Action::MarkRead, &resource).is_allowed() {
            return Err(not_found("Notification"));
        }

        if !notification.is_read {
            tx.mark_notification_read(notification.id).await?;
            tx.commit().await?;
            notification.is_read = true;
        }
        Ok(notification)
    }

    pub async fn mark_all_notifications_read(&self, actor: &Actor) -> Result<u64> {
        let mut tx = self.begin().await?;
        let updated = tx.mark_all_notifications_read(actor.id).await?;
        tx.commit().await?;
        tracing::debug!(actor_id = %actor.id, updated, "notifications marked read");
        Ok(updated)
    }

    /// Broadcasts an announcement to the approved members of `target_role`.
    pub async fn send_announcement(
        &self,
        actor: &Actor,
        payload: AnnouncementPayload,
    ) -> Result<u64> {
        ensure(actor, Action::Broadcast, &Resource::Announcement)?;
        let audience = Audience::from_target_role(&payload.target_role)?;

        let mut tx = self.begin().await?;
        let sent = fanout(
            tx.as_mut(),
            &FanoutEvent::Announcement {
                audience,
                title: &payload.title,
                message: &payload.message,
                link: payload.link.as_deref(),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            target_role = %payload.target_role,
            recipients = sent,
            "announcement sent"
        );
        Ok(sent)
    }
}
