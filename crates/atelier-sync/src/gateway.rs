//! Fetch gateway — the request/response seam to the backend data service.
//!
//! Stateless by contract: the gateway performs no retries and carries no
//! partial state on failure. Retry and resync policy live with the caller.

use async_trait::async_trait;

use atelier_core::AppResult;
use atelier_core::types::id::{NotificationId, TenantId, UserId};
use atelier_entity::NotificationBatch;

/// Backend operations consumed by the synchronizer.
///
/// Any network or authorization failure surfaces as a typed [`AppError`]
/// (`Network`, `Timeout`, `Authorization`, ...); callers resync rather
/// than patch fields on failure.
///
/// [`AppError`]: atelier_core::AppError
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Loads the most recent records and the unread count.
    async fn fetch_initial(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        limit: u32,
    ) -> AppResult<NotificationBatch>;

    /// Marks a notification as read.
    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> AppResult<()>;

    /// Records a click on a notification (implies read).
    async fn mark_clicked(&self, id: NotificationId, user_id: UserId) -> AppResult<()>;

    /// Soft-deletes a notification.
    async fn delete(&self, id: NotificationId, user_id: UserId) -> AppResult<()>;

    /// Marks all of the user's notifications as read.
    async fn mark_all_read(&self, user_id: UserId) -> AppResult<()>;
}
