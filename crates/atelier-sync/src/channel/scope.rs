//! Typed channel names and parsing.

use atelier_core::types::id::{TenantId, UserId};
use uuid::Uuid;

/// Typed channel identifiers.
///
/// Delivery is scoped per tenant; the per-user feed is the channel the
/// synchronizer subscribes to. The broadcast variant carries tenant-wide
/// announcements when the transport does not filter per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelScope {
    /// One user's notification feed within a tenant.
    TenantUser {
        /// Owning tenant.
        tenant: TenantId,
        /// Recipient user.
        user: UserId,
    },
    /// Tenant-wide broadcast channel.
    TenantBroadcast {
        /// Owning tenant.
        tenant: TenantId,
    },
}

impl ChannelScope {
    /// Parses a channel string into a typed scope.
    pub fn parse(channel: &str) -> Option<Self> {
        let parts: Vec<&str> = channel.split(':').collect();
        match parts.as_slice() {
            ["tenant", tenant, "user", user, "notifications"] => {
                let tenant = Uuid::parse_str(tenant).ok()?;
                let user = Uuid::parse_str(user).ok()?;
                Some(ChannelScope::TenantUser {
                    tenant: TenantId::from_uuid(tenant),
                    user: UserId::from_uuid(user),
                })
            }
            ["tenant", tenant, "broadcast"] => {
                let tenant = Uuid::parse_str(tenant).ok()?;
                Some(ChannelScope::TenantBroadcast {
                    tenant: TenantId::from_uuid(tenant),
                })
            }
            _ => None,
        }
    }

    /// Converts back to a channel string.
    pub fn to_channel_name(&self) -> String {
        match self {
            ChannelScope::TenantUser { tenant, user } => {
                format!("tenant:{tenant}:user:{user}:notifications")
            }
            ChannelScope::TenantBroadcast { tenant } => format!("tenant:{tenant}:broadcast"),
        }
    }

    /// Returns the tenant this channel belongs to.
    pub fn tenant(&self) -> TenantId {
        match self {
            ChannelScope::TenantUser { tenant, .. } => *tenant,
            ChannelScope::TenantBroadcast { tenant } => *tenant,
        }
    }
}
