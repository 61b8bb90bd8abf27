use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Notification;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { user_id: Uuid, username: String },

    /// A notification row was created for the connected user.
    /// Replacement for the original row-insert push subscription keyed on
    /// the receiver id: only the receiver's connection gets this event.
    NotificationCreate { notification: Notification },

    /// A notification (or all of them) was marked read on another device.
    NotificationRead {
        notification_id: Option<Uuid>,
        all: bool,
    },
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },
}
