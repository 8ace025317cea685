//! Event types for PetalSonic entity audio

use crate::backend::TriggerId;
use crate::proxy::ProxyId;
use crate::world::OwnerId;

/// Notifications handed to the host by [`EntityAudioWorld::poll_events`](crate::EntityAudioWorld::poll_events).
#[derive(Debug, Clone, PartialEq)]
pub enum EntityAudioEvent {
    /// A trigger that asked for a deferred completion finished
    TriggerFinished {
        owner: OwnerId,
        proxy_id: ProxyId,
        trigger: TriggerId,
        user_tag: u64,
        success: bool,
    },
    /// A listener owner moved; its area membership should be recomputed
    AreaUpdateRequested { owner: OwnerId },
    ListenerCreated { owner: OwnerId },
    ListenerReleased { owner: OwnerId },
}

impl EntityAudioEvent {
    pub fn owner(&self) -> OwnerId {
        match self {
            Self::TriggerFinished { owner, .. }
            | Self::AreaUpdateRequested { owner }
            | Self::ListenerCreated { owner }
            | Self::ListenerReleased { owner } => *owner,
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, Self::TriggerFinished { .. })
    }
}
