//! Per-entity audio state.

use crate::area::AreaMembership;
use crate::backend::EnvironmentId;
use crate::error::{EntityAudioError, Result};
use crate::listener::ListenerHandle;
use crate::math::Pose;
use crate::proxy::{OwnerView, ProxyId, ProxyTable};
use crate::sync::SyncMode;
use crate::world::OwnerId;

/// Flags controlling how an owner's audio objects behave.
///
/// `follow_transform` and `is_listener` are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerFlags {
    /// Proxies track the owner's world transform on every move
    pub follow_transform: bool,
    /// Owner holds a listener instead of emission proxies
    pub is_listener: bool,
    /// Triggers are not executed on this owner
    pub audio_disabled: bool,
}

impl Default for OwnerFlags {
    fn default() -> Self {
        Self {
            follow_transform: true,
            is_listener: false,
            audio_disabled: false,
        }
    }
}

/// Audio state of one host entity.
#[derive(Debug)]
pub struct AudioOwner {
    pub(crate) id: OwnerId,
    pub(crate) name: String,
    pub(crate) pose: Pose,
    pub(crate) flags: OwnerFlags,
    pub(crate) listener: Option<ListenerHandle>,
    /// Last pose forwarded to the listener, listener offset included
    pub(crate) last_listener_pose: Option<Pose>,
    pub(crate) proxies: ProxyTable,
    pub(crate) fade_distance: f32,
    pub(crate) environment_fade_distance: f32,
    pub(crate) environment: Option<EnvironmentId>,
    pub(crate) area_membership: AreaMembership,
    /// Blend between overlapping areas reported with the last area event
    pub(crate) area_blend: Option<f32>,
}

impl AudioOwner {
    pub(crate) fn new(id: OwnerId, name: String, pose: Pose) -> Self {
        Self {
            id,
            name,
            pose,
            flags: OwnerFlags::default(),
            listener: None,
            last_listener_pose: None,
            proxies: ProxyTable::new(),
            fade_distance: 0.0,
            environment_fade_distance: 0.0,
            environment: None,
            area_membership: AreaMembership::None,
            area_blend: None,
        }
    }

    pub fn id(&self) -> OwnerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn flags(&self) -> OwnerFlags {
        self.flags
    }

    pub fn listener(&self) -> Option<ListenerHandle> {
        self.listener
    }

    pub fn proxies(&self) -> &ProxyTable {
        &self.proxies
    }

    pub fn area_membership(&self) -> AreaMembership {
        self.area_membership
    }

    pub fn area_blend(&self) -> Option<f32> {
        self.area_blend
    }

    pub fn environment(&self) -> Option<EnvironmentId> {
        self.environment
    }

    /// Id of the owner's current implicit proxy, [`ProxyId::INVALID`] for listeners.
    pub fn default_proxy_id(&self) -> ProxyId {
        self.proxies.default_proxy_id()
    }

    /// Larger of the two relevance radii, used by the host for culling.
    pub fn greatest_fade_distance(&self) -> f32 {
        self.fade_distance.max(self.environment_fade_distance)
    }

    pub fn sync_mode(&self) -> Result<SyncMode> {
        match (self.flags.follow_transform, self.flags.is_listener) {
            (true, true) => Err(EntityAudioError::InvalidOwnerFlags(self.id)),
            (true, false) => Ok(SyncMode::Follow),
            (false, true) => Ok(SyncMode::ListenerAnchored),
            (false, false) => Ok(SyncMode::Detached),
        }
    }

    /// Read-only owner view alongside mutable access to its proxy table.
    pub(crate) fn split_proxies(&mut self) -> (OwnerView<'_>, &mut ProxyTable) {
        let view = OwnerView {
            id: self.id,
            name: &self.name,
            pose: self.pose,
            is_listener: self.flags.is_listener,
            audio_disabled: self.flags.audio_disabled,
        };
        (view, &mut self.proxies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greatest_fade_distance() {
        let mut owner = AudioOwner::new(OwnerId::new(), "wind".to_string(), Pose::identity());
        owner.fade_distance = 12.0;
        owner.environment_fade_distance = 30.0;
        assert_eq!(owner.greatest_fade_distance(), 30.0);
    }

    #[test]
    fn test_sync_mode_from_flags() {
        let mut owner = AudioOwner::new(OwnerId::new(), "x".to_string(), Pose::identity());
        assert_eq!(owner.sync_mode().unwrap(), SyncMode::Follow);

        owner.flags.follow_transform = false;
        assert_eq!(owner.sync_mode().unwrap(), SyncMode::Detached);

        owner.flags.is_listener = true;
        assert_eq!(owner.sync_mode().unwrap(), SyncMode::ListenerAnchored);

        owner.flags.follow_transform = true;
        assert!(matches!(
            owner.sync_mode(),
            Err(EntityAudioError::InvalidOwnerFlags(_))
        ));
    }
}
