//! Transform synchronization between owners and their backend objects.
//!
//! An owner is in exactly one [`SyncMode`]. Ordinary emitters push their
//! pose to every proxy; listener owners forward it to their listener handle,
//! filtered by the configured epsilon so floating-point jitter does not
//! churn the backend.

use crate::backend::AudioBackend;
use crate::config::EntityAudioDesc;
use crate::error::Result;
use crate::listener::ListenerRegistry;
use crate::owner::AudioOwner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Proxies follow the owner's world transform
    Follow,
    /// Owner drives its listener handle and has no proxies
    ListenerAnchored,
    /// Proxies stay where they are when the owner moves
    Detached,
}

/// What a transform change did on the backend side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    ProxiesRepositioned(usize),
    /// The listener pose changed; areas should recompute membership
    ListenerUpdated,
    /// Change was below the listener epsilon
    ListenerSuppressed,
    Detached,
}

pub struct TransformSync;

impl TransformSync {
    /// Propagates the owner's current pose according to its sync mode.
    pub fn on_owner_moved(
        owner: &mut AudioOwner,
        listeners: &mut ListenerRegistry,
        desc: &EntityAudioDesc,
        backend: &mut dyn AudioBackend,
    ) -> Result<SyncOutcome> {
        match owner.sync_mode()? {
            SyncMode::Follow => {
                owner.proxies.reposition_all(owner.pose, backend);
                Ok(SyncOutcome::ProxiesRepositioned(owner.proxies.len()))
            }
            SyncMode::Detached => Ok(SyncOutcome::Detached),
            SyncMode::ListenerAnchored => {
                let target = owner.pose.translated(desc.listener_offset);
                let unchanged = owner
                    .last_listener_pose
                    .is_some_and(|last| last.is_equivalent(&target, desc.listener_epsilon));
                if unchanged {
                    return Ok(SyncOutcome::ListenerSuppressed);
                }

                owner.last_listener_pose = Some(target);
                if let Some(handle) = owner.listener {
                    listeners.set_pose(backend, handle, target);
                }
                Ok(SyncOutcome::ListenerUpdated)
            }
        }
    }

    /// Turns an emitter into a listener: a listener handle is created at its
    /// pose, its proxies are released, and it stops following its transform.
    ///
    /// Returns `false` if the owner already was a listener, or if the backend
    /// could not allocate a listener. The owner is left untouched in both cases.
    pub fn become_listener(
        owner: &mut AudioOwner,
        listeners: &mut ListenerRegistry,
        desc: &EntityAudioDesc,
        backend: &mut dyn AudioBackend,
    ) -> Result<bool> {
        if owner.flags.is_listener {
            return Ok(false);
        }

        let Some(handle) = listeners.create_listener(backend) else {
            log::error!(
                "Owner '{}' stays an emitter, no backend listener available",
                owner.name
            );
            return Ok(false);
        };

        owner.proxies.release_all(backend);
        owner.flags.follow_transform = false;
        owner.flags.is_listener = true;
        owner.listener = Some(handle);

        let target = owner.pose.translated(desc.listener_offset);
        owner.last_listener_pose = Some(target);
        listeners.set_pose(backend, handle, target);

        log::info!("Owner '{}' is now an audio listener", owner.name);
        Ok(true)
    }

    /// Turns a listener back into a following emitter with a fresh implicit proxy.
    ///
    /// Returns `false` if the owner was not a listener.
    pub fn leave_listener(
        owner: &mut AudioOwner,
        listeners: &mut ListenerRegistry,
        desc: &EntityAudioDesc,
        backend: &mut dyn AudioBackend,
    ) -> Result<bool> {
        if !owner.flags.is_listener {
            return Ok(false);
        }

        if let Some(handle) = owner.listener.take() {
            listeners.release_listener(backend, handle);
        }
        owner.flags.is_listener = false;
        owner.flags.follow_transform = true;
        owner.last_listener_pose = None;

        let (view, proxies) = owner.split_proxies();
        proxies.create_proxy(
            &view,
            None,
            true,
            desc.default_occlusion,
            &desc.aux_name_suffix,
            backend,
        )?;
        owner.proxies.reposition_all(owner.pose, backend);

        log::info!("Owner '{}' is no longer an audio listener", owner.name);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::OcclusionType;
    use crate::backend::recording::{BackendCall, CallLog, RecordingBackend};
    use crate::math::{Pose, Vec3};
    use crate::proxy::ProxyId;
    use crate::world::OwnerId;

    struct Fixture {
        backend: RecordingBackend,
        log: CallLog,
        listeners: ListenerRegistry,
        desc: EntityAudioDesc,
    }

    impl Fixture {
        fn new(desc: EntityAudioDesc) -> Self {
            let (backend, log) = RecordingBackend::new();
            Self {
                backend,
                log,
                listeners: ListenerRegistry::new(),
                desc,
            }
        }

        fn emitter(&mut self, proxies: usize) -> AudioOwner {
            let mut owner =
                AudioOwner::new(OwnerId::new(), "emitter".to_string(), Pose::identity());
            for _ in 0..proxies {
                let (view, table) = owner.split_proxies();
                table
                    .create_proxy(
                        &view,
                        None,
                        false,
                        OcclusionType::Ignore,
                        &self.desc.aux_name_suffix,
                        &mut self.backend,
                    )
                    .unwrap();
            }
            owner
        }

        fn moved(&mut self, owner: &mut AudioOwner) -> SyncOutcome {
            let desc = &self.desc;
            TransformSync::on_owner_moved(owner, &mut self.listeners, desc, &mut self.backend)
                .unwrap()
        }

        fn become_listener(&mut self, owner: &mut AudioOwner) -> bool {
            let desc = &self.desc;
            TransformSync::become_listener(owner, &mut self.listeners, desc, &mut self.backend)
                .unwrap()
        }

        fn leave_listener(&mut self, owner: &mut AudioOwner) -> bool {
            let desc = &self.desc;
            TransformSync::leave_listener(owner, &mut self.listeners, desc, &mut self.backend)
                .unwrap()
        }
    }

    #[test]
    fn test_follow_repositions_every_proxy() {
        let mut fixture = Fixture::new(EntityAudioDesc::default());
        let mut owner = fixture.emitter(2);
        fixture.log.clear();

        owner.pose = Pose::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(fixture.moved(&mut owner), SyncOutcome::ProxiesRepositioned(2));
        assert_eq!(
            fixture.log.count(|c| matches!(c, BackendCall::SetTransform(..))),
            2
        );
    }

    #[test]
    fn test_listener_epsilon_suppresses_jitter() {
        let mut fixture = Fixture::new(EntityAudioDesc::default());
        let mut owner = fixture.emitter(0);
        fixture.become_listener(&mut owner);
        fixture.log.clear();

        owner.pose = Pose::from_position(Vec3::new(0.005, 0.0, 0.0));
        assert_eq!(fixture.moved(&mut owner), SyncOutcome::ListenerSuppressed);
        assert!(fixture.log.calls().is_empty());

        owner.pose = Pose::from_position(Vec3::new(0.01, 0.0, 0.0));
        assert_eq!(fixture.moved(&mut owner), SyncOutcome::ListenerUpdated);
        assert_eq!(
            fixture.log.count(|c| matches!(c, BackendCall::SetTransform(..))),
            1
        );
    }

    #[test]
    fn test_listener_offset_is_applied() {
        let desc = EntityAudioDesc::default().listener_offset(Vec3::new(0.0, 1.7, 0.0));
        let mut fixture = Fixture::new(desc);
        let mut owner = fixture.emitter(0);
        fixture.become_listener(&mut owner);

        assert_eq!(
            fixture.listeners.active_attributes().pose.position,
            Vec3::new(0.0, 1.7, 0.0)
        );
    }

    #[test]
    fn test_become_listener_releases_proxies() {
        let mut fixture = Fixture::new(EntityAudioDesc::default());
        let mut owner = fixture.emitter(2);
        let handles: Vec<_> = owner.proxies.entries().iter().map(|e| e.handle).collect();
        fixture.log.clear();

        assert!(fixture.become_listener(&mut owner));
        assert!(!fixture.become_listener(&mut owner));

        let calls = fixture.log.calls();
        for handle in handles {
            assert!(calls.contains(&BackendCall::Release(handle)));
        }
        assert_eq!(
            fixture.log.count(|c| matches!(c, BackendCall::CreateListener(_))),
            1
        );
        assert_eq!(owner.sync_mode().unwrap(), SyncMode::ListenerAnchored);
        assert!(owner.proxies.is_empty());
    }

    #[test]
    fn test_failed_listener_allocation_keeps_emitter() {
        let mut fixture = Fixture::new(EntityAudioDesc::default());
        let mut owner = fixture.emitter(1);
        fixture.log.fail_allocations_after(0);
        fixture.log.clear();

        assert!(!fixture.become_listener(&mut owner));
        assert!(fixture.log.calls().is_empty());
        assert_eq!(owner.sync_mode().unwrap(), SyncMode::Follow);
        assert!(owner.listener.is_none());
        assert_eq!(owner.proxies.len(), 1);
        assert_eq!(fixture.listeners.active_count(), 0);
    }

    #[test]
    fn test_leave_listener_restores_default_proxy() {
        let mut fixture = Fixture::new(EntityAudioDesc::default());
        let mut owner = fixture.emitter(1);
        fixture.become_listener(&mut owner);

        assert!(fixture.leave_listener(&mut owner));
        assert_eq!(fixture.listeners.active_count(), 0);
        assert_eq!(owner.sync_mode().unwrap(), SyncMode::Follow);
        assert_eq!(owner.proxies.len(), 1);
        assert!(owner.proxies.entries()[0].implicit);
        assert!(owner.proxies.entries()[0].id > ProxyId::DEFAULT);
        assert_eq!(owner.default_proxy_id(), owner.proxies.entries()[0].id);
    }
}
