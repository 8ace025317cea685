//! Listener registry.
//!
//! Owns every listener handle created on the backend and exposes one
//! representative listener for consumers that need a single reference point.
//! The representative is the first-created listener that is still registered;
//! with several listeners (split-screen, for example) the others are tracked
//! and positioned but never mixed into [`ListenerRegistry::active_attributes`].

use crate::backend::{AudioBackend, ObjectHandle};
use crate::math::{Pose, Vec3};

/// Backend listener object, the ears of one owner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle(ObjectHandle);

impl ListenerHandle {
    pub fn object(&self) -> ObjectHandle {
        self.0
    }
}

impl std::fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ListenerHandle({})", self.0.0)
    }
}

/// Spatial attributes of a listener as read by the backend's panning math.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ListenerAttributes {
    pub pose: Pose,
    /// World units per second, derived from pose history in [`ListenerRegistry::update`]
    pub velocity: Vec3,
}

#[derive(Debug)]
struct ListenerEntry {
    handle: ListenerHandle,
    attributes: ListenerAttributes,
    previous_position: Option<Vec3>,
}

#[derive(Debug, Default)]
pub struct ListenerRegistry {
    active: Vec<ListenerEntry>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a backend listener and registers it. `None` if the backend cannot allocate.
    pub fn create_listener(&mut self, backend: &mut dyn AudioBackend) -> Option<ListenerHandle> {
        let Some(object) = backend.create_listener_object() else {
            log::error!("Backend could not allocate a listener object");
            return None;
        };

        let handle = ListenerHandle(object);
        self.active.push(ListenerEntry {
            handle,
            attributes: ListenerAttributes::default(),
            previous_position: None,
        });
        log::debug!(
            "Created {} ({} active listener(s))",
            handle,
            self.active.len()
        );
        Some(handle)
    }

    /// Unregisters `handle`, then releases its backend object.
    ///
    /// Returns `false` (and releases nothing) if the handle is not registered.
    pub fn release_listener(
        &mut self,
        backend: &mut dyn AudioBackend,
        handle: ListenerHandle,
    ) -> bool {
        let Some(index) = self.active.iter().position(|entry| entry.handle == handle) else {
            log::warn!("Tried to release unknown or already released {}", handle);
            return false;
        };

        self.active.remove(index);
        backend.release_object(handle.object());
        log::debug!(
            "Released {} ({} active listener(s))",
            handle,
            self.active.len()
        );
        true
    }

    /// Stores `pose` for `handle` and forwards it to the backend.
    pub fn set_pose(
        &mut self,
        backend: &mut dyn AudioBackend,
        handle: ListenerHandle,
        pose: Pose,
    ) -> bool {
        let Some(entry) = self.active.iter_mut().find(|entry| entry.handle == handle) else {
            log::warn!("Tried to move unknown {}", handle);
            return false;
        };

        entry.attributes.pose = pose;
        backend.set_transform(handle.object(), pose);
        true
    }

    /// Advances time-dependent listener state once per frame.
    pub fn update(&mut self, delta_time: f32) {
        for entry in &mut self.active {
            let position = entry.attributes.pose.position;
            if let Some(previous) = entry.previous_position {
                if delta_time > 0.0 {
                    entry.attributes.velocity = (position - previous) / delta_time;
                }
            }
            entry.previous_position = Some(position);
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn contains(&self, handle: ListenerHandle) -> bool {
        self.active.iter().any(|entry| entry.handle == handle)
    }

    /// Attributes of the representative listener, or neutral attributes when none exist.
    pub fn active_attributes(&self) -> ListenerAttributes {
        self.active
            .first()
            .map(|entry| entry.attributes)
            .unwrap_or_default()
    }

    pub fn attributes(&self, handle: ListenerHandle) -> Option<ListenerAttributes> {
        self.active
            .iter()
            .find(|entry| entry.handle == handle)
            .map(|entry| entry.attributes)
    }

    /// Releases every listener, for simulation teardown.
    pub fn release_all(&mut self, backend: &mut dyn AudioBackend) {
        for entry in self.active.drain(..) {
            backend.release_object(entry.handle.object());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{BackendCall, RecordingBackend};

    #[test]
    fn test_create_and_release_listener() {
        let (mut backend, log) = RecordingBackend::new();
        let mut registry = ListenerRegistry::new();

        let handle = registry.create_listener(&mut backend).unwrap();
        assert_eq!(registry.active_count(), 1);

        assert!(registry.release_listener(&mut backend, handle));
        assert_eq!(registry.active_count(), 0);
        assert!(log.calls().contains(&BackendCall::Release(handle.object())));
    }

    #[test]
    fn test_double_release_is_noop() {
        let (mut backend, log) = RecordingBackend::new();
        let mut registry = ListenerRegistry::new();

        let handle = registry.create_listener(&mut backend).unwrap();
        assert!(registry.release_listener(&mut backend, handle));
        assert!(!registry.release_listener(&mut backend, handle));
        assert_eq!(log.count(|c| matches!(c, BackendCall::Release(_))), 1);
    }

    #[test]
    fn test_failed_allocation_returns_none() {
        let (mut backend, log) = RecordingBackend::new();
        log.fail_allocations_after(0);
        let mut registry = ListenerRegistry::new();

        assert!(registry.create_listener(&mut backend).is_none());
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_active_attributes_use_first_listener() {
        let (mut backend, _log) = RecordingBackend::new();
        let mut registry = ListenerRegistry::new();

        assert_eq!(registry.active_attributes(), ListenerAttributes::default());

        let first = registry.create_listener(&mut backend).unwrap();
        let second = registry.create_listener(&mut backend).unwrap();
        registry.set_pose(&mut backend, first, Pose::from_position(Vec3::X));
        registry.set_pose(&mut backend, second, Pose::from_position(Vec3::Y));

        assert_eq!(registry.active_attributes().pose.position, Vec3::X);

        registry.release_listener(&mut backend, first);
        assert_eq!(registry.active_attributes().pose.position, Vec3::Y);
    }

    #[test]
    fn test_update_derives_velocity() {
        let (mut backend, _log) = RecordingBackend::new();
        let mut registry = ListenerRegistry::new();
        let handle = registry.create_listener(&mut backend).unwrap();

        registry.update(0.1);
        assert_eq!(registry.active_attributes().velocity, Vec3::ZERO);

        registry.set_pose(&mut backend, handle, Pose::from_position(Vec3::new(1.0, 0.0, 0.0)));
        registry.update(0.1);
        let velocity = registry.active_attributes().velocity;
        assert!((velocity - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    }
}
