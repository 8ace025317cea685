//! Audio backend interface.
//!
//! The backend owns the actual listener and emission objects and does all the
//! mixing. This crate only drives those objects through the [`AudioBackend`]
//! trait; object handles are opaque to it.

use crate::math::Pose;
use crate::request::RequestOptions;
use crate::world::OwnerId;

#[cfg(test)]
pub(crate) mod recording;

/// Opaque handle to a backend-owned object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

impl std::fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectHandle({})", self.0)
    }
}

macro_rules! control_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

control_id!(
    /// Backend trigger (event) identifier
    TriggerId
);
control_id!(
    /// Backend real-time parameter identifier
    ParameterId
);
control_id!(
    /// Backend switch identifier
    SwitchId
);
control_id!(
    /// State of a backend switch
    SwitchStateId
);
control_id!(
    /// Backend environment (reverb send) identifier
    EnvironmentId
);

/// How the backend computes occlusion for an emission object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcclusionType {
    #[default]
    Ignore,
    Adaptive,
    Low,
    Medium,
    High,
}

/// Everything the backend needs to create an emission object.
#[derive(Debug, Clone)]
pub struct EmissionObjectDesc<'a> {
    pub name: &'a str,
    pub transform: Pose,
    pub owner: OwnerId,
    pub occlusion: OcclusionType,
    /// Backend should also compute the environments the object is in
    pub set_current_environments: bool,
}

/// Contract between the proxy layer and the audio engine.
///
/// Calls are issued from the simulation thread only. Whether the backend
/// processes them immediately or enqueues them is up to the implementation,
/// guided by the [`RequestOptions`] passed with trigger calls. Completion
/// notifications are delivered through a
/// [`CompletionSender`](crate::request::CompletionSender) handed to the
/// backend by the host.
pub trait AudioBackend {
    /// Allocates a listener object. `None` when the backend is out of objects.
    fn create_listener_object(&mut self) -> Option<ObjectHandle>;

    /// Allocates an emission object positioned at `desc.transform`.
    fn create_emission_object(&mut self, desc: &EmissionObjectDesc<'_>) -> Option<ObjectHandle>;

    fn release_object(&mut self, handle: ObjectHandle);

    fn set_transform(&mut self, handle: ObjectHandle, transform: Pose);

    /// Returns whether the backend accepted the request.
    fn execute_trigger(
        &mut self,
        handle: ObjectHandle,
        trigger: TriggerId,
        options: &RequestOptions,
    ) -> bool;

    fn stop_trigger(&mut self, handle: ObjectHandle, trigger: TriggerId, options: &RequestOptions);

    fn set_parameter(&mut self, handle: ObjectHandle, parameter: ParameterId, value: f32);

    fn set_switch_state(&mut self, handle: ObjectHandle, switch: SwitchId, state: SwitchStateId);

    /// `amount` is within `[0, 1]`.
    fn set_environment_amount(
        &mut self,
        handle: ObjectHandle,
        environment: EnvironmentId,
        amount: f32,
    );

    fn set_occlusion_type(&mut self, handle: ObjectHandle, occlusion: OcclusionType);

    /// Debug name of the object. Default implementation ignores it.
    fn set_name(&mut self, _handle: ObjectHandle, _name: &str) {}

    /// Plays a standalone file on the object. Default implementation does nothing.
    fn play_file(&mut self, _handle: ObjectHandle, _file: &str, _options: &RequestOptions) {}

    /// Default implementation does nothing.
    fn stop_file(&mut self, _handle: ObjectHandle, _file: &str) {}

    /// Asks the backend to recompute which environments the object is in,
    /// ignoring those contributed by `ignore_owner`. Default implementation does nothing.
    fn set_current_environments(&mut self, _handle: ObjectHandle, _ignore_owner: OwnerId) {}
}
