//! Configuration for PetalSonic entity audio

use crate::backend::{EnvironmentId, OcclusionType};
use crate::math::{Pose, Vec3};

/// World-wide settings shared by every owner.
#[derive(Debug, Clone)]
pub struct EntityAudioDesc {
    /// Added to the translation of every listener owner before it reaches the backend
    pub listener_offset: Vec3,
    /// Listener poses closer than this (per component) to the last applied pose are not forwarded
    pub listener_epsilon: f32,
    /// Suffix inserted between the owner name and the index of additional proxies
    pub aux_name_suffix: String,
    /// Occlusion type requested for newly created proxies
    pub default_occlusion: OcclusionType,
}

impl Default for EntityAudioDesc {
    fn default() -> Self {
        Self {
            listener_offset: Vec3::ZERO,
            listener_epsilon: 0.01,
            aux_name_suffix: "_aux_object_#".to_string(),
            default_occlusion: OcclusionType::Ignore,
        }
    }
}

impl EntityAudioDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_offset(mut self, offset: Vec3) -> Self {
        self.listener_offset = offset;
        self
    }

    pub fn listener_epsilon(mut self, epsilon: f32) -> Self {
        self.listener_epsilon = epsilon;
        self
    }

    pub fn aux_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.aux_name_suffix = suffix.into();
        self
    }

    pub fn default_occlusion(mut self, occlusion: OcclusionType) -> Self {
        self.default_occlusion = occlusion;
        self
    }
}

/// Registration settings for one owner entity.
#[derive(Debug, Clone)]
pub struct OwnerDesc {
    /// Display name, also used to name the owner's backend objects
    pub name: String,
    /// Initial world pose
    pub pose: Pose,
    /// Owner is tagged as the audio listener
    pub is_listener: bool,
    /// Create the implicit default proxy on registration
    pub create_default_proxy: bool,
    /// Sound relevance radius
    pub fade_distance: f32,
    /// Environment relevance radius
    pub environment_fade_distance: f32,
    /// Environment this owner applies to others, if any
    pub environment: Option<EnvironmentId>,
}

impl Default for OwnerDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            pose: Pose::identity(),
            is_listener: false,
            create_default_proxy: true,
            fade_distance: 0.0,
            environment_fade_distance: 0.0,
            environment: None,
        }
    }
}

impl OwnerDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn listener(mut self, is_listener: bool) -> Self {
        self.is_listener = is_listener;
        self
    }

    pub fn create_default_proxy(mut self, create: bool) -> Self {
        self.create_default_proxy = create;
        self
    }

    pub fn fade_distances(mut self, fade: f32, environment_fade: f32) -> Self {
        self.fade_distance = fade;
        self.environment_fade_distance = environment_fade;
        self
    }

    pub fn environment(mut self, environment: EnvironmentId) -> Self {
        self.environment = Some(environment);
        self
    }
}
