//! Entity audio for PetalSonic hosts.
//!
//! Host entities register as owners of an [`EntityAudioWorld`]. Each owner
//! holds emission proxies on an [`AudioBackend`], or a listener if it is the
//! point sound is heard from. Control operations are routed to a proxy or
//! fanned out to all of them, and trigger completions come back as
//! [`EntityAudioEvent`]s from [`EntityAudioWorld::poll_events`].

pub mod area;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod listener;
pub mod math;
pub mod owner;
pub mod proxy;
pub mod request;
pub mod spot;
pub mod sync;
pub mod world;

pub use area::{AreaEvent, AreaMembership, AreaSubject, AreaTransitionPolicy, AreaVolume};
pub use backend::{AudioBackend, ObjectHandle, OcclusionType, TriggerId};
pub use config::{EntityAudioDesc, OwnerDesc};
pub use error::EntityAudioError;
pub use events::EntityAudioEvent;
pub use listener::{ListenerAttributes, ListenerHandle};
pub use owner::{AudioOwner, OwnerFlags};
pub use proxy::{ControlOperation, ProxyId};
pub use request::{CallbackDelivery, ExecutionMode, RequestOptions, TriggerCompletion};
pub use spot::{AudioSpot, AudioSpotSettings, PlayMode};
pub use sync::{SyncMode, SyncOutcome};
pub use world::{EntityAudioWorld, EntityEvent, OwnerId, TransformFlags};
