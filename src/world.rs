use crate::area::{AreaEvent, AreaTransitionPolicy};
use crate::backend::{
    AudioBackend, EnvironmentId, ObjectHandle, OcclusionType, ParameterId, SwitchId,
    SwitchStateId, TriggerId,
};
use crate::config::{EntityAudioDesc, OwnerDesc};
use crate::error::{EntityAudioError, Result};
use crate::events::EntityAudioEvent;
use crate::listener::{ListenerAttributes, ListenerRegistry};
use crate::math::{Pose, Vec3};
use crate::owner::AudioOwner;
use crate::proxy::{ControlOperation, ProxyId};
use crate::request::{CompletionQueue, CompletionSender, RequestOptions, TriggerCompletion};
use crate::sync::{SyncOutcome, TransformSync};
use std::collections::HashMap;
use uuid::Uuid;

/// Lightweight, type-safe handle for a host entity registered with the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}

/// Which parts of a transform changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformFlags {
    pub position: bool,
    pub rotation: bool,
    pub scale: bool,
}

impl TransformFlags {
    pub const ALL: Self = Self {
        position: true,
        rotation: true,
        scale: true,
    };
    pub const POSITION: Self = Self {
        position: true,
        rotation: false,
        scale: false,
    };
    pub const SCALE: Self = Self {
        position: false,
        rotation: false,
        scale: true,
    };

    pub fn moves(&self) -> bool {
        self.position || self.rotation
    }
}

/// Events the host raises on an owner.
#[derive(Clone, Copy)]
pub enum EntityEvent<'a> {
    TransformChanged { pose: Pose, flags: TransformFlags },
    Area(AreaEvent<'a>),
    Renamed(&'a str),
}

/// Simulation context that owns every audio owner, the listener registry,
/// and the backend they talk to.
///
/// `EntityAudioWorld` lives on the simulation thread. All mutation happens
/// there; the backend reports finished triggers through a
/// [`CompletionSender`], and deferred completions are mapped back to their
/// proxies in [`poll_events`](Self::poll_events).
///
/// # Example
///
/// ```ignore
/// let mut world = EntityAudioWorld::new(EntityAudioDesc::default(), Box::new(my_backend))?;
/// let door = world.register_owner(OwnerDesc::new("door"))?;
/// world.execute_trigger(door, TriggerId(42), ProxyId::ALL, RequestOptions::default())?;
///
/// for event in world.poll_events() {
///     // ...
/// }
/// ```
pub struct EntityAudioWorld {
    desc: EntityAudioDesc,
    backend: Box<dyn AudioBackend>,
    listeners: ListenerRegistry,
    owners: HashMap<OwnerId, AudioOwner>,
    completions: CompletionQueue,
    pending_events: Vec<EntityAudioEvent>,
}

impl EntityAudioWorld {
    pub fn new(desc: EntityAudioDesc, backend: Box<dyn AudioBackend>) -> Result<Self> {
        if !desc.listener_epsilon.is_finite() || desc.listener_epsilon < 0.0 {
            return Err(EntityAudioError::Configuration(format!(
                "listener epsilon must be a non-negative number, got {}",
                desc.listener_epsilon
            )));
        }
        if !desc.listener_offset.is_finite() {
            return Err(EntityAudioError::Configuration(
                "listener offset must be finite".to_string(),
            ));
        }

        Ok(Self {
            desc,
            backend,
            listeners: ListenerRegistry::new(),
            owners: HashMap::new(),
            completions: CompletionQueue::new(),
            pending_events: Vec::new(),
        })
    }

    pub fn desc(&self) -> &EntityAudioDesc {
        &self.desc
    }

    /// Sender the backend uses to report finished triggers.
    pub fn completion_sender(&self) -> CompletionSender {
        self.completions.sender()
    }

    /// Installs the hook run on the backend thread for inline completions.
    pub fn set_inline_completion_hook<F>(&self, hook: F)
    where
        F: Fn(&TriggerCompletion) + Send + Sync + 'static,
    {
        self.completions.set_inline_hook(hook);
    }

    /// Registers a host entity and creates its audio objects.
    ///
    /// Listener owners get a listener handle; everyone else gets the implicit
    /// default proxy unless `desc.create_default_proxy` is off.
    pub fn register_owner(&mut self, desc: OwnerDesc) -> Result<OwnerId> {
        validate_pose(&desc.pose)?;

        let id = OwnerId::new();
        let mut owner = AudioOwner::new(id, desc.name, desc.pose);
        owner.fade_distance = desc.fade_distance;
        owner.environment_fade_distance = desc.environment_fade_distance;
        owner.environment = desc.environment;

        let backend = self.backend.as_mut();
        let listeners = &mut self.listeners;
        if desc.is_listener
            && TransformSync::become_listener(&mut owner, listeners, &self.desc, backend)?
        {
            self.pending_events
                .push(EntityAudioEvent::ListenerCreated { owner: id });
        }

        if desc.create_default_proxy {
            let (view, proxies) = owner.split_proxies();
            proxies.create_proxy(
                &view,
                None,
                true,
                self.desc.default_occlusion,
                &self.desc.aux_name_suffix,
                backend,
            )?;
        }
        TransformSync::on_owner_moved(&mut owner, listeners, &self.desc, backend)?;

        log::debug!("Registered owner '{}' as {}", owner.name, id);
        self.owners.insert(id, owner);
        Ok(id)
    }

    /// Releases every backend object of the owner and forgets it.
    pub fn remove_owner(&mut self, id: OwnerId) -> Result<()> {
        let mut owner = self
            .owners
            .remove(&id)
            .ok_or(EntityAudioError::OwnerNotFound(id))?;

        owner.proxies.release_all(self.backend.as_mut());
        if let Some(handle) = owner.listener.take() {
            self.listeners.release_listener(self.backend.as_mut(), handle);
            self.pending_events
                .push(EntityAudioEvent::ListenerReleased { owner: id });
        }
        log::debug!("Removed owner '{}'", owner.name);
        Ok(())
    }

    pub fn owner(&self, id: OwnerId) -> Option<&AudioOwner> {
        self.owners.get(&id)
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Creates an auxiliary proxy named after the owner.
    pub fn create_proxy(&mut self, owner: OwnerId) -> Result<ProxyId> {
        self.create_proxy_internal(owner, None)
    }

    pub fn create_named_proxy(&mut self, owner: OwnerId, name: &str) -> Result<ProxyId> {
        self.create_proxy_internal(owner, Some(name))
    }

    fn create_proxy_internal(&mut self, id: OwnerId, name: Option<&str>) -> Result<ProxyId> {
        let owner = owner_mut(&mut self.owners, id)?;
        let (view, proxies) = owner.split_proxies();
        proxies.create_proxy(
            &view,
            name,
            false,
            self.desc.default_occlusion,
            &self.desc.aux_name_suffix,
            self.backend.as_mut(),
        )
    }

    pub fn remove_proxy(&mut self, owner: OwnerId, proxy: ProxyId) -> Result<bool> {
        let owner = owner_mut(&mut self.owners, owner)?;
        Ok(owner
            .proxies
            .remove_proxy(proxy, &owner.name, self.backend.as_mut()))
    }

    /// Routes `op` to `proxy`, or to every proxy of the owner with [`ProxyId::ALL`].
    ///
    /// `Ok(false)` means the operation reached no proxy.
    pub fn dispatch(
        &mut self,
        owner: OwnerId,
        op: ControlOperation,
        proxy: ProxyId,
    ) -> Result<bool> {
        let owner = owner_mut(&mut self.owners, owner)?;
        let (view, proxies) = owner.split_proxies();
        Ok(proxies.dispatch(&view, op, proxy, self.backend.as_mut()))
    }

    pub fn execute_trigger(
        &mut self,
        owner: OwnerId,
        trigger: TriggerId,
        proxy: ProxyId,
        options: RequestOptions,
    ) -> Result<bool> {
        self.dispatch(
            owner,
            ControlOperation::ExecuteTrigger { trigger, options },
            proxy,
        )
    }

    pub fn stop_trigger(
        &mut self,
        owner: OwnerId,
        trigger: TriggerId,
        proxy: ProxyId,
    ) -> Result<bool> {
        self.dispatch(owner, ControlOperation::stop_trigger(trigger), proxy)
    }

    pub fn set_parameter(
        &mut self,
        owner: OwnerId,
        parameter: ParameterId,
        value: f32,
        proxy: ProxyId,
    ) -> Result<bool> {
        self.dispatch(owner, ControlOperation::set_parameter(parameter, value), proxy)
    }

    pub fn set_switch_state(
        &mut self,
        owner: OwnerId,
        switch: SwitchId,
        state: SwitchStateId,
        proxy: ProxyId,
    ) -> Result<bool> {
        self.dispatch(owner, ControlOperation::set_switch_state(switch, state), proxy)
    }

    pub fn set_occlusion_type(
        &mut self,
        owner: OwnerId,
        occlusion: OcclusionType,
        proxy: ProxyId,
    ) -> Result<bool> {
        self.dispatch(owner, ControlOperation::SetOcclusionType(occlusion), proxy)
    }

    pub fn set_environment_amount(
        &mut self,
        owner: OwnerId,
        environment: EnvironmentId,
        amount: f32,
        proxy: ProxyId,
    ) -> Result<bool> {
        self.dispatch(
            owner,
            ControlOperation::set_environment_amount(environment, amount),
            proxy,
        )
    }

    pub fn set_offset(&mut self, owner: OwnerId, offset: Pose, proxy: ProxyId) -> Result<bool> {
        validate_pose(&offset)?;
        self.dispatch(owner, ControlOperation::SetOffset(offset), proxy)
    }

    pub fn play_file(
        &mut self,
        owner: OwnerId,
        file: &str,
        proxy: ProxyId,
        options: RequestOptions,
    ) -> Result<bool> {
        self.dispatch(
            owner,
            ControlOperation::PlayFile {
                file: file.to_string(),
                options,
            },
            proxy,
        )
    }

    pub fn stop_file(&mut self, owner: OwnerId, file: &str, proxy: ProxyId) -> Result<bool> {
        self.dispatch(
            owner,
            ControlOperation::StopFile {
                file: file.to_string(),
            },
            proxy,
        )
    }

    pub fn set_current_environments(&mut self, owner: OwnerId, proxy: ProxyId) -> Result<bool> {
        self.dispatch(owner, ControlOperation::SetCurrentEnvironments, proxy)
    }

    pub fn proxy_offset(&self, owner: OwnerId, proxy: ProxyId) -> Result<Pose> {
        Ok(owner_ref(&self.owners, owner)?.proxies.offset(proxy))
    }

    pub fn lookup_proxy_by_handle(&self, owner: OwnerId, handle: ObjectHandle) -> Result<ProxyId> {
        Ok(owner_ref(&self.owners, owner)?
            .proxies
            .lookup_id_by_backend_handle(handle))
    }

    /// Id of the owner's current implicit proxy.
    ///
    /// [`ProxyId::DEFAULT`] until the owner goes through the listener role,
    /// [`ProxyId::INVALID`] while it is a listener or if it was registered
    /// without one.
    pub fn default_proxy_id(&self, owner: OwnerId) -> Result<ProxyId> {
        Ok(owner_ref(&self.owners, owner)?.default_proxy_id())
    }

    pub fn greatest_fade_distance(&self, owner: OwnerId) -> Result<f32> {
        Ok(owner_ref(&self.owners, owner)?.greatest_fade_distance())
    }

    pub fn set_fade_distances(
        &mut self,
        owner: OwnerId,
        fade: f32,
        environment_fade: f32,
    ) -> Result<()> {
        let owner = owner_mut(&mut self.owners, owner)?;
        owner.fade_distance = fade;
        owner.environment_fade_distance = environment_fade;
        Ok(())
    }

    /// Lets the owner's proxies follow (or stop following) its transform.
    ///
    /// Listener owners cannot follow; the request is refused with `Ok(false)`.
    pub fn set_follow_transform(&mut self, owner: OwnerId, follow: bool) -> Result<bool> {
        let owner = owner_mut(&mut self.owners, owner)?;
        if follow && owner.flags.is_listener {
            log::warn!(
                "Owner '{}' is a listener and cannot follow its transform",
                owner.name
            );
            return Ok(false);
        }
        owner.flags.follow_transform = follow;
        Ok(true)
    }

    pub fn set_audio_disabled(&mut self, owner: OwnerId, disabled: bool) -> Result<()> {
        owner_mut(&mut self.owners, owner)?.flags.audio_disabled = disabled;
        Ok(())
    }

    /// Moves the owner between emitter and listener roles.
    ///
    /// Returns `Ok(false)` when the owner already had the requested role, or
    /// when the backend could not allocate the listener. No event is queued then.
    pub fn set_listener(&mut self, id: OwnerId, is_listener: bool) -> Result<bool> {
        let owner = owner_mut(&mut self.owners, id)?;
        let backend = self.backend.as_mut();
        let changed = if is_listener {
            TransformSync::become_listener(owner, &mut self.listeners, &self.desc, backend)?
        } else {
            TransformSync::leave_listener(owner, &mut self.listeners, &self.desc, backend)?
        };
        owner.sync_mode()?;

        if changed {
            self.pending_events.push(if is_listener {
                EntityAudioEvent::ListenerCreated { owner: id }
            } else {
                EntityAudioEvent::ListenerReleased { owner: id }
            });
        }
        Ok(changed)
    }

    /// Sets the owner's authoritative world pose and propagates it.
    pub fn set_world_pose(&mut self, id: OwnerId, pose: Pose) -> Result<SyncOutcome> {
        validate_pose(&pose)?;
        let owner = owner_mut(&mut self.owners, id)?;
        owner.pose = pose;

        let outcome = TransformSync::on_owner_moved(
            owner,
            &mut self.listeners,
            &self.desc,
            self.backend.as_mut(),
        )?;
        if outcome == SyncOutcome::ListenerUpdated {
            self.pending_events
                .push(EntityAudioEvent::AreaUpdateRequested { owner: id });
        }
        Ok(outcome)
    }

    /// Moves the owner to `position`, keeping its rotation.
    pub fn set_world_position(&mut self, id: OwnerId, position: Vec3) -> Result<SyncOutcome> {
        let rotation = owner_ref(&self.owners, id)?.pose.rotation;
        self.set_world_pose(id, Pose::new(position, rotation))
    }

    /// Entry point for events raised by the host entity system.
    pub fn on_entity_event(&mut self, id: OwnerId, event: EntityEvent<'_>) -> Result<()> {
        match event {
            EntityEvent::TransformChanged { pose, flags } => {
                if flags.moves() {
                    self.set_world_pose(id, pose)?;
                }
            }
            EntityEvent::Area(area_event) => {
                let Some(transition) = AreaTransitionPolicy::resolve(&area_event) else {
                    return Ok(());
                };
                let owner = owner_mut(&mut self.owners, id)?;
                owner.area_membership = transition.membership;
                owner.area_blend = transition.blend;
                if let Some(position) = transition.position {
                    self.set_world_position(id, position)?;
                }
            }
            EntityEvent::Renamed(name) => {
                let owner = owner_mut(&mut self.owners, id)?;
                owner.name = name.to_string();
                owner
                    .proxies
                    .rename(&owner.name, &self.desc.aux_name_suffix, self.backend.as_mut());
            }
        }
        Ok(())
    }

    /// Applies `source`'s environment to every proxy of `target`.
    ///
    /// An owner never applies its own environment to itself; that case and a
    /// source without an environment report `Ok(false)`.
    pub fn apply_environment_to(
        &mut self,
        source: OwnerId,
        target: OwnerId,
        amount: f32,
    ) -> Result<bool> {
        if source == target {
            return Ok(false);
        }
        let Some(environment) = owner_ref(&self.owners, source)?.environment else {
            return Ok(false);
        };
        self.set_environment_amount(target, environment, amount, ProxyId::ALL)
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Attributes of the representative listener (the first created one still alive).
    pub fn active_listener_attributes(&self) -> ListenerAttributes {
        self.listeners.active_attributes()
    }

    /// Advances per-frame state. Call once per simulation frame.
    pub fn update(&mut self, delta_time: f32) {
        self.listeners.update(delta_time);
    }

    /// Drains pending events and maps deferred completions back to their proxies.
    ///
    /// Completions whose owner or proxy is gone are dropped.
    pub fn poll_events(&mut self) -> Vec<EntityAudioEvent> {
        let mut events = std::mem::take(&mut self.pending_events);

        for completion in self.completions.drain() {
            let Some(owner) = self.owners.get(&completion.owner) else {
                log::debug!(
                    "Dropping completion of {} for removed {}",
                    completion.trigger,
                    completion.owner
                );
                continue;
            };

            let proxy_id = owner.proxies.lookup_id_by_backend_handle(completion.source);
            if !proxy_id.is_valid() {
                log::debug!(
                    "Dropping completion of {} for removed proxy on owner '{}'",
                    completion.trigger,
                    owner.name
                );
                continue;
            }

            events.push(EntityAudioEvent::TriggerFinished {
                owner: completion.owner,
                proxy_id,
                trigger: completion.trigger,
                user_tag: completion.user_tag,
                success: completion.success,
            });
        }

        events
    }

    /// Releases every backend object. The world stays usable but empty.
    pub fn shutdown(&mut self) {
        for (_, mut owner) in self.owners.drain() {
            owner.proxies.release_all(self.backend.as_mut());
            owner.listener = None;
        }
        self.listeners.release_all(self.backend.as_mut());
        self.pending_events.clear();
    }
}

impl Drop for EntityAudioWorld {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn owner_ref(owners: &HashMap<OwnerId, AudioOwner>, id: OwnerId) -> Result<&AudioOwner> {
    owners.get(&id).ok_or_else(|| {
        log::error!("Audio operation on unknown {}", id);
        EntityAudioError::OwnerNotFound(id)
    })
}

fn owner_mut(owners: &mut HashMap<OwnerId, AudioOwner>, id: OwnerId) -> Result<&mut AudioOwner> {
    owners.get_mut(&id).ok_or_else(|| {
        log::error!("Audio operation on unknown {}", id);
        EntityAudioError::OwnerNotFound(id)
    })
}

fn validate_pose(pose: &Pose) -> Result<()> {
    if pose.is_finite() {
        Ok(())
    } else {
        Err(EntityAudioError::InvalidTransform(format!("{:?}", pose)))
    }
}
