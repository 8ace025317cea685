use super::{ControlOperation, MAX_OBJECT_NAME_LENGTH, ProxyId};
use crate::backend::{AudioBackend, EmissionObjectDesc, ObjectHandle, OcclusionType};
use crate::error::{EntityAudioError, Result};
use crate::math::Pose;
use crate::world::OwnerId;

/// The parts of an owner a [`ProxyTable`] needs to read.
#[derive(Debug, Clone, Copy)]
pub struct OwnerView<'a> {
    pub id: OwnerId,
    pub name: &'a str,
    pub pose: Pose,
    pub is_listener: bool,
    pub audio_disabled: bool,
}

/// One emission point of an owner.
#[derive(Debug, Clone)]
pub struct ProxyEntry {
    pub id: ProxyId,
    pub handle: ObjectHandle,
    /// Placement relative to the owner
    pub offset: Pose,
    /// Created on owner registration; cannot be removed explicitly
    pub implicit: bool,
}

/// Proxies of a single owner, kept in insertion (and therefore id) order.
#[derive(Debug, Default)]
pub struct ProxyTable {
    entries: Vec<ProxyEntry>,
    id_counter: u32,
}

impl ProxyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<ProxyId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    pub fn entries(&self) -> &[ProxyEntry] {
        &self.entries
    }

    pub fn handle(&self, id: ProxyId) -> Option<ObjectHandle> {
        self.find(id).map(|entry| entry.handle)
    }

    /// Id of the implicit proxy, [`ProxyId::INVALID`] when there is none.
    pub fn default_proxy_id(&self) -> ProxyId {
        self.entries
            .iter()
            .find(|entry| entry.implicit)
            .map(|entry| entry.id)
            .unwrap_or(ProxyId::INVALID)
    }

    /// Allocates the next id and a backend object at the owner's pose.
    ///
    /// Returns [`ProxyId::INVALID`] for listener owners and when the backend
    /// cannot allocate. Running out of ids is a hard error.
    pub fn create_proxy(
        &mut self,
        owner: &OwnerView<'_>,
        name: Option<&str>,
        implicit: bool,
        occlusion: OcclusionType,
        aux_name_suffix: &str,
        backend: &mut dyn AudioBackend,
    ) -> Result<ProxyId> {
        if owner.is_listener {
            log::debug!(
                "Owner '{}' is a listener, not creating an emission proxy",
                owner.name
            );
            return Ok(ProxyId::INVALID);
        }

        if self.id_counter == u32::MAX {
            log::error!("Exceeded proxy id limits on owner '{}'", owner.name);
            return Err(EntityAudioError::ProxyIdExhausted(owner.id));
        }

        let object_name = match name {
            Some(name) => truncate_name(name.to_string()),
            None => auto_name(owner.name, self.entries.len(), aux_name_suffix),
        };

        let desc = EmissionObjectDesc {
            name: &object_name,
            transform: owner.pose,
            owner: owner.id,
            occlusion,
            set_current_environments: true,
        };
        let Some(handle) = backend.create_emission_object(&desc) else {
            log::error!(
                "Backend could not allocate emission object '{}' for owner '{}'",
                object_name,
                owner.name
            );
            return Ok(ProxyId::INVALID);
        };

        self.id_counter += 1;
        let id = ProxyId(self.id_counter);
        self.entries.push(ProxyEntry {
            id,
            handle,
            offset: Pose::identity(),
            implicit,
        });
        log::debug!(
            "Created {} '{}' on owner '{}' ({} proxies)",
            id,
            object_name,
            owner.name,
            self.entries.len()
        );
        Ok(id)
    }

    /// Releases the proxy's backend object and forgets it.
    pub fn remove_proxy(
        &mut self,
        id: ProxyId,
        owner_name: &str,
        backend: &mut dyn AudioBackend,
    ) -> bool {
        if !id.is_valid() {
            log::error!(
                "Trying to remove a proxy with the all-proxies id on owner '{}'",
                owner_name
            );
            return false;
        }

        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            log::warn!("{} not found on owner '{}' during removal", id, owner_name);
            return false;
        };

        if self.entries[index].implicit {
            log::error!(
                "Trying to remove the default proxy of owner '{}'",
                owner_name
            );
            return false;
        }

        let entry = self.entries.remove(index);
        backend.release_object(entry.handle);
        true
    }

    /// Applies `op` to the proxy `id`, or to every proxy when `id` is [`ProxyId::ALL`].
    ///
    /// Returns whether the operation reached at least one proxy.
    pub fn dispatch(
        &mut self,
        owner: &OwnerView<'_>,
        op: ControlOperation,
        id: ProxyId,
        backend: &mut dyn AudioBackend,
    ) -> bool {
        if op.starts_playback() && owner.audio_disabled {
            log::debug!(
                "Audio disabled on owner '{}', skipping {}",
                owner.name,
                op.name()
            );
            return false;
        }

        let op = op.sanitized();

        if id == ProxyId::ALL {
            for entry in &mut self.entries {
                apply(entry, owner, &op, backend);
            }
            return !self.entries.is_empty();
        }

        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                apply(entry, owner, &op, backend);
                true
            }
            None => {
                log::warn!(
                    "Could not find {} on owner '{}' to {}",
                    id,
                    owner.name,
                    op.name()
                );
                false
            }
        }
    }

    /// Stored offset of `id`, identity if unknown.
    pub fn offset(&self, id: ProxyId) -> Pose {
        self.find(id)
            .map(|entry| entry.offset)
            .unwrap_or_else(Pose::identity)
    }

    /// Maps a backend object back to the proxy that owns it.
    pub fn lookup_id_by_backend_handle(&self, handle: ObjectHandle) -> ProxyId {
        self.entries
            .iter()
            .find(|entry| entry.handle == handle)
            .map(|entry| entry.id)
            .unwrap_or(ProxyId::INVALID)
    }

    /// Moves every proxy to `owner_pose` composed with its offset.
    pub fn reposition_all(&self, owner_pose: Pose, backend: &mut dyn AudioBackend) {
        for entry in &self.entries {
            backend.set_transform(entry.handle, owner_pose.compose(&entry.offset));
        }
    }

    /// Renames every backend object after the owner. The first proxy keeps the
    /// bare name, the rest are numbered from 2.
    pub fn rename(&self, owner_name: &str, aux_name_suffix: &str, backend: &mut dyn AudioBackend) {
        for (index, entry) in self.entries.iter().enumerate() {
            let name = auto_name(owner_name, index, aux_name_suffix);
            backend.set_name(entry.handle, &name);
        }
    }

    /// Releases every backend object. Ids already issued stay retired.
    pub fn release_all(&mut self, backend: &mut dyn AudioBackend) {
        for entry in self.entries.drain(..) {
            backend.release_object(entry.handle);
        }
    }

    fn find(&self, id: ProxyId) -> Option<&ProxyEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    #[cfg(test)]
    pub(crate) fn with_id_counter(id_counter: u32) -> Self {
        Self {
            entries: Vec::new(),
            id_counter,
        }
    }
}

fn apply(
    entry: &mut ProxyEntry,
    owner: &OwnerView<'_>,
    op: &ControlOperation,
    backend: &mut dyn AudioBackend,
) {
    match op {
        ControlOperation::ExecuteTrigger { trigger, options } => {
            backend.set_transform(entry.handle, owner.pose.compose(&entry.offset));
            if !backend.execute_trigger(entry.handle, *trigger, options) {
                log::debug!(
                    "Backend rejected {} on {} of owner '{}'",
                    trigger,
                    entry.id,
                    owner.name
                );
            }
        }
        ControlOperation::StopTrigger { trigger, options } => {
            backend.stop_trigger(entry.handle, *trigger, options);
        }
        ControlOperation::SetParameter { parameter, value } => {
            backend.set_parameter(entry.handle, *parameter, *value);
        }
        ControlOperation::SetSwitchState { switch, state } => {
            backend.set_switch_state(entry.handle, *switch, *state);
        }
        ControlOperation::SetOcclusionType(occlusion) => {
            backend.set_occlusion_type(entry.handle, *occlusion);
        }
        ControlOperation::SetEnvironmentAmount {
            environment,
            amount,
        } => {
            backend.set_environment_amount(entry.handle, *environment, *amount);
        }
        ControlOperation::SetOffset(offset) => {
            entry.offset = *offset;
            backend.set_transform(entry.handle, owner.pose.compose(offset));
        }
        ControlOperation::PlayFile { file, options } => {
            backend.set_transform(entry.handle, owner.pose.compose(&entry.offset));
            backend.play_file(entry.handle, file, options);
        }
        ControlOperation::StopFile { file } => {
            backend.stop_file(entry.handle, file);
        }
        ControlOperation::SetCurrentEnvironments => {
            backend.set_current_environments(entry.handle, owner.id);
        }
    }
}

fn auto_name(owner_name: &str, index: usize, aux_name_suffix: &str) -> String {
    if index == 0 {
        truncate_name(owner_name.to_string())
    } else {
        truncate_name(format!("{}{}{}", owner_name, aux_name_suffix, index + 1))
    }
}

fn truncate_name(mut name: String) -> String {
    if name.len() > MAX_OBJECT_NAME_LENGTH {
        let mut end = MAX_OBJECT_NAME_LENGTH;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name
}
