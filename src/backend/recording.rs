//! Backend test double that records every call.

use super::*;
use crate::request::{CallbackDelivery, CompletionSender, TriggerCompletion};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BackendCall {
    CreateListener(ObjectHandle),
    CreateEmission {
        handle: ObjectHandle,
        name: String,
        transform: Pose,
    },
    Release(ObjectHandle),
    SetTransform(ObjectHandle, Pose),
    ExecuteTrigger(ObjectHandle, TriggerId, RequestOptions),
    StopTrigger(ObjectHandle, TriggerId),
    SetParameter(ObjectHandle, ParameterId, f32),
    SetSwitchState(ObjectHandle, SwitchId, SwitchStateId),
    SetEnvironmentAmount(ObjectHandle, EnvironmentId, f32),
    SetOcclusionType(ObjectHandle, OcclusionType),
    SetName(ObjectHandle, String),
    PlayFile(ObjectHandle, String),
    StopFile(ObjectHandle, String),
    SetCurrentEnvironments(ObjectHandle, OwnerId),
}

#[derive(Default)]
struct Shared {
    calls: Vec<BackendCall>,
    pending: Vec<(TriggerCompletion, CallbackDelivery)>,
    /// Allocations left before the backend runs out of objects, `None` for unlimited
    allocations_left: Option<usize>,
}

/// Inspection side of a [`RecordingBackend`], usable after the backend is boxed.
#[derive(Clone)]
pub(crate) struct CallLog(Arc<Mutex<Shared>>);

impl CallLog {
    pub(crate) fn calls(&self) -> Vec<BackendCall> {
        self.0.lock().unwrap().calls.clone()
    }

    pub(crate) fn clear(&self) {
        self.0.lock().unwrap().calls.clear();
    }

    pub(crate) fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.0
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// Lets the next `count` allocations succeed and fails every one after.
    pub(crate) fn fail_allocations_after(&self, count: usize) {
        self.0.lock().unwrap().allocations_left = Some(count);
    }

    /// Finishes every trigger that asked for a completion, in request order.
    pub(crate) fn complete_pending(&self, sender: &CompletionSender, success: bool) {
        let pending: Vec<_> = self.0.lock().unwrap().pending.drain(..).collect();
        for (mut completion, delivery) in pending {
            completion.success = success;
            sender.deliver(completion, delivery);
        }
    }
}

pub(crate) struct RecordingBackend {
    shared: Arc<Mutex<Shared>>,
    owners: HashMap<ObjectHandle, OwnerId>,
    next_handle: u64,
}

impl RecordingBackend {
    pub(crate) fn new() -> (Self, CallLog) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let backend = Self {
            shared: shared.clone(),
            owners: HashMap::new(),
            next_handle: 100,
        };
        (backend, CallLog(shared))
    }

    fn record(&self, call: BackendCall) {
        self.shared.lock().unwrap().calls.push(call);
    }

    fn allocate(&mut self) -> Option<ObjectHandle> {
        if let Some(left) = self.shared.lock().unwrap().allocations_left.as_mut() {
            if *left == 0 {
                return None;
            }
            *left -= 1;
        }
        self.next_handle += 1;
        Some(ObjectHandle(self.next_handle))
    }
}

impl AudioBackend for RecordingBackend {
    fn create_listener_object(&mut self) -> Option<ObjectHandle> {
        let handle = self.allocate()?;
        self.record(BackendCall::CreateListener(handle));
        Some(handle)
    }

    fn create_emission_object(&mut self, desc: &EmissionObjectDesc<'_>) -> Option<ObjectHandle> {
        let handle = self.allocate()?;
        self.owners.insert(handle, desc.owner);
        self.record(BackendCall::CreateEmission {
            handle,
            name: desc.name.to_string(),
            transform: desc.transform,
        });
        Some(handle)
    }

    fn release_object(&mut self, handle: ObjectHandle) {
        self.owners.remove(&handle);
        self.record(BackendCall::Release(handle));
    }

    fn set_transform(&mut self, handle: ObjectHandle, transform: Pose) {
        self.record(BackendCall::SetTransform(handle, transform));
    }

    fn execute_trigger(
        &mut self,
        handle: ObjectHandle,
        trigger: TriggerId,
        options: &RequestOptions,
    ) -> bool {
        self.record(BackendCall::ExecuteTrigger(handle, trigger, *options));
        if options.wants_callback() {
            if let Some(owner) = self.owners.get(&handle) {
                let completion = TriggerCompletion {
                    owner: *owner,
                    source: handle,
                    trigger,
                    user_tag: options.user_tag,
                    success: true,
                };
                self.shared
                    .lock()
                    .unwrap()
                    .pending
                    .push((completion, options.callback));
            }
        }
        true
    }

    fn stop_trigger(
        &mut self,
        handle: ObjectHandle,
        trigger: TriggerId,
        _options: &RequestOptions,
    ) {
        self.record(BackendCall::StopTrigger(handle, trigger));
    }

    fn set_parameter(&mut self, handle: ObjectHandle, parameter: ParameterId, value: f32) {
        self.record(BackendCall::SetParameter(handle, parameter, value));
    }

    fn set_switch_state(&mut self, handle: ObjectHandle, switch: SwitchId, state: SwitchStateId) {
        self.record(BackendCall::SetSwitchState(handle, switch, state));
    }

    fn set_environment_amount(
        &mut self,
        handle: ObjectHandle,
        environment: EnvironmentId,
        amount: f32,
    ) {
        self.record(BackendCall::SetEnvironmentAmount(handle, environment, amount));
    }

    fn set_occlusion_type(&mut self, handle: ObjectHandle, occlusion: OcclusionType) {
        self.record(BackendCall::SetOcclusionType(handle, occlusion));
    }

    fn set_name(&mut self, handle: ObjectHandle, name: &str) {
        self.record(BackendCall::SetName(handle, name.to_string()));
    }

    fn play_file(&mut self, handle: ObjectHandle, file: &str, _options: &RequestOptions) {
        self.record(BackendCall::PlayFile(handle, file.to_string()));
    }

    fn stop_file(&mut self, handle: ObjectHandle, file: &str) {
        self.record(BackendCall::StopFile(handle, file.to_string()));
    }

    fn set_current_environments(&mut self, handle: ObjectHandle, ignore_owner: OwnerId) {
        self.record(BackendCall::SetCurrentEnvironments(handle, ignore_owner));
    }
}
