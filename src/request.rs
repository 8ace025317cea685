//! Per-call request options and completion delivery.
//!
//! Trigger requests carry a [`RequestOptions`] value telling the backend how
//! to execute them and where the completion notification should land:
//!
//! - [`CallbackDelivery::InlineOnBackendThread`]: the backend invokes the
//!   inline hook right away, on its own thread. The hook must not touch any
//!   proxy or listener state.
//! - [`CallbackDelivery::DeferredOnSimulationThread`]: the completion is
//!   queued on a channel and only mapped back to its proxy when the
//!   simulation thread calls [`EntityAudioWorld::poll_events`](crate::EntityAudioWorld::poll_events).

use crate::backend::{ObjectHandle, TriggerId};
use crate::world::OwnerId;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::{Arc, RwLock};

/// How the backend processes a request relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Enqueued to the backend, returns immediately. FIFO per object.
    #[default]
    FireAndForget,
    /// Caller stalls until the backend has processed the request
    Blocking,
}

/// Where a completion notification is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallbackDelivery {
    /// No completion notification
    #[default]
    None,
    /// Delivered on the backend's internal thread through the inline hook
    InlineOnBackendThread,
    /// Queued and delivered on the simulation thread
    DeferredOnSimulationThread,
}

/// Options attached to a single backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestOptions {
    pub mode: ExecutionMode,
    pub callback: CallbackDelivery,
    /// Opaque value handed back in the completion notification
    pub user_tag: u64,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocking() -> Self {
        Self {
            mode: ExecutionMode::Blocking,
            ..Default::default()
        }
    }

    /// Fire-and-forget request whose completion comes back on the simulation thread.
    pub fn deferred_callback(user_tag: u64) -> Self {
        Self {
            mode: ExecutionMode::FireAndForget,
            callback: CallbackDelivery::DeferredOnSimulationThread,
            user_tag,
        }
    }

    pub fn inline_callback(user_tag: u64) -> Self {
        Self {
            mode: ExecutionMode::FireAndForget,
            callback: CallbackDelivery::InlineOnBackendThread,
            user_tag,
        }
    }

    pub fn wants_callback(&self) -> bool {
        self.callback != CallbackDelivery::None
    }
}

/// Completion notification produced by the backend for a finished trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerCompletion {
    /// Owner the source object was created for
    pub owner: OwnerId,
    pub source: ObjectHandle,
    pub trigger: TriggerId,
    pub user_tag: u64,
    pub success: bool,
}

/// Hook run on the backend thread for inline completions.
pub type InlineCompletionHook = dyn Fn(&TriggerCompletion) + Send + Sync;

type SharedHook = Arc<RwLock<Option<Arc<InlineCompletionHook>>>>;

/// Backend-side end of the completion queue. Cheap to clone, `Send`.
#[derive(Clone)]
pub struct CompletionSender {
    sender: Sender<TriggerCompletion>,
    inline_hook: SharedHook,
}

impl CompletionSender {
    /// Delivers `completion` the way the original request asked for.
    pub fn deliver(&self, completion: TriggerCompletion, delivery: CallbackDelivery) {
        match delivery {
            CallbackDelivery::None => {}
            CallbackDelivery::InlineOnBackendThread => {
                let hook = match self.inline_hook.read() {
                    Ok(guard) => guard.clone(),
                    Err(_) => {
                        log::error!("Inline completion hook lock poisoned, dropping completion");
                        return;
                    }
                };
                if let Some(hook) = hook {
                    hook(&completion);
                }
            }
            CallbackDelivery::DeferredOnSimulationThread => {
                if self.sender.send(completion).is_err() {
                    log::debug!(
                        "Completion queue closed, dropping completion for {}",
                        completion.source
                    );
                }
            }
        }
    }
}

/// Simulation-side end of the completion queue.
pub struct CompletionQueue {
    sender: Sender<TriggerCompletion>,
    receiver: Receiver<TriggerCompletion>,
    inline_hook: SharedHook,
}

impl CompletionQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            inline_hook: Arc::new(RwLock::new(None)),
        }
    }

    pub fn sender(&self) -> CompletionSender {
        CompletionSender {
            sender: self.sender.clone(),
            inline_hook: self.inline_hook.clone(),
        }
    }

    pub fn set_inline_hook<F>(&self, hook: F)
    where
        F: Fn(&TriggerCompletion) + Send + Sync + 'static,
    {
        match self.inline_hook.write() {
            Ok(mut guard) => *guard = Some(Arc::new(hook)),
            Err(_) => log::error!("Inline completion hook lock poisoned, hook not installed"),
        }
    }

    /// Takes every deferred completion received so far.
    pub fn drain(&self) -> Vec<TriggerCompletion> {
        self.receiver.try_iter().collect()
    }
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}
