//! Audio spot: a component that plays a default trigger on its own proxy.

use crate::backend::{OcclusionType, TriggerId};
use crate::error::Result;
use crate::events::EntityAudioEvent;
use crate::math::{Pose, Vec3};
use crate::proxy::ProxyId;
use crate::request::RequestOptions;
use crate::world::{EntityAudioWorld, OwnerId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How the default trigger is (re)started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    /// Not started automatically
    None,
    #[default]
    TriggerOnce,
    /// Restarted every random delay, whether or not it finished
    ReTriggerConstantly,
    /// Restarted a random delay after it finished
    ReTriggerWhenDone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioSpotSettings {
    pub default_trigger: Option<TriggerId>,
    pub play_mode: PlayMode,
    /// Seconds
    pub min_delay: f32,
    /// Seconds
    pub max_delay: f32,
    pub occlusion: OcclusionType,
    /// Placement of the spot's proxy relative to the owner
    pub offset: Vec3,
    pub enabled: bool,
}

impl Default for AudioSpotSettings {
    fn default() -> Self {
        Self {
            default_trigger: None,
            play_mode: PlayMode::TriggerOnce,
            min_delay: 1.0,
            max_delay: 2.0,
            occlusion: OcclusionType::Ignore,
            offset: Vec3::ZERO,
            enabled: true,
        }
    }
}

/// Raised when a trigger started by the spot finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerFinishedSignal {
    /// 0 for the default trigger, otherwise the id returned by [`AudioSpot::execute_trigger`]
    pub instance_id: u64,
    pub trigger: TriggerId,
    pub success: bool,
}

pub struct AudioSpot {
    settings: AudioSpotSettings,
    owner: Option<OwnerId>,
    proxy: ProxyId,
    active: bool,
    /// Seconds until the default trigger fires again
    timer: Option<f32>,
    next_instance_id: u64,
    rng: StdRng,
}

impl AudioSpot {
    pub fn new(settings: AudioSpotSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    pub fn with_seed(settings: AudioSpotSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: AudioSpotSettings, rng: StdRng) -> Self {
        Self {
            settings,
            owner: None,
            proxy: ProxyId::INVALID,
            active: false,
            timer: None,
            next_instance_id: 1,
            rng,
        }
    }

    pub fn settings(&self) -> &AudioSpotSettings {
        &self.settings
    }

    pub fn proxy_id(&self) -> ProxyId {
        self.proxy
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_scheduled(&self) -> bool {
        self.timer.is_some()
    }

    /// Creates the spot's proxy on `owner`, replacing one from an earlier call.
    pub fn initialize(&mut self, world: &mut EntityAudioWorld, owner: OwnerId) -> Result<()> {
        self.release_proxy(world)?;

        self.proxy = world.create_proxy(owner)?;
        self.owner = Some(owner);
        if !self.proxy.is_valid() {
            log::warn!("Audio spot on {} has no proxy to play on", owner);
            return Ok(());
        }

        world.set_offset(owner, Pose::from_position(self.settings.offset), self.proxy)?;
        world.set_occlusion_type(owner, self.settings.occlusion, self.proxy)?;
        Ok(())
    }

    /// Removes the spot's proxy. The owner itself stays registered.
    pub fn shutdown(&mut self, world: &mut EntityAudioWorld) -> Result<()> {
        self.release_proxy(world)?;
        self.owner = None;
        self.active = false;
        self.timer = None;
        Ok(())
    }

    fn release_proxy(&mut self, world: &mut EntityAudioWorld) -> Result<()> {
        if let Some(owner) = self.playable_owner() {
            if world.owner(owner).is_some() {
                world.remove_proxy(owner, self.proxy)?;
            }
        }
        self.proxy = ProxyId::INVALID;
        Ok(())
    }

    /// The owner to address, only while the spot holds a proxy of its own.
    ///
    /// An invalid proxy id would address every proxy of the owner.
    fn playable_owner(&self) -> Option<OwnerId> {
        self.owner.filter(|_| self.proxy.is_valid())
    }

    /// Activates the spot and plays the default trigger.
    pub fn start_game(&mut self, world: &mut EntityAudioWorld) -> Result<bool> {
        self.active = true;
        self.execute_default_trigger(world)
    }

    /// Deactivates the spot and stops the default trigger.
    ///
    /// The stopped trigger still reports completion; inactive spots ignore it.
    pub fn leave_game(&mut self, world: &mut EntityAudioWorld) -> Result<()> {
        self.active = false;
        self.timer = None;
        let trigger = self.settings.default_trigger;
        if let (Some(owner), Some(trigger)) = (self.playable_owner(), trigger) {
            world.stop_trigger(owner, trigger, self.proxy)?;
        }
        Ok(())
    }

    /// Enables or disables the retriggering of the default trigger.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
        if !enabled {
            self.timer = None;
        }
    }

    /// Replaces the settings, reapplies occlusion and restarts the default trigger.
    pub fn apply_settings(
        &mut self,
        world: &mut EntityAudioWorld,
        settings: AudioSpotSettings,
    ) -> Result<bool> {
        self.settings = settings;
        if let Some(owner) = self.playable_owner() {
            world.set_occlusion_type(owner, self.settings.occlusion, self.proxy)?;
            world.set_offset(owner, Pose::from_position(self.settings.offset), self.proxy)?;
        }
        self.execute_default_trigger(world)
    }

    /// Plays an arbitrary trigger on the spot's proxy.
    ///
    /// Returns the instance id its [`TriggerFinishedSignal`] will carry.
    pub fn execute_trigger(
        &mut self,
        world: &mut EntityAudioWorld,
        trigger: TriggerId,
    ) -> Result<Option<u64>> {
        let Some(owner) = self.playable_owner() else {
            return Ok(None);
        };
        let instance_id = self.next_instance_id;
        if world.execute_trigger(
            owner,
            trigger,
            self.proxy,
            RequestOptions::deferred_callback(instance_id),
        )? {
            self.next_instance_id = self.next_instance_id.wrapping_add(1).max(1);
            Ok(Some(instance_id))
        } else {
            Ok(None)
        }
    }

    pub fn stop_trigger(
        &mut self,
        world: &mut EntityAudioWorld,
        trigger: TriggerId,
    ) -> Result<bool> {
        match self.playable_owner() {
            Some(owner) => world.stop_trigger(owner, trigger, self.proxy),
            None => Ok(false),
        }
    }

    /// Advances the retrigger timer. Returns whether the default trigger fired.
    pub fn update(&mut self, world: &mut EntityAudioWorld, delta_time: f32) -> Result<bool> {
        let Some(remaining) = self.timer else {
            return Ok(false);
        };

        let remaining = remaining - delta_time;
        if remaining > 0.0 {
            self.timer = Some(remaining);
            return Ok(false);
        }

        self.timer = None;
        self.execute_default_trigger(world)
    }

    /// Feeds a world event to the spot.
    ///
    /// Returns a signal when one of the spot's triggers finished while the
    /// spot was active and enabled.
    pub fn handle_event(&mut self, event: &EntityAudioEvent) -> Option<TriggerFinishedSignal> {
        let EntityAudioEvent::TriggerFinished {
            owner,
            proxy_id,
            trigger,
            user_tag,
            success,
        } = *event
        else {
            return None;
        };

        if !self.active || !self.settings.enabled {
            return None;
        }
        if self.owner != Some(owner) || proxy_id != self.proxy {
            return None;
        }

        if user_tag == 0
            && Some(trigger) == self.settings.default_trigger
            && self.settings.play_mode == PlayMode::ReTriggerWhenDone
        {
            self.schedule();
        }

        Some(TriggerFinishedSignal {
            instance_id: user_tag,
            trigger,
            success,
        })
    }

    fn execute_default_trigger(&mut self, world: &mut EntityAudioWorld) -> Result<bool> {
        if !self.active || !self.settings.enabled || self.settings.play_mode == PlayMode::None {
            return Ok(false);
        }
        let trigger = self.settings.default_trigger;
        let (Some(owner), Some(trigger)) = (self.playable_owner(), trigger) else {
            return Ok(false);
        };

        let started = world.execute_trigger(
            owner,
            trigger,
            self.proxy,
            RequestOptions::deferred_callback(0),
        )?;
        if started && self.settings.play_mode == PlayMode::ReTriggerConstantly {
            self.schedule();
        }
        Ok(started)
    }

    fn schedule(&mut self) {
        let low = self.settings.min_delay.min(self.settings.max_delay).max(0.0);
        let high = self.settings.min_delay.max(self.settings.max_delay).max(0.0);
        let delay = if low < high {
            self.rng.gen_range(low..=high)
        } else {
            low
        };
        log::trace!("Audio spot retriggers in {:.2}s", delay);
        self.timer = Some(delay);
    }
}
