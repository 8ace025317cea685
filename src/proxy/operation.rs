use crate::backend::{
    EnvironmentId, OcclusionType, ParameterId, SwitchId, SwitchStateId, TriggerId,
};
use crate::math::Pose;
use crate::request::RequestOptions;

/// A control command routed to one or all proxies of an owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlOperation {
    /// Re-syncs the proxy transform to the owner, then fires the trigger
    ExecuteTrigger {
        trigger: TriggerId,
        options: RequestOptions,
    },
    /// Best effort, a completion may still arrive afterwards
    StopTrigger {
        trigger: TriggerId,
        options: RequestOptions,
    },
    SetParameter {
        parameter: ParameterId,
        value: f32,
    },
    SetSwitchState {
        switch: SwitchId,
        state: SwitchStateId,
    },
    SetOcclusionType(OcclusionType),
    /// `amount` is clamped to `[0, 1]`
    SetEnvironmentAmount {
        environment: EnvironmentId,
        amount: f32,
    },
    /// Stores the offset relative to the owner and moves the proxy there
    SetOffset(Pose),
    PlayFile {
        file: String,
        options: RequestOptions,
    },
    StopFile {
        file: String,
    },
    SetCurrentEnvironments,
}

impl ControlOperation {
    pub fn execute_trigger(trigger: TriggerId) -> Self {
        Self::ExecuteTrigger {
            trigger,
            options: RequestOptions::default(),
        }
    }

    pub fn stop_trigger(trigger: TriggerId) -> Self {
        Self::StopTrigger {
            trigger,
            options: RequestOptions::default(),
        }
    }

    pub fn set_parameter(parameter: ParameterId, value: f32) -> Self {
        Self::SetParameter { parameter, value }
    }

    pub fn set_switch_state(switch: SwitchId, state: SwitchStateId) -> Self {
        Self::SetSwitchState { switch, state }
    }

    pub fn set_environment_amount(environment: EnvironmentId, amount: f32) -> Self {
        Self::SetEnvironmentAmount {
            environment,
            amount,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ExecuteTrigger { .. } => "ExecuteTrigger",
            Self::StopTrigger { .. } => "StopTrigger",
            Self::SetParameter { .. } => "SetParameter",
            Self::SetSwitchState { .. } => "SetSwitchState",
            Self::SetOcclusionType(_) => "SetOcclusionType",
            Self::SetEnvironmentAmount { .. } => "SetEnvironmentAmount",
            Self::SetOffset(_) => "SetOffset",
            Self::PlayFile { .. } => "PlayFile",
            Self::StopFile { .. } => "StopFile",
            Self::SetCurrentEnvironments => "SetCurrentEnvironments",
        }
    }

    /// Operations that start sound and therefore respect the owner's audio-disabled flag.
    pub(crate) fn starts_playback(&self) -> bool {
        matches!(self, Self::ExecuteTrigger { .. })
    }

    pub(crate) fn sanitized(self) -> Self {
        match self {
            Self::SetEnvironmentAmount {
                environment,
                amount,
            } if !(0.0..=1.0).contains(&amount) => {
                log::warn!(
                    "Environment amount {} for {} is outside [0, 1], clamping",
                    amount,
                    environment
                );
                Self::SetEnvironmentAmount {
                    environment,
                    amount: if amount.is_nan() {
                        0.0
                    } else {
                        amount.clamp(0.0, 1.0)
                    },
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_amount_is_clamped() {
        let op = ControlOperation::set_environment_amount(EnvironmentId(3), 1.5).sanitized();
        assert_eq!(
            op,
            ControlOperation::set_environment_amount(EnvironmentId(3), 1.0)
        );

        let op = ControlOperation::set_environment_amount(EnvironmentId(3), f32::NAN).sanitized();
        assert_eq!(
            op,
            ControlOperation::set_environment_amount(EnvironmentId(3), 0.0)
        );
    }

    #[test]
    fn test_in_range_operations_unchanged() {
        let op = ControlOperation::set_parameter(ParameterId(1), 12.0);
        assert_eq!(op.clone().sanitized(), op);
    }
}
