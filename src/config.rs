//! Configuration components.
//!
//! This module defines the tuning for the IK solver and the cover controller:
//! socket names, probe distances and smoothing rates.

use bevy::prelude::*;

/// Configuration for foot and hand IK.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct IkConfig {
    // === Sockets ===
    /// Left foot socket.
    pub left_foot_socket: String,
    /// Right foot socket.
    pub right_foot_socket: String,
    /// Left upper-arm socket the left hand probe starts from.
    pub left_hand_socket: String,
    /// Right upper-arm socket the right hand probe starts from.
    pub right_hand_socket: String,

    // === Probe Distances ===
    /// Foot probe length. `None` uses the capsule half-height, so the probe
    /// spans from hip level to below the lowest expected ground contact.
    pub foot_trace_distance: Option<f32>,
    /// Hand probe length along the actor forward vector.
    pub hand_reach: f32,

    // === Smoothing Rates ===
    /// Interpolation speed of the foot offsets (1/s).
    pub foot_offset_speed: f32,
    /// Interpolation speed of the foot rotations (1/s).
    pub foot_rotation_speed: f32,
    /// Interpolation speed of the hip offset (1/s).
    pub hip_offset_speed: f32,

    // === Hip ===
    /// Foot height difference at or above which the hip is not lowered.
    pub max_hip_step: f32,

    /// Smooth the right foot rotation starting from the left foot rotation.
    ///
    /// Off by default. Only for bit-for-bit parity with animation data tuned
    /// against that behavior; the feet then no longer rotate independently.
    pub legacy_right_foot_rotation: bool,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            left_foot_socket: "foot_lSocket".into(),
            right_foot_socket: "foot_rSocket".into(),
            left_hand_socket: "upperarm_lSocket".into(),
            right_hand_socket: "upperarm_rSocket".into(),
            foot_trace_distance: None,
            hand_reach: 100.0,
            foot_offset_speed: 20.0,
            foot_rotation_speed: 100.0,
            hip_offset_speed: 20.0,
            max_hip_step: 50.0,
            legacy_right_foot_rotation: false,
        }
    }
}

impl IkConfig {
    /// Foot probe length for a capsule of the given half-height.
    #[inline]
    pub fn foot_trace_length(&self, capsule_half_height: f32) -> f32 {
        self.foot_trace_distance.unwrap_or(capsule_half_height)
    }

    /// Builder: set foot socket names.
    pub fn with_foot_sockets(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_foot_socket = left.into();
        self.right_foot_socket = right.into();
        self
    }

    /// Builder: set hand (upper-arm) socket names.
    pub fn with_hand_sockets(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_hand_socket = left.into();
        self.right_hand_socket = right.into();
        self
    }

    /// Builder: set a fixed foot probe length.
    pub fn with_foot_trace_distance(mut self, distance: f32) -> Self {
        assert!(
            distance > 0.0 && distance.is_finite(),
            "Foot trace distance must be positive and finite, got: {}",
            distance
        );
        self.foot_trace_distance = Some(distance);
        self
    }

    /// Builder: set hand probe length.
    pub fn with_hand_reach(mut self, reach: f32) -> Self {
        assert!(
            reach > 0.0 && reach.is_finite(),
            "Hand reach must be positive and finite, got: {}",
            reach
        );
        self.hand_reach = reach;
        self
    }

    /// Builder: set smoothing speeds for foot offsets, foot rotations and the hip.
    pub fn with_speeds(mut self, foot_offset: f32, foot_rotation: f32, hip_offset: f32) -> Self {
        self.foot_offset_speed = foot_offset;
        self.foot_rotation_speed = foot_rotation;
        self.hip_offset_speed = hip_offset;
        self
    }

    /// Builder: set the hip step clamp.
    pub fn with_max_hip_step(mut self, step: f32) -> Self {
        self.max_hip_step = step;
        self
    }

    /// Builder: enable legacy right-foot rotation smoothing.
    pub fn with_legacy_right_foot_rotation(mut self, enabled: bool) -> Self {
        self.legacy_right_foot_rotation = enabled;
        self
    }
}

/// Configuration for the cover controller.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct CoverConfig {
    /// Length of the wall probe issued when cover is requested.
    pub cover_distance: f32,
    /// Length of the flank and root probes while in cover.
    pub maintain_distance: f32,
    /// Distance kept between the wall and the character root.
    pub stand_off: f32,
    /// Left shoulder socket used for the flank probe.
    pub left_trace_socket: String,
    /// Right shoulder socket used for the flank probe.
    pub right_trace_socket: String,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            cover_distance: 200.0,
            maintain_distance: 200.0,
            stand_off: 35.0,
            left_trace_socket: "upperarm_lCoverSocket".into(),
            right_trace_socket: "upperarm_rCoverSocket".into(),
        }
    }
}

impl CoverConfig {
    /// Create a config with the given wall probe length.
    pub fn new(cover_distance: f32) -> Self {
        Self::default().with_cover_distance(cover_distance)
    }

    /// Builder: set the wall probe length.
    pub fn with_cover_distance(mut self, distance: f32) -> Self {
        assert!(
            distance > 0.0 && distance.is_finite(),
            "Cover distance must be positive and finite, got: {}",
            distance
        );
        self.cover_distance = distance;
        self
    }

    /// Builder: set the flank/root probe length.
    pub fn with_maintain_distance(mut self, distance: f32) -> Self {
        assert!(
            distance > 0.0 && distance.is_finite(),
            "Maintain distance must be positive and finite, got: {}",
            distance
        );
        self.maintain_distance = distance;
        self
    }

    /// Builder: set the wall stand-off.
    pub fn with_stand_off(mut self, stand_off: f32) -> Self {
        self.stand_off = stand_off;
        self
    }

    /// Builder: set the flank probe sockets.
    pub fn with_trace_sockets(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_trace_socket = left.into();
        self.right_trace_socket = right.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ik_config_defaults() {
        let config = IkConfig::default();
        assert_eq!(config.left_foot_socket, "foot_lSocket");
        assert_eq!(config.right_hand_socket, "upperarm_rSocket");
        assert_eq!(config.hand_reach, 100.0);
        assert_eq!(config.foot_offset_speed, 20.0);
        assert_eq!(config.foot_rotation_speed, 100.0);
        assert_eq!(config.max_hip_step, 50.0);
        assert!(!config.legacy_right_foot_rotation);
    }

    #[test]
    fn foot_trace_length_defaults_to_capsule() {
        let config = IkConfig::default();
        assert_eq!(config.foot_trace_length(96.0), 96.0);

        let config = config.with_foot_trace_distance(120.0);
        assert_eq!(config.foot_trace_length(96.0), 120.0);
    }

    #[test]
    #[should_panic(expected = "Hand reach must be positive")]
    fn ik_config_rejects_zero_reach() {
        let _ = IkConfig::default().with_hand_reach(0.0);
    }

    #[test]
    fn cover_config_defaults() {
        let config = CoverConfig::default();
        assert_eq!(config.cover_distance, 200.0);
        assert_eq!(config.maintain_distance, 200.0);
        assert_eq!(config.stand_off, 35.0);
    }

    #[test]
    fn cover_config_builders() {
        let config = CoverConfig::new(300.0)
            .with_stand_off(20.0)
            .with_trace_sockets("l", "r");
        assert_eq!(config.cover_distance, 300.0);
        assert_eq!(config.stand_off, 20.0);
        assert_eq!(config.left_trace_socket, "l");
        assert_eq!(config.right_trace_socket, "r");
    }

    #[test]
    #[should_panic(expected = "Cover distance must be positive")]
    fn cover_config_rejects_negative_distance() {
        let _ = CoverConfig::new(-1.0);
    }
}
