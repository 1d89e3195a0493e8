//! Movement integrator capability.
//!
//! The cover controller never moves the character through physics itself. It
//! drives a [`MovementIntegrator`]: a plane constraint that keeps velocity
//! parallel to the wall, and the "orient rotation to movement" switch that
//! decides whether velocity or the cover normal sets the facing.
//!
//! [`CharacterMovement`] is the integrator this crate ships; the systems in
//! `systems` apply it to the physics backend every step.

use bevy::prelude::*;

/// Capability interface over a character movement integrator.
pub trait MovementIntegrator {
    /// Enable or disable the plane constraint.
    fn set_plane_constraint_enabled(&mut self, enabled: bool);

    /// Whether the plane constraint is active.
    fn is_plane_constraint_enabled(&self) -> bool;

    /// Set the plane constraint normal. Normalized by the integrator.
    fn set_plane_constraint_normal(&mut self, normal: Vec3);

    /// Current plane constraint normal.
    fn plane_constraint_normal(&self) -> Vec3;

    /// Enable or disable turning the character toward its movement direction.
    fn set_orient_rotation_to_movement(&mut self, enabled: bool);

    /// Whether the character turns toward its movement direction.
    fn orients_rotation_to_movement(&self) -> bool;
}

/// Movement integrator settings and switches.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct CharacterMovement {
    /// Maximum horizontal speed from movement input (units/second).
    pub max_speed: f32,
    /// Turn rate toward the movement direction (degrees/second).
    pub rotation_rate: f32,
    /// Turn toward the horizontal velocity every step.
    pub orient_rotation_to_movement: bool,
    /// Project velocity onto the constraint plane every step.
    pub plane_constraint_enabled: bool,
    /// Normal of the constraint plane.
    pub plane_constraint_normal: Vec3,
}

impl Default for CharacterMovement {
    fn default() -> Self {
        Self {
            max_speed: 600.0,
            rotation_rate: 540.0,
            orient_rotation_to_movement: true,
            plane_constraint_enabled: false,
            plane_constraint_normal: Vec3::ZERO,
        }
    }
}

impl CharacterMovement {
    /// Create an integrator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set max speed.
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Builder: set rotation rate in degrees per second.
    pub fn with_rotation_rate(mut self, rate: f32) -> Self {
        self.rotation_rate = rate;
        self
    }

    /// Remove the velocity component along the constraint normal.
    ///
    /// Returns the velocity unchanged while the constraint is off.
    pub fn constrain_velocity(&self, velocity: Vec3) -> Vec3 {
        if !self.plane_constraint_enabled || self.plane_constraint_normal == Vec3::ZERO {
            return velocity;
        }
        let normal = self.plane_constraint_normal;
        velocity - normal * velocity.dot(normal)
    }

    /// Rotate `current` toward facing the horizontal part of `velocity`.
    ///
    /// Turns at most `rotation_rate * dt` degrees around +Y. Returns `current`
    /// when there is no horizontal velocity.
    pub fn orient_toward(&self, current: Quat, velocity: Vec3, dt: f32) -> Quat {
        let flat = Vec3::new(velocity.x, 0.0, velocity.z);
        if flat.length_squared() < 1e-6 {
            return current;
        }

        let forward = current * Vec3::NEG_Z;
        let current_yaw = f32::atan2(-forward.x, -forward.z);
        let target_yaw = f32::atan2(-flat.x, -flat.z);

        let mut delta = target_yaw - current_yaw;
        while delta > std::f32::consts::PI {
            delta -= std::f32::consts::TAU;
        }
        while delta < -std::f32::consts::PI {
            delta += std::f32::consts::TAU;
        }

        let max_step = self.rotation_rate.to_radians() * dt;
        let step = delta.clamp(-max_step, max_step);

        Quat::from_rotation_y(current_yaw + step)
    }
}

impl MovementIntegrator for CharacterMovement {
    fn set_plane_constraint_enabled(&mut self, enabled: bool) {
        self.plane_constraint_enabled = enabled;
    }

    fn is_plane_constraint_enabled(&self) -> bool {
        self.plane_constraint_enabled
    }

    fn set_plane_constraint_normal(&mut self, normal: Vec3) {
        self.plane_constraint_normal = normal.normalize_or_zero();
    }

    fn plane_constraint_normal(&self) -> Vec3 {
        self.plane_constraint_normal
    }

    fn set_orient_rotation_to_movement(&mut self, enabled: bool) {
        self.orient_rotation_to_movement = enabled;
    }

    fn orients_rotation_to_movement(&self) -> bool {
        self.orient_rotation_to_movement
    }
}
