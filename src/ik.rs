//! Foot and hand IK.
//!
//! Every step the feet are probed straight down and the hands straight ahead.
//! Foot offsets, foot rotations and the hip offset are eased toward the probe
//! results by a fraction of the remaining distance per step; hand results are
//! copied as-is. There is no state machine: a probe that misses
//! simply leaves the previous output in place.

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::IkConfig;
use crate::probe::{foot_trace, hand_trace, CharacterPose, RayCaster, SocketLookup};

/// Pitch/yaw/roll in degrees.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotator {
    /// Rotation around the right axis.
    pub pitch: f32,
    /// Rotation around the up axis.
    pub yaw: f32,
    /// Rotation around the forward axis.
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Foot rotation that lays the sole flat on a surface with this normal.
    ///
    /// Normals are world-space with +Y up.
    pub fn from_surface_normal(normal: Vec3) -> Self {
        let roll = f32::atan2(normal.z, normal.y).to_degrees();
        let pitch = -f32::atan2(normal.x, normal.y).to_degrees();
        Self::new(pitch, 0.0, roll)
    }

    /// Same rotation with every component in (-180, 180].
    pub fn normalized(self) -> Self {
        Self::new(
            normalize_angle(self.pitch),
            normalize_angle(self.yaw),
            normalize_angle(self.roll),
        )
    }
}

/// Wrap an angle in degrees into (-180, 180].
pub fn normalize_angle(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Move `current` toward `target` by `clamp(dt * speed, 0, 1)` of the remaining distance.
///
/// A non-positive speed jumps straight to the target.
pub fn interp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }

    let distance = target - current;
    if distance * distance < 1e-8 {
        return target;
    }

    current + distance * (dt * speed).clamp(0.0, 1.0)
}

/// [`interp_to`] for rotations, taking the short way around each axis.
pub fn interp_rotator_to(current: Rotator, target: Rotator, dt: f32, speed: f32) -> Rotator {
    if dt == 0.0 || current == target {
        return current;
    }
    if speed <= 0.0 {
        return target;
    }

    let delta = Rotator::new(
        target.pitch - current.pitch,
        target.yaw - current.yaw,
        target.roll - current.roll,
    )
    .normalized();

    if delta.pitch.abs() <= 1e-4 && delta.yaw.abs() <= 1e-4 && delta.roll.abs() <= 1e-4 {
        return target;
    }

    let alpha = (dt * speed).clamp(0.0, 1.0);
    Rotator::new(
        current.pitch + delta.pitch * alpha,
        current.yaw + delta.yaw * alpha,
        current.roll + delta.roll * alpha,
    )
    .normalized()
}

/// IK output read by the animation layer.
///
/// Zero-initialised at spawn. Offsets are vertical distances relative to the
/// mesh origin; rotations are in degrees.
#[derive(Component, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Component)]
pub struct IkState {
    // === Legs ===
    /// Vertical hip offset. Negative lowers the pelvis.
    pub hip_offset: f32,
    pub left_foot_offset: f32,
    pub right_foot_offset: f32,
    pub left_foot_surface_normal: Vec3,
    pub right_foot_surface_normal: Vec3,
    pub left_foot_rotation: Rotator,
    pub right_foot_rotation: Rotator,
    /// Last ground point found under the left foot.
    pub left_foot_hit_point: Vec3,
    /// Last ground point found under the right foot.
    pub right_foot_hit_point: Vec3,

    // === Hands ===
    pub left_hand_hit_wall: bool,
    pub right_hand_hit_wall: bool,
    pub left_hand_location: Vec3,
    pub right_hand_location: Vec3,
}

impl IkState {
    /// Create a zeroed state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether either hand touches a wall.
    pub fn any_hand_on_wall(&self) -> bool {
        self.left_hand_hit_wall || self.right_hand_hit_wall
    }

    /// Hip offset target for two foot contact heights.
    ///
    /// Lowers the hip by half the height difference, unless the difference
    /// reaches `max_step`, in which case the hip is left alone.
    pub fn hip_target(left_height: f32, right_height: f32, max_step: f32) -> f32 {
        let step = (left_height - right_height).abs();
        if step < max_step {
            step * -0.5
        } else {
            0.0
        }
    }

    /// Advance the leg outputs from this step's foot probe results.
    ///
    /// `mesh_origin_height` is the world height of the skeletal mesh origin.
    /// A foot whose probe missed keeps its previous offset, rotation and
    /// normal. When both missed nothing changes at all.
    pub fn update_legs(
        &mut self,
        config: &IkConfig,
        dt: f32,
        mesh_origin_height: f32,
        left: Option<&CollisionData>,
        right: Option<&CollisionData>,
    ) {
        if left.is_none() && right.is_none() {
            return;
        }

        if let Some(hit) = left {
            let target = (hit.point.y - mesh_origin_height) - self.hip_offset;
            self.left_foot_offset =
                interp_to(self.left_foot_offset, target, dt, config.foot_offset_speed);
            self.left_foot_surface_normal = hit.normal;
            self.left_foot_hit_point = hit.point;

            let target = Rotator::from_surface_normal(hit.normal);
            self.left_foot_rotation = interp_rotator_to(
                self.left_foot_rotation,
                target,
                dt,
                config.foot_rotation_speed,
            );
        }

        if let Some(hit) = right {
            let target = (hit.point.y - mesh_origin_height) - self.hip_offset;
            self.right_foot_offset =
                interp_to(self.right_foot_offset, target, dt, config.foot_offset_speed);
            self.right_foot_surface_normal = hit.normal;
            self.right_foot_hit_point = hit.point;

            let from = if config.legacy_right_foot_rotation {
                self.left_foot_rotation
            } else {
                self.right_foot_rotation
            };
            let target = Rotator::from_surface_normal(hit.normal);
            self.right_foot_rotation =
                interp_rotator_to(from, target, dt, config.foot_rotation_speed);
        }

        let hip = Self::hip_target(
            self.left_foot_hit_point.y,
            self.right_foot_hit_point.y,
            config.max_hip_step,
        );
        self.hip_offset = interp_to(self.hip_offset, hip, dt, config.hip_offset_speed);
    }

    /// Copy this step's hand probe results.
    ///
    /// Each side is the probe hit and the probe end point. A hand that hit
    /// nothing is placed at the end point.
    pub fn update_hands(
        &mut self,
        left: (Option<CollisionData>, Vec3),
        right: (Option<CollisionData>, Vec3),
    ) {
        self.left_hand_hit_wall = left.0.is_some();
        self.left_hand_location = left.0.map(|hit| hit.point).unwrap_or(left.1);

        self.right_hand_hit_wall = right.0.is_some();
        self.right_hand_location = right.0.map(|hit| hit.point).unwrap_or(right.1);
    }

    /// Probe both feet and advance the leg outputs.
    pub fn solve_legs(
        &mut self,
        config: &IkConfig,
        caster: &impl RayCaster,
        pose: &CharacterPose,
        sockets: &impl SocketLookup,
        dt: f32,
    ) {
        let distance = config.foot_trace_length(pose.capsule_half_height);

        let left = foot_trace(caster, pose, sockets, &config.left_foot_socket, distance);
        let right = foot_trace(caster, pose, sockets, &config.right_foot_socket, distance);

        if left.is_none() {
            trace!("left foot probe missed");
        }
        if right.is_none() {
            trace!("right foot probe missed");
        }

        self.update_legs(
            config,
            dt,
            pose.mesh_origin().y,
            left.as_ref(),
            right.as_ref(),
        );
    }

    /// Probe both hands and copy the results.
    pub fn solve_hands(
        &mut self,
        config: &IkConfig,
        caster: &impl RayCaster,
        pose: &CharacterPose,
        sockets: &impl SocketLookup,
    ) {
        let left = hand_trace(caster, pose, sockets, &config.left_hand_socket, config.hand_reach);
        let right = hand_trace(caster, pose, sockets, &config.right_hand_socket, config.hand_reach);

        self.update_hands(left, right);
    }
}
