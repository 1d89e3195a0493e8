//! Cover state machine.
//!
//! A character is either [`CoverState::Free`] or [`CoverState::InCover`].
//! Cover is entered by probing for a wall in the input direction, and kept by
//! re-probing every step: while both shoulders still see cover behind them and
//! the player strafes, the character is slid along the wall and snapped back
//! onto it.
//!
//! Alignment is a hard snap of the transform plus a plane constraint on the
//! [`MovementIntegrator`], so movement stays parallel to the wall until cover
//! is left.

use bevy::prelude::*;

use crate::collision::{CollisionData, TraceChannel};
use crate::config::CoverConfig;
use crate::intent::MovementIntent;
use crate::movement::{CharacterMovement, MovementIntegrator};
use crate::probe::{
    cover_flank_trace, cover_probe_direction, facing_rotation, CharacterPose, RayCaster,
    SocketLookup,
};

/// Cover state of a character.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub enum CoverState {
    /// Not attached to any cover.
    #[default]
    Free,
    /// Attached to a wall.
    InCover {
        /// Outward normal of the wall. Mirrors the plane constraint normal.
        normal: Vec3,
    },
}

/// Cover controller component.
///
/// Requires [`CharacterMovement`] and [`MovementIntent`] on the same entity.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
#[require(CoverConfig, CharacterMovement, MovementIntent)]
pub struct CoverController {
    state: CoverState,
}

impl CoverController {
    /// Create a controller in the free state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> CoverState {
        self.state
    }

    /// Check if attached to cover.
    pub fn is_in_cover(&self) -> bool {
        matches!(self.state, CoverState::InCover { .. })
    }

    /// Wall normal while in cover.
    pub fn cover_normal(&self) -> Option<Vec3> {
        match self.state {
            CoverState::InCover { normal } => Some(normal),
            CoverState::Free => None,
        }
    }

    /// Probe for a wall and take cover against it.
    ///
    /// Leaves cover first if already in it. The probe runs from the character
    /// root toward the input direction, or straight ahead without input.
    /// Returns whether cover was taken.
    pub fn try_cover(
        &mut self,
        config: &CoverConfig,
        caster: &impl RayCaster,
        transform: &mut Transform,
        movement: &mut impl MovementIntegrator,
        forward_axis: f32,
        right_axis: f32,
    ) -> bool {
        if self.is_in_cover() {
            self.stop_cover(movement);
        }

        let pose = CharacterPose::from_transform(transform, 0.0);
        let direction = cover_probe_direction(&pose, forward_axis, right_axis);
        let start = transform.translation;
        let end = start + direction * config.cover_distance;

        let Some(hit) = cover_hit(caster, start, end) else {
            debug!("no cover within {} along {}", config.cover_distance, direction);
            return false;
        };

        self.start_cover(config, &hit, transform, movement);
        true
    }

    /// Take cover against a hit surface.
    pub fn start_cover(
        &mut self,
        config: &CoverConfig,
        hit: &CollisionData,
        transform: &mut Transform,
        movement: &mut impl MovementIntegrator,
    ) {
        self.align(config, hit, transform, movement);
        debug!("entered cover at {} facing {}", transform.translation, hit.normal);
    }

    /// Leave cover. Safe to call when already free.
    pub fn stop_cover(&mut self, movement: &mut impl MovementIntegrator) {
        if self.is_in_cover() {
            debug!("left cover");
        }

        self.state = CoverState::Free;
        movement.set_plane_constraint_enabled(false);
        movement.set_orient_rotation_to_movement(true);
    }

    /// Re-probe the current cover and slide along it.
    ///
    /// Does nothing unless in cover, both shoulder probes hit cover behind the
    /// character, `right_axis` is non-zero and the root probe hits as well.
    /// Returns whether the character was re-aligned.
    pub fn cover_trace(
        &mut self,
        config: &CoverConfig,
        caster: &impl RayCaster,
        sockets: &impl SocketLookup,
        transform: &mut Transform,
        movement: &mut impl MovementIntegrator,
        right_axis: f32,
    ) -> bool {
        let CoverState::InCover { normal } = self.state else {
            return false;
        };
        let into_wall = -normal;

        let left = cover_flank_trace(
            caster,
            sockets,
            &config.left_trace_socket,
            into_wall,
            config.maintain_distance,
        );
        let right = cover_flank_trace(
            caster,
            sockets,
            &config.right_trace_socket,
            into_wall,
            config.maintain_distance,
        );

        if left.is_none() || right.is_none() {
            trace!("cover edge reached, holding position");
            return false;
        }
        if right_axis == 0.0 {
            return false;
        }

        let start = transform.translation;
        let end = start + into_wall * config.maintain_distance;
        let Some(hit) = cover_hit(caster, start, end) else {
            trace!("root cover probe missed");
            return false;
        };

        self.maintain_cover(config, &hit, transform, movement);
        true
    }

    /// Re-align against a hit surface while already in cover.
    pub fn maintain_cover(
        &mut self,
        config: &CoverConfig,
        hit: &CollisionData,
        transform: &mut Transform,
        movement: &mut impl MovementIntegrator,
    ) {
        self.align(config, hit, transform, movement);
    }

    fn align(
        &mut self,
        config: &CoverConfig,
        hit: &CollisionData,
        transform: &mut Transform,
        movement: &mut impl MovementIntegrator,
    ) {
        movement.set_plane_constraint_enabled(true);
        movement.set_plane_constraint_normal(hit.normal);
        movement.set_orient_rotation_to_movement(false);

        let normal = movement.plane_constraint_normal();
        self.state = CoverState::InCover { normal };

        // Keep the current height, stand off the wall along its normal.
        let anchor = Vec3::new(hit.point.x, transform.translation.y, hit.point.z);
        transform.translation = anchor + normal * config.stand_off;

        if let Some(rotation) = facing_rotation(normal) {
            transform.rotation = rotation;
        }
    }
}

/// Cover trace whose hit has a usable surface normal.
///
/// A ray starting inside a collider reports a zero normal, which cannot be
/// aligned against and counts as a miss.
fn cover_hit(caster: &impl RayCaster, start: Vec3, end: Vec3) -> Option<CollisionData> {
    caster
        .line_trace(start, end, TraceChannel::Cover)
        .filter(|hit| hit.normal.try_normalize().is_some())
}
