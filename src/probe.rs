//! Geometric probes shared by the IK solver and the cover controller.
//!
//! Both subsystems only ever ask the world one question: "what is the nearest
//! blocking surface on this segment, on this channel?". That question is the
//! [`RayCaster`] trait. Physics backends answer it (see the `rapier` module),
//! and tests answer it with analytic geometry.

use std::collections::HashMap;

use bevy::log::warn_once;
use bevy::prelude::*;

use crate::collision::{CollisionData, TraceChannel};

/// Synchronous line trace service.
///
/// Implementations return the nearest blocking hit between `start` and `end`
/// on the given channel, or `None` when the segment is clear.
pub trait RayCaster {
    /// Trace the segment `start..end` against `channel`.
    fn line_trace(&self, start: Vec3, end: Vec3, channel: TraceChannel) -> Option<CollisionData>;
}

/// Lookup of named attachment points (sockets) in world space.
pub trait SocketLookup {
    /// World position of the named socket, if the character has one.
    fn socket_location(&self, name: &str) -> Option<Vec3>;
}

impl SocketLookup for HashMap<String, Vec3> {
    fn socket_location(&self, name: &str) -> Option<Vec3> {
        self.get(name).copied()
    }
}

/// World positions of a character's sockets, refreshed every step.
///
/// The `update_socket_locations` system fills this from descendant entities
/// carrying a [`Name`]. Hosts without a skeleton can write entries directly
/// with [`CharacterSockets::set`].
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct CharacterSockets {
    locations: HashMap<String, Vec3>,
}

impl CharacterSockets {
    /// Create an empty socket map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a socket.
    pub fn with(mut self, name: impl Into<String>, location: Vec3) -> Self {
        self.set(name, location);
        self
    }

    /// Insert or move a socket.
    pub fn set(&mut self, name: impl Into<String>, location: Vec3) {
        self.locations.insert(name.into(), location);
    }

    /// Get a socket location.
    pub fn get(&self, name: &str) -> Option<Vec3> {
        self.locations.get(name).copied()
    }

    /// Number of known sockets.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether no socket is known.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl SocketLookup for CharacterSockets {
    fn socket_location(&self, name: &str) -> Option<Vec3> {
        self.get(name)
    }
}

/// Snapshot of the character body a probe is cast from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterPose {
    /// Actor (capsule center) position.
    pub position: Vec3,
    /// Actor rotation.
    pub rotation: Quat,
    /// Distance from the capsule center to its bottom.
    pub capsule_half_height: f32,
}

impl CharacterPose {
    /// Create a pose.
    pub fn new(position: Vec3, rotation: Quat, capsule_half_height: f32) -> Self {
        Self {
            position,
            rotation,
            capsule_half_height,
        }
    }

    /// Build a pose from a transform.
    pub fn from_transform(transform: &Transform, capsule_half_height: f32) -> Self {
        Self::new(transform.translation, transform.rotation, capsule_half_height)
    }

    /// The actor's forward vector (local -Z).
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The actor's right vector (local +X).
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Origin of the skeletal mesh. The mesh sits at the bottom of the capsule.
    #[inline]
    pub fn mesh_origin(&self) -> Vec3 {
        self.position - Vec3::Y * self.capsule_half_height
    }
}

fn socket_or_warn(sockets: &impl SocketLookup, socket: &str) -> Option<Vec3> {
    let location = sockets.socket_location(socket);
    if location.is_none() {
        warn_once!("character has no socket named `{socket}`, its probe always misses");
    }
    location
}

/// Vertical foot probe.
///
/// Casts from the socket's horizontal position at actor height straight down
/// to `max_distance` below the socket.
pub fn foot_trace(
    caster: &impl RayCaster,
    pose: &CharacterPose,
    sockets: &impl SocketLookup,
    socket: &str,
    max_distance: f32,
) -> Option<CollisionData> {
    let socket_location = socket_or_warn(sockets, socket)?;

    let start = Vec3::new(socket_location.x, pose.position.y, socket_location.z);
    let end = Vec3::new(
        socket_location.x,
        socket_location.y - max_distance,
        socket_location.z,
    );

    caster.line_trace(start, end, TraceChannel::Visibility)
}

/// End point of a hand probe. Also used as the hand location on a miss.
pub fn hand_trace_end(pose: &CharacterPose, socket_location: Vec3, max_distance: f32) -> Vec3 {
    socket_location + pose.forward() * max_distance
}

/// Forward hand probe from a shoulder socket along the actor forward vector.
///
/// Returns the socket-based end point alongside the hit so callers can place
/// the hand even when nothing was hit.
pub fn hand_trace(
    caster: &impl RayCaster,
    pose: &CharacterPose,
    sockets: &impl SocketLookup,
    socket: &str,
    max_distance: f32,
) -> (Option<CollisionData>, Vec3) {
    let Some(start) = socket_or_warn(sockets, socket) else {
        return (None, pose.position);
    };
    let end = hand_trace_end(pose, start, max_distance);

    (caster.line_trace(start, end, TraceChannel::Visibility), end)
}

/// Probe from a socket along `direction` on the cover channel.
///
/// Used for the shoulder probes that check the character is still flanked by
/// cover on both sides.
pub fn cover_flank_trace(
    caster: &impl RayCaster,
    sockets: &impl SocketLookup,
    socket: &str,
    direction: Vec3,
    max_distance: f32,
) -> Option<CollisionData> {
    let start = socket_or_warn(sockets, socket)?;
    caster.line_trace(start, start + direction * max_distance, TraceChannel::Cover)
}

/// Direction of the wall probe issued when cover is requested.
///
/// The movement axes are applied to the actor's forward and right vectors and
/// the result is flattened onto the ground plane. With no input the probe goes
/// straight ahead.
pub fn cover_probe_direction(pose: &CharacterPose, forward_axis: f32, right_axis: f32) -> Vec3 {
    let input = pose.forward() * forward_axis + pose.right() * right_axis;
    let direction = Vec3::new(input.x, 0.0, input.z).normalize_or_zero();

    if direction == Vec3::ZERO {
        pose.forward()
    } else {
        direction
    }
}

/// Rotation whose forward vector points along the horizontal part of `normal`.
///
/// Returns `None` for (near) vertical normals, which have no facing.
pub fn facing_rotation(normal: Vec3) -> Option<Quat> {
    let flat = Vec3::new(normal.x, 0.0, normal.z).normalize_or_zero();
    if flat == Vec3::ZERO {
        return None;
    }

    // Forward is local -Z, so yaw so that rotation * NEG_Z == flat.
    Some(Quat::from_rotation_y(f32::atan2(-flat.x, -flat.z)))
}
