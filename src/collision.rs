//! Line trace result structures.
//!
//! These structures hold the results of the physics queries used by the
//! IK solver and the cover controller.

use bevy::prelude::*;

/// Collision channel a line trace runs against.
///
/// The IK probes and the cover probes deliberately use different channels so
/// that level designers can flag surfaces as cover-eligible independently of
/// whether they block sight or feet.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TraceChannel {
    /// General blocking geometry. Used by foot and hand IK.
    #[default]
    Visibility,
    /// Surfaces marked as cover. Used by every cover probe.
    Cover,
}

/// Information about a line trace hit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance from the trace start to the hit point.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}
