//! State marker components.
//!
//! These components indicate the current cover and hand contact state of a
//! character. They are automatically added/removed by the controller systems
//! so gameplay and animation code can filter on them in queries.

use bevy::prelude::*;

/// Marker component indicating the character is in cover.
///
/// Added when the cover controller enters cover, removed when it leaves.
/// Contains the wall normal at the time of the last alignment.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_cover_ik::prelude::*;
///
/// fn crouch_behind_cover(q: Query<&InCover>) {
///     for cover in &q {
///         let _facing = cover.normal;
///     }
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct InCover {
    /// Outward normal of the wall.
    pub normal: Vec3,
}

impl Default for InCover {
    fn default() -> Self {
        Self { normal: Vec3::Z }
    }
}

impl InCover {
    /// Create a new cover marker.
    pub fn new(normal: Vec3) -> Self {
        Self { normal }
    }
}

/// Marker component indicating at least one hand touches a wall.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct HandTouchingWall {
    /// Left hand probe hit.
    pub left: bool,
    /// Right hand probe hit.
    pub right: bool,
}

impl HandTouchingWall {
    /// Create a new hand contact marker.
    pub fn new(left: bool, right: bool) -> Self {
        Self { left, right }
    }

    /// Check if both hands touch.
    pub fn both(&self) -> bool {
        self.left && self.right
    }
}
