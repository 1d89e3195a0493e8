//! Movement intent component.
//!
//! Intents carry what the player or AI wants this step: the two movement
//! axes and discrete cover requests. Input handling stays in the host; the
//! controller systems only read and consume these values.

use bevy::prelude::*;

/// Movement axes and cover requests for one character.
///
/// # Example
///
/// ```rust
/// use msg_cover_ik::prelude::*;
///
/// let mut intent = MovementIntent::new();
/// intent.set_axes(1.0, 0.0);
/// assert!(intent.is_moving());
///
/// // Rising edge of a held cover button queues one request.
/// intent.set_cover_pressed(true);
/// assert!(intent.has_cover_request());
/// intent.take_cover_request();
/// intent.set_cover_pressed(true);
/// assert!(!intent.has_cover_request());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Forward/backward axis (-1.0 = back, 1.0 = forward).
    pub forward: f32,
    /// Side axis (-1.0 = left, 1.0 = right).
    pub right: f32,
    /// Yaw (radians around +Y) of the view the axes are relative to when moving.
    ///
    /// Usually the camera yaw. Zero means forward is world -Z.
    pub view_yaw: f32,
    /// Pending "try cover" request.
    pub cover_request: bool,
    /// Pending "leave cover" request.
    pub stop_cover_request: bool,
    /// Whether the cover action is currently held.
    pub cover_pressed: bool,
    /// Previous frame's cover_pressed state (for edge detection).
    pub(crate) cover_pressed_prev: bool,
}

impl MovementIntent {
    /// Create a new empty movement intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both movement axes, clamped to [-1, 1].
    pub fn set_axes(&mut self, forward: f32, right: f32) {
        self.forward = forward.clamp(-1.0, 1.0);
        self.right = right.clamp(-1.0, 1.0);
    }

    /// Set the forward axis, clamped to [-1, 1].
    pub fn set_forward(&mut self, value: f32) {
        self.forward = value.clamp(-1.0, 1.0);
    }

    /// Set the side axis, clamped to [-1, 1].
    pub fn set_right(&mut self, value: f32) {
        self.right = value.clamp(-1.0, 1.0);
    }

    /// Set the view yaw the axes are relative to.
    pub fn set_view_yaw(&mut self, yaw: f32) {
        self.view_yaw = yaw;
    }

    /// Clear both axes.
    pub fn clear(&mut self) {
        self.forward = 0.0;
        self.right = 0.0;
    }

    /// Check if there is any axis input.
    pub fn is_moving(&self) -> bool {
        self.forward != 0.0 || self.right != 0.0
    }

    /// Check if there is side axis input.
    pub fn is_strafing(&self) -> bool {
        self.right != 0.0
    }

    /// World-space horizontal movement direction for the current axes.
    ///
    /// Not normalized: diagonal input is clamped to length 1.
    pub fn world_direction(&self) -> Vec3 {
        let view = Quat::from_rotation_y(self.view_yaw);
        let direction = view * Vec3::NEG_Z * self.forward + view * Vec3::X * self.right;
        direction.clamp_length_max(1.0)
    }

    /// Queue a "try cover" request.
    pub fn request_cover(&mut self) {
        self.cover_request = true;
    }

    /// Queue a "leave cover" request.
    pub fn request_stop_cover(&mut self) {
        self.stop_cover_request = true;
    }

    /// Check if a "try cover" request is pending.
    pub fn has_cover_request(&self) -> bool {
        self.cover_request
    }

    /// Take and consume the pending "try cover" request.
    pub fn take_cover_request(&mut self) -> bool {
        std::mem::take(&mut self.cover_request)
    }

    /// Take and consume the pending "leave cover" request.
    pub fn take_stop_cover_request(&mut self) -> bool {
        std::mem::take(&mut self.stop_cover_request)
    }

    /// Set the held state of the cover action.
    ///
    /// Call this every frame with the current button state. A change from
    /// `false` to `true` queues one "try cover" request.
    pub fn set_cover_pressed(&mut self, pressed: bool) {
        self.cover_pressed = pressed;
        if pressed && !self.cover_pressed_prev {
            self.cover_request = true;
        }
        self.cover_pressed_prev = pressed;
    }
}
