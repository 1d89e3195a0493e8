//! Physics engine seam.
//!
//! Everything the controller needs from a physics engine goes through
//! [`CharacterPhysicsBackend`]: the line traces behind the IK and cover probes
//! (registered by [`CharacterPhysicsBackend::plugin`]) and velocity access for
//! the movement integrator systems.

use bevy::prelude::*;

/// A physics engine the controller can drive.
///
/// Velocity access is all the generic movement systems need. The plugin must
/// add systems in [`crate::CoverIkSet::Sensors`] and [`crate::CoverIkSet::Cover`] that build a [`crate::probe::RayCaster`] for
/// the engine and call into [`crate::ik::IkState`] and
/// [`crate::cover::CoverController`].
///
/// For an example implementation, see the `rapier` module's
/// `Rapier3dBackend`.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Component holding the linear velocity.
    type VelocityComponent: Component;

    /// Plugin registering the engine-specific probe systems.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Seconds per fixed step.
    fn get_fixed_timestep(world: &World) -> f32 {
        fixed_timestep(world)
    }
}

const FALLBACK_TIMESTEP: f32 = 1.0 / 60.0;

/// Fixed timestep delta, with fallback for testing scenarios.
pub fn fixed_timestep(world: &World) -> f32 {
    world
        .get_resource::<Time<Fixed>>()
        .map(fixed_delta)
        .unwrap_or(FALLBACK_TIMESTEP)
}

/// Delta of a fixed clock, falling back to 60 Hz before its first step.
pub fn fixed_delta(time: &Time<Fixed>) -> f32 {
    let dt = time.delta_secs();
    if dt > 0.0 {
        dt
    } else {
        FALLBACK_TIMESTEP
    }
}

/// Plugin for backends without probe systems, e.g. in unit tests.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
