//! Core controller systems.
//!
//! These systems implement the movement integrator and keep the marker
//! components in sync. They are generic over the physics backend; the probe
//! systems that need the physics world live in the backend modules.

use std::f32::consts;

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::cover::CoverController;
use crate::ik::IkState;
use crate::intent::MovementIntent;
use crate::movement::CharacterMovement;
use crate::probe::CharacterSockets;
use crate::state::{HandTouchingWall, InCover};

/// Refresh socket world positions from named descendant entities.
///
/// Every descendant with a [`Name`] and a [`GlobalTransform`] is recorded
/// under its name. Entries written by the host for names that have no
/// descendant are kept.
pub fn update_socket_locations(
    mut q_characters: Query<(Entity, &mut CharacterSockets)>,
    q_children: Query<&Children>,
    q_named: Query<(&Name, &GlobalTransform)>,
) {
    for (entity, mut sockets) in &mut q_characters {
        for descendant in q_children.iter_descendants(entity) {
            if let Ok((name, transform)) = q_named.get(descendant) {
                sockets.set(name.as_str(), transform.translation());
            }
        }
    }
}

/// Leave cover on request.
///
/// Cover requests need a ray caster and are handled by the backend.
pub fn process_stop_cover_requests(
    mut q_characters: Query<(
        &mut CoverController,
        &mut CharacterMovement,
        &mut MovementIntent,
    )>,
) {
    for (mut controller, mut movement, mut intent) in &mut q_characters {
        if intent.take_stop_cover_request() {
            controller.stop_cover(&mut *movement);
        }
    }
}

/// Apply movement axes as horizontal velocity.
///
/// Axes are relative to the intent's view yaw. Vertical velocity is left to
/// the physics engine.
pub fn apply_movement_input<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, MovementIntent, CharacterMovement)> = world
        .query::<(Entity, &MovementIntent, &CharacterMovement)>()
        .iter(world)
        .map(|(e, intent, movement)| (e, intent.clone(), *movement))
        .collect();

    for (entity, intent, movement) in entities {
        let velocity = B::get_velocity(world, entity);
        let desired = intent.world_direction() * movement.max_speed;

        let new_velocity = Vec3::new(desired.x, velocity.y, desired.z);
        B::set_velocity(world, entity, new_velocity);
    }
}

/// Project velocity onto the plane constraint while it is enabled.
///
/// This is what keeps a character in cover moving parallel to the wall.
pub fn apply_plane_constraint<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, CharacterMovement)> = world
        .query::<(Entity, &CharacterMovement)>()
        .iter(world)
        .filter(|(_, movement)| movement.plane_constraint_enabled)
        .map(|(e, movement)| (e, *movement))
        .collect();

    for (entity, movement) in entities {
        let velocity = B::get_velocity(world, entity);
        B::set_velocity(world, entity, movement.constrain_velocity(velocity));
    }
}

/// Turn characters toward their horizontal velocity.
///
/// Skipped while orient-to-movement is disabled, which is the case in cover:
/// the wall normal sets the facing there.
pub fn orient_rotation_to_movement<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, CharacterMovement)> = world
        .query::<(Entity, &CharacterMovement)>()
        .iter(world)
        .filter(|(_, movement)| movement.orient_rotation_to_movement)
        .map(|(e, movement)| (e, *movement))
        .collect();

    for (entity, movement) in entities {
        let velocity = B::get_velocity(world, entity);
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            let rotation = movement.orient_toward(transform.rotation, velocity, dt);
            // Avoid flagging the transform as changed when standing still.
            if rotation.angle_between(transform.rotation) > consts::PI * 1e-5 {
                transform.rotation = rotation;
            }
        }
    }
}

/// Sync state marker components based on cover and IK state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_cover: Query<(Entity, &CoverController, Option<&InCover>)>,
    q_hands: Query<(Entity, &IkState, Option<&HandTouchingWall>)>,
) {
    for (entity, controller, marker) in &q_cover {
        match (controller.cover_normal(), marker) {
            (Some(normal), None) => {
                commands.entity(entity).insert(InCover::new(normal));
            }
            (Some(normal), Some(marker)) if marker.normal != normal => {
                commands.entity(entity).insert(InCover::new(normal));
            }
            (None, Some(_)) => {
                commands.entity(entity).remove::<InCover>();
            }
            _ => {}
        }
    }

    for (entity, state, marker) in &q_hands {
        let contact = HandTouchingWall::new(state.left_hand_hit_wall, state.right_hand_hit_wall);
        match (state.any_hand_on_wall(), marker) {
            (true, None) => {
                commands.entity(entity).insert(contact);
            }
            (true, Some(marker)) if marker.left != contact.left || marker.right != contact.right => {
                commands.entity(entity).insert(contact);
            }
            (false, Some(_)) => {
                commands.entity(entity).remove::<HandTouchingWall>();
            }
            _ => {}
        }
    }
}
