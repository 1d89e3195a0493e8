//! Integration tests for the cover/IK controller.
//!
//! These tests verify the complete system behavior with actual Rapier scene
//! queries. Each test checks the resulting transforms, IK outputs and marker
//! components directly.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use bevy::time::Virtual;
use bevy_rapier3d::prelude::*;
use msg_cover_ik::prelude::*;

#[cfg(feature = "rapier3d")]
use msg_cover_ik::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};

const CAPSULE_HALF_SEGMENT: f32 = 50.0;
const CAPSULE_RADIUS: f32 = 20.0;
/// Center-to-bottom distance of the test capsule.
const CAPSULE_HALF_HEIGHT: f32 = CAPSULE_HALF_SEGMENT + CAPSULE_RADIUS;

/// Create a minimal test app with physics and the controller.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
    app.add_plugins(CoverIkPlugin::<Rapier3dBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));

    app.finish();
    app.cleanup();
    app
}

/// Spawn a static box collider.
fn spawn_box(app: &mut App, position: Vec3, half_size: Vec3) -> Entity {
    let transform = Transform::from_translation(position);
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            RigidBody::Fixed,
            Collider::cuboid(half_size.x, half_size.y, half_size.z),
        ))
        .id()
}

/// Spawn a wall whose -X face sits at `face_x`, marked as cover.
fn spawn_cover_wall(app: &mut App, face_x: f32) -> Entity {
    let wall = spawn_box(
        app,
        Vec3::new(face_x + 5.0, 0.0, 0.0),
        Vec3::new(5.0, 200.0, 300.0),
    );
    app.world_mut().entity_mut(wall).insert(CoverSurface);
    wall
}

/// Spawn a cover character at `position` facing `forward` (horizontal).
fn spawn_character(app: &mut App, position: Vec3, forward: Vec3) -> Entity {
    let yaw = f32::atan2(-forward.x, -forward.z);
    let transform = Transform::from_translation(position).with_rotation(Quat::from_rotation_y(yaw));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            CoverController::new(),
            IkConfig::default(),
            IkState::default(),
            CharacterSockets::default(),
            Rapier3dCharacterBundle::new(),
            Collider::capsule_y(CAPSULE_HALF_SEGMENT, CAPSULE_RADIUS),
            GravityScale(0.0),
        ))
        .id()
}

/// Attach named socket entities to a character.
fn add_socket_children(app: &mut App, character: Entity, sockets: &[(&str, Vec3)]) {
    for (name, local) in sockets {
        let child = app
            .world_mut()
            .spawn((Name::new(name.to_string()), Transform::from_translation(*local)))
            .id();
        app.world_mut().entity_mut(character).add_child(child);
    }
}

/// Run one physics step.
fn tick(app: &mut App) {
    let timestep = std::time::Duration::from_secs_f64(1.0 / 60.0);
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .advance_by(timestep);
    app.update();
    app.world_mut().run_schedule(bevy::prelude::FixedUpdate);
    app.update();
}

/// Run the app for N physics frames.
fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        tick(app);
    }
}

fn intent_mut(app: &mut App, entity: Entity) -> Mut<'_, MovementIntent> {
    app.world_mut()
        .get_mut::<MovementIntent>(entity)
        .expect("character has a MovementIntent")
}

fn forward_of(app: &App, entity: Entity) -> Vec3 {
    app.world().get::<Transform>(entity).unwrap().rotation * Vec3::NEG_Z
}

// ==================== Cover Tests ====================

mod cover {
    use super::*;

    #[test]
    fn takes_cover_against_wall_ahead() {
        let mut app = create_test_app();
        spawn_cover_wall(&mut app, 150.0);
        let character = spawn_character(&mut app, Vec3::ZERO, Vec3::X);
        run_frames(&mut app, 2);

        intent_mut(&mut app, character).request_cover();
        tick(&mut app);

        let controller = app.world().get::<CoverController>(character).unwrap();
        assert!(controller.is_in_cover(), "Character should be in cover");

        let normal = controller.cover_normal().unwrap();
        assert!(
            (normal - Vec3::NEG_X).length() < 1e-3,
            "Cover normal should be the wall normal, got {:?}",
            normal
        );

        let position = app.world().get::<Transform>(character).unwrap().translation;
        assert!(
            (position.x - 115.0).abs() < 1.0,
            "Character should stand 35 units off the wall, got x = {}",
            position.x
        );
        assert!(position.z.abs() < 1.0);

        let forward = forward_of(&app, character);
        assert!(
            forward.dot(Vec3::NEG_X) > 0.99,
            "Character should face along the wall normal, got {:?}",
            forward
        );

        let marker = app.world().get::<InCover>(character);
        assert!(marker.is_some(), "InCover marker should be added");
    }

    #[test]
    fn cover_enables_plane_constraint() {
        let mut app = create_test_app();
        spawn_cover_wall(&mut app, 150.0);
        let character = spawn_character(&mut app, Vec3::ZERO, Vec3::X);
        run_frames(&mut app, 2);

        intent_mut(&mut app, character).request_cover();
        tick(&mut app);

        let movement = app.world().get::<CharacterMovement>(character).unwrap();
        assert!(movement.plane_constraint_enabled);
        assert!(!movement.orient_rotation_to_movement);
        assert!((movement.plane_constraint_normal - Vec3::NEG_X).length() < 1e-3);
    }

    #[test]
    fn unmarked_wall_is_not_cover() {
        let mut app = create_test_app();
        spawn_box(
            &mut app,
            Vec3::new(155.0, 0.0, 0.0),
            Vec3::new(5.0, 200.0, 300.0),
        );
        let character = spawn_character(&mut app, Vec3::ZERO, Vec3::X);
        run_frames(&mut app, 2);

        intent_mut(&mut app, character).request_cover();
        tick(&mut app);

        let controller = app.world().get::<CoverController>(character).unwrap();
        assert!(!controller.is_in_cover());
        assert!(app.world().get::<InCover>(character).is_none());
    }

    #[test]
    fn wall_out_of_range_is_not_cover() {
        let mut app = create_test_app();
        spawn_cover_wall(&mut app, 250.0);
        let character = spawn_character(&mut app, Vec3::ZERO, Vec3::X);
        run_frames(&mut app, 2);

        intent_mut(&mut app, character).request_cover();
        tick(&mut app);

        let controller = app.world().get::<CoverController>(character).unwrap();
        assert!(!controller.is_in_cover());
    }

    #[test]
    fn stop_request_leaves_cover() {
        let mut app = create_test_app();
        spawn_cover_wall(&mut app, 150.0);
        let character = spawn_character(&mut app, Vec3::ZERO, Vec3::X);
        run_frames(&mut app, 2);

        intent_mut(&mut app, character).request_cover();
        tick(&mut app);
        assert!(app.world().get::<InCover>(character).is_some());

        intent_mut(&mut app, character).request_stop_cover();
        tick(&mut app);

        let controller = app.world().get::<CoverController>(character).unwrap();
        assert!(!controller.is_in_cover());
        assert!(app.world().get::<InCover>(character).is_none());

        let movement = app.world().get::<CharacterMovement>(character).unwrap();
        assert!(!movement.plane_constraint_enabled);
        assert!(movement.orient_rotation_to_movement);
    }

    #[test]
    fn slides_along_wall_with_lateral_input() {
        let mut app = create_test_app();
        spawn_cover_wall(&mut app, 150.0);
        let character = spawn_character(&mut app, Vec3::ZERO, Vec3::X);
        add_socket_children(
            &mut app,
            character,
            &[
                ("upperarm_lCoverSocket", Vec3::new(-20.0, 40.0, 0.0)),
                ("upperarm_rCoverSocket", Vec3::new(20.0, 40.0, 0.0)),
            ],
        );
        run_frames(&mut app, 2);

        intent_mut(&mut app, character).request_cover();
        tick(&mut app);
        assert!(app.world().get::<InCover>(character).is_some());

        // View yaw of 90 degrees turns "right" into world -Z, along the wall.
        {
            let mut intent = intent_mut(&mut app, character);
            intent.set_view_yaw(FRAC_PI_2);
            intent.set_axes(0.0, 1.0);
        }
        run_frames(&mut app, 10);

        let position = app.world().get::<Transform>(character).unwrap().translation;
        assert!(
            position.z < -1.0,
            "Character should slide along the wall, got z = {}",
            position.z
        );
        assert!(
            (position.x - 115.0).abs() < 1.0,
            "Character should stay against the wall, got x = {}",
            position.x
        );
        assert!(app.world().get::<CoverController>(character).unwrap().is_in_cover());
    }

    #[test]
    fn sockets_collected_from_named_children() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app, Vec3::new(10.0, 0.0, 0.0), Vec3::NEG_Z);
        add_socket_children(&mut app, character, &[("foot_lSocket", Vec3::new(-15.0, -68.0, 0.0))]);
        run_frames(&mut app, 3);

        let sockets = app.world().get::<CharacterSockets>(character).unwrap();
        let foot = sockets.get("foot_lSocket").expect("socket should be collected");
        assert!((foot - Vec3::new(-5.0, -68.0, 0.0)).length() < 0.5);
    }
}

// ==================== IK Tests ====================

mod ik {
    use super::*;

    /// A kinematic character standing on a floor at y = 0, with a raised step
    /// under the right foot.
    fn setup_stepped_floor(step_height: f32) -> (App, Entity) {
        let mut app = create_test_app();
        spawn_box(
            &mut app,
            Vec3::new(0.0, -5.0, 0.0),
            Vec3::new(500.0, 5.0, 500.0),
        );
        if step_height > 0.0 {
            spawn_box(
                &mut app,
                Vec3::new(40.0, step_height / 2.0, 0.0),
                Vec3::new(15.0, step_height / 2.0, 50.0),
            );
        }

        let character = spawn_character(&mut app, Vec3::new(0.0, CAPSULE_HALF_HEIGHT, 0.0), Vec3::NEG_Z);
        let sockets = CharacterSockets::new()
            .with("foot_lSocket", Vec3::new(-35.0, 2.0, 0.0))
            .with("foot_rSocket", Vec3::new(35.0, 2.0, 0.0));
        app.world_mut().entity_mut(character).insert((
            sockets,
            Rapier3dCharacterBundle::new().with_body(RigidBody::KinematicPositionBased),
        ));
        (app, character)
    }

    #[test]
    fn flat_floor_keeps_feet_level() {
        let (mut app, character) = setup_stepped_floor(0.0);
        run_frames(&mut app, 20);

        let state = app.world().get::<IkState>(character).unwrap();
        assert!(state.left_foot_offset.abs() < 0.5);
        assert!(state.right_foot_offset.abs() < 0.5);
        assert!(state.hip_offset.abs() < 0.5);
        assert!(state.left_foot_hit_point.y.abs() < 0.5);
        assert!((state.left_foot_surface_normal - Vec3::Y).length() < 1e-3);
    }

    #[test]
    fn step_lowers_hip_and_raises_foot() {
        let (mut app, character) = setup_stepped_floor(20.0);
        run_frames(&mut app, 30);

        let state = app.world().get::<IkState>(character).unwrap();
        assert!(
            (state.right_foot_hit_point.y - 20.0).abs() < 0.5,
            "Right foot should land on the step, got {:?}",
            state.right_foot_hit_point
        );
        assert!(
            state.hip_offset < -1.0,
            "Hip should drop toward -10, got {}",
            state.hip_offset
        );
        assert!(
            state.right_foot_offset > state.left_foot_offset + 5.0,
            "Right foot should sit higher: left {}, right {}",
            state.left_foot_offset,
            state.right_foot_offset
        );
    }

    #[test]
    fn hands_touch_wall_in_reach() {
        let mut app = create_test_app();
        // Wall face at z = -60, in front of a character facing -Z.
        spawn_box(
            &mut app,
            Vec3::new(0.0, 0.0, -65.0),
            Vec3::new(300.0, 200.0, 5.0),
        );
        let character = spawn_character(&mut app, Vec3::ZERO, Vec3::NEG_Z);
        let sockets = CharacterSockets::new()
            .with("upperarm_lSocket", Vec3::new(-20.0, 40.0, 0.0))
            .with("upperarm_rSocket", Vec3::new(20.0, 40.0, 0.0));
        app.world_mut().entity_mut(character).insert(sockets);
        run_frames(&mut app, 3);

        let state = app.world().get::<IkState>(character).unwrap();
        assert!(state.left_hand_hit_wall);
        assert!(state.right_hand_hit_wall);
        assert!((state.left_hand_location - Vec3::new(-20.0, 40.0, -60.0)).length() < 1.0);

        let marker = app.world().get::<HandTouchingWall>(character);
        assert!(marker.is_some_and(|m| m.both()));
    }

    #[test]
    fn hands_reach_out_without_wall() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app, Vec3::ZERO, Vec3::NEG_Z);
        let sockets = CharacterSockets::new()
            .with("upperarm_lSocket", Vec3::new(-20.0, 40.0, 0.0))
            .with("upperarm_rSocket", Vec3::new(20.0, 40.0, 0.0));
        app.world_mut().entity_mut(character).insert(sockets);
        run_frames(&mut app, 3);

        let state = app.world().get::<IkState>(character).unwrap();
        assert!(!state.left_hand_hit_wall);
        assert!((state.right_hand_location - Vec3::new(20.0, 40.0, -100.0)).length() < 1e-3);
        assert!(app.world().get::<HandTouchingWall>(character).is_none());
    }
}

// ==================== Movement Tests ====================

mod movement {
    use super::*;

    #[test]
    fn input_moves_character_relative_to_view() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app, Vec3::ZERO, Vec3::NEG_Z);
        run_frames(&mut app, 2);

        intent_mut(&mut app, character).set_axes(1.0, 0.0);
        run_frames(&mut app, 5);

        let velocity = app.world().get::<Velocity>(character).unwrap().linvel;
        assert!(
            velocity.z < -500.0,
            "Forward input should move along -Z, got {:?}",
            velocity
        );
        let position = app.world().get::<Transform>(character).unwrap().translation;
        assert!(position.z < 0.0);
    }

    #[test]
    fn character_turns_toward_movement() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app, Vec3::ZERO, Vec3::NEG_Z);
        run_frames(&mut app, 2);

        intent_mut(&mut app, character).set_axes(0.0, 1.0);
        run_frames(&mut app, 30);

        let forward = forward_of(&app, character);
        assert!(
            forward.x > 0.5,
            "Character should turn toward +X, got {:?}",
            forward
        );
    }
}
