//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::{fixed_delta, CharacterPhysicsBackend};
use crate::collision::{CollisionData, TraceChannel};
use crate::config::{CoverConfig, IkConfig};
use crate::cover::CoverController;
use crate::ik::IkState;
use crate::intent::MovementIntent;
use crate::movement::CharacterMovement;
use crate::probe::{CharacterPose, CharacterSockets, RayCaster};

/// Rapier3D physics backend for the cover/IK controller.
///
/// Velocity access goes through Rapier's [`Velocity`] component. Line traces
/// are handled by dedicated Rapier systems that receive `RapierContext` as a
/// system parameter.
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    type VelocityComponent = Velocity;

    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }
}

/// Plugin that sets up Rapier3D-specific systems for the controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::CoverIkSet;

        app.register_type::<CoverSurface>();
        app.init_resource::<TraceChannelGroups>();

        app.add_systems(FixedUpdate, rapier_limb_ik.in_set(CoverIkSet::Sensors));
        app.add_systems(FixedUpdate, rapier_cover.in_set(CoverIkSet::Cover));
    }
}

/// Marker for colliders that count as cover.
///
/// Traces on [`TraceChannel::Cover`] ignore every collider without it.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct CoverSurface;

/// Collision groups used by each trace channel.
///
/// Both channels see all groups by default.
#[derive(Resource, Debug, Clone, Copy)]
pub struct TraceChannelGroups {
    pub visibility: CollisionGroups,
    pub cover: CollisionGroups,
}

impl Default for TraceChannelGroups {
    fn default() -> Self {
        Self {
            visibility: CollisionGroups::new(Group::ALL, Group::ALL),
            cover: CollisionGroups::new(Group::ALL, Group::ALL),
        }
    }
}

impl TraceChannelGroups {
    /// Groups for a channel.
    pub fn get(&self, channel: TraceChannel) -> CollisionGroups {
        match channel {
            TraceChannel::Visibility => self.visibility,
            TraceChannel::Cover => self.cover,
        }
    }
}

/// [`RayCaster`] over a Rapier context.
///
/// Ignores the character's own rigid body and sensors.
pub struct RapierProbe<'a> {
    context: &'a RapierContext<'a>,
    exclude: Entity,
    groups: TraceChannelGroups,
    is_cover_surface: &'a dyn Fn(Entity) -> bool,
}

impl<'a> RapierProbe<'a> {
    pub fn new(
        context: &'a RapierContext<'a>,
        exclude: Entity,
        groups: TraceChannelGroups,
        is_cover_surface: &'a dyn Fn(Entity) -> bool,
    ) -> Self {
        Self {
            context,
            exclude,
            groups,
            is_cover_surface,
        }
    }
}

impl RayCaster for RapierProbe<'_> {
    fn line_trace(&self, start: Vec3, end: Vec3, channel: TraceChannel) -> Option<CollisionData> {
        let delta = end - start;
        let length = delta.length();
        if length <= f32::EPSILON {
            return None;
        }
        let direction = delta / length;

        let mut filter = QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .exclude_sensors()
            .groups(self.groups.get(channel));
        if channel == TraceChannel::Cover {
            filter.predicate = Some(self.is_cover_surface);
        }

        self.context
            .cast_ray_and_get_normal(start, direction, length, true, filter)
            .map(|(hit_entity, hit)| {
                CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
            })
    }
}

/// Distance from collider center to its bottom.
///
/// For capsules this is the half segment length plus the radius.
pub fn capsule_half_height(collider: &Collider) -> f32 {
    if let Some(capsule) = collider.as_capsule() {
        let segment = capsule.segment();
        let half_height = (segment.a().y - segment.b().y).abs() / 2.0;
        half_height + capsule.radius()
    } else if let Some(ball) = collider.as_ball() {
        ball.radius()
    } else if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents().y
    } else {
        0.0
    }
}

/// Foot and hand probes for every character with an [`IkState`].
fn rapier_limb_ik(
    rapier_context: ReadRapierContext,
    time: Res<Time<Fixed>>,
    groups: Res<TraceChannelGroups>,
    q_cover_surfaces: Query<(), With<CoverSurface>>,
    mut q_characters: Query<(
        Entity,
        &Transform,
        &IkConfig,
        &mut IkState,
        Option<&CharacterSockets>,
        Option<&Collider>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    let dt = fixed_delta(&time);
    let is_cover_surface = |entity: Entity| q_cover_surfaces.contains(entity);
    let no_sockets = CharacterSockets::default();

    for (entity, transform, config, mut state, sockets, collider) in &mut q_characters {
        let half_height = collider.map(capsule_half_height).unwrap_or(0.0);
        let pose = CharacterPose::from_transform(transform, half_height);
        let sockets = sockets.unwrap_or(&no_sockets);
        let probe = RapierProbe::new(&context, entity, *groups, &is_cover_surface);

        state.solve_legs(config, &probe, &pose, sockets, dt);
        state.solve_hands(config, &probe, &pose, sockets);
    }
}

/// Cover requests and per-step cover maintenance.
fn rapier_cover(
    rapier_context: ReadRapierContext,
    groups: Res<TraceChannelGroups>,
    q_cover_surfaces: Query<(), With<CoverSurface>>,
    mut q_characters: Query<(
        Entity,
        &mut Transform,
        &CoverConfig,
        &mut CoverController,
        &mut CharacterMovement,
        &mut MovementIntent,
        Option<&CharacterSockets>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    let is_cover_surface = |entity: Entity| q_cover_surfaces.contains(entity);
    let no_sockets = CharacterSockets::default();

    for (entity, mut transform, config, mut controller, mut movement, mut intent, sockets) in
        &mut q_characters
    {
        let sockets = sockets.unwrap_or(&no_sockets);
        let probe = RapierProbe::new(&context, entity, *groups, &is_cover_surface);

        if intent.take_cover_request() {
            controller.try_cover(
                config,
                &probe,
                &mut transform,
                &mut *movement,
                intent.forward,
                intent.right,
            );
        } else if controller.is_in_cover() {
            controller.cover_trace(
                config,
                &probe,
                sockets,
                &mut transform,
                &mut *movement,
                intent.right,
            );
        }
    }
}

/// Bundle for creating a character with Rapier3D physics.
///
/// Rotation is locked: the movement integrator and the cover controller set
/// the facing directly on the [`Transform`].
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_cover_ik::prelude::*;
/// use msg_cover_ik::rapier::Rapier3dCharacterBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 96.0, 0.0),
///         CoverController::new(),
///         IkConfig::default(),
///         IkState::default(),
///         CharacterSockets::default(),
///         Rapier3dCharacterBundle::new(),
///         Collider::capsule_y(62.0, 34.0),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `velocity`: Zero velocity
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`]
/// - `damping`: Linear 0.0, Angular 1.0 (horizontal velocity is set each step)
#[derive(Bundle, Default)]
pub struct Rapier3dCharacterBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`] for characters.
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Written by the movement systems.
    pub velocity: Velocity,
    /// Which axes are locked.
    pub locked_axes: LockedAxes,
    /// Damping coefficients for velocity reduction.
    pub damping: Damping,
}

impl Rapier3dCharacterBundle {
    /// Create a new character bundle with rotation locked.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 1.0,
            },
        }
    }

    /// Set the rigid body type for the character.
    ///
    /// [`RigidBody::KinematicPositionBased`] suits scripted characters that
    /// should still take cover but ignore forces.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the damping coefficients for velocity reduction.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
        app.insert_resource(Time::<Fixed>::from_hz(60.0));
        app
    }

    #[test]
    fn rapier_backend_velocity() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((
                Transform::default(),
                RigidBody::Dynamic,
                GravityScale(0.0),
                Velocity::linear(Vec3::new(50.0, 0.0, 30.0)),
            ))
            .id();

        app.update();

        let vel = Rapier3dBackend::get_velocity(app.world(), entity);
        assert!((vel.x - 50.0).abs() < 0.01);
        assert!((vel.z - 30.0).abs() < 0.01);

        Rapier3dBackend::set_velocity(app.world_mut(), entity, Vec3::new(100.0, 0.0, 0.0));

        let vel = Rapier3dBackend::get_velocity(app.world(), entity);
        assert!((vel.x - 100.0).abs() < 0.01);
        assert!(vel.z.abs() < 0.01);
    }

    #[test]
    fn velocity_missing_component_is_zero() {
        let mut app = create_test_app();
        let entity = app.world_mut().spawn(Transform::default()).id();

        assert_eq!(Rapier3dBackend::get_velocity(app.world(), entity), Vec3::ZERO);
    }

    #[test]
    fn rapier_character_bundle_creates_valid_entity() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((
                Transform::default(),
                Rapier3dCharacterBundle::new(),
                Collider::capsule_y(62.0, 34.0),
            ))
            .id();

        app.update();

        assert!(app.world().get::<RigidBody>(entity).is_some());
        assert!(app.world().get::<Velocity>(entity).is_some());
        assert_eq!(
            *app.world().get::<LockedAxes>(entity).unwrap(),
            LockedAxes::ROTATION_LOCKED
        );
    }

    #[test]
    fn capsule_half_height_includes_radius() {
        assert!((capsule_half_height(&Collider::capsule_y(62.0, 34.0)) - 96.0).abs() < 1e-4);
        assert!((capsule_half_height(&Collider::ball(20.0)) - 20.0).abs() < 1e-4);
        assert!((capsule_half_height(&Collider::cuboid(5.0, 40.0, 5.0)) - 40.0).abs() < 1e-4);
    }

    #[test]
    fn trace_channel_groups_default_to_all() {
        let groups = TraceChannelGroups::default();
        assert_eq!(groups.get(TraceChannel::Visibility).filters, Group::ALL);
        assert_eq!(groups.get(TraceChannel::Cover).filters, Group::ALL);
    }
}
