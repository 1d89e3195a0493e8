//! # `msg_cover_ik`
//!
//! Procedural foot/hand IK targets and a wall cover controller for 3D
//! characters, with physics backend abstraction.
//!
//! This crate provides:
//! - Foot placement: per-foot height offsets and surface-aligned rotations,
//!   plus a hip offset that keeps both feet on uneven ground
//! - Hand placement: forward hand probes that report wall contact points
//! - Cover: snapping flat against a wall, sliding along it and leaving it
//! - A small movement integrator with a plane constraint for cover movement
//! - Abstracts physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! The solvers are plain structs ([`ik::IkState`], [`cover::CoverController`])
//! with explicit update methods. World queries go through the
//! [`probe::RayCaster`] trait, so the same code runs against Rapier and
//! against analytic test geometry. Bevy systems in [`FixedUpdate`] drive them
//! in a fixed order, see [`CoverIkSet`].
//!
//! All distances are in world units with +Y up; characters face -Z.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_cover_ik::prelude::*;
//!
//! // Components for a character that can take cover and place its feet
//! let controller = CoverController::new();
//! let cover = CoverConfig::default().with_cover_distance(250.0);
//! let ik = IkConfig::default().with_hand_reach(80.0);
//! let mut intent = MovementIntent::default();
//! intent.request_cover();
//!
//! // These can be spawned together with physics components
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod cover;
pub mod ik;
pub mod intent;
pub mod movement;
pub mod probe;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::collision::{CollisionData, TraceChannel};
    pub use crate::config::{CoverConfig, IkConfig};
    pub use crate::cover::{CoverController, CoverState};
    pub use crate::ik::{IkState, Rotator};
    pub use crate::intent::MovementIntent;
    pub use crate::movement::{CharacterMovement, MovementIntegrator};
    pub use crate::probe::{CharacterPose, CharacterSockets, RayCaster, SocketLookup};
    pub use crate::state::{HandTouchingWall, InCover};
    pub use crate::{CoverIkPlugin, CoverIkSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{CoverSurface, Rapier3dBackend};
}

/// Ordering of the controller systems inside [`FixedUpdate`].
///
/// The sets run chained in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverIkSet {
    /// Stop-cover requests.
    Input,
    /// Socket positions from the skeleton.
    Sockets,
    /// Foot and hand probes (backend).
    Sensors,
    /// Cover requests and cover maintenance (backend).
    Cover,
    /// Movement integrator.
    Movement,
    /// State marker components.
    Markers,
}

/// Main plugin for the cover/IK controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// line traces and velocity access.
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_cover_ik::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(CoverIkPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct CoverIkPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for CoverIkPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for CoverIkPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::IkConfig>();
        app.register_type::<config::CoverConfig>();
        app.register_type::<cover::CoverController>();
        app.register_type::<cover::CoverState>();
        app.register_type::<ik::IkState>();
        app.register_type::<ik::Rotator>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<movement::CharacterMovement>();
        app.register_type::<probe::CharacterSockets>();
        app.register_type::<state::InCover>();
        app.register_type::<state::HandTouchingWall>();
        app.register_type::<collision::TraceChannel>();

        app.configure_sets(
            FixedUpdate,
            (
                CoverIkSet::Input,
                CoverIkSet::Sockets,
                CoverIkSet::Sensors,
                CoverIkSet::Cover,
                CoverIkSet::Movement,
                CoverIkSet::Markers,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            systems::process_stop_cover_requests.in_set(CoverIkSet::Input),
        );
        app.add_systems(
            FixedUpdate,
            systems::update_socket_locations.in_set(CoverIkSet::Sockets),
        );
        app.add_systems(
            FixedUpdate,
            (
                systems::apply_movement_input::<B>,
                systems::apply_plane_constraint::<B>,
                systems::orient_rotation_to_movement::<B>,
            )
                .chain()
                .in_set(CoverIkSet::Movement),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(CoverIkSet::Markers),
        );
    }
}
