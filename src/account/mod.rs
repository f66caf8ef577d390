//! Account domain — identity resolution and lifecycle management.
//!
//! A phone number can map to zero, one, or several independent accounts
//! depending on the client surface and chosen participant type. The resolver
//! disambiguates logins; the lifecycle manager owns every mutation, driven by
//! the pure state machine in [`state`].

pub mod commands;
pub mod lifecycle;
pub mod model;
pub mod resolver;
pub mod state;

pub use commands::{AssignParticipantType, Command, CreateAccount, ReactivateAccount};
pub use lifecycle::LifecycleManager;
pub use model::{
    Account, AccountView, Generation, JoinType, LifecycleState, ParticipantType, Surface,
};
pub use resolver::{PhoneDirectoryResolver, normalize_phone};
pub use state::{AccountState, Effect, Transition, Verification, transition};
