//! Per-entity repositories: each composes the remote adapter for its
//! entity with the synchronization layer and exposes only the operations
//! that entity supports.

mod addresses;
mod clubs;
mod raids;
mod races;
mod teams;
mod users;

pub use addresses::AddressRepository;
pub use clubs::ClubRepository;
pub use raids::RaidRepository;
pub use races::RaceRepository;
pub use teams::TeamRepository;
pub use users::UserRepository;
