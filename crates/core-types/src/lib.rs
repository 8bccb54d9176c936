pub mod enums;
pub mod error;
pub mod generate;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{CycleStatus, ProfileKind, Role};
pub use error::CoreError;
pub use structs::{
    Cycle, CycleWithProfiles, Profile, ProfileUpdate, RankingEntry, Scope, SummaryRow, User,
    Window,
};
