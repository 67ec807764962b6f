//! Entity types: identifiers, teams, and the persisted records.
//!
//! - [`GameId`], [`ShipId`], [`MoveId`], [`ObjectiveId`]: numeric newtype ids
//! - [`Team`], [`PlayerId`]: string newtypes
//! - [`Game`], [`Ship`], [`Objective`]: the entity records themselves
//!
//! # Ordering
//!
//! All ids order by their numeric value. Every per-game collection is a
//! `BTreeMap` keyed by id, so iteration order is the same on every run.

pub mod game;
pub mod objective;
pub mod ship;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use game::{EndReason, Game, Outcome, Phase};
pub use objective::{Control, Objective, ObjectiveKind, ObjectiveSpec, ObjectiveStatus};
pub use ship::{Controller, FiringArc, Ship, ShipSpec, ShipStatus, Weapon};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates an id from its raw value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self::new(id)
            }
        }
    };
}

numeric_id!(
    /// Identifies a game in the arena.
    GameId
);
numeric_id!(
    /// Identifies a ship within its game. Assigned from 1 upward.
    ShipId
);
numeric_id!(
    /// Identifies a submitted move within its game.
    MoveId
);
numeric_id!(
    /// Identifies an objective within its game.
    ObjectiveId
);

/// A side in the battle (e.g. `"federation"`).
///
/// Team names are case-sensitive and compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team(String);

impl Team {
    /// Creates a team from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the team name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Team {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A human player's identity, as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Creates a player id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
