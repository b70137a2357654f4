//! Status flags carried by every mine.
//!
//! The flags are independent bits, not an exclusive state: a mine can be
//! active and invulnerable at the same time, and a detonated mine keeps its
//! `ACTIVE` bit.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Lifecycle and behaviour flags for a [`Mine`](super::Mine).
    ///
    /// # Lifecycle
    ///
    /// `SELF_DESTROYED` is set when the mine runs its detonation sequence and
    /// `INVALIDATED` when it has been removed from the pool store. A mine is
    /// never invalidated without having been self-destroyed first.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MineStatus: u8 {
        /// Scans for targets each round and may be picked to detonate.
        const ACTIVE = 0b0000_0001;
        /// Halts another mine's target scan when encountered.
        const INVULNERABLE = 0b0000_0010;
        /// Has executed its detonation sequence.
        const SELF_DESTROYED = 0b0000_0100;
        /// Removed from the store; must never be referenced again.
        const INVALIDATED = 0b0000_1000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(MineStatus::default().is_empty());
    }

    #[test]
    fn flags_are_independent() {
        let mut status = MineStatus::ACTIVE;
        status.set(MineStatus::INVULNERABLE, true);
        assert!(status.contains(MineStatus::ACTIVE | MineStatus::INVULNERABLE));

        status.set(MineStatus::ACTIVE, false);
        assert!(!status.contains(MineStatus::ACTIVE));
        assert!(status.contains(MineStatus::INVULNERABLE));
    }

    #[test]
    fn serialization_roundtrip() {
        let status = MineStatus::ACTIVE | MineStatus::SELF_DESTROYED;
        let json = serde_json::to_string(&status).unwrap();
        let back: MineStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, back);
    }
}
