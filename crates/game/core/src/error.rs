//! Common error infrastructure for crawl-core.
//!
//! Domain-specific errors (e.g. [`CastError`], [`CombatActionError`]) live in the
//! modules that validate them. This module only provides the shared severity
//! classification so clients can pick a recovery strategy without matching on
//! every concrete variant.

use crate::combat::CombatActionError;
use crate::magic::CastError;
use crate::player::{ConsumableError, InventoryError, UpgradeError};

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition. The same action may succeed later, or an
    /// alternative action is available right now.
    ///
    /// Examples: not enough slots this floor, summon on cooldown
    Recoverable,

    /// Invalid input. Retrying without changing the request is pointless.
    ///
    /// Examples: casting an unknown spell, upgrading an empty slot
    Validation,

    /// Unexpected state inconsistency. Indicates a bug and should be
    /// investigated rather than retried.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for all crawl-core errors.
///
/// Error enums derive `thiserror::Error` for Display and implement this trait
/// for classification. Clients (the CLI, future frontends) use the severity to
/// decide whether to re-prompt or to bail.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Useful for logging and testing without string-matching Display output.
    fn error_code(&self) -> &'static str;
}

impl GameError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotEnoughSlots { .. }
            | Self::SummonActive
            | Self::SummonOnCooldown { .. }
            | Self::TeleportOnCooldown { .. }
            | Self::AlreadyActive
            | Self::NoValidTarget => ErrorSeverity::Recoverable,
            Self::GrimoireLocked | Self::NotKnown | Self::CombatOnly | Self::ExploreOnly => {
                ErrorSeverity::Validation
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::GrimoireLocked => "cast.grimoire_locked",
            Self::NotKnown => "cast.not_known",
            Self::NotEnoughSlots { .. } => "cast.not_enough_slots",
            Self::SummonActive => "cast.summon_active",
            Self::SummonOnCooldown { .. } => "cast.summon_on_cooldown",
            Self::TeleportOnCooldown { .. } => "cast.teleport_on_cooldown",
            Self::AlreadyActive => "cast.already_active",
            Self::CombatOnly => "cast.combat_only",
            Self::ExploreOnly => "cast.explore_only",
            Self::NoValidTarget => "cast.no_valid_target",
        }
    }
}

impl GameError for CombatActionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::FightOver => ErrorSeverity::Internal,
            Self::NotEnoughHp { .. } => ErrorSeverity::Recoverable,
            Self::Cast(err) => err.severity(),
            Self::Consumable(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::FightOver => "combat.fight_over",
            Self::NotEnoughHp { .. } => "combat.not_enough_hp",
            Self::Cast(err) => err.error_code(),
            Self::Consumable(err) => err.error_code(),
        }
    }
}

impl GameError for ConsumableError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoSuchStack => ErrorSeverity::Validation,
            Self::NoSummon | Self::CombatOnly => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoSuchStack => "consumable.no_such_stack",
            Self::NoSummon => "consumable.no_summon",
            Self::CombatOnly => "consumable.combat_only",
        }
    }
}

impl GameError for InventoryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ItemsFull { .. } | Self::ConsumablesFull => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ItemsFull { .. } => "inventory.items_full",
            Self::ConsumablesFull => "inventory.consumables_full",
        }
    }
}

impl GameError for UpgradeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotEnoughGold { .. } => ErrorSeverity::Recoverable,
            Self::SlotEmpty | Self::AtUpgradeCap => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::SlotEmpty => "upgrade.slot_empty",
            Self::NotEnoughGold { .. } => "upgrade.not_enough_gold",
            Self::AtUpgradeCap => "upgrade.at_cap",
        }
    }
}
