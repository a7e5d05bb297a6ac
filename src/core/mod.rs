//! Core game types and entities

pub mod card;
pub mod entity;
pub mod events;
pub mod modifier;
pub mod player;
pub mod targeting;
pub mod types;

pub use card::{Card, CardArt, CardId, CardKind};
pub use entity::{EntityId, EntityStore, GameEntity, IdGenerator};
pub use events::GameEvent;
pub use modifier::{Expiry, Modifier, ModifierEffect, ModifierId};
pub use player::{Player, PlayerId};
pub use targeting::{TargetFilter, TargetRef, TargetSpec};
pub use types::{Affinity, BlueprintId, PlayerName};
