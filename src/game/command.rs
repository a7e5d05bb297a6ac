//! Command wire codec
//!
//! Everything a client may ask the engine to do arrives as a command:
//! `{ "type": "...", "player": n, "payload": {...} }`. The type registry
//! is closed; a type outside it decodes to `None` and the caller drops it
//! without error, so a newer client talking to an older engine degrades
//! to ignored input rather than a poisoned queue. A known type with a
//! malformed payload is a validation error, not a fatal one.
//!
//! Commands are immutable once decoded. The processor appends every
//! executed command to its history verbatim, and replaying that history
//! against the same seed reconstructs the game.

use crate::core::{CardId, PlayerId, TargetRef};
use crate::game::interaction::InteractionAnswer;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything after the envelope: what the player wants to do.
///
/// Serializes adjacently tagged so the wire shape is exactly
/// `{"type": ..., "payload": {...}}` with the payload absent for
/// parameterless commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum CommandAction {
    /// Play a card from hand during the main phase
    PlayCard {
        card: CardId,
        #[serde(default)]
        slot: Option<u8>,
        #[serde(default)]
        targets: Vec<TargetRef>,
    },

    /// Chain a response onto the open chain
    AddResponse {
        card: CardId,
        #[serde(default)]
        targets: Vec<TargetRef>,
    },

    /// Decline to add to the open chain
    PassChain,

    /// Open combat with this attacker
    DeclareAttacker { attacker: CardId },

    /// Lock in what the declared attacker hits
    DeclareAttackTarget { target: CardId },

    /// Back out of combat before the target is locked in
    CancelAttack,

    /// Toggle one option in the open interaction
    InteractionSelect { target: TargetRef },

    /// Commit a full answer to the open interaction
    InteractionCommit { answer: InteractionAnswer },

    EndTurn,

    Concede,
}

impl CommandAction {
    /// Wire name of this command, as it appears in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            CommandAction::PlayCard { .. } => "play_card",
            CommandAction::AddResponse { .. } => "add_response",
            CommandAction::PassChain => "pass_chain",
            CommandAction::DeclareAttacker { .. } => "declare_attacker",
            CommandAction::DeclareAttackTarget { .. } => "declare_attack_target",
            CommandAction::CancelAttack => "cancel_attack",
            CommandAction::InteractionSelect { .. } => "interaction_select",
            CommandAction::InteractionCommit { .. } => "interaction_commit",
            CommandAction::EndTurn => "end_turn",
            CommandAction::Concede => "concede",
        }
    }
}

/// The fixed registry of command types this engine understands
pub const KNOWN_COMMAND_TYPES: &[&str] = &[
    "play_card",
    "add_response",
    "pass_chain",
    "declare_attacker",
    "declare_attack_target",
    "cancel_attack",
    "interaction_select",
    "interaction_commit",
    "end_turn",
    "concede",
];

/// A decoded, validated command ready for the processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub player: PlayerId,
    pub action: CommandAction,
}

impl Command {
    pub fn new(player: PlayerId, action: CommandAction) -> Self {
        Command { player, action }
    }

    /// Decode a wire command. `Ok(None)` means the type is not in the
    /// registry and the command should be silently dropped.
    pub fn decode(value: &Value) -> Result<Option<Command>> {
        let obj = value
            .as_object()
            .ok_or_else(|| EngineError::InvalidCommand("command is not an object".to_string()))?;

        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::InvalidCommand("command has no type".to_string()))?;
        if !KNOWN_COMMAND_TYPES.contains(&kind) {
            return Ok(None);
        }

        let player = obj
            .get("player")
            .and_then(Value::as_u64)
            .ok_or_else(|| EngineError::InvalidCommand("command has no player".to_string()))?;
        let player: PlayerId = crate::core::EntityId::new(player as u32);

        // Rebuild the adjacently-tagged shape without the envelope fields
        // so serde can do the per-type payload validation.
        let mut tagged = serde_json::Map::new();
        tagged.insert("type".to_string(), Value::String(kind.to_string()));
        if let Some(payload) = obj.get("payload") {
            tagged.insert("payload".to_string(), payload.clone());
        }
        let action: CommandAction =
            serde_json::from_value(Value::Object(tagged)).map_err(|e| {
                EngineError::InvalidCommand(format!("malformed {kind} payload: {e}"))
            })?;

        Ok(Some(Command { player, action }))
    }

    /// Encode to the wire shape. Inverse of [`Command::decode`].
    pub fn encode(&self) -> Result<Value> {
        let mut obj = match serde_json::to_value(&self.action)? {
            Value::Object(map) => map,
            _ => {
                return Err(EngineError::CorruptState(
                    "command action did not serialize to an object".to_string(),
                ))
            }
        };
        obj.insert(
            "player".to_string(),
            Value::Number(self.player.as_u32().into()),
        );
        Ok(Value::Object(obj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use serde_json::json;

    #[test]
    fn test_decode_play_card() {
        let wire = json!({
            "type": "play_card",
            "player": 0,
            "payload": { "card": 7, "slot": 2 },
        });
        let command = Command::decode(&wire).unwrap().unwrap();
        assert_eq!(command.player, EntityId::new(0));
        assert_eq!(
            command.action,
            CommandAction::PlayCard {
                card: EntityId::new(7),
                slot: Some(2),
                targets: Vec::new(),
            }
        );
    }

    #[test]
    fn test_decode_parameterless_command_without_payload() {
        let wire = json!({ "type": "end_turn", "player": 1 });
        let command = Command::decode(&wire).unwrap().unwrap();
        assert_eq!(command.action, CommandAction::EndTurn);
    }

    #[test]
    fn test_unknown_type_is_silently_dropped() {
        let wire = json!({ "type": "emote", "player": 0, "payload": { "face": "wave" } });
        assert!(Command::decode(&wire).unwrap().is_none());
    }

    #[test]
    fn test_malformed_payload_is_a_validation_error() {
        let wire = json!({ "type": "play_card", "player": 0, "payload": { "slot": 2 } });
        let err = Command::decode(&wire).unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(err, EngineError::InvalidCommand(_)));
    }

    #[test]
    fn test_missing_player_rejected() {
        let wire = json!({ "type": "end_turn" });
        assert!(Command::decode(&wire).is_err());
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let command = Command::new(
            EntityId::new(1),
            CommandAction::AddResponse {
                card: EntityId::new(12),
                targets: vec![TargetRef::card(EntityId::new(3))],
            },
        );
        let wire = command.encode().unwrap();
        assert_eq!(wire["type"], "add_response");
        assert_eq!(wire["player"], 1);
        let back = Command::decode(&wire).unwrap().unwrap();
        assert_eq!(back, command);
    }

    #[test]
    fn test_every_kind_is_registered() {
        let actions = [
            CommandAction::PlayCard {
                card: EntityId::new(0),
                slot: None,
                targets: Vec::new(),
            },
            CommandAction::AddResponse {
                card: EntityId::new(0),
                targets: Vec::new(),
            },
            CommandAction::PassChain,
            CommandAction::DeclareAttacker {
                attacker: EntityId::new(0),
            },
            CommandAction::DeclareAttackTarget {
                target: EntityId::new(0),
            },
            CommandAction::CancelAttack,
            CommandAction::InteractionSelect {
                target: TargetRef::card(EntityId::new(0)),
            },
            CommandAction::InteractionCommit {
                answer: InteractionAnswer::Bool { value: true },
            },
            CommandAction::EndTurn,
            CommandAction::Concede,
        ];
        for action in actions {
            assert!(
                KNOWN_COMMAND_TYPES.contains(&action.kind()),
                "{} missing from the registry",
                action.kind()
            );
        }
    }
}
