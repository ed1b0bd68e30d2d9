use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod mailbox;

pub use mailbox::{channel, Delivery, MailboxError, MailboxReceiver, MailboxSender};

// ============================================================================
// ENTITIES
// ============================================================================

/// Kind of entity a published state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Group,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::User => f.write_str("user"),
            EntityType::Group => f.write_str("group"),
        }
    }
}

/// Topic key: one topic per entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct EntityKey {
    pub entity_type: EntityType,
    pub entity_id: String,
}

impl EntityKey {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            entity_type: EntityType::User,
            entity_id: id.into(),
        }
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self {
            entity_type: EntityType::Group,
            entity_id: id.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.entity_id)
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

/// Message delivered to subscribers whenever an entity's state is republished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StateMessage {
    pub entity_id: String,
    pub entity_type: EntityType,
    /// Serialized state (user snapshot or group analysis)
    pub state: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl StateMessage {
    pub fn new(key: &EntityKey, state: serde_json::Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            entity_id: key.entity_id.clone(),
            entity_type: key.entity_type,
            state,
            timestamp,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey {
            entity_type: self.entity_type,
            entity_id: self.entity_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_shape() {
        let msg = StateMessage::new(
            &EntityKey::user("u1"),
            serde_json::json!({"stale": false}),
            Utc::now(),
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["entity_id"], "u1");
        assert_eq!(json["entity_type"], "user");
        assert_eq!(json["state"]["stale"], false);
        assert!(json["timestamp"].is_string());
        assert_eq!(msg.key(), EntityKey::user("u1"));
    }

    #[test]
    fn test_schema_names_fields() {
        let schema = serde_json::to_value(schemars::schema_for!(StateMessage)).unwrap();
        let props = &schema["properties"];
        for field in ["entity_id", "entity_type", "state", "timestamp"] {
            assert!(props.get(field).is_some(), "missing {field}");
        }
    }
}
