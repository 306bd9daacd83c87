//! Subscription management for WebSocket clients.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Available subscription topics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTopic {
    /// New original badges.
    Minted,
    /// New clones drawn from an origin.
    Cloned,
    /// Origin records whose issued-clone count changed.
    OriginUpdated,
}

impl fmt::Display for SubscriptionTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubscriptionTopic::Minted => "minted",
            SubscriptionTopic::Cloned => "cloned",
            SubscriptionTopic::OriginUpdated => "origin_updated",
        };
        f.write_str(name)
    }
}

/// A message from the client.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { topic: SubscriptionTopic },
    Unsubscribe { topic: SubscriptionTopic },
    Ping,
}

/// A control message sent back to the client.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Ack {
        action: String,
        topic: SubscriptionTopic,
    },
    Pong,
    Error {
        message: String,
    },
}

/// Topics a single client is currently subscribed to.
#[derive(Debug, Default)]
pub struct ClientSubscriptions {
    topics: HashSet<SubscriptionTopic>,
}

impl ClientSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subscription. Returns `false` when already subscribed.
    pub fn subscribe(&mut self, topic: SubscriptionTopic) -> bool {
        self.topics.insert(topic)
    }

    /// Remove a subscription. Returns `false` when it did not exist.
    pub fn unsubscribe(&mut self, topic: &SubscriptionTopic) -> bool {
        self.topics.remove(topic)
    }

    pub fn is_subscribed(&self, topic: &SubscriptionTopic) -> bool {
        self.topics.contains(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse_from_action_tag() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"action":"subscribe","topic":"minted"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Subscribe {
                topic: SubscriptionTopic::Minted
            }
        ));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"action":"unsubscribe","topic":"origin_updated"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Unsubscribe {
                topic: SubscriptionTopic::OriginUpdated
            }
        ));

        let msg: ClientMessage = serde_json::from_str(r#"{"action":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn unknown_topics_are_rejected() {
        let result =
            serde_json::from_str::<ClientMessage>(r#"{"action":"subscribe","topic":"burned"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn server_messages_serialize_with_type_tag() {
        let ack = ServerMessage::Ack {
            action: "subscribe".to_string(),
            topic: SubscriptionTopic::Cloned,
        };
        assert_eq!(
            serde_json::to_string(&ack).unwrap(),
            r#"{"type":"ack","action":"subscribe","topic":"cloned"}"#
        );
        assert_eq!(
            serde_json::to_string(&ServerMessage::Pong).unwrap(),
            r#"{"type":"pong"}"#
        );
    }

    #[test]
    fn subscription_bookkeeping() {
        let mut subs = ClientSubscriptions::new();
        assert!(subs.subscribe(SubscriptionTopic::Minted));
        assert!(!subs.subscribe(SubscriptionTopic::Minted));
        assert!(subs.is_subscribed(&SubscriptionTopic::Minted));
        assert!(!subs.is_subscribed(&SubscriptionTopic::Cloned));
        assert!(subs.unsubscribe(&SubscriptionTopic::Minted));
        assert!(!subs.unsubscribe(&SubscriptionTopic::Minted));
    }

    #[test]
    fn topic_names_match_the_wire_format() {
        assert_eq!(SubscriptionTopic::Minted.to_string(), "minted");
        assert_eq!(SubscriptionTopic::OriginUpdated.to_string(), "origin_updated");
        assert_eq!(
            serde_json::to_string(&SubscriptionTopic::OriginUpdated).unwrap(),
            r#""origin_updated""#
        );
    }
}
