//! JSON text framing for the chat channel.
//!
//! Every transport frame carries exactly one JSON object. Inbound objects
//! are told apart by their `type` field: `"userList"` is a presence
//! snapshot, anything else (including no `type` at all) is a chat message.

use serde_json::Value;

use crate::error::{ChatError, ChatResult};
use crate::messages::{ChatFrame, InboundFrame, OutboundFrame, OutgoingMessage, PresenceFrame, USER_LIST_TYPE};

/// Encode an outgoing message as a single text frame.
pub fn encode_outbound(message: &OutgoingMessage) -> ChatResult<String> {
    serde_json::to_string(&OutboundFrame::from(message)).map_err(|e| ChatError::Codec(e.to_string()))
}

/// Decode one inbound text frame.
pub fn decode_inbound(text: &str) -> ChatResult<InboundFrame> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ChatError::MalformedFrame(format!("not JSON: {e}")))?;

    if !value.is_object() {
        return Err(ChatError::MalformedFrame("frame is not a JSON object".into()));
    }

    let is_presence = value.get("type").and_then(Value::as_str) == Some(USER_LIST_TYPE);

    if is_presence {
        let frame: PresenceFrame = serde_json::from_value(value)
            .map_err(|e| ChatError::MalformedFrame(format!("bad {USER_LIST_TYPE} frame: {e}")))?;
        Ok(InboundFrame::Presence(frame.into()))
    } else {
        let frame: ChatFrame = serde_json::from_value(value)
            .map_err(|e| ChatError::MalformedFrame(format!("bad chat frame: {e}")))?;
        Ok(InboundFrame::Chat(frame.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ChatMessage, RosterEntry, ANON_SENDER};
    use chrono::{TimeZone, Utc};

    #[test]
    fn encode_matches_wire_shape() {
        let msg = OutgoingMessage::new("hi", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let text = encode_outbound(&msg).unwrap();
        assert_eq!(text, r#"{"message":"hi","time":"2024-01-01T00:00:00Z"}"#);
    }

    #[test]
    fn encode_keeps_subsecond_precision() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap() + chrono::Duration::milliseconds(250);
        let text = encode_outbound(&OutgoingMessage::new("x", ts)).unwrap();
        assert!(text.contains(r#""time":"2024-01-01T12:30:00.250Z""#), "{text}");
    }

    #[test]
    fn decode_untagged_chat() {
        let frame = decode_inbound(r#"{"username":"alice","message":"hello","time":"2024-01-01T00:00:00Z"}"#).unwrap();
        match frame {
            InboundFrame::Chat(msg) => {
                assert_eq!(msg.sender, "alice");
                assert_eq!(msg.body, "hello");
                assert_eq!(msg.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
            }
            other => panic!("expected chat, got {other:?}"),
        }
    }

    #[test]
    fn decode_chat_without_sender_is_anon() {
        let frame = decode_inbound(r#"{"message":"psst","time":"2024-01-01T00:00:00Z"}"#).unwrap();
        let InboundFrame::Chat(msg) = frame else {
            panic!("expected chat");
        };
        assert_eq!(msg.sender, ANON_SENDER);
    }

    #[test]
    fn decode_chat_uses_user_field() {
        let frame = decode_inbound(r#"{"user":"bob","message":"yo","time":"2024-01-01T00:00:00+02:00"}"#).unwrap();
        let InboundFrame::Chat(msg) = frame else {
            panic!("expected chat");
        };
        assert_eq!(msg.sender, "bob");
        assert_eq!(msg.timestamp, Utc.with_ymd_and_hms(2023, 12, 31, 22, 0, 0).unwrap());
    }

    fn decode_chat(text: &str) -> ChatMessage {
        match decode_inbound(text) {
            Ok(InboundFrame::Chat(msg)) => msg,
            other => panic!("expected chat, got {other:?}"),
        }
    }

    #[test]
    fn decode_chat_with_offsetless_time() {
        let msg = decode_chat(r#"{"username":"bob","message":"hello","time":"2024-01-01T12:00:00"}"#);
        assert_eq!(msg.sender, "bob");
        assert_eq!(msg.body, "hello");
        assert_eq!(msg.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn decode_chat_with_unreadable_time_keeps_message() {
        let before = Utc::now();
        for text in [
            r#"{"username":"bob","message":"hello","time":"garbage"}"#,
            r#"{"username":"bob","message":"hello","time":12345}"#,
            r#"{"username":"bob","message":"hello","time":null}"#,
            r#"{"username":"bob","message":"hello"}"#,
        ] {
            let msg = decode_chat(text);
            assert_eq!(msg.sender, "bob", "{text}");
            assert_eq!(msg.body, "hello", "{text}");
            assert!(msg.timestamp >= before && msg.timestamp <= Utc::now(), "{text}");
        }
    }

    #[test]
    fn decode_rejects_non_string_body() {
        let err = decode_inbound(r#"{"username":"alice","message":42}"#).unwrap_err();
        assert!(matches!(err, ChatError::MalformedFrame(_)));
    }

    #[test]
    fn decode_unknown_type_falls_back_to_chat() {
        let frame =
            decode_inbound(r#"{"type":"somethingElse","username":"carol","message":"m","time":"2024-01-01T00:00:00Z"}"#)
                .unwrap();
        assert!(matches!(frame, InboundFrame::Chat(_)));
    }

    #[test]
    fn decode_user_list() {
        let frame = decode_inbound(r#"{"type":"userList","users":[{"username":"alice"},{"username":"bob"}]}"#).unwrap();
        let InboundFrame::Presence(event) = frame else {
            panic!("expected presence");
        };
        assert_eq!(
            event.users,
            vec![
                RosterEntry { username: "alice".into() },
                RosterEntry { username: "bob".into() },
            ]
        );
    }

    #[test]
    fn decode_empty_user_list() {
        let frame = decode_inbound(r#"{"type":"userList","users":[]}"#).unwrap();
        assert_eq!(frame, InboundFrame::Presence(Default::default()));
    }

    #[test]
    fn decode_rejects_non_json() {
        let err = decode_inbound("definitely not json").unwrap_err();
        assert!(matches!(err, ChatError::MalformedFrame(_)));
    }

    #[test]
    fn decode_rejects_non_object() {
        assert!(matches!(decode_inbound("[1,2,3]"), Err(ChatError::MalformedFrame(_))));
        assert!(matches!(decode_inbound("\"hi\""), Err(ChatError::MalformedFrame(_))));
    }

    #[test]
    fn decode_rejects_chat_without_body() {
        let err = decode_inbound(r#"{"username":"alice","time":"2024-01-01T00:00:00Z"}"#).unwrap_err();
        assert!(matches!(err, ChatError::MalformedFrame(_)));
    }

    #[test]
    fn decode_rejects_user_list_without_users() {
        let err = decode_inbound(r#"{"type":"userList"}"#).unwrap_err();
        assert!(matches!(err, ChatError::MalformedFrame(_)));
    }
}
