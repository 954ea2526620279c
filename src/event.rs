use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMessage {
    pub group_id: i64,
    pub user_id: i64,
    pub role: String,
    pub text: String,
}

impl GroupMessage {
    pub fn sender_is_group_admin(&self) -> bool {
        self.role == "owner" || self.role == "admin"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    MemberJoined { group_id: i64, user_id: i64 },
    MemberLeft { group_id: i64, user_id: i64 },
    GroupMessage(GroupMessage),
    Other,
}

// numbers sometimes arrive as strings depending on the gateway build
fn id_field(raw: &Value, key: &str) -> Option<i64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn str_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str)
}

impl Event {
    pub fn from_value(raw: &Value) -> Event {
        if !raw.is_object() {
            return Event::Other;
        }
        match str_field(raw, "post_type") {
            Some("notice") => Self::from_notice(raw),
            Some("message") => Self::from_message(raw),
            _ => Event::Other,
        }
    }

    fn from_notice(raw: &Value) -> Event {
        let (Some(group_id), Some(user_id)) = (id_field(raw, "group_id"), id_field(raw, "user_id"))
        else {
            return Event::Other;
        };
        match str_field(raw, "notice_type") {
            Some("group_increase") => Event::MemberJoined { group_id, user_id },
            Some("group_decrease") => Event::MemberLeft { group_id, user_id },
            _ => Event::Other,
        }
    }

    fn from_message(raw: &Value) -> Event {
        if str_field(raw, "message_type") != Some("group") {
            return Event::Other;
        }
        let (Some(group_id), Some(user_id)) = (id_field(raw, "group_id"), id_field(raw, "user_id"))
        else {
            return Event::Other;
        };
        let role = raw
            .get("sender")
            .and_then(|s| str_field(s, "role"))
            .unwrap_or("member")
            .to_string();
        let text = str_field(raw, "raw_message").unwrap_or_default().to_string();
        Event::GroupMessage(GroupMessage {
            group_id,
            user_id,
            role,
            text,
        })
    }

    /// Whether the event was caused by the bot account itself.
    pub fn is_from_self(&self, self_id: Option<i64>) -> bool {
        let Some(self_id) = self_id else {
            return false;
        };
        match self {
            Event::MemberJoined { user_id, .. } | Event::MemberLeft { user_id, .. } => {
                *user_id == self_id
            }
            Event::GroupMessage(msg) => msg.user_id == self_id,
            Event::Other => false,
        }
    }
}

pub fn self_id(raw: &Value) -> Option<i64> {
    id_field(raw, "self_id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn member_joined_notice() {
        let raw = json!({
            "post_type": "notice",
            "notice_type": "group_increase",
            "group_id": 123,
            "user_id": 456,
            "self_id": 1,
        });
        assert_eq!(
            Event::from_value(&raw),
            Event::MemberJoined {
                group_id: 123,
                user_id: 456
            }
        );
        assert_eq!(self_id(&raw), Some(1));
    }

    #[test]
    fn member_left_notice_with_string_ids() {
        let raw = json!({
            "post_type": "notice",
            "notice_type": "group_decrease",
            "group_id": "123",
            "user_id": "456",
        });
        assert_eq!(
            Event::from_value(&raw),
            Event::MemberLeft {
                group_id: 123,
                user_id: 456
            }
        );
    }

    #[test]
    fn other_notices_are_ignored() {
        let raw = json!({
            "post_type": "notice",
            "notice_type": "group_recall",
            "group_id": 123,
            "user_id": 456,
        });
        assert_eq!(Event::from_value(&raw), Event::Other);
        let heartbeat = json!({"post_type": "meta_event", "meta_event_type": "heartbeat"});
        assert_eq!(Event::from_value(&heartbeat), Event::Other);
        assert_eq!(Event::from_value(&json!("notice")), Event::Other);
        let missing_group = json!({"post_type": "notice", "notice_type": "group_increase"});
        assert_eq!(Event::from_value(&missing_group), Event::Other);
    }

    #[test]
    fn group_message_carries_role() {
        let raw = json!({
            "post_type": "message",
            "message_type": "group",
            "group_id": 123,
            "user_id": 456,
            "raw_message": "查看欢迎语",
            "sender": {"role": "admin", "nickname": "x"},
        });
        match Event::from_value(&raw) {
            Event::GroupMessage(msg) => {
                assert_eq!(msg.text, "查看欢迎语");
                assert!(msg.sender_is_group_admin());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn private_message_is_other() {
        let raw = json!({
            "post_type": "message",
            "message_type": "private",
            "user_id": 456,
            "raw_message": "hi",
        });
        assert_eq!(Event::from_value(&raw), Event::Other);
    }

    #[test]
    fn self_events_are_detected() {
        let event = Event::MemberJoined {
            group_id: 1,
            user_id: 99,
        };
        assert!(event.is_from_self(Some(99)));
        assert!(!event.is_from_self(Some(98)));
        assert!(!event.is_from_self(None));
    }
}
