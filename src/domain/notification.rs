use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "nova_demanda")]
    NewTicket,
    #[serde(rename = "comentario")]
    Comment,
    #[serde(rename = "mencao")]
    Mention,
    #[serde(rename = "demanda_atribuida")]
    Assignment,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewTicket => "nova_demanda",
            NotificationKind::Comment => "comentario",
            NotificationKind::Mention => "mencao",
            NotificationKind::Assignment => "demanda_atribuida",
        }
    }
}

/// Structured references carried alongside the notification message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationExtras {
    #[serde(rename = "demanda_id", skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<i64>,
    #[serde(rename = "autor_id", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(rename = "comentario_id", skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub extras: Option<NotificationExtras>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Row to insert; `read` starts false.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub extras: Option<NotificationExtras>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_to_wire_value() {
        let encoded = serde_json::to_string(&NotificationKind::NewTicket).unwrap();
        assert_eq!(encoded, "\"nova_demanda\"");
        let decoded: NotificationKind = serde_json::from_str("\"mencao\"").unwrap();
        assert_eq!(decoded, NotificationKind::Mention);
    }

    #[test]
    fn extras_skip_absent_references() {
        let extras = NotificationExtras {
            ticket_id: Some(7),
            author_id: None,
            comment_id: None,
        };
        assert_eq!(
            serde_json::to_string(&extras).unwrap(),
            "{\"demanda_id\":7}"
        );
    }
}
