use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserProfile;

/// Ticket lifecycle. Transitions are unordered: any state is reachable from
/// any other through explicit user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    #[serde(rename = "pendente_visualizacao")]
    PendingReview,
    #[serde(rename = "visualizada")]
    Viewed,
    #[serde(rename = "em_producao")]
    InProduction,
    #[serde(rename = "finalizada")]
    Finalized,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::PendingReview,
        TicketStatus::Viewed,
        TicketStatus::InProduction,
        TicketStatus::Finalized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::PendingReview => "pendente_visualizacao",
            TicketStatus::Viewed => "visualizada",
            TicketStatus::InProduction => "em_producao",
            TicketStatus::Finalized => "finalizada",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pendente_visualizacao" | "pending" => Some(TicketStatus::PendingReview),
            "visualizada" | "viewed" => Some(TicketStatus::Viewed),
            "em_producao" | "production" => Some(TicketStatus::InProduction),
            "finalizada" | "finalized" => Some(TicketStatus::Finalized),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::PendingReview => "Pendente de Visualização",
            TicketStatus::Viewed => "Visualizada",
            TicketStatus::InProduction => "Em Produção",
            TicketStatus::Finalized => "Finalizada",
        }
    }
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::PendingReview
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "baixa")]
    Low,
    #[serde(rename = "media")]
    Medium,
    #[serde(rename = "alta")]
    High,
    #[serde(rename = "urgente")]
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "baixa",
            Priority::Medium => "media",
            Priority::High => "alta",
            Priority::Urgent => "urgente",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "baixa" | "low" => Some(Priority::Low),
            "media" | "medium" => Some(Priority::Medium),
            "alta" | "high" => Some(Priority::High),
            "urgente" | "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Requesting/responsible team tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Area {
    #[serde(rename = "suporte")]
    Support,
    #[serde(rename = "atendimento")]
    Service,
    #[serde(rename = "comercial")]
    Commercial,
}

impl Area {
    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Support => "suporte",
            Area::Service => "atendimento",
            Area::Commercial => "comercial",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "suporte" | "support" => Some(Area::Support),
            "atendimento" | "service" => Some(Area::Service),
            "comercial" | "commercial" => Some(Area::Commercial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub requesting_area: Area,
    pub responsible_area: Area,
    pub ad_server: String,
    pub agency: String,
    pub final_client: String,
    pub deadline: Option<NaiveDate>,
    pub notes: String,
    pub responsible: Option<String>,
    pub created_by: Option<String>,
    pub last_edited_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Embedded aggregate from the comment table.
    pub comment_count: u64,
    /// Creator profile joined by the list query.
    pub creator: Option<UserProfile>,
}

/// Fields accepted at creation time. The store stamps the creator from the
/// session.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub requesting_area: Area,
    pub responsible_area: Area,
    pub ad_server: String,
    pub agency: String,
    pub final_client: String,
    pub deadline: NaiveDate,
    pub notes: String,
    pub responsible: Option<String>,
}

/// Partial update. `None` fields are left untouched; the store stamps the
/// last editor and refreshes `updated_at`.
#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub requesting_area: Option<Area>,
    pub responsible_area: Option<Area>,
    pub ad_server: Option<String>,
    pub agency: Option<String>,
    pub final_client: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub notes: Option<String>,
    pub responsible: Option<String>,
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.requesting_area.is_none()
            && self.responsible_area.is_none()
            && self.ad_server.is_none()
            && self.agency.is_none()
            && self.final_client.is_none()
            && self.deadline.is_none()
            && self.notes.is_none()
            && self.responsible.is_none()
    }

    pub fn status_only(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_values_round_trip() {
        for status in TicketStatus::ALL {
            assert_eq!(TicketStatus::from_str(status.as_str()), Some(status));
            let encoded = serde_json::to_string(&status).unwrap();
            assert_eq!(encoded, format!("\"{}\"", status.as_str()));
            let decoded: TicketStatus = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, status);
        }
    }

    #[test]
    fn unset_status_defaults_to_pending_review() {
        assert_eq!(TicketStatus::default(), TicketStatus::PendingReview);
    }

    #[test]
    fn status_accepts_english_aliases() {
        assert_eq!(
            TicketStatus::from_str("viewed"),
            Some(TicketStatus::Viewed)
        );
        assert_eq!(
            TicketStatus::from_str("PRODUCTION"),
            Some(TicketStatus::InProduction)
        );
        assert_eq!(TicketStatus::from_str("archived"), None);
    }

    #[test]
    fn priority_and_area_parse_both_spellings() {
        assert_eq!(Priority::from_str("urgente"), Some(Priority::Urgent));
        assert_eq!(Priority::from_str("urgent"), Some(Priority::Urgent));
        assert_eq!(Area::from_str("atendimento"), Some(Area::Service));
        assert_eq!(Area::from_str("commercial"), Some(Area::Commercial));
        assert_eq!(Area::from_str("marketing"), None);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TicketPatch::default().is_empty());
        assert!(!TicketPatch::status_only(TicketStatus::Viewed).is_empty());
    }
}
