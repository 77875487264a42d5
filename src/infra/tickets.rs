use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ticket::{Area, Priority, Ticket, TicketDraft, TicketPatch, TicketStatus};
use crate::domain::user::UserProfile;
use crate::error::{AppError, AppResult};
use crate::infra::rest::RestClient;
use crate::services::TicketStore;
use crate::session::Session;

const TABLE: &str = "demandas";
const LIST_SELECT: &str =
    "*,profile:profiles(id,email,full_name),comentarios_count:comentarios(count)";

pub struct TicketTable {
    rest: Arc<RestClient>,
}

impl TicketTable {
    pub fn new(rest: Arc<RestClient>) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl TicketStore for TicketTable {
    async fn list(&self, session: &Session) -> AppResult<Vec<Ticket>> {
        let rows: Vec<TicketRow> = self
            .rest
            .select(
                session,
                TABLE,
                &[
                    ("select", LIST_SELECT.to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(TicketRow::into_domain).collect())
    }

    async fn get(&self, session: &Session, id: i64) -> AppResult<Ticket> {
        let row: TicketRow = self
            .rest
            .select_one(
                session,
                TABLE,
                &[
                    ("select", LIST_SELECT.to_string()),
                    ("id", format!("eq.{id}")),
                ],
                "ticket",
            )
            .await?;
        Ok(row.into_domain())
    }

    async fn create(&self, session: &Session, draft: TicketDraft) -> AppResult<Ticket> {
        let row = NewTicketRow {
            titulo: &draft.title,
            descricao: &draft.description,
            status: draft.status,
            prioridade: draft.priority,
            area_solicitante: draft.requesting_area,
            area_responsavel: draft.responsible_area,
            adserver: &draft.ad_server,
            agencia: &draft.agency,
            cliente_final: &draft.final_client,
            prazo_estimado: draft.deadline,
            observacoes: &draft.notes,
            responsavel_designado: draft.responsible.as_deref(),
            user_id: session.user_id(),
        };
        let mut created: Vec<TicketRow> = self
            .rest
            .insert_returning(session, TABLE, &[row], LIST_SELECT)
            .await?;
        if created.is_empty() {
            return Err(AppError::Backend(
                "insert returned no ticket row".to_string(),
            ));
        }
        Ok(created.swap_remove(0).into_domain())
    }

    async fn update(&self, session: &Session, id: i64, patch: TicketPatch) -> AppResult<()> {
        let row = TicketPatchRow {
            titulo: patch.title.as_deref(),
            descricao: patch.description.as_deref(),
            status: patch.status,
            prioridade: patch.priority,
            area_solicitante: patch.requesting_area,
            area_responsavel: patch.responsible_area,
            adserver: patch.ad_server.as_deref(),
            agencia: patch.agency.as_deref(),
            cliente_final: patch.final_client.as_deref(),
            prazo_estimado: patch.deadline,
            observacoes: patch.notes.as_deref(),
            responsavel_designado: patch.responsible.as_deref(),
            last_edited_by: session.user_id(),
            updated_at: Utc::now(),
        };
        self.rest
            .update(session, TABLE, &[("id", format!("eq.{id}"))], &row)
            .await
    }

    async fn delete(&self, session: &Session, id: i64) -> AppResult<()> {
        self.rest
            .delete(session, TABLE, &[("id", format!("eq.{id}"))])
            .await
    }
}

#[derive(Deserialize)]
struct TicketRow {
    id: i64,
    titulo: String,
    #[serde(default)]
    descricao: Option<String>,
    #[serde(default)]
    status: Option<TicketStatus>,
    #[serde(default)]
    prioridade: Option<Priority>,
    area_solicitante: Area,
    area_responsavel: Area,
    adserver: String,
    agencia: String,
    cliente_final: String,
    #[serde(default)]
    prazo_estimado: Option<NaiveDate>,
    #[serde(default)]
    observacoes: Option<String>,
    #[serde(default)]
    responsavel_designado: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    last_edited_by: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    profile: Option<ProfileRow>,
    #[serde(default)]
    comentarios_count: Vec<CountRow>,
}

impl TicketRow {
    fn into_domain(self) -> Ticket {
        let comment_count = self
            .comentarios_count
            .first()
            .map(|row| row.count)
            .unwrap_or(0);
        Ticket {
            id: self.id,
            title: self.titulo,
            description: self.descricao.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            priority: self.prioridade.unwrap_or_default(),
            requesting_area: self.area_solicitante,
            responsible_area: self.area_responsavel,
            ad_server: self.adserver,
            agency: self.agencia,
            final_client: self.cliente_final,
            deadline: self.prazo_estimado,
            notes: self.observacoes.unwrap_or_default(),
            responsible: self.responsavel_designado,
            created_by: self.user_id,
            last_edited_by: self.last_edited_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            comment_count,
            creator: self.profile.map(ProfileRow::into_domain),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ProfileRow {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl ProfileRow {
    pub(crate) fn into_domain(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
        }
    }
}

#[derive(Deserialize)]
struct CountRow {
    count: u64,
}

#[derive(Serialize)]
struct NewTicketRow<'a> {
    titulo: &'a str,
    descricao: &'a str,
    status: TicketStatus,
    prioridade: Priority,
    area_solicitante: Area,
    area_responsavel: Area,
    adserver: &'a str,
    agencia: &'a str,
    cliente_final: &'a str,
    prazo_estimado: NaiveDate,
    observacoes: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    responsavel_designado: Option<&'a str>,
    user_id: &'a str,
}

#[derive(Serialize)]
struct TicketPatchRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    titulo: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    descricao: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prioridade: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    area_solicitante: Option<Area>,
    #[serde(skip_serializing_if = "Option::is_none")]
    area_responsavel: Option<Area>,
    #[serde(skip_serializing_if = "Option::is_none")]
    adserver: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agencia: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cliente_final: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prazo_estimado: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    observacoes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    responsavel_designado: Option<&'a str>,
    last_edited_by: &'a str,
    updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_row_maps_joins_and_aggregates() {
        let json = r#"{
            "id": 7,
            "titulo": "Trocar criativo da campanha",
            "descricao": "Banner 300x250 desatualizado",
            "status": "em_producao",
            "prioridade": "urgente",
            "area_solicitante": "comercial",
            "area_responsavel": "suporte",
            "adserver": "Admotion",
            "agencia": "AgenciaX",
            "cliente_final": "ClienteY",
            "prazo_estimado": "2024-03-15",
            "observacoes": null,
            "responsavel_designado": "Ana Lima",
            "user_id": "u-1",
            "last_edited_by": null,
            "created_at": "2024-03-01T12:00:00+00:00",
            "updated_at": null,
            "profile": {"id": "u-1", "email": "ana@example.com", "full_name": "Ana Lima"},
            "comentarios_count": [{"count": 3}]
        }"#;
        let row: TicketRow = serde_json::from_str(json).unwrap();
        let ticket = row.into_domain();
        assert_eq!(ticket.id, 7);
        assert_eq!(ticket.status, TicketStatus::InProduction);
        assert_eq!(ticket.priority, Priority::Urgent);
        assert_eq!(ticket.comment_count, 3);
        assert_eq!(ticket.deadline.unwrap().to_string(), "2024-03-15");
        assert_eq!(ticket.creator.unwrap().display_name(), "Ana Lima");
        assert_eq!(ticket.notes, "");
    }

    #[test]
    fn null_status_defaults_to_pending_review() {
        let json = r#"{
            "id": 8,
            "titulo": "Sem status",
            "status": null,
            "prioridade": null,
            "area_solicitante": "suporte",
            "area_responsavel": "atendimento",
            "adserver": "Ahead",
            "agencia": "AgenciaX",
            "cliente_final": "ClienteY",
            "created_at": "2024-03-01T12:00:00Z"
        }"#;
        let row: TicketRow = serde_json::from_str(json).unwrap();
        let ticket = row.into_domain();
        assert_eq!(ticket.status, TicketStatus::PendingReview);
        assert_eq!(ticket.priority, Priority::Medium);
        assert_eq!(ticket.comment_count, 0);
        assert!(ticket.creator.is_none());
    }

    #[test]
    fn patch_row_serializes_only_set_fields() {
        let row = TicketPatchRow {
            titulo: None,
            descricao: None,
            status: Some(TicketStatus::Viewed),
            prioridade: None,
            area_solicitante: None,
            area_responsavel: None,
            adserver: None,
            agencia: None,
            cliente_final: None,
            prazo_estimado: None,
            observacoes: None,
            responsavel_designado: None,
            last_edited_by: "u-2",
            updated_at: "2024-03-02T10:00:00Z".parse().unwrap(),
        };
        let value = serde_json::to_value(&row).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object["status"], "visualizada");
        assert_eq!(object["last_edited_by"], "u-2");
    }
}
