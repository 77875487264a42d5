use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::notification::{
    Notification, NotificationDraft, NotificationExtras, NotificationKind,
};
use crate::error::AppResult;
use crate::infra::rest::RestClient;
use crate::services::NotificationStore;
use crate::session::Session;

const TABLE: &str = "notificacoes";

pub struct NotificationTable {
    rest: Arc<RestClient>,
}

impl NotificationTable {
    pub fn new(rest: Arc<RestClient>) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl NotificationStore for NotificationTable {
    async fn list(&self, session: &Session, user_id: &str) -> AppResult<Vec<Notification>> {
        let rows: Vec<NotificationRow> = self
            .rest
            .select(
                session,
                TABLE,
                &[
                    ("select", "*".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(NotificationRow::into_domain).collect())
    }

    async fn count_unread(&self, session: &Session, user_id: &str) -> AppResult<u64> {
        self.rest
            .count_exact(
                session,
                TABLE,
                &[
                    ("user_id", format!("eq.{user_id}")),
                    ("lida", "eq.false".to_string()),
                ],
            )
            .await
    }

    async fn mark_as_read(&self, session: &Session, id: i64) -> AppResult<()> {
        self.rest
            .update(
                session,
                TABLE,
                &[("id", format!("eq.{id}"))],
                &ReadFlagRow { lida: true },
            )
            .await
    }

    async fn mark_all_as_read(&self, session: &Session, user_id: &str) -> AppResult<()> {
        self.rest
            .update(
                session,
                TABLE,
                &[
                    ("user_id", format!("eq.{user_id}")),
                    ("lida", "eq.false".to_string()),
                ],
                &ReadFlagRow { lida: true },
            )
            .await
    }

    async fn delete(&self, session: &Session, id: i64) -> AppResult<()> {
        self.rest
            .delete(session, TABLE, &[("id", format!("eq.{id}"))])
            .await
    }

    async fn create_many(
        &self,
        session: &Session,
        drafts: Vec<NotificationDraft>,
    ) -> AppResult<()> {
        if drafts.is_empty() {
            return Ok(());
        }
        let rows: Vec<NewNotificationRow> =
            drafts.iter().map(NewNotificationRow::from_draft).collect();
        self.rest.insert(session, TABLE, &rows).await
    }
}

#[derive(Deserialize)]
struct NotificationRow {
    id: i64,
    user_id: String,
    tipo: NotificationKind,
    titulo: String,
    #[serde(default)]
    mensagem: Option<String>,
    #[serde(default)]
    dados_extras: Option<NotificationExtras>,
    #[serde(default)]
    lida: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_domain(self) -> Notification {
        Notification {
            id: self.id,
            user_id: self.user_id,
            kind: self.tipo,
            title: self.titulo,
            message: self.mensagem.unwrap_or_default(),
            extras: self.dados_extras,
            read: self.lida,
            created_at: self.created_at,
        }
    }
}

#[derive(Serialize)]
struct NewNotificationRow<'a> {
    user_id: &'a str,
    tipo: NotificationKind,
    titulo: &'a str,
    mensagem: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dados_extras: Option<&'a NotificationExtras>,
    lida: bool,
}

impl<'a> NewNotificationRow<'a> {
    fn from_draft(draft: &'a NotificationDraft) -> Self {
        Self {
            user_id: &draft.user_id,
            tipo: draft.kind,
            titulo: &draft.title,
            mensagem: &draft.message,
            dados_extras: draft.extras.as_ref(),
            lida: false,
        }
    }
}

#[derive(Serialize)]
struct ReadFlagRow {
    lida: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_maps_kind_and_extras() {
        let json = r#"{
            "id": 3,
            "user_id": "u-1",
            "tipo": "nova_demanda",
            "titulo": "Nova demanda criada",
            "mensagem": "Ana criou uma nova demanda",
            "dados_extras": {"demanda_id": 7, "autor_id": "u-2"},
            "lida": false,
            "created_at": "2024-03-02T09:30:00Z"
        }"#;
        let notification: Notification = serde_json::from_str::<NotificationRow>(json)
            .unwrap()
            .into_domain();
        assert_eq!(notification.kind, NotificationKind::NewTicket);
        assert!(!notification.read);
        let extras = notification.extras.unwrap();
        assert_eq!(extras.ticket_id, Some(7));
        assert_eq!(extras.author_id.as_deref(), Some("u-2"));
    }

    #[test]
    fn new_rows_start_unread() {
        let draft = NotificationDraft {
            user_id: "u-1".to_string(),
            kind: NotificationKind::Comment,
            title: "Novo comentário na demanda".to_string(),
            message: "msg".to_string(),
            extras: None,
        };
        let value = serde_json::to_value(NewNotificationRow::from_draft(&draft)).unwrap();
        assert_eq!(value["lida"], false);
        assert_eq!(value["tipo"], "comentario");
        assert!(value.get("dados_extras").is_none());
    }
}
