use chrono::NaiveDate;

use crate::context::AppContext;
use crate::domain::notification::{NotificationExtras, NotificationKind};
use crate::domain::ticket::{Area, Priority, Ticket, TicketDraft, TicketPatch, TicketStatus};
use crate::error::{AppError, AppResult};
use crate::workflow::notify;

/// Creation form as collected from the user; the deadline arrives raw and is
/// normalized here before anything reaches the backend.
#[derive(Debug, Clone)]
pub struct NewTicketForm {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub requesting_area: Area,
    pub responsible_area: Area,
    pub ad_server: String,
    pub agency: String,
    pub final_client: String,
    pub deadline: String,
    pub notes: String,
    pub responsible: Option<String>,
}

pub async fn create_ticket(ctx: &AppContext, form: NewTicketForm) -> AppResult<Ticket> {
    require_field(&form.title, "title")?;
    require_field(&form.ad_server, "ad-server")?;
    require_field(&form.agency, "agency")?;
    require_field(&form.final_client, "final client")?;
    let deadline = normalize_deadline(&form.deadline)?;

    let draft = TicketDraft {
        title: form.title.trim().to_string(),
        description: form.description.trim().to_string(),
        status: TicketStatus::PendingReview,
        priority: form.priority,
        requesting_area: form.requesting_area,
        responsible_area: form.responsible_area,
        ad_server: form.ad_server.trim().to_string(),
        agency: form.agency.trim().to_string(),
        final_client: form.final_client.trim().to_string(),
        deadline,
        notes: form.notes.trim().to_string(),
        responsible: form
            .responsible
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
    };

    let ticket = ctx.tickets.create(&ctx.session, draft).await?;

    let author = ctx.session.user.display_name().to_string();
    notify::fan_out(
        ctx,
        NotificationKind::NewTicket,
        "Nova demanda criada",
        &format!("{author} criou uma nova demanda: \"{}\"", ticket.title),
        NotificationExtras {
            ticket_id: Some(ticket.id),
            author_id: Some(ctx.session.user_id().to_string()),
            comment_id: None,
        },
    )
    .await;

    if let Some(responsible) = ticket.responsible.clone() {
        notify_assignment(ctx, &ticket, &responsible).await;
    }

    Ok(ticket)
}

pub async fn update_ticket(ctx: &AppContext, id: i64, patch: TicketPatch) -> AppResult<Ticket> {
    if patch.is_empty() {
        return Err(AppError::Validation("no fields to update".to_string()));
    }
    let before = ctx.tickets.get(&ctx.session, id).await?;
    let newly_assigned = patch
        .responsible
        .as_deref()
        .filter(|name| before.responsible.as_deref() != Some(*name))
        .map(str::to_string);

    ctx.tickets.update(&ctx.session, id, patch).await?;
    let ticket = ctx.tickets.get(&ctx.session, id).await?;

    if let Some(responsible) = newly_assigned {
        notify_assignment(ctx, &ticket, &responsible).await;
    }
    Ok(ticket)
}

pub async fn set_status(ctx: &AppContext, id: i64, status: TicketStatus) -> AppResult<()> {
    // Any state is reachable from any other; existence is the only check.
    ctx.tickets.get(&ctx.session, id).await?;
    ctx.tickets
        .update(&ctx.session, id, TicketPatch::status_only(status))
        .await
}

pub async fn delete_ticket(ctx: &AppContext, id: i64) -> AppResult<()> {
    ctx.tickets.delete(&ctx.session, id).await
}

async fn notify_assignment(ctx: &AppContext, ticket: &Ticket, responsible: &str) {
    let profiles = match ctx.directory.list_profiles(&ctx.session).await {
        Ok(profiles) => profiles,
        Err(err) => {
            tracing::warn!("skipping assignment notification, directory unavailable: {err}");
            return;
        }
    };
    let needle = responsible.to_lowercase();
    let assignee = profiles.iter().find(|profile| {
        profile.email.to_lowercase() == needle
            || profile
                .full_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase() == needle)
    });
    let Some(assignee) = assignee else {
        tracing::warn!("responsible \"{responsible}\" has no profile, assignment not notified");
        return;
    };
    notify::notify_user(
        ctx,
        &assignee.id,
        NotificationKind::Assignment,
        "Demanda atribuída a você",
        &format!("Você é o responsável pela demanda \"{}\"", ticket.title),
        NotificationExtras {
            ticket_id: Some(ticket.id),
            author_id: Some(ctx.session.user_id().to_string()),
            comment_id: None,
        },
    )
    .await;
}

fn require_field(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Parses the deadline as a plain calendar date so it re-serializes exactly
/// as entered, with no timezone drift. Accepts ISO and dd/MM/yyyy input.
pub fn normalize_deadline(raw: &str) -> AppResult<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("deadline is required".to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .map_err(|_| {
            AppError::Validation(format!(
                "invalid deadline \"{trimmed}\", expected YYYY-MM-DD"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_round_trips_date_only() {
        let date = normalize_deadline("2024-03-15").unwrap();
        assert_eq!(date.to_string(), "2024-03-15");
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-03-15\"");
    }

    #[test]
    fn deadline_accepts_local_format() {
        let date = normalize_deadline("15/03/2024").unwrap();
        assert_eq!(date.to_string(), "2024-03-15");
    }

    #[test]
    fn bad_deadlines_are_rejected_before_any_request() {
        assert!(matches!(
            normalize_deadline(""),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            normalize_deadline("2024-13-45"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            normalize_deadline("amanhã"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn required_fields_block_submission() {
        assert!(require_field("  ", "title").is_err());
        assert!(require_field("ok", "title").is_ok());
    }
}
