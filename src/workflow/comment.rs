use std::fs;
use std::path::Path;

use crate::context::AppContext;
use crate::domain::comment::{Attachment, Comment, CommentDraft};
use crate::domain::notification::{NotificationExtras, NotificationKind};
use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};
use crate::infra::storage::object_key;
use crate::workflow::notify;

pub async fn add_comment(
    ctx: &AppContext,
    ticket_id: i64,
    text: &str,
    attachment_paths: &[std::path::PathBuf],
) -> AppResult<Comment> {
    let text = text.trim();
    if text.is_empty() && attachment_paths.is_empty() {
        return Err(AppError::Validation(
            "a comment needs text or at least one attachment".to_string(),
        ));
    }

    let ticket = ctx.tickets.get(&ctx.session, ticket_id).await?;

    let mut attachments = Vec::with_capacity(attachment_paths.len());
    for path in attachment_paths {
        attachments.push(upload_attachment(ctx, ticket_id, path).await?);
    }

    let comment = ctx
        .comments
        .create(
            &ctx.session,
            CommentDraft {
                ticket_id,
                text: text.to_string(),
                attachments,
            },
        )
        .await?;

    notify_comment(ctx, &ticket, &comment).await;
    Ok(comment)
}

pub async fn edit_comment(ctx: &AppContext, id: i64, text: &str) -> AppResult<Comment> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("comment text is required".to_string()));
    }
    let existing = ctx.comments.get(&ctx.session, id).await?;
    require_author(&existing, ctx, "edit")?;
    ctx.comments.update(&ctx.session, id, text).await
}

/// Author-scoped: deleting someone else's comment is refused before any
/// request is made.
pub async fn delete_comment(ctx: &AppContext, id: i64) -> AppResult<()> {
    let existing = ctx.comments.get(&ctx.session, id).await?;
    require_author(&existing, ctx, "delete")?;
    ctx.comments.delete(&ctx.session, id).await
}

fn require_author(comment: &Comment, ctx: &AppContext, action: &str) -> AppResult<()> {
    if comment.author_id != ctx.session.user_id() {
        return Err(AppError::Validation(format!(
            "only the author can {action} a comment"
        )));
    }
    Ok(())
}

async fn upload_attachment(
    ctx: &AppContext,
    ticket_id: i64,
    path: &Path,
) -> AppResult<Attachment> {
    let bytes = fs::read(path)
        .map_err(|err| AppError::Storage(format!("cannot read {}: {err}", path.display())))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("arquivo")
        .to_string();
    let content_type = content_type_for(&name);
    let key = object_key(ticket_id, &name, &bytes);
    let size = bytes.len() as u64;
    let url = ctx
        .files
        .upload(&ctx.session, &key, bytes, content_type)
        .await?;
    Ok(Attachment {
        name,
        url,
        size,
        content_type: content_type.to_string(),
    })
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "zip" => "application/zip",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Comment fan-out to every profile plus targeted mention notifications for
/// resolved `@token`s.
async fn notify_comment(ctx: &AppContext, ticket: &Ticket, comment: &Comment) {
    let extras = NotificationExtras {
        ticket_id: Some(ticket.id),
        author_id: Some(comment.author_id.clone()),
        comment_id: Some(comment.id),
    };
    notify::fan_out(
        ctx,
        NotificationKind::Comment,
        "Novo comentário na demanda",
        &format!("Novo comentário adicionado na demanda \"{}\"", ticket.title),
        extras.clone(),
    )
    .await;

    let tokens = notify::extract_mentions(&comment.text);
    if tokens.is_empty() {
        return;
    }
    let profiles = match ctx.directory.list_profiles(&ctx.session).await {
        Ok(profiles) => profiles,
        Err(err) => {
            tracing::warn!("skipping mention notifications, directory unavailable: {err}");
            return;
        }
    };
    let author = ctx.session.user.display_name().to_string();
    for mentioned in notify::resolve_mentions(&tokens, &profiles) {
        notify::notify_user(
            ctx,
            &mentioned.id,
            NotificationKind::Mention,
            "Você foi mencionado",
            &format!("{author} mencionou você na demanda \"{}\"", ticket.title),
            extras.clone(),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_content_types_by_extension() {
        assert_eq!(content_type_for("banner.PNG"), "image/png");
        assert_eq!(content_type_for("relatorio.pdf"), "application/pdf");
        assert_eq!(content_type_for("dados.csv"), "text/csv");
        assert_eq!(content_type_for("sem-extensao"), "application/octet-stream");
    }
}
