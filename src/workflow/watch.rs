use crate::context::AppContext;
use crate::domain::comment::{Comment, CommentChange};
use crate::error::AppResult;

/// Applies one change-feed event to the local comment list, keeping it
/// oldest-first. Returns whether anything changed; events for other tickets
/// and duplicate inserts are ignored.
pub fn apply_change(comments: &mut Vec<Comment>, change: CommentChange, ticket_id: i64) -> bool {
    match change {
        CommentChange::Inserted(comment) => {
            if comment.ticket_id != ticket_id
                || comments.iter().any(|existing| existing.id == comment.id)
            {
                return false;
            }
            comments.push(comment);
            true
        }
        CommentChange::Updated(comment) => {
            if comment.ticket_id != ticket_id {
                return false;
            }
            match comments.iter_mut().find(|existing| existing.id == comment.id) {
                Some(existing) => {
                    *existing = comment;
                    true
                }
                None => false,
            }
        }
        CommentChange::Deleted { id } => {
            let before = comments.len();
            comments.retain(|existing| existing.id != id);
            comments.len() != before
        }
    }
}

/// Lists once, then patches local state per event until the feed closes.
/// `render` runs on the initial snapshot and after every effective change.
pub async fn watch_comments(
    ctx: &AppContext,
    ticket_id: i64,
    mut render: impl FnMut(&[Comment]),
) -> AppResult<()> {
    let mut comments = ctx
        .comments
        .list_for_ticket(&ctx.session, ticket_id)
        .await?;
    render(&comments);

    let mut events = ctx.feed.subscribe_comments(&ctx.session, ticket_id).await?;
    while let Some(change) = events.recv().await {
        if apply_change(&mut comments, change, ticket_id) {
            render(&comments);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(id: i64, ticket_id: i64, text: &str) -> Comment {
        Comment {
            id,
            ticket_id,
            author_id: "u-1".to_string(),
            text: text.to_string(),
            attachments: Vec::new(),
            created_at: Utc::now(),
            author: None,
        }
    }

    #[test]
    fn insert_appends_and_deduplicates() {
        let mut comments = vec![comment(1, 7, "primeiro")];
        assert!(apply_change(
            &mut comments,
            CommentChange::Inserted(comment(2, 7, "segundo")),
            7
        ));
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].id, 2);

        // Same id again: the feed delivered a duplicate.
        assert!(!apply_change(
            &mut comments,
            CommentChange::Inserted(comment(2, 7, "segundo")),
            7
        ));
        assert_eq!(comments.len(), 2);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut comments = vec![comment(1, 7, "antes"), comment(2, 7, "outro")];
        assert!(apply_change(
            &mut comments,
            CommentChange::Updated(comment(1, 7, "depois")),
            7
        ));
        assert_eq!(comments[0].text, "depois");
        assert_eq!(comments.len(), 2);

        assert!(!apply_change(
            &mut comments,
            CommentChange::Updated(comment(99, 7, "fantasma")),
            7
        ));
    }

    #[test]
    fn delete_removes_by_id() {
        let mut comments = vec![comment(1, 7, "a"), comment(2, 7, "b")];
        assert!(apply_change(&mut comments, CommentChange::Deleted { id: 1 }, 7));
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, 2);

        assert!(!apply_change(&mut comments, CommentChange::Deleted { id: 1 }, 7));
    }

    #[test]
    fn foreign_ticket_events_are_ignored() {
        let mut comments = vec![comment(1, 7, "a")];
        assert!(!apply_change(
            &mut comments,
            CommentChange::Inserted(comment(9, 8, "de outra demanda")),
            7
        ));
        assert!(!apply_change(
            &mut comments,
            CommentChange::Updated(comment(1, 8, "de outra demanda")),
            7
        ));
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "a");
    }
}
