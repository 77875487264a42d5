use std::fs;

use crate::domain::comment::CommentChange;
use crate::domain::notification::NotificationKind;
use crate::domain::ticket::{Area, Priority, TicketPatch, TicketStatus};
use crate::error::AppError;
use crate::workflow::testing::{profile, session, ContextBuilder};
use crate::workflow::{comment, ticket, watch};

fn form(title: &str, responsible: Option<&str>) -> ticket::NewTicketForm {
    ticket::NewTicketForm {
        title: title.to_string(),
        description: "Banner desatualizado".to_string(),
        priority: Priority::High,
        requesting_area: Area::Commercial,
        responsible_area: Area::Support,
        ad_server: "Admotion".to_string(),
        agency: "AgenciaX".to_string(),
        final_client: "ClienteY".to_string(),
        deadline: "2024-03-15".to_string(),
        notes: String::new(),
        responsible: responsible.map(str::to_string),
    }
}

fn builder() -> ContextBuilder {
    ContextBuilder::new(
        session("u-1", "ana@example.com", Some("Ana Lima")),
        vec![
            profile("u-1", "ana@example.com", Some("Ana Lima")),
            profile("u-2", "bruno@example.com", Some("Bruno Reis")),
            profile("u-3", "clara@example.com", None),
        ],
    )
}

#[tokio::test]
async fn creating_a_ticket_notifies_every_profile_including_the_creator() {
    let fixtures = builder();
    let ctx = fixtures.build();

    let created = ticket::create_ticket(&ctx, form("Nova campanha", None))
        .await
        .unwrap();
    assert_eq!(created.status, TicketStatus::PendingReview);
    assert_eq!(created.deadline.unwrap().to_string(), "2024-03-15");
    assert_eq!(created.created_by.as_deref(), Some("u-1"));

    let rows = fixtures.notifications.rows.lock().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().any(|n| n.user_id == "u-1"));
    assert!(rows.iter().all(|n| n.kind == NotificationKind::NewTicket));
    assert!(rows.iter().all(|n| !n.read));
    let extras = rows[0].extras.as_ref().unwrap();
    assert_eq!(extras.ticket_id, Some(created.id));
    assert_eq!(extras.author_id.as_deref(), Some("u-1"));
}

#[tokio::test]
async fn assigning_a_responsible_adds_a_targeted_notification() {
    let fixtures = builder();
    let ctx = fixtures.build();

    ticket::create_ticket(&ctx, form("Com responsável", Some("Bruno Reis")))
        .await
        .unwrap();

    let rows = fixtures.notifications.rows.lock().unwrap();
    let assignments: Vec<_> = rows
        .iter()
        .filter(|n| n.kind == NotificationKind::Assignment)
        .collect();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].user_id, "u-2");
}

#[tokio::test]
async fn missing_required_fields_block_creation() {
    let fixtures = builder();
    let ctx = fixtures.build();

    let err = ticket::create_ticket(&ctx, form("  ", None)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(fixtures.tickets.rows.lock().unwrap().is_empty());
    assert!(fixtures.notifications.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn update_stamps_the_last_editor_and_notifies_new_assignee() {
    let fixtures = builder();
    let ctx = fixtures.build();
    let created = ticket::create_ticket(&ctx, form("Editável", None))
        .await
        .unwrap();

    let patch = TicketPatch {
        responsible: Some("Bruno Reis".to_string()),
        priority: Some(Priority::Urgent),
        ..TicketPatch::default()
    };
    let updated = ticket::update_ticket(&ctx, created.id, patch).await.unwrap();
    assert_eq!(updated.last_edited_by.as_deref(), Some("u-1"));
    assert_eq!(updated.priority, Priority::Urgent);

    let rows = fixtures.notifications.rows.lock().unwrap();
    assert!(rows
        .iter()
        .any(|n| n.kind == NotificationKind::Assignment && n.user_id == "u-2"));
}

#[tokio::test]
async fn every_status_is_reachable_and_reads_back_exactly() {
    let fixtures = builder();
    let ctx = fixtures.build();
    let created = ticket::create_ticket(&ctx, form("Ciclo de status", None))
        .await
        .unwrap();

    for status in TicketStatus::ALL {
        ticket::set_status(&ctx, created.id, status).await.unwrap();
        let fetched = ctx.tickets.get(&ctx.session, created.id).await.unwrap();
        assert_eq!(fetched.status, status);
    }
    // Backwards is allowed too; the lifecycle is not a pipeline.
    ticket::set_status(&ctx, created.id, TicketStatus::PendingReview)
        .await
        .unwrap();
}

#[tokio::test]
async fn status_change_on_a_deleted_ticket_reports_not_found() {
    let fixtures = builder();
    let ctx = fixtures.build();
    let err = ticket::set_status(&ctx, 404, TicketStatus::Viewed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn comment_needs_text_or_attachment() {
    let fixtures = builder();
    let ctx = fixtures.build();
    let created = ticket::create_ticket(&ctx, form("Comentável", None))
        .await
        .unwrap();

    let err = comment::add_comment(&ctx, created.id, "   ", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn comment_fans_out_and_mentions_notify_directly() {
    let fixtures = builder();
    let ctx = fixtures.build();
    let created = ticket::create_ticket(&ctx, form("Com menção", None))
        .await
        .unwrap();
    fixtures.notifications.rows.lock().unwrap().clear();

    comment::add_comment(&ctx, created.id, "Olha isso @bruno", &[])
        .await
        .unwrap();

    let rows = fixtures.notifications.rows.lock().unwrap();
    let comments = rows
        .iter()
        .filter(|n| n.kind == NotificationKind::Comment)
        .count();
    assert_eq!(comments, 3);
    let mentions: Vec<_> = rows
        .iter()
        .filter(|n| n.kind == NotificationKind::Mention)
        .collect();
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].user_id, "u-2");
}

#[tokio::test]
async fn attachments_are_uploaded_before_the_comment_row() {
    let fixtures = builder();
    let ctx = fixtures.build();
    let created = ticket::create_ticket(&ctx, form("Com anexo", None))
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("banner.png");
    fs::write(&file, b"png-bytes").unwrap();

    let posted = comment::add_comment(&ctx, created.id, "", &[file]).await.unwrap();
    assert_eq!(posted.attachments.len(), 1);
    let attachment = &posted.attachments[0];
    assert_eq!(attachment.name, "banner.png");
    assert_eq!(attachment.content_type, "image/png");
    assert_eq!(attachment.size, 9);
    assert!(attachment.url.starts_with("https://files.test/"));
    assert_eq!(fixtures.files.uploads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn only_the_author_deletes_a_comment() {
    let fixtures = builder();
    let ctx = fixtures.build();
    let created = ticket::create_ticket(&ctx, form("Protegida", None))
        .await
        .unwrap();
    let posted = comment::add_comment(&ctx, created.id, "meu comentário", &[])
        .await
        .unwrap();

    // Same stores, different signed-in user.
    let mut other = fixtures.build();
    other.session = session("u-2", "bruno@example.com", None);
    let err = comment::delete_comment(&other, posted.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(fixtures.comments.rows.lock().unwrap().len(), 1);

    comment::delete_comment(&ctx, posted.id).await.unwrap();
    assert!(fixtures.comments.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn mark_all_as_read_only_touches_that_user() {
    let fixtures = builder();
    let ctx = fixtures.build();
    ticket::create_ticket(&ctx, form("Para todos", None))
        .await
        .unwrap();

    ctx.notifications
        .mark_all_as_read(&ctx.session, "u-1")
        .await
        .unwrap();

    let rows = fixtures.notifications.rows.lock().unwrap();
    assert!(rows.iter().filter(|n| n.user_id == "u-1").all(|n| n.read));
    assert!(rows.iter().filter(|n| n.user_id != "u-1").all(|n| !n.read));
    drop(rows);

    assert_eq!(
        ctx.notifications
            .count_unread(&ctx.session, "u-1")
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        ctx.notifications
            .count_unread(&ctx.session, "u-2")
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn watch_applies_feed_events_incrementally() {
    let fixtures = builder();
    let mut ctx = fixtures.build();
    let created = ticket::create_ticket(&ctx, form("Ao vivo", None))
        .await
        .unwrap();
    let first = comment::add_comment(&ctx, created.id, "primeiro", &[])
        .await
        .unwrap();

    let (feed, tx) = crate::workflow::testing::FakeFeed::with_channel();
    ctx.feed = feed;

    let mut second = first.clone();
    second.id = first.id + 1;
    second.text = "segundo".to_string();
    tx.send(CommentChange::Inserted(second))
        .await
        .unwrap();
    tx.send(CommentChange::Deleted { id: first.id }).await.unwrap();
    drop(tx);

    let mut snapshots: Vec<Vec<String>> = Vec::new();
    watch::watch_comments(&ctx, created.id, |comments| {
        snapshots.push(comments.iter().map(|c| c.text.clone()).collect());
    })
    .await
    .unwrap();

    assert_eq!(
        snapshots,
        vec![
            vec!["primeiro".to_string()],
            vec!["primeiro".to_string(), "segundo".to_string()],
            vec!["segundo".to_string()],
        ]
    );
}
