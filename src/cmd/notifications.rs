use clap::{Args, Subcommand};

use crate::context::AppContext;
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct NotificationsArgs {
    #[command(subcommand)]
    pub command: NotificationsCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum NotificationsCommand {
    /// List your notifications, newest first.
    List,
    /// Print the unread count.
    Unread,
    /// Mark one notification as read.
    Read { id: i64 },
    /// Mark everything as read.
    ReadAll,
    /// Delete a notification.
    Delete { id: i64 },
}

pub async fn run(ctx: &AppContext, args: NotificationsArgs) -> AppResult<()> {
    let user_id = ctx.session.user_id().to_string();
    match args.command {
        NotificationsCommand::List => {
            let notifications = ctx.notifications.list(&ctx.session, &user_id).await?;
            if notifications.is_empty() {
                println!("No notifications.");
                return Ok(());
            }
            for notification in &notifications {
                let marker = if notification.read { " " } else { "*" };
                let ticket = notification
                    .extras
                    .as_ref()
                    .and_then(|extras| extras.ticket_id)
                    .map(|id| format!(" (ticket #{id})"))
                    .unwrap_or_default();
                println!(
                    "{marker} #{} [{}] {}{} - {}",
                    notification.id,
                    notification.kind.as_str(),
                    notification.title,
                    ticket,
                    notification.message,
                );
            }
            Ok(())
        }
        NotificationsCommand::Unread => {
            let count = ctx.notifications.count_unread(&ctx.session, &user_id).await?;
            println!("{count}");
            Ok(())
        }
        NotificationsCommand::Read { id } => {
            ctx.notifications.mark_as_read(&ctx.session, id).await?;
            println!("Notification #{id} marked as read.");
            Ok(())
        }
        NotificationsCommand::ReadAll => {
            ctx.notifications
                .mark_all_as_read(&ctx.session, &user_id)
                .await?;
            println!("All notifications marked as read.");
            Ok(())
        }
        NotificationsCommand::Delete { id } => {
            ctx.notifications.delete(&ctx.session, id).await?;
            println!("Notification #{id} deleted.");
            Ok(())
        }
    }
}
