use crate::cmd::comment::print_comment;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::watch;

/// Streams a ticket's comment thread, reprinting after each change until the
/// feed closes or the process is interrupted.
pub async fn run(ctx: &AppContext, ticket_id: i64) -> AppResult<()> {
    let ticket = ctx.tickets.get(&ctx.session, ticket_id).await?;
    println!("Watching comments on #{} {}", ticket.id, ticket.title);

    watch::watch_comments(ctx, ticket_id, |comments| {
        println!("--- {} comment(s) ---", comments.len());
        for comment in comments {
            print_comment(comment);
        }
    })
    .await?;

    println!("Change feed closed.");
    Ok(())
}
