use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::context::AppContext;
use crate::domain::comment::Comment;
use crate::error::AppResult;
use crate::workflow::comment as workflow;

#[derive(Args, Debug, Clone)]
pub struct CommentArgs {
    #[command(subcommand)]
    pub command: CommentCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CommentCommand {
    /// List a ticket's comments, oldest first.
    List { ticket: i64 },
    /// Comment on a ticket; text, attachments, or both.
    Add {
        ticket: i64,
        #[arg(long, default_value = "")]
        message: String,
        /// File to attach; repeat for several.
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },
    /// Rewrite one of your comments.
    Edit { id: i64, message: String },
    /// Delete one of your comments.
    Delete { id: i64 },
}

pub async fn run(ctx: &AppContext, args: CommentArgs) -> AppResult<()> {
    match args.command {
        CommentCommand::List { ticket } => {
            let comments = ctx.comments.list_for_ticket(&ctx.session, ticket).await?;
            if comments.is_empty() {
                println!("No comments yet.");
                return Ok(());
            }
            for comment in &comments {
                print_comment(comment);
            }
            Ok(())
        }
        CommentCommand::Add {
            ticket,
            message,
            attachments,
        } => {
            let comment = workflow::add_comment(ctx, ticket, &message, &attachments).await?;
            println!("Comment #{} added to ticket #{ticket}.", comment.id);
            Ok(())
        }
        CommentCommand::Edit { id, message } => {
            let comment = workflow::edit_comment(ctx, id, &message).await?;
            println!("Comment #{} updated.", comment.id);
            Ok(())
        }
        CommentCommand::Delete { id } => {
            workflow::delete_comment(ctx, id).await?;
            println!("Comment #{id} deleted.");
            Ok(())
        }
    }
}

pub fn print_comment(comment: &Comment) {
    let author = comment
        .author
        .as_ref()
        .map(|profile| profile.display_name().to_string())
        .unwrap_or_else(|| comment.author_id.clone());
    println!("#{} {} at {}", comment.id, author, comment.created_at);
    if !comment.text.is_empty() {
        println!("  {}", comment.text);
    }
    for attachment in &comment.attachments {
        println!(
            "  [{} | {} bytes] {}",
            attachment.name, attachment.size, attachment.url
        );
    }
}
