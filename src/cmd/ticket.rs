use clap::{Args, Subcommand};

use crate::context::AppContext;
use crate::domain::ticket::{Area, Priority, Ticket, TicketPatch, TicketStatus};
use crate::error::{AppError, AppResult};
use crate::filter::{TicketFilters, distinct_values, status_tallies};
use crate::workflow::ticket::{self as workflow, NewTicketForm, normalize_deadline};

#[derive(Args, Debug, Clone)]
pub struct TicketArgs {
    #[command(subcommand)]
    pub command: TicketCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TicketCommand {
    /// List tickets, newest first, optionally narrowed by filters.
    List(ListArgs),
    /// Show one ticket in full.
    Show { id: i64 },
    /// Create a ticket.
    Create(CreateArgs),
    /// Edit fields of an existing ticket.
    Edit(EditArgs),
    /// Move a ticket to another lifecycle state.
    Status { id: i64, status: String },
    /// Delete a ticket.
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<String>,
    /// Responsible area.
    #[arg(long)]
    pub area: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub adserver: Option<String>,
    #[arg(long)]
    pub agency: Option<String>,
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long)]
    pub responsible: Option<String>,
    /// Print the distinct agency/client/responsible values instead.
    #[arg(long)]
    pub facets: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "media")]
    pub priority: String,
    #[arg(long = "requesting-area")]
    pub requesting_area: String,
    #[arg(long = "responsible-area")]
    pub responsible_area: String,
    #[arg(long)]
    pub adserver: String,
    #[arg(long)]
    pub agency: String,
    #[arg(long)]
    pub client: String,
    /// Estimated deadline, YYYY-MM-DD.
    #[arg(long)]
    pub deadline: String,
    #[arg(long)]
    pub responsible: Option<String>,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    pub id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long = "requesting-area")]
    pub requesting_area: Option<String>,
    #[arg(long = "responsible-area")]
    pub responsible_area: Option<String>,
    #[arg(long)]
    pub adserver: Option<String>,
    #[arg(long)]
    pub agency: Option<String>,
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long)]
    pub deadline: Option<String>,
    #[arg(long)]
    pub responsible: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

pub async fn run(ctx: &AppContext, args: TicketArgs) -> AppResult<()> {
    match args.command {
        TicketCommand::List(list) => run_list(ctx, list).await,
        TicketCommand::Show { id } => run_show(ctx, id).await,
        TicketCommand::Create(create) => run_create(ctx, create).await,
        TicketCommand::Edit(edit) => run_edit(ctx, edit).await,
        TicketCommand::Status { id, status } => run_status(ctx, id, &status).await,
        TicketCommand::Delete { id } => run_delete(ctx, id).await,
    }
}

async fn run_list(ctx: &AppContext, args: ListArgs) -> AppResult<()> {
    let tickets = ctx.tickets.list(&ctx.session).await?;

    if args.facets {
        print_facets(&tickets);
        return Ok(());
    }

    let filters = parse_filters(&args)?;
    for (status, count) in status_tallies(&tickets) {
        print!("{}: {count}  ", status.label());
    }
    println!();

    let filtered = filters.apply(&tickets);
    if filtered.is_empty() {
        println!("No tickets match.");
        return Ok(());
    }
    for ticket in filtered {
        println!("{}", summary_line(ticket));
    }
    Ok(())
}

async fn run_show(ctx: &AppContext, id: i64) -> AppResult<()> {
    let ticket = ctx.tickets.get(&ctx.session, id).await?;
    println!("#{} {}", ticket.id, ticket.title);
    println!("Status: {}", ticket.status.label());
    println!("Priority: {}", ticket.priority.as_str());
    println!(
        "Areas: {} -> {}",
        ticket.requesting_area.as_str(),
        ticket.responsible_area.as_str()
    );
    println!("Ad server: {}", ticket.ad_server);
    println!("Agency: {}", ticket.agency);
    println!("Client: {}", ticket.final_client);
    if let Some(deadline) = ticket.deadline {
        println!("Deadline: {deadline}");
    }
    if let Some(responsible) = &ticket.responsible {
        println!("Responsible: {responsible}");
    }
    if let Some(creator) = &ticket.creator {
        println!("Created by: {}", creator.display_name());
    }
    println!("Created at: {}", ticket.created_at);
    if let Some(updated) = ticket.updated_at {
        println!("Updated at: {}", updated);
    }
    if !ticket.description.is_empty() {
        println!("\n{}", ticket.description);
    }
    if !ticket.notes.is_empty() {
        println!("\nNotes: {}", ticket.notes);
    }
    println!("\nComments: {}", ticket.comment_count);
    Ok(())
}

async fn run_create(ctx: &AppContext, args: CreateArgs) -> AppResult<()> {
    let form = NewTicketForm {
        title: args.title,
        description: args.description,
        priority: parse_priority(&args.priority)?,
        requesting_area: parse_area(&args.requesting_area)?,
        responsible_area: parse_area(&args.responsible_area)?,
        ad_server: args.adserver,
        agency: args.agency,
        final_client: args.client,
        deadline: args.deadline,
        notes: args.notes,
        responsible: args.responsible,
    };
    let ticket = workflow::create_ticket(ctx, form).await?;
    println!("Ticket #{} created: {}", ticket.id, ticket.title);
    Ok(())
}

async fn run_edit(ctx: &AppContext, args: EditArgs) -> AppResult<()> {
    let patch = TicketPatch {
        title: args.title,
        description: args.description,
        status: None,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        requesting_area: args.requesting_area.as_deref().map(parse_area).transpose()?,
        responsible_area: args
            .responsible_area
            .as_deref()
            .map(parse_area)
            .transpose()?,
        ad_server: args.adserver,
        agency: args.agency,
        final_client: args.client,
        deadline: args.deadline.as_deref().map(normalize_deadline).transpose()?,
        notes: args.notes,
        responsible: args.responsible,
    };
    let ticket = workflow::update_ticket(ctx, args.id, patch).await?;
    println!("Ticket #{} updated.", ticket.id);
    Ok(())
}

async fn run_status(ctx: &AppContext, id: i64, status: &str) -> AppResult<()> {
    let status = parse_status(status)?;
    workflow::set_status(ctx, id, status).await?;
    println!("Ticket #{id} moved to {}.", status.label());
    Ok(())
}

async fn run_delete(ctx: &AppContext, id: i64) -> AppResult<()> {
    workflow::delete_ticket(ctx, id).await?;
    println!("Ticket #{id} deleted.");
    Ok(())
}

fn summary_line(ticket: &Ticket) -> String {
    let deadline = ticket
        .deadline
        .map(|date| date.to_string())
        .unwrap_or_else(|| "-".to_string());
    let responsible = ticket.responsible.as_deref().unwrap_or("-");
    format!(
        "#{:<4} [{}] {} | {} | {} | due {} | {} | {} comment(s)",
        ticket.id,
        ticket.status.as_str(),
        ticket.title,
        ticket.priority.as_str(),
        ticket.responsible_area.as_str(),
        deadline,
        responsible,
        ticket.comment_count,
    )
}

fn print_facets(tickets: &[Ticket]) {
    println!(
        "Agencies: {}",
        distinct_values(tickets, |t| Some(t.agency.as_str())).join(", ")
    );
    println!(
        "Clients: {}",
        distinct_values(tickets, |t| Some(t.final_client.as_str())).join(", ")
    );
    println!(
        "Responsibles: {}",
        distinct_values(tickets, |t| t.responsible.as_deref()).join(", ")
    );
    println!(
        "Ad servers: {}",
        distinct_values(tickets, |t| Some(t.ad_server.as_str())).join(", ")
    );
}

/// "todos"/"all" means the same as omitting the flag.
fn filter_value(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("todos") && !v.eq_ignore_ascii_case("all"))
}

fn parse_filters(args: &ListArgs) -> AppResult<TicketFilters> {
    Ok(TicketFilters {
        status: filter_value(&args.status).map(parse_status).transpose()?,
        responsible_area: filter_value(&args.area).map(parse_area).transpose()?,
        priority: filter_value(&args.priority).map(parse_priority).transpose()?,
        ad_server: filter_value(&args.adserver).map(str::to_string),
        agency: filter_value(&args.agency).map(str::to_string),
        final_client: filter_value(&args.client).map(str::to_string),
        responsible: filter_value(&args.responsible).map(str::to_string),
    })
}

fn parse_status(value: &str) -> AppResult<TicketStatus> {
    TicketStatus::from_str(value).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown status \"{value}\", expected one of: {}",
            TicketStatus::ALL.map(|s| s.as_str()).join(", ")
        ))
    })
}

fn parse_priority(value: &str) -> AppResult<Priority> {
    Priority::from_str(value).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown priority \"{value}\", expected baixa, media, alta or urgente"
        ))
    })
}

fn parse_area(value: &str) -> AppResult<Area> {
    Area::from_str(value).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown area \"{value}\", expected suporte, atendimento or comercial"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_args() -> ListArgs {
        ListArgs {
            status: None,
            area: None,
            priority: None,
            adserver: None,
            agency: None,
            client: None,
            responsible: None,
            facets: false,
        }
    }

    #[test]
    fn todos_sentinel_means_unfiltered() {
        let args = ListArgs {
            status: Some("todos".to_string()),
            priority: Some("all".to_string()),
            ..list_args()
        };
        let filters = parse_filters(&args).unwrap();
        assert!(filters.is_unfiltered());
    }

    #[test]
    fn filter_values_parse_into_enums() {
        let args = ListArgs {
            status: Some("em_producao".to_string()),
            priority: Some("urgent".to_string()),
            agency: Some("AgenciaX".to_string()),
            ..list_args()
        };
        let filters = parse_filters(&args).unwrap();
        assert_eq!(filters.status, Some(TicketStatus::InProduction));
        assert_eq!(filters.priority, Some(Priority::Urgent));
        assert_eq!(filters.agency.as_deref(), Some("AgenciaX"));
    }

    #[test]
    fn bad_filter_values_are_rejected() {
        let args = ListArgs {
            status: Some("arquivada".to_string()),
            ..list_args()
        };
        assert!(matches!(
            parse_filters(&args),
            Err(AppError::Validation(_))
        ));
    }
}
