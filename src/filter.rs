//! In-memory narrowing of the ticket list. Every field is ANDed; a `None`
//! field means "all" and matches everything. Recomputed from the full list
//! on demand, no indexing.

use crate::domain::ticket::{Area, Priority, Ticket, TicketStatus};

#[derive(Debug, Clone, Default)]
pub struct TicketFilters {
    pub status: Option<TicketStatus>,
    pub responsible_area: Option<Area>,
    pub priority: Option<Priority>,
    pub ad_server: Option<String>,
    pub agency: Option<String>,
    pub final_client: Option<String>,
    pub responsible: Option<String>,
}

impl TicketFilters {
    pub fn is_unfiltered(&self) -> bool {
        self.status.is_none()
            && self.responsible_area.is_none()
            && self.priority.is_none()
            && self.ad_server.is_none()
            && self.agency.is_none()
            && self.final_client.is_none()
            && self.responsible.is_none()
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        let status_ok = self.status.is_none_or(|status| ticket.status == status);
        let area_ok = self
            .responsible_area
            .is_none_or(|area| ticket.responsible_area == area);
        let priority_ok = self
            .priority
            .is_none_or(|priority| ticket.priority == priority);
        let adserver_ok = self
            .ad_server
            .as_deref()
            .is_none_or(|value| ticket.ad_server == value);
        let agency_ok = self
            .agency
            .as_deref()
            .is_none_or(|value| ticket.agency == value);
        let client_ok = self
            .final_client
            .as_deref()
            .is_none_or(|value| ticket.final_client == value);
        let responsible_ok = self
            .responsible
            .as_deref()
            .is_none_or(|value| ticket.responsible.as_deref() == Some(value));
        status_ok
            && area_ok
            && priority_ok
            && adserver_ok
            && agency_ok
            && client_ok
            && responsible_ok
    }

    pub fn apply<'a>(&self, tickets: &'a [Ticket]) -> Vec<&'a Ticket> {
        tickets.iter().filter(|ticket| self.matches(ticket)).collect()
    }
}

/// Distinct non-empty values of one field, sorted; feeds the dropdown-style
/// choices for agency, client and responsible.
pub fn distinct_values<'a>(
    tickets: &'a [Ticket],
    field: impl Fn(&'a Ticket) -> Option<&'a str>,
) -> Vec<String> {
    let mut values: Vec<String> = tickets
        .iter()
        .filter_map(|ticket| field(ticket))
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .collect();
    values.sort();
    values.dedup();
    values
}

/// Ticket count per lifecycle state, in lifecycle order.
pub fn status_tallies(tickets: &[Ticket]) -> [(TicketStatus, usize); 4] {
    TicketStatus::ALL.map(|status| {
        let count = tickets
            .iter()
            .filter(|ticket| ticket.status == status)
            .count();
        (status, count)
    })
}
