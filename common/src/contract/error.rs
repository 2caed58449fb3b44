use thiserror::Error;

// Assertion failures raised by the lottery circuits
// A failed circuit never mutates the ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LotteryError {
    #[error("Invalid winning ticket {winning_ticket}: must be between 1 and {total_tickets}")]
    InvalidWinningTicket {
        winning_ticket: u64,
        total_tickets: u64,
    },
    #[error("Ticket {ticket_id} is not the winning ticket")]
    NotWinningTicket { ticket_id: u64 },
    #[error("Ticket counter overflow")]
    TicketOverflow,
    #[error("Round counter overflow")]
    RoundOverflow,
}
