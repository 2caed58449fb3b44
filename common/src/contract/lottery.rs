use log::trace;

use super::{Circuit, LedgerState, LotteryError};

/// The lottery contract state machine
///
/// Circuits either apply their whole effect or return an error and leave
/// the ledger untouched. Ticket ownership is not tracked here: callers keep
/// their own record of the IDs they bought.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LotteryContract {
    ledger: LedgerState,
}

impl LotteryContract {
    pub fn new() -> Self {
        Self::default()
    }

    // Rebuild a contract from a queried ledger, used for local execution
    pub fn from_state(ledger: LedgerState) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    // Sell the next ticket and return its ID
    // Purchases stay open after a draw
    pub fn buy_ticket(&mut self) -> Result<u64, LotteryError> {
        let ticket_id = self
            .ledger
            .total_tickets
            .checked_add(1)
            .ok_or(LotteryError::TicketOverflow)?;

        self.ledger.total_tickets = ticket_id;
        trace!("ticket {} sold", ticket_id);
        Ok(ticket_id)
    }

    // The caller picks the winning number, nothing is randomized here
    // Any caller may draw
    pub fn draw_winner(&mut self, winning_ticket: u64) -> Result<(), LotteryError> {
        if winning_ticket < 1 || winning_ticket > self.ledger.total_tickets {
            return Err(LotteryError::InvalidWinningTicket {
                winning_ticket,
                total_tickets: self.ledger.total_tickets,
            });
        }

        let round = self
            .ledger
            .round
            .checked_add(1)
            .ok_or(LotteryError::RoundOverflow)?;

        self.ledger.winning_ticket = winning_ticket;
        self.ledger.round = round;
        trace!("round {} drawn with winning ticket {}", round, winning_ticket);
        Ok(())
    }

    // Only compares against the winning number, ownership is not verified
    pub fn claim_prize(&self, ticket_id: u64) -> Result<(), LotteryError> {
        if ticket_id != self.ledger.winning_ticket {
            return Err(LotteryError::NotWinningTicket { ticket_id });
        }

        Ok(())
    }

    /// Dispatch a circuit call
    ///
    /// Returns the circuit output when it has one, which is only the case
    /// for `buy_ticket`.
    pub fn execute(&mut self, circuit: &Circuit) -> Result<Option<u64>, LotteryError> {
        match circuit {
            Circuit::BuyTicket => self.buy_ticket().map(Some),
            Circuit::DrawWinner { winning_ticket } => {
                self.draw_winner(*winning_ticket).map(|_| None)
            }
            Circuit::ClaimPrize { ticket_id } => self.claim_prize(*ticket_id).map(|_| None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_contract_is_empty() {
        let contract = LotteryContract::new();
        assert_eq!(contract.ledger().total_tickets, 0);
        assert_eq!(contract.ledger().round, 0);
        assert_eq!(contract.ledger().winning_ticket, 0);
    }

    #[test]
    fn test_buy_ticket_returns_first_id() {
        let mut contract = LotteryContract::new();
        assert_eq!(contract.buy_ticket(), Ok(1));
        assert_eq!(contract.ledger().total_tickets, 1);
    }

    #[test]
    fn test_draw_winner_sets_ticket_and_round() {
        let mut contract = LotteryContract::new();
        contract.buy_ticket().unwrap();
        contract.buy_ticket().unwrap();
        contract.draw_winner(2).unwrap();

        assert_eq!(contract.ledger().winning_ticket, 2);
        assert_eq!(contract.ledger().round, 1);
    }

    #[test]
    fn test_claim_with_winning_ticket() {
        let mut contract = LotteryContract::new();
        contract.buy_ticket().unwrap();
        contract.draw_winner(1).unwrap();
        assert!(contract.claim_prize(1).is_ok());
    }

    #[test]
    fn test_claim_with_losing_ticket() {
        let mut contract = LotteryContract::new();
        contract.buy_ticket().unwrap();
        contract.buy_ticket().unwrap();
        contract.draw_winner(1).unwrap();

        assert_eq!(
            contract.claim_prize(2),
            Err(LotteryError::NotWinningTicket { ticket_id: 2 })
        );
    }

    #[test]
    fn test_draw_out_of_range_keeps_ledger() {
        let mut contract = LotteryContract::new();
        assert!(matches!(
            contract.draw_winner(1),
            Err(LotteryError::InvalidWinningTicket {
                winning_ticket: 1,
                total_tickets: 0
            })
        ));

        contract.buy_ticket().unwrap();
        let before = *contract.ledger();
        assert!(contract.draw_winner(0).is_err());
        assert!(contract.draw_winner(2).is_err());
        assert_eq!(*contract.ledger(), before);
    }

    #[test]
    fn test_purchases_allowed_after_draw() {
        let mut contract = LotteryContract::new();
        contract.buy_ticket().unwrap();
        contract.draw_winner(1).unwrap();
        assert_eq!(contract.buy_ticket(), Ok(2));
        assert_eq!(contract.ledger().round, 1);
        assert_eq!(contract.ledger().winning_ticket, 1);
    }

    #[test]
    fn test_claim_before_any_draw() {
        // Winning ticket is 0 until the first draw and 0 is never sold
        let contract = LotteryContract::new();
        assert!(contract.claim_prize(1).is_err());
        assert!(contract.claim_prize(0).is_ok());
    }

    #[test]
    fn test_ticket_overflow() {
        let mut contract = LotteryContract::from_state(LedgerState {
            round: 0,
            total_tickets: u64::MAX,
            winning_ticket: 0,
        });
        assert_eq!(contract.buy_ticket(), Err(LotteryError::TicketOverflow));
        assert_eq!(contract.ledger().total_tickets, u64::MAX);
    }

    #[test]
    fn test_round_overflow() {
        let mut contract = LotteryContract::from_state(LedgerState {
            round: u64::MAX,
            total_tickets: 3,
            winning_ticket: 1,
        });
        assert_eq!(contract.draw_winner(2), Err(LotteryError::RoundOverflow));
        assert_eq!(contract.ledger().winning_ticket, 1);
    }

    #[test]
    fn test_execute_dispatch() {
        let mut contract = LotteryContract::new();
        assert_eq!(contract.execute(&Circuit::BuyTicket), Ok(Some(1)));
        assert_eq!(
            contract.execute(&Circuit::DrawWinner { winning_ticket: 1 }),
            Ok(None)
        );
        assert_eq!(contract.execute(&Circuit::ClaimPrize { ticket_id: 1 }), Ok(None));
        assert!(contract
            .execute(&Circuit::ClaimPrize { ticket_id: 2 })
            .is_err());
    }
}
