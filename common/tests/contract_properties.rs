// Property tests for the lottery state machine

use lottery_common::contract::{Circuit, LedgerState, LotteryContract};
use proptest::prelude::*;

fn circuit_strategy() -> impl Strategy<Value = Circuit> {
    prop_oneof![
        Just(Circuit::BuyTicket),
        (0u64..20).prop_map(|winning_ticket| Circuit::DrawWinner { winning_ticket }),
        (0u64..20).prop_map(|ticket_id| Circuit::ClaimPrize { ticket_id }),
    ]
}

// Ticket IDs are handed out as a dense sequence starting at 1
proptest! {
    #[test]
    fn test_ticket_ids_are_sequential(purchases in 1usize..200) {
        let mut contract = LotteryContract::new();
        for expected in 1..=purchases as u64 {
            prop_assert_eq!(contract.buy_ticket(), Ok(expected));
        }
        prop_assert_eq!(contract.ledger().total_tickets, purchases as u64);
    }
}

// Draw succeeds exactly when the number was sold
proptest! {
    #[test]
    fn test_draw_range(sold in 0u64..50, candidate in 0u64..60) {
        let mut contract = LotteryContract::from_state(LedgerState {
            round: 0,
            total_tickets: sold,
            winning_ticket: 0,
        });

        let result = contract.draw_winner(candidate);
        if candidate >= 1 && candidate <= sold {
            prop_assert!(result.is_ok());
            prop_assert_eq!(contract.ledger().winning_ticket, candidate);
            prop_assert_eq!(contract.ledger().round, 1);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(contract.ledger().round, 0);
        }
    }
}

// Claims only pass for the winning number and never touch the ledger
proptest! {
    #[test]
    fn test_claim_matches_winner(winning in 1u64..30, ticket in 0u64..40) {
        let contract = LotteryContract::from_state(LedgerState {
            round: 1,
            total_tickets: 30,
            winning_ticket: winning,
        });
        let before = *contract.ledger();

        prop_assert_eq!(contract.claim_prize(ticket).is_ok(), ticket == winning);
        prop_assert_eq!(*contract.ledger(), before);
    }
}

// Counters never decrease and a failed circuit leaves the ledger as it was
proptest! {
    #[test]
    fn test_counters_monotonic(circuits in prop::collection::vec(circuit_strategy(), 0..100)) {
        let mut contract = LotteryContract::new();

        for circuit in circuits {
            let before = *contract.ledger();
            match contract.execute(&circuit) {
                Ok(_) => {
                    prop_assert!(contract.ledger().round >= before.round);
                    prop_assert!(contract.ledger().total_tickets >= before.total_tickets);
                }
                Err(_) => prop_assert_eq!(*contract.ledger(), before),
            }

            let ledger = contract.ledger();
            if ledger.round > 0 {
                prop_assert!(ledger.winning_ticket >= 1);
                prop_assert!(ledger.winning_ticket <= ledger.total_tickets);
            }
        }
    }
}
