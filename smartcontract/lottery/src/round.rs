// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! The lottery state machine: a manager, the entries of the current round and their pooled stake. */

use async_graphql::{Enum, SimpleObject};
use linera_sdk::linera_base_types::{AccountOwner, Amount};
use serde::{Deserialize, Serialize};

use crate::{draw::WinnerSource, error::LotteryError};

/// Who is calling and what value is attached to the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountOwner,
    pub stake: Amount,
}

impl CallContext {
    pub fn new(caller: AccountOwner, stake: Amount) -> Self {
        CallContext { caller, stake }
    }

    /// A call carrying no value.
    pub fn from_caller(caller: AccountOwner) -> Self {
        CallContext::new(caller, Amount::ZERO)
    }
}

/// Whether the current round has any entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Enum)]
pub enum Phase {
    Idle,      // No entries, pool is empty
    Accepting, // At least one entry
}

impl Phase {
    /// The phase of a round holding `entries` entries.
    pub fn for_entries(entries: usize) -> Self {
        if entries == 0 {
            Phase::Idle
        } else {
            Phase::Accepting
        }
    }
}

/// The result of a payout. The host moves `prize` to `winner`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, SimpleObject)]
pub struct Payout {
    pub round: u64,
    pub winner: AccountOwner,
    pub prize: Amount,
    pub entries: u64,
}

/// One lottery instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    manager: AccountOwner,
    minimum_stake: Amount,
    players: Vec<AccountOwner>,
    pool: Amount,
    completed: u64,
}

impl Round {
    /// Opens a lottery managed by `manager`.
    pub fn new(manager: AccountOwner, minimum_stake: Amount) -> Result<Self, LotteryError> {
        if minimum_stake == Amount::ZERO {
            return Err(LotteryError::InvalidMinimumStake);
        }
        Ok(Round {
            manager,
            minimum_stake,
            players: Vec::new(),
            pool: Amount::ZERO,
            completed: 0,
        })
    }

    /// Rebuilds an instance from persisted fields.
    pub fn restore(
        manager: AccountOwner,
        minimum_stake: Amount,
        players: Vec<AccountOwner>,
        pool: Amount,
        completed: u64,
    ) -> Self {
        Round {
            manager,
            minimum_stake,
            players,
            pool,
            completed,
        }
    }

    pub fn manager(&self) -> AccountOwner {
        self.manager
    }

    pub fn minimum_stake(&self) -> Amount {
        self.minimum_stake
    }

    /// Entries of the current round, oldest first.
    pub fn players(&self) -> &[AccountOwner] {
        &self.players
    }

    pub fn pool(&self) -> Amount {
        self.pool
    }

    /// Number of payouts made so far.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn phase(&self) -> Phase {
        Phase::for_entries(self.players.len())
    }

    /// Adds the caller to the round and its stake to the pool.
    pub fn enter(&mut self, context: CallContext) -> Result<(), LotteryError> {
        if context.stake < self.minimum_stake {
            return Err(LotteryError::InsufficientStake {
                stake: context.stake,
                minimum: self.minimum_stake,
            });
        }
        let pool = self
            .pool
            .try_add(context.stake)
            .map_err(|_| LotteryError::PoolOverflow)?;

        self.players.push(context.caller);
        self.pool = pool;
        Ok(())
    }

    /// Draws one entry, hands back the payout and starts a new round.
    ///
    /// Only the manager may call this, and only while there are entries.
    /// Nothing changes unless the whole payout succeeds.
    pub fn pick_winner(
        &mut self,
        context: CallContext,
        source: &mut impl WinnerSource,
    ) -> Result<Payout, LotteryError> {
        if context.caller != self.manager {
            return Err(LotteryError::Unauthorized {
                caller: context.caller,
            });
        }
        if self.players.is_empty() {
            return Err(LotteryError::EmptyPool);
        }

        let entries = self.players.len();
        let index = source.pick(entries);
        let winner = *self
            .players
            .get(index)
            .ok_or(LotteryError::DrawOutOfRange {
                index,
                players: entries,
            })?;

        self.completed += 1;
        let payout = Payout {
            round: self.completed,
            winner,
            prize: self.pool,
            entries: entries as u64,
        };
        self.players.clear();
        self.pool = Amount::ZERO;
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(byte: u8) -> AccountOwner {
        AccountOwner::Address20([byte; 20])
    }

    fn minimum() -> Amount {
        Amount::from_millis(10)
    }

    fn lottery() -> Round {
        Round::new(owner(0), minimum()).expect("positive minimum")
    }

    fn first(_: usize) -> usize {
        0
    }

    #[test]
    fn starts_idle() {
        let round = lottery();
        assert_eq!(round.phase(), Phase::Idle);
        assert!(round.players().is_empty());
        assert_eq!(round.pool(), Amount::ZERO);
        assert_eq!(round.manager(), owner(0));
        assert_eq!(round.completed(), 0);
    }

    #[test]
    fn phase_follows_entry_count() {
        assert_eq!(Phase::for_entries(0), Phase::Idle);
        assert_eq!(Phase::for_entries(1), Phase::Accepting);
        assert_eq!(Phase::for_entries(usize::MAX), Phase::Accepting);
    }

    #[test]
    fn zero_minimum_is_rejected() {
        assert_eq!(
            Round::new(owner(0), Amount::ZERO),
            Err(LotteryError::InvalidMinimumStake)
        );
    }

    #[test]
    fn enter_adds_player_and_stake() {
        let mut round = lottery();
        for (i, millis) in [10u128, 30, 2_000, 10_000_000].into_iter().enumerate() {
            let before = round.pool();
            let stake = Amount::from_millis(millis);
            round.enter(CallContext::new(owner(1), stake)).unwrap();
            assert_eq!(round.players().len(), i + 1);
            assert_eq!(round.pool(), before.saturating_add(stake));
        }
        assert_eq!(round.phase(), Phase::Accepting);
    }

    #[test]
    fn stake_equal_to_minimum_is_accepted() {
        let mut round = lottery();
        round.enter(CallContext::new(owner(1), minimum())).unwrap();
        assert_eq!(round.players(), &[owner(1)]);
    }

    #[test]
    fn stake_below_minimum_changes_nothing() {
        let mut round = lottery();
        round.enter(CallContext::new(owner(1), minimum())).unwrap();
        let before = round.clone();

        let result = round.enter(CallContext::new(owner(2), Amount::from_attos(200)));
        assert_eq!(
            result,
            Err(LotteryError::InsufficientStake {
                stake: Amount::from_attos(200),
                minimum: minimum(),
            })
        );
        assert_eq!(round, before);
    }

    #[test]
    fn pool_overflow_changes_nothing() {
        let mut round = lottery();
        round.enter(CallContext::new(owner(1), Amount::MAX)).unwrap();
        let before = round.clone();

        assert_eq!(
            round.enter(CallContext::new(owner(2), minimum())),
            Err(LotteryError::PoolOverflow)
        );
        assert_eq!(round, before);
    }

    #[test]
    fn players_keep_entry_order() {
        let mut round = lottery();
        for byte in [3, 1, 2, 1] {
            round
                .enter(CallContext::new(owner(byte), Amount::from_millis(30)))
                .unwrap();
        }
        assert_eq!(round.players(), &[owner(3), owner(1), owner(2), owner(1)]);
    }

    #[test]
    fn only_manager_picks_winner() {
        let mut round = lottery();
        round.enter(CallContext::new(owner(1), minimum())).unwrap();
        let before = round.clone();

        let result = round.pick_winner(CallContext::from_caller(owner(1)), &mut first);
        assert_eq!(result, Err(LotteryError::Unauthorized { caller: owner(1) }));
        assert_eq!(round, before);
    }

    #[test]
    fn authorization_is_checked_before_emptiness() {
        let mut round = lottery();
        let result = round.pick_winner(CallContext::from_caller(owner(9)), &mut first);
        assert_eq!(result, Err(LotteryError::Unauthorized { caller: owner(9) }));
    }

    #[test]
    fn empty_round_has_no_winner() {
        let mut round = lottery();
        let mut drawn = false;
        let mut source = |_: usize| {
            drawn = true;
            0
        };

        let result = round.pick_winner(CallContext::from_caller(owner(0)), &mut source);
        assert_eq!(result, Err(LotteryError::EmptyPool));
        assert!(!drawn, "the source must not be consulted for an empty round");
        assert_eq!(round, lottery());
    }

    #[test]
    fn payout_goes_to_drawn_player_and_resets() {
        let mut round = lottery();
        for byte in 1..=3 {
            round
                .enter(CallContext::new(owner(byte), Amount::from_millis(30)))
                .unwrap();
        }

        let mut second = |players: usize| {
            assert_eq!(players, 3);
            1
        };
        let payout = round
            .pick_winner(CallContext::from_caller(owner(0)), &mut second)
            .unwrap();

        assert_eq!(
            payout,
            Payout {
                round: 1,
                winner: owner(2),
                prize: Amount::from_millis(90),
                entries: 3,
            }
        );
        assert_eq!(round.phase(), Phase::Idle);
        assert!(round.players().is_empty());
        assert_eq!(round.pool(), Amount::ZERO);
        assert_eq!(round.completed(), 1);
        assert_eq!(round.manager(), owner(0));
    }

    #[test]
    fn out_of_range_draw_changes_nothing() {
        let mut round = lottery();
        round.enter(CallContext::new(owner(1), minimum())).unwrap();
        let before = round.clone();

        let mut broken = |players: usize| players;
        let result = round.pick_winner(CallContext::from_caller(owner(0)), &mut broken);
        assert_eq!(
            result,
            Err(LotteryError::DrawOutOfRange {
                index: 1,
                players: 1
            })
        );
        assert_eq!(round, before);
    }

    #[test]
    fn rounds_repeat() {
        let mut round = lottery();
        for expected in 1..=3 {
            round
                .enter(CallContext::new(owner(1), Amount::from_tokens(1)))
                .unwrap();
            let payout = round
                .pick_winner(CallContext::from_caller(owner(0)), &mut first)
                .unwrap();
            assert_eq!(payout.round, expected);
            assert_eq!(payout.prize, Amount::from_tokens(1));
        }
        assert_eq!(round.completed(), 3);
    }

    #[test]
    fn restore_round_trips_fields() {
        let mut round = lottery();
        round
            .enter(CallContext::new(owner(4), Amount::from_tokens(2)))
            .unwrap();
        let restored = Round::restore(
            round.manager(),
            round.minimum_stake(),
            round.players().to_vec(),
            round.pool(),
            round.completed(),
        );
        assert_eq!(restored, round);
    }
}
