// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use linera_sdk::linera_base_types::{AccountOwner, Amount};
use linera_sdk::views::{
    linera_views, LogView, MapView, RegisterView, RootView, View, ViewError, ViewStorageContext,
};
use lottery::{Payout, Round};

/// Finished rounds kept in `outcomes`; older ones are dropped as new ones land.
pub const MAX_OUTCOME_HISTORY: u64 = 256;

/// The application state for the Lottery.
#[derive(RootView)]
#[view(context = ViewStorageContext)]
pub struct LotteryState {
    /// Identity that created the application; `None` only before instantiation
    pub manager: RegisterView<Option<AccountOwner>>,
    /// Entries of the current round, oldest first
    pub players: LogView<AccountOwner>,
    /// Sum of the stakes of the current round
    pub pool: RegisterView<Amount>,
    /// Number of payouts made so far
    pub completed: RegisterView<u64>,
    /// The last `MAX_OUTCOME_HISTORY` finished rounds by round number
    pub outcomes: MapView<u64, Payout>,
}

#[allow(dead_code)]
impl LotteryState {
    pub async fn players(&self) -> Result<Vec<AccountOwner>, String> {
        self.players
            .read(0..self.players.count())
            .await
            .map_err(|e: ViewError| format!("Failed to read players: {:?}", e))
    }

    /// Reads the persisted fields into a state machine, or `None` before instantiation.
    pub async fn round(&self, minimum_stake: Amount) -> Result<Option<Round>, String> {
        let Some(manager) = *self.manager.get() else {
            return Ok(None);
        };
        Ok(Some(Round::restore(
            manager,
            minimum_stake,
            self.players().await?,
            *self.pool.get(),
            *self.completed.get(),
        )))
    }

    /// Writes a state machine back after a successful call.
    ///
    /// Entries only ever append during a round and are dropped together at a
    /// payout, so only the new tail is pushed to the log.
    pub fn commit(&mut self, round: &Round) {
        self.manager.set(Some(round.manager()));

        let players = round.players();
        let mut stored = self.players.count();
        if players.len() < stored {
            self.players.clear();
            stored = 0;
        }
        for player in &players[stored..] {
            self.players.push(*player);
        }

        self.pool.set(round.pool());
        self.completed.set(round.completed());
    }

    /// Stores a finished round and forgets the one falling out of the history window.
    pub fn record_outcome(&mut self, payout: &Payout) -> Result<(), String> {
        self.outcomes
            .insert(&payout.round, payout.clone())
            .map_err(|e: ViewError| format!("Failed to record round {}: {:?}", payout.round, e))?;

        if payout.round > MAX_OUTCOME_HISTORY {
            let oldest = payout.round - MAX_OUTCOME_HISTORY;
            log::debug!("Round {} leaves the outcome history", oldest);
            self.outcomes
                .remove(&oldest)
                .map_err(|e: ViewError| format!("Failed to drop round {}: {:?}", oldest, e))?;
        }
        Ok(())
    }

    pub async fn get_outcome(&self, round: u64) -> Result<Option<Payout>, String> {
        self.outcomes
            .get(&round)
            .await
            .map_err(|e: ViewError| format!("Failed to get round {}: {:?}", round, e))
    }

    /// All remembered rounds, oldest first.
    pub async fn get_all_outcomes(&self) -> Result<Vec<Payout>, String> {
        let indices = self
            .outcomes
            .indices()
            .await
            .map_err(|e: ViewError| format!("Failed to get round indices: {:?}", e))?;

        let mut outcomes = Vec::with_capacity(indices.len());
        for index in indices {
            if let Some(outcome) = self.get_outcome(index).await? {
                outcomes.push(outcome);
            }
        }
        // Keys are stored little-endian, so index order is not round order.
        outcomes.sort_by_key(|outcome| outcome.round);
        Ok(outcomes)
    }
}
