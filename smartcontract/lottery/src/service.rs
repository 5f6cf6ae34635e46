// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(target_arch = "wasm32", no_main)]

mod state;

use std::sync::Arc;

use async_graphql::{EmptySubscription, Object, Request, Response, Schema};
use linera_sdk::{
    linera_base_types::{AccountOwner, Amount, WithServiceAbi},
    views::View,
    Service, ServiceRuntime,
};
use lottery::{LotteryAbi, LotteryParameters, Operation, Payout, Phase};
use self::state::LotteryState;

pub struct LotteryService {
    state: Arc<LotteryState>,
    runtime: Arc<ServiceRuntime<Self>>,
}

linera_sdk::service!(LotteryService);

impl WithServiceAbi for LotteryService {
    type Abi = LotteryAbi;
}

impl Service for LotteryService {
    type Parameters = LotteryParameters;

    async fn new(runtime: ServiceRuntime<Self>) -> Self {
        let state = LotteryState::load(runtime.root_view_storage_context())
            .await
            .expect("Failed to load state");
        LotteryService {
            state: Arc::new(state),
            runtime: Arc::new(runtime),
        }
    }

    async fn handle_query(&self, request: Request) -> Response {
        let schema = Schema::build(
            QueryRoot {
                state: self.state.clone(),
                runtime: self.runtime.clone(),
            },
            MutationRoot {
                runtime: self.runtime.clone(),
            },
            EmptySubscription,
        )
        .finish();
        schema.execute(request).await
    }
}

struct QueryRoot {
    state: Arc<LotteryState>,
    runtime: Arc<ServiceRuntime<LotteryService>>,
}

#[Object]
impl QueryRoot {
    /// Entries of the current round, in the order they were made
    async fn players(&self) -> async_graphql::Result<Vec<AccountOwner>> {
        Ok(self.state.players().await?)
    }

    async fn player_count(&self) -> usize {
        self.state.players.count()
    }

    /// Total stake waiting to be paid out
    async fn pool(&self) -> Amount {
        *self.state.pool.get()
    }

    async fn manager(&self) -> Option<AccountOwner> {
        *self.state.manager.get()
    }

    async fn minimum_stake(&self) -> Amount {
        self.runtime.application_parameters().minimum_stake
    }

    /// Number of payouts made so far
    async fn round(&self) -> u64 {
        *self.state.completed.get()
    }

    async fn phase(&self) -> Phase {
        Phase::for_entries(self.state.players.count())
    }

    /// The most recent finished rounds, oldest first
    async fn outcomes(&self) -> async_graphql::Result<Vec<Payout>> {
        Ok(self.state.get_all_outcomes().await?)
    }

    /// The payout of a finished round, if it is still remembered
    async fn outcome(&self, round: u64) -> async_graphql::Result<Option<Payout>> {
        Ok(self.state.get_outcome(round).await?)
    }
}

struct MutationRoot {
    runtime: Arc<ServiceRuntime<LotteryService>>,
}

#[Object]
impl MutationRoot {
    /// Stake tokens from `owner` and join the current round
    async fn enter(&self, owner: AccountOwner, stake: String) -> async_graphql::Result<String> {
        let stake = parse_stake(&stake)?;
        self.runtime.schedule_operation(&Operation::Enter { owner, stake });
        Ok("Enter operation scheduled".to_string())
    }

    /// Pay the pool to one of the players
    async fn pick_winner(&self) -> String {
        self.runtime.schedule_operation(&Operation::PickWinner);
        "PickWinner operation scheduled".to_string()
    }
}

fn parse_stake(stake: &str) -> async_graphql::Result<Amount> {
    stake
        .trim()
        .parse::<Amount>()
        .map_err(|e| async_graphql::Error::new(format!("Invalid stake {:?}: {}", stake, e)))
}
