// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(target_arch = "wasm32", no_main)]

mod state;

use linera_sdk::{
    linera_base_types::{Account, AccountOwner, WithContractAbi},
    views::{RootView, View},
    Contract, ContractRuntime,
};
use lottery::{
    CallContext, ChainEntropy, LotteryAbi, LotteryParameters, LotteryResponse, Operation, Round,
};
use self::state::LotteryState;

pub struct LotteryContract {
    state: LotteryState,
    runtime: ContractRuntime<Self>,
}

linera_sdk::contract!(LotteryContract);

impl WithContractAbi for LotteryContract {
    type Abi = LotteryAbi;
}

impl Contract for LotteryContract {
    type Message = ();
    type Parameters = LotteryParameters;
    type InstantiationArgument = ();
    type EventValue = ();

    async fn load(runtime: ContractRuntime<Self>) -> Self {
        let state = LotteryState::load(runtime.root_view_storage_context())
            .await
            .expect("Failed to load state");
        LotteryContract { state, runtime }
    }

    async fn instantiate(&mut self, _arg: Self::InstantiationArgument) {
        let parameters = self.runtime.application_parameters();
        let manager = self
            .runtime
            .authenticated_signer()
            .expect("The lottery manager must sign the instantiation");

        match Round::new(manager, parameters.minimum_stake) {
            Ok(round) => self.state.commit(&round),
            Err(e) => panic!("Failed to create lottery: {}", e),
        }
        log::info!(
            "Lottery created by {} with a minimum stake of {}",
            manager,
            parameters.minimum_stake
        );
    }

    async fn execute_operation(&mut self, operation: Self::Operation) -> Self::Response {
        match operation {
            Operation::Enter { owner, stake } => {
                self.runtime
                    .check_account_permission(owner)
                    .expect("Permission for Enter operation");

                let mut round = self.round().await;
                if let Err(e) = round.enter(CallContext::new(owner, stake)) {
                    panic!("Failed to enter lottery: {}", e);
                }

                let lottery_account = Account {
                    chain_id: self.runtime.chain_id(),
                    owner: self.application_owner(),
                };
                self.runtime.transfer(owner, lottery_account, stake);
                self.state.commit(&round);

                log::debug!("Lottery::Enter - {} staked {}", owner, stake);
                LotteryResponse::Ok
            }

            Operation::PickWinner => {
                let caller = self
                    .runtime
                    .authenticated_signer()
                    .expect("Authentication required to pick a winner");

                let mut round = self.round().await;
                let mut source =
                    ChainEntropy::new(self.runtime.system_time(), self.runtime.block_height());
                let payout = match round.pick_winner(CallContext::from_caller(caller), &mut source) {
                    Ok(payout) => payout,
                    Err(e) => panic!("Failed to pick a winner: {}", e),
                };

                let winner_account = Account {
                    chain_id: self.runtime.chain_id(),
                    owner: payout.winner,
                };
                let lottery_owner = self.application_owner();
                self.runtime
                    .transfer(lottery_owner, winner_account, payout.prize);

                self.state.commit(&round);
                if let Err(e) = self.state.record_outcome(&payout) {
                    panic!("{}", e);
                }

                log::info!(
                    "Lottery::PickWinner - round {} paid {} to {} ({} entries)",
                    payout.round,
                    payout.prize,
                    payout.winner,
                    payout.entries
                );
                LotteryResponse::Winner(payout)
            }

            // Query operations
            Operation::GetPlayers => match self.state.players().await {
                Ok(players) => LotteryResponse::Players(players),
                Err(e) => panic!("{}", e),
            },

            Operation::GetPool => LotteryResponse::Pool(*self.state.pool.get()),

            Operation::GetManager => LotteryResponse::Manager(self.round().await.manager()),
        }
    }

    async fn execute_message(&mut self, _message: Self::Message) {
        // The lottery lives on a single chain and sends no messages
    }

    async fn store(mut self) {
        self.state.save().await.expect("Failed to save state");
    }
}

impl LotteryContract {
    async fn round(&mut self) -> Round {
        let minimum_stake = self.runtime.application_parameters().minimum_stake;
        match self.state.round(minimum_stake).await {
            Ok(Some(round)) => round,
            Ok(None) => panic!("Lottery used before instantiation"),
            Err(e) => panic!("{}", e),
        }
    }

    /// The account holding the pooled stakes.
    fn application_owner(&mut self) -> AccountOwner {
        AccountOwner::from(self.runtime.application_id().forget_abi())
    }
}
