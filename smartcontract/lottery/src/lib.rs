// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! ABI of the Lottery application: players stake into a shared pool and the manager pays it all to one of them. */

pub mod draw;
pub mod error;
pub mod local;
pub mod round;

use async_graphql::{Request, Response};
use linera_sdk::linera_base_types::{AccountOwner, Amount, ContractAbi, ServiceAbi};
use serde::{Deserialize, Serialize};

pub use self::{
    draw::{ChainEntropy, WinnerSource},
    error::LotteryError,
    local::{Ledger, LocalLottery},
    round::{CallContext, Payout, Phase, Round},
};

/// Smallest stake accepted when the parameters do not say otherwise: 0.01 tokens.
pub const DEFAULT_MINIMUM_STAKE: Amount = Amount::from_millis(10);

pub struct LotteryAbi;

impl ContractAbi for LotteryAbi {
    type Operation = Operation;
    type Response = LotteryResponse;
}

impl ServiceAbi for LotteryAbi {
    type Query = Request;
    type QueryResponse = Response;
}

/// Application parameters, fixed when the application is created.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LotteryParameters {
    #[serde(default = "default_minimum_stake")]
    pub minimum_stake: Amount,
}

fn default_minimum_stake() -> Amount {
    DEFAULT_MINIMUM_STAKE
}

impl Default for LotteryParameters {
    fn default() -> Self {
        LotteryParameters {
            minimum_stake: DEFAULT_MINIMUM_STAKE,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub enum Operation {
    /// Stake `stake` tokens from `owner` and join the current round
    Enter { owner: AccountOwner, stake: Amount },
    /// Pay the whole pool to one player (manager only)
    PickWinner,

    // Queries
    GetPlayers,
    GetPool,
    GetManager,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum LotteryResponse {
    Ok,
    Players(Vec<AccountOwner>),
    Pool(Amount),
    Manager(AccountOwner),
    Winner(Payout),
}
