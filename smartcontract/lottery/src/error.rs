// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use linera_sdk::linera_base_types::{AccountOwner, Amount};
use thiserror::Error;

/// Reasons a lottery call is rejected. A rejected call never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LotteryError {
    #[error("stake of {stake} is below the minimum of {minimum}")]
    InsufficientStake { stake: Amount, minimum: Amount },

    #[error("{caller} is not the manager of this lottery")]
    Unauthorized { caller: AccountOwner },

    #[error("cannot pick a winner without players")]
    EmptyPool,

    #[error("the pool cannot hold any more stake")]
    PoolOverflow,

    #[error("draw returned index {index} for {players} players")]
    DrawOutOfRange { index: usize, players: usize },

    #[error("the minimum stake must be greater than zero")]
    InvalidMinimumStake,

    #[error("{owner} needs {needed} but only holds {available}")]
    InsufficientFunds {
        owner: AccountOwner,
        needed: Amount,
        available: Amount,
    },
}
