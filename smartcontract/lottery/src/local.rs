// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! Running a lottery outside a chain: one lock per instance and an in-memory balance ledger. */

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use linera_sdk::linera_base_types::{AccountOwner, Amount};

use crate::{
    draw::WinnerSource,
    error::LotteryError,
    round::{CallContext, Payout, Phase, Round},
};

/// Account balances, charging a flat fee to whoever submits a call.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: BTreeMap<AccountOwner, Amount>,
    fee: Amount,
}

impl Ledger {
    pub fn new(fee: Amount) -> Self {
        Ledger {
            balances: BTreeMap::new(),
            fee,
        }
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    /// Credits `amount` to `owner` out of thin air.
    pub fn fund(&mut self, owner: AccountOwner, amount: Amount) {
        self.credit(owner, amount);
    }

    pub fn balance(&self, owner: &AccountOwner) -> Amount {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    pub fn transfer(
        &mut self,
        from: AccountOwner,
        to: AccountOwner,
        amount: Amount,
    ) -> Result<(), LotteryError> {
        self.debit(from, amount)?;
        self.credit(to, amount);
        Ok(())
    }

    fn charge_fee(&mut self, payer: AccountOwner) -> Result<(), LotteryError> {
        let fee = self.fee;
        self.debit(payer, fee)
    }

    fn debit(&mut self, owner: AccountOwner, amount: Amount) -> Result<(), LotteryError> {
        let available = self.balance(&owner);
        let remaining =
            available
                .try_sub(amount)
                .map_err(|_| LotteryError::InsufficientFunds {
                    owner,
                    needed: amount,
                    available,
                })?;
        self.balances.insert(owner, remaining);
        Ok(())
    }

    fn credit(&mut self, owner: AccountOwner, amount: Amount) {
        let balance = self.balances.entry(owner).or_default();
        *balance = balance.saturating_add(amount);
    }
}

#[derive(Debug, Clone)]
struct Instance {
    round: Round,
    ledger: Ledger,
}

/// A lottery deployed on a local ledger.
///
/// Every call runs under the instance lock against a copy of the state, and
/// the copy replaces the state only if the call succeeds, so a rejected call
/// leaves both the round and all balances as they were.
#[derive(Debug)]
pub struct LocalLottery {
    account: AccountOwner,
    inner: Mutex<Instance>,
}

impl LocalLottery {
    /// Deploys a lottery managed by `manager`, holding stakes in `account`.
    /// The manager pays the call fee.
    pub fn deploy(
        mut ledger: Ledger,
        manager: AccountOwner,
        account: AccountOwner,
        minimum_stake: Amount,
    ) -> Result<Self, LotteryError> {
        let round = Round::new(manager, minimum_stake)?;
        ledger.charge_fee(manager)?;
        log::info!("lottery deployed at {account} by {manager}");
        Ok(LocalLottery {
            account,
            inner: Mutex::new(Instance { round, ledger }),
        })
    }

    /// The account holding the pooled stakes.
    pub fn account(&self) -> AccountOwner {
        self.account
    }

    pub fn enter(&self, caller: AccountOwner, stake: Amount) -> Result<(), LotteryError> {
        self.transact(|instance, account| {
            instance.ledger.charge_fee(caller)?;
            instance.round.enter(CallContext::new(caller, stake))?;
            instance.ledger.transfer(caller, account, stake)?;
            log::debug!("{caller} entered with {stake}");
            Ok(())
        })
    }

    pub fn pick_winner(
        &self,
        caller: AccountOwner,
        source: &mut impl WinnerSource,
    ) -> Result<Payout, LotteryError> {
        self.transact(|instance, account| {
            instance.ledger.charge_fee(caller)?;
            let payout = instance
                .round
                .pick_winner(CallContext::from_caller(caller), source)?;
            instance
                .ledger
                .transfer(account, payout.winner, payout.prize)?;
            log::info!(
                "round {} paid {} to {} out of {} entries",
                payout.round,
                payout.prize,
                payout.winner,
                payout.entries
            );
            Ok(payout)
        })
    }

    pub fn players(&self) -> Vec<AccountOwner> {
        self.lock().round.players().to_vec()
    }

    pub fn pool(&self) -> Amount {
        self.lock().round.pool()
    }

    pub fn manager(&self) -> AccountOwner {
        self.lock().round.manager()
    }

    pub fn phase(&self) -> Phase {
        self.lock().round.phase()
    }

    pub fn balance(&self, owner: &AccountOwner) -> Amount {
        self.lock().ledger.balance(owner)
    }

    /// Adds funds to an account, outside of any lottery call.
    pub fn fund(&self, owner: AccountOwner, amount: Amount) {
        self.lock().ledger.fund(owner, amount);
    }

    fn transact<T>(
        &self,
        call: impl FnOnce(&mut Instance, AccountOwner) -> Result<T, LotteryError>,
    ) -> Result<T, LotteryError> {
        let mut guard = self.lock();
        let mut draft = guard.clone();
        let result = call(&mut draft, self.account);
        if result.is_ok() {
            *guard = draft;
        }
        result
    }

    fn lock(&self) -> MutexGuard<'_, Instance> {
        // Calls only ever replace the state wholesale, so it is never half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
