// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! Winner selection. */

use linera_sdk::linera_base_types::{BlockHeight, Timestamp};
use sha3::{Digest, Keccak256};

/// Picks the index of the winning entry among `players` entries.
///
/// Implementations must return a value in `0..players`; the round rejects
/// anything else. `players` is never zero when called by a round.
pub trait WinnerSource {
    fn pick(&mut self, players: usize) -> usize;
}

impl<F> WinnerSource for F
where
    F: FnMut(usize) -> usize,
{
    fn pick(&mut self, players: usize) -> usize {
        self(players)
    }
}

/// Draws from the volatile state of the block that executes the payout.
///
/// The index is `keccak256(timestamp || block_height || players) mod players`.
/// Anyone who can observe or influence the block (the validator proposing it,
/// or the manager choosing when to submit) can predict the result. Swap this
/// for a verifiable source where entrants may be adversarial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntropy {
    pub timestamp: Timestamp,
    pub block_height: BlockHeight,
}

impl ChainEntropy {
    pub fn new(timestamp: Timestamp, block_height: BlockHeight) -> Self {
        ChainEntropy {
            timestamp,
            block_height,
        }
    }

    fn seed(&self, players: usize) -> u64 {
        let digest = Keccak256::new()
            .chain_update(self.timestamp.micros().to_be_bytes())
            .chain_update(u64::from(self.block_height).to_be_bytes())
            .chain_update((players as u64).to_be_bytes())
            .finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }
}

impl WinnerSource for ChainEntropy {
    fn pick(&mut self, players: usize) -> usize {
        if players == 0 {
            return 0;
        }
        let index = self.seed(players) % players as u64;
        log::debug!(
            "chain entropy draw: timestamp={} block={} players={} index={}",
            self.timestamp.micros(),
            self.block_height,
            players,
            index
        );
        index as usize
    }
}
