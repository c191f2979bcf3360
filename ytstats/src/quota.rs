//! Tracking of the YouTube API quota a single request has cost the caller.

use parking_lot::Mutex;

/// Quota charged for one page of `commentThreads.list` with `part=snippet,replies`.
pub const THREAD_PAGE_COST: u64 = 5;

/// Quota charged for one page of `comments.list` with `part=snippet`.
pub const REPLY_PAGE_COST: u64 = 2;

/// Running total of the quota units a request has been billed for.
///
/// Every page fetch charges the ledger as soon as YouTube answers, and refunds the charge if
/// YouTube turned the key away (see [`crate::youtube_api::Status::is_key_invalid`]), since
/// such calls are not billed. Shared by all reply workers of a request.
#[derive(Debug, Default)]
pub struct QuotaLedger {
    used: Mutex<u64>,
}

impl QuotaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charge(&self, amount: u64) {
        *self.used.lock() += amount;
    }

    /// Takes back a previous charge.
    ///
    /// Only ever called right after the matching [`Self::charge`], so the total can't drop
    /// below zero; it saturates regardless.
    pub fn refund(&self, amount: u64) {
        let mut used = self.used.lock();
        *used = used.saturating_sub(amount);
    }

    pub fn total(&self) -> u64 {
        *self.used.lock()
    }
}
