//! Elapsed counters addressed by expiration payloads.
//!
//! A timer's `sigev_value` is a [`CounterToken`]: a slot index in a static
//! table plus the generation the slot had when the timer leased it. Slots
//! are never freed, so an expiration delivered after its timer was dropped
//! lands on valid memory. Its generation no longer matches, so it is ignored.
//!
//! Each slot packs the generation (high 16 bits) and the count (low 48 bits)
//! into one `AtomicU64`. Checking the generation and adding to the count are
//! a single compare-exchange, so a stale expiration can never leak into the
//! count of the slot's next owner.
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use nix::libc::{self, c_int};

/// Number of timers that can be live at once in a process.
pub(crate) const COUNTER_CAPACITY: usize = 1_024;

const GENERATION_SHIFT: u32 = 48;
const COUNT_MASK: u64 = (1 << GENERATION_SHIFT) - 1;
const INDEX_BITS: u32 = 16;
const INDEX_MASK: usize = (1 << INDEX_BITS) - 1;
const _: () = assert!(COUNTER_CAPACITY <= INDEX_MASK + 1);
/// Keeps encoded tokens positive on 32-bit `intptr_t`.
const MAX_GENERATION: u16 = 0x7FFF;

/// Process-wide table backing every [`IntervalTimer`](crate::timer::IntervalTimer).
pub(crate) static COUNTERS: CounterTable<COUNTER_CAPACITY> = CounterTable::new();

/// Lease type held by every live timer.
pub(crate) type TimerCounter = CounterLease<'static, COUNTER_CAPACITY>;

/// Payload carried by every expiration of one timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CounterToken {
    index: usize,
    generation: u16,
}

impl CounterToken {
    /// Encode as `sigev_value`. Never zero: generations start at 1.
    pub(crate) fn to_raw(self) -> libc::intptr_t {
        ((usize::from(self.generation) << INDEX_BITS) | self.index) as libc::intptr_t
    }

    pub(crate) fn from_raw(raw: libc::intptr_t) -> Option<Self> {
        if raw <= 0 {
            return None;
        }
        let raw = raw as usize;
        let generation = raw >> INDEX_BITS;
        if generation == 0 || generation > usize::from(MAX_GENERATION) {
            return None;
        }
        Some(Self {
            index: raw & INDEX_MASK,
            generation: generation as u16,
        })
    }
}

struct CounterSlot {
    leased: AtomicBool,
    state: AtomicU64,
}

impl CounterSlot {
    #[allow(clippy::declare_interior_mutable_const)]
    const EMPTY: CounterSlot = CounterSlot {
        leased: AtomicBool::new(false),
        state: AtomicU64::new(0),
    };
}

/// Fixed-size table of generation-tagged counters.
pub(crate) struct CounterTable<const N: usize> {
    slots: [CounterSlot; N],
}

impl<const N: usize> CounterTable<N> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: [CounterSlot::EMPTY; N],
        }
    }

    /// Claim a free slot, reset to zero under a fresh generation.
    pub(crate) fn lease(&self) -> Option<CounterLease<'_, N>> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            slot.leased
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .ok()?;
            let previous = state_generation(slot.state.load(Ordering::Relaxed));
            let generation = next_generation(previous);
            slot.state.store(pack(generation, 0), Ordering::Release);
            Some(CounterLease {
                table: self,
                token: CounterToken { index, generation },
            })
        })
    }

    /// Account one delivered expiration plus `overrun` missed ones on the
    /// slot named by `raw`, if it still belongs to the same lease.
    ///
    /// A negative `overrun` means the kernel could not tell how many periods
    /// were missed; the counter is left alone rather than guessed. Lock-free
    /// and allocation-free: called from the signal handler.
    pub(crate) fn record(&self, raw: libc::intptr_t, overrun: c_int) {
        if overrun < 0 {
            return;
        }
        let Some(token) = CounterToken::from_raw(raw) else {
            return;
        };
        let Some(slot) = self.slots.get(token.index) else {
            return;
        };
        let periods = overrun as u64 + 1;
        let mut state = slot.state.load(Ordering::Relaxed);
        loop {
            if state_generation(state) != token.generation {
                return;
            }
            // Saturate inside the count bits so the generation is never touched.
            let count = (state & COUNT_MASK).saturating_add(periods).min(COUNT_MASK);
            match slot.state.compare_exchange_weak(
                state,
                pack(token.generation, count),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => state = actual,
            }
        }
    }
}

/// Exclusive ownership of one slot. Releasing it bumps the generation so
/// late expirations for the old token are dropped.
pub(crate) struct CounterLease<'a, const N: usize> {
    table: &'a CounterTable<N>,
    token: CounterToken,
}

impl<const N: usize> CounterLease<'_, N> {
    pub(crate) fn token(&self) -> CounterToken {
        self.token
    }

    /// Current count; never decreases while the lease is held.
    pub(crate) fn load(&self) -> u64 {
        self.slot().state.load(Ordering::Relaxed) & COUNT_MASK
    }

    fn slot(&self) -> &CounterSlot {
        &self.table.slots[self.token.index]
    }
}

impl<const N: usize> Drop for CounterLease<'_, N> {
    fn drop(&mut self) {
        let slot = self.slot();
        let retired = next_generation(self.token.generation);
        slot.state.store(pack(retired, 0), Ordering::Release);
        slot.leased.store(false, Ordering::Release);
    }
}

const fn pack(generation: u16, count: u64) -> u64 {
    ((generation as u64) << GENERATION_SHIFT) | count
}

const fn state_generation(state: u64) -> u16 {
    (state >> GENERATION_SHIFT) as u16
}

/// Generations cycle through 1..=MAX_GENERATION; 0 marks a never-leased slot.
const fn next_generation(generation: u16) -> u16 {
    if generation >= MAX_GENERATION {
        1
    } else {
        generation + 1
    }
}
