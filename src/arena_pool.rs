//! Pooled scratch arenas for aggregation queries.
//!
//! Completion aggregation allocates its result buffer from an arena the
//! caller supplies. Those queries are frequent and short-lived, so the
//! server recycles a small set of arenas instead of paying a fresh heap
//! allocation on every request.

use bumpalo::Bump;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// How many arenas survive between queries. Aggregation buffers hold a few
/// hundred completion refs at most, so a short free list is plenty.
const RETAINED_ARENAS: usize = 8;

static FREE_ARENAS: Lazy<Mutex<Vec<Bump>>> = Lazy::new(Mutex::default);

/// Run `f` with a scratch arena, recycling the arena afterwards.
///
/// Arenas are reset before they re-enter the free list, so `f` always
/// observes an empty one. The list lock is not held while `f` runs.
pub fn with_pooled_arena<R>(f: impl FnOnce(&Bump) -> R) -> R {
    let mut arena = FREE_ARENAS.lock().pop().unwrap_or_default();
    let result = f(&arena);

    arena.reset();
    let mut free = FREE_ARENAS.lock();
    if free.len() < RETAINED_ARENAS {
        free.push(arena);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_arena_passes_result_through() {
        let value = with_pooled_arena(|arena| {
            arena.alloc_str("scratch");
            42
        });
        assert_eq!(value, 42);
    }

    #[test]
    fn test_arena_is_empty_on_entry() {
        // Whether fresh or recycled, an arena must arrive reset.
        with_pooled_arena(|arena| {
            arena.alloc_slice_copy(&[1u8, 2, 3]);
        });
        with_pooled_arena(|arena| {
            assert_eq!(arena.allocated_bytes(), 0);
        });
    }
}
