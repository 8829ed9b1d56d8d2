// ============================================================================
// reactive-engine - Constants
// Flag bits shared by every node in the dependency graph
// ============================================================================

// =============================================================================
// NODE KIND FLAGS
// =============================================================================

/// Observable value (leaf, no dependencies of its own)
pub const SOURCE: u32 = 1 << 0;

/// Computed value - both a source (has observers) and a reaction (has deps)
pub const DERIVED: u32 = 1 << 1;

/// Reaction - an effectful observer, never itself observed
pub const EFFECT: u32 = 1 << 2;

/// Effect runs synchronously the instant it is scheduled instead of being
/// coalesced into the next flush (`autorun`'s default mode)
pub const RENDER_EFFECT: u32 = 1 << 3;

/// Effect is the root of a disposal tree (scope boundary / action root)
pub const ROOT_EFFECT: u32 = 1 << 4;

/// Effect was created through a public operator (`autorun`/`reaction`/`when`)
pub const USER_EFFECT: u32 = 1 << 6;

// =============================================================================
// COMPUTED-SPECIFIC FLAGS
// =============================================================================

/// Computed has no observers and `keep_alive == false`: its cache and
/// dependency edges are dropped until next read ("Not-Tracking" state)
pub const NOT_TRACKING: u32 = 1 << 8;

/// Computed retains its cache and dependency edges even with zero observers
pub const KEEP_ALIVE: u32 = 1 << 9;

/// Computed rejects reads taken outside any tracking context with
/// `ReadOutsideReaction` instead of falling back to an untracked recompute
pub const REQUIRES_REACTION: u32 = 1 << 10;

// =============================================================================
// STATUS FLAGS (Up-To-Date / Stale / Possibly-Stale / Recomputing)
// =============================================================================

/// Up-to-date: cached value is valid, reading is free
pub const CLEAN: u32 = 1 << 11;

/// Stale: a direct dependency changed, must recompute before the next read
pub const DIRTY: u32 = 1 << 12;

/// Possibly-stale: a transitive (computed) dependency signalled `MaybeDirty`;
/// must walk dependency versions to decide whether a recompute is needed
pub const MAYBE_DIRTY: u32 = 1 << 13;

/// Set for the duration of a derivation's getter or a reaction's body,
/// doubling as the re-entrancy guard that detects cyclic dependencies
pub const REACTION_IS_UPDATING: u32 = 1 << 14;

/// Node has been disposed; scheduling and tracking become no-ops
pub const DESTROYED: u32 = 1 << 15;

/// Effect is paused because an ancestor disposal scope is paused
pub const INERT: u32 = 1 << 16;

/// Effect has executed at least once, distinguishing first run from rerun
pub const EFFECT_RAN: u32 = 1 << 17;

/// Effect survives its parent scope's disposal (root/detached effects)
pub const EFFECT_PRESERVED: u32 = 1 << 18;

// =============================================================================
// STATUS MASK
// =============================================================================

/// Mask to clear the three status bits (CLEAN, DIRTY, MAYBE_DIRTY) while
/// preserving kind/config flags
pub const STATUS_MASK: u32 = !(DIRTY | MAYBE_DIRTY | CLEAN);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_distinct() {
        let all_flags = [
            SOURCE,
            DERIVED,
            EFFECT,
            RENDER_EFFECT,
            ROOT_EFFECT,
            USER_EFFECT,
            NOT_TRACKING,
            KEEP_ALIVE,
            REQUIRES_REACTION,
            CLEAN,
            DIRTY,
            MAYBE_DIRTY,
            REACTION_IS_UPDATING,
            DESTROYED,
            INERT,
            EFFECT_RAN,
            EFFECT_PRESERVED,
        ];

        for (i, &a) in all_flags.iter().enumerate() {
            for (j, &b) in all_flags.iter().enumerate() {
                if i != j {
                    assert_eq!(
                        a & b,
                        0,
                        "flags at index {} and {} overlap: {:b} & {:b}",
                        i,
                        j,
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn status_mask_clears_status_bits_only() {
        let flags = DERIVED | DIRTY | EFFECT_RAN;
        let cleared = flags & STATUS_MASK;

        assert_eq!(cleared & DIRTY, 0);
        assert_ne!(cleared & DERIVED, 0);
        assert_ne!(cleared & EFFECT_RAN, 0);
    }

    #[test]
    fn can_combine_and_transition_flags() {
        let mut flags = SOURCE | CLEAN;

        assert_ne!(flags & SOURCE, 0);
        assert_ne!(flags & CLEAN, 0);
        assert_eq!(flags & DIRTY, 0);

        flags = (flags & STATUS_MASK) | DIRTY;

        assert_ne!(flags & SOURCE, 0);
        assert_eq!(flags & CLEAN, 0);
        assert_ne!(flags & DIRTY, 0);
    }
}
