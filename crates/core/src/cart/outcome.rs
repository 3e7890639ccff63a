//! Result of a cart line mutation.

/// What a line mutation actually did.
///
/// Cart mutations never fail; they clamp or no-op. The outcome lets callers
/// notice when the requested quantity was not honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The request was applied as asked.
    Applied,
    /// The quantity was reduced to the stock ceiling.
    ClampedToStock {
        /// Quantity the caller asked for (after merging, for adds).
        requested: u32,
        /// Quantity stored.
        granted: u32,
    },
    /// The line was removed.
    Removed,
    /// No line exists for the product.
    ItemNotFound,
    /// The supplied stock ceiling is zero for a product not in the cart;
    /// nothing was added.
    OutOfStock,
    /// The request would not change anything (e.g. adding zero units).
    Unchanged,
}

impl MutationOutcome {
    pub(crate) const fn from_clamp(requested: u32, granted: u32) -> Self {
        if granted < requested {
            Self::ClampedToStock { requested, granted }
        } else {
            Self::Applied
        }
    }

    /// Whether the cart contents changed.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(
            self,
            Self::Applied | Self::ClampedToStock { .. } | Self::Removed
        )
    }

    /// Whether the stored quantity is lower than requested.
    #[must_use]
    pub const fn is_clamped(self) -> bool {
        matches!(self, Self::ClampedToStock { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_clamp() {
        assert_eq!(MutationOutcome::from_clamp(3, 3), MutationOutcome::Applied);
        assert_eq!(
            MutationOutcome::from_clamp(6, 5),
            MutationOutcome::ClampedToStock {
                requested: 6,
                granted: 5
            }
        );
    }

    #[test]
    fn test_changed() {
        assert!(MutationOutcome::Applied.changed());
        assert!(MutationOutcome::Removed.changed());
        assert!(!MutationOutcome::ItemNotFound.changed());
        assert!(!MutationOutcome::OutOfStock.changed());
        assert!(!MutationOutcome::Unchanged.changed());
    }
}
