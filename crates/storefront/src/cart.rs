//! Shared cart store.
//!
//! [`CartStore`] wraps a [`CartState`] behind a lock so UI call sites can hold
//! a handle instead of reaching for a global. Line mutations are synchronous;
//! coupon validation is the only operation that awaits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bazaar_client::{CouponError, CouponRequest, CouponValidator};
use bazaar_core::{
    CartItem, CartState, CouponLine, CouponStatus, MutationOutcome, PaymentMethod, ProductId,
    ShippingAddress,
};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

/// Cart state shared between every part of the UI.
///
/// Cheap to clone; clones share the same cart and validator.
pub struct CartStore<V> {
    inner: Arc<CartStoreInner<V>>,
}

struct CartStoreInner<V> {
    state: RwLock<CartState>,
    validator: V,
    /// Ticket of the most recently started coupon validation.
    latest_ticket: AtomicU64,
}

impl<V> Clone for CartStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> std::fmt::Debug for CartStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.read())
            .finish_non_exhaustive()
    }
}

impl<V> CartStore<V> {
    /// An empty cart validated by `validator`.
    #[must_use]
    pub fn new(validator: V) -> Self {
        Self::with_state(validator, CartState::new())
    }

    /// A store starting from a previously saved cart.
    #[must_use]
    pub fn with_state(validator: V, mut state: CartState) -> Self {
        state.cancel_coupon_validation();
        Self {
            inner: Arc::new(CartStoreInner {
                state: RwLock::new(state),
                validator,
                latest_ticket: AtomicU64::new(0),
            }),
        }
    }

    #[must_use]
    pub fn validator(&self) -> &V {
        &self.inner.validator
    }

    // A panic while holding the lock cannot leave the cart half-updated:
    // every reducer method recomputes totals before returning.
    fn read(&self) -> RwLockReadGuard<'_, CartState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CartState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the current state without cloning it.
    pub fn inspect<R>(&self, f: impl FnOnce(&CartState) -> R) -> R {
        f(&self.read())
    }

    /// Invalidate any coupon validation still in flight.
    fn supersede_validations(&self) {
        self.inner.latest_ticket.fetch_add(1, Ordering::SeqCst);
    }

    // =========================================================================
    // Line items
    // =========================================================================

    /// Add a line or merge it into the existing line for the same product.
    pub fn add_item(&self, item: CartItem) -> MutationOutcome {
        let product = item.product.clone();
        let outcome = self.write().add_item(item);
        match outcome {
            MutationOutcome::ClampedToStock { requested, granted } => {
                warn!(product = %product, requested, granted, "Quantity clamped to stock");
            }
            _ => debug!(product = %product, ?outcome, "Item added"),
        }
        outcome
    }

    pub fn remove_item(&self, product: &ProductId) -> MutationOutcome {
        let outcome = self.write().remove_item(product);
        debug!(product = %product, ?outcome, "Item removed");
        outcome
    }

    pub fn update_quantity(&self, product: &ProductId, quantity: u32) -> MutationOutcome {
        let outcome = self.write().update_quantity(product, quantity);
        match outcome {
            MutationOutcome::ClampedToStock { requested, granted } => {
                warn!(product = %product, requested, granted, "Quantity clamped to stock");
            }
            _ => debug!(product = %product, quantity, ?outcome, "Quantity updated"),
        }
        outcome
    }

    /// Empty the cart's lines. The coupon and checkout details stay.
    pub fn clear_cart(&self) {
        self.write().clear_items();
        debug!("Cart cleared");
    }

    /// Start over: lines, coupon and checkout details are all dropped, and
    /// any pending coupon validation is ignored when it lands.
    pub fn reset(&self) {
        self.supersede_validations();
        self.write().reset();
        info!("Cart reset");
    }

    // =========================================================================
    // Checkout details
    // =========================================================================

    pub fn set_shipping_address(&self, address: ShippingAddress) {
        debug!(city = %address.city, country = %address.country, "Shipping address set");
        self.write().set_shipping_address(address);
    }

    pub fn set_payment_method(&self, method: PaymentMethod) {
        debug!(method = %method, "Payment method set");
        self.write().set_payment_method(method);
    }

    // =========================================================================
    // Coupon
    // =========================================================================

    /// Drop the applied coupon. No request is made.
    pub fn remove_coupon(&self) {
        self.write().remove_coupon();
        debug!("Coupon removed");
    }

    // =========================================================================
    // Snapshots and accessors
    // =========================================================================

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.read().clone()
    }

    /// Replace the state wholesale, e.g. with one loaded from disk.
    ///
    /// Pending coupon validations are superseded so they cannot write into
    /// the restored cart.
    pub fn restore(&self, mut state: CartState) {
        self.supersede_validations();
        state.cancel_coupon_validation();
        *self.write() = state;
        debug!("Cart restored");
    }

    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.read().total_items()
    }

    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.read().total_price()
    }

    #[must_use]
    pub fn discount(&self) -> Decimal {
        self.read().discount()
    }

    #[must_use]
    pub fn coupon_status(&self) -> CouponStatus {
        self.read().coupon_status()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read().is_loading()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read().error().map(str::to_string)
    }
}

impl<V: CouponValidator> CartStore<V> {
    /// Validate `code` against a caller-supplied total and line projection.
    ///
    /// While the request is pending the cart reports `Validating`. On
    /// success the server's code and discount are stored; on failure any
    /// applied coupon is dropped and the error message kept.
    ///
    /// When calls overlap only the most recently started one updates the
    /// cart. Earlier calls still return their own result.
    ///
    /// # Errors
    ///
    /// Returns the validator's `CouponError` when the code is not applied.
    #[instrument(skip(self, cart_items), fields(code = %code))]
    pub async fn apply_coupon(
        &self,
        code: &str,
        cart_total: Decimal,
        cart_items: Vec<CouponLine>,
    ) -> Result<Decimal, CouponError> {
        let ticket = {
            let mut state = self.write();
            state.begin_coupon_validation();
            self.inner.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1
        };

        let request = CouponRequest {
            code: code.trim().to_string(),
            cart_total,
            cart_items,
        };
        let result = self.inner.validator.validate(&request).await;

        let mut state = self.write();
        if self.inner.latest_ticket.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Discarding superseded coupon result");
            return result.map(|coupon| coupon.discount);
        }

        match result {
            Ok(coupon) => {
                let discount = coupon.discount;
                info!(code = %coupon.code, discount = %discount, "Coupon applied");
                state.apply_coupon_grant(coupon);
                Ok(discount)
            }
            Err(err) => {
                warn!(error = %err, "Coupon not applied");
                state.fail_coupon(err.to_string());
                Err(err)
            }
        }
    }

    /// Validate `code` against the cart's own total and lines.
    ///
    /// # Errors
    ///
    /// Same as [`CartStore::apply_coupon`].
    pub async fn apply_coupon_to_cart(&self, code: &str) -> Result<Decimal, CouponError> {
        let (total, lines) = self.inspect(|state| (state.total_price(), state.coupon_lines()));
        self.apply_coupon(code, total, lines).await
    }
}
