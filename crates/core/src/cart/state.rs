//! The cart reducer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AppliedCoupon, CartItem, CouponLine, CouponStatus, MutationOutcome};
use crate::types::{PaymentMethod, ProductId, ShippingAddress};

/// In-memory cart for one session.
///
/// `total_items` and `total_price` are derived from `items` and recomputed
/// by every operation that touches `items`; there is no way to set them
/// directly. Deserializing recomputes them as well, so a stale or edited
/// snapshot cannot smuggle in inconsistent totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredCart")]
pub struct CartState {
    items: Vec<CartItem>,
    total_items: u64,
    total_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    shipping_address: Option<ShippingAddress>,
    payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    coupon: Option<AppliedCoupon>,
    /// Coupon validation in flight. Never persisted.
    #[serde(skip)]
    loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Persisted form; totals are ignored on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCart {
    #[serde(default)]
    items: Vec<CartItem>,
    #[serde(default)]
    shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    payment_method: PaymentMethod,
    #[serde(default)]
    coupon: Option<AppliedCoupon>,
    #[serde(default)]
    error: Option<String>,
}

impl From<StoredCart> for CartState {
    fn from(stored: StoredCart) -> Self {
        let mut state = Self {
            items: Vec::new(),
            total_items: 0,
            total_price: Decimal::ZERO,
            shipping_address: stored.shipping_address,
            payment_method: stored.payment_method,
            coupon: stored.coupon,
            loading: false,
            error: stored.error,
        };
        // Re-add through the reducer so duplicate or over-stock lines in a
        // hand-edited file collapse the same way live adds do.
        for item in stored.items {
            state.add_item(item);
        }
        state
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            total_price: Decimal::ZERO,
            shipping_address: None,
            payment_method: PaymentMethod::default(),
            coupon: None,
            loading: false,
            error: None,
        }
    }
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Line items
    // =========================================================================

    /// Add a line, merging with an existing line for the same product.
    ///
    /// A merged line takes the incoming snapshot (price, name, image and
    /// stock ceiling) and `min(existing + incoming, incoming.count_in_stock)`
    /// units, so a smaller fresh ceiling lowers an already valid quantity.
    /// A fresh ceiling of zero removes the line.
    pub fn add_item(&mut self, item: CartItem) -> MutationOutcome {
        let outcome = match self.items.iter().position(|line| line.product == item.product) {
            Some(index) if item.count_in_stock == 0 => {
                self.items.remove(index);
                MutationOutcome::Removed
            }
            Some(index) => {
                let existing = &mut self.items[index];
                let requested = existing.quantity.saturating_add(item.quantity);
                let granted = requested.min(item.count_in_stock);
                *existing = CartItem {
                    quantity: granted,
                    ..item
                };
                MutationOutcome::from_clamp(requested, granted)
            }
            None if item.count_in_stock == 0 => return MutationOutcome::OutOfStock,
            None if item.quantity == 0 => return MutationOutcome::Unchanged,
            None => {
                let requested = item.quantity;
                let granted = requested.min(item.count_in_stock);
                self.items.push(CartItem {
                    quantity: granted,
                    ..item
                });
                MutationOutcome::from_clamp(requested, granted)
            }
        };

        self.recompute_totals();
        outcome
    }

    /// Remove the line for `product`. Removing an absent line is a no-op.
    pub fn remove_item(&mut self, product: &ProductId) -> MutationOutcome {
        let before = self.items.len();
        self.items.retain(|line| &line.product != product);

        if self.items.len() == before {
            return MutationOutcome::ItemNotFound;
        }

        self.recompute_totals();
        MutationOutcome::Removed
    }

    /// Set the quantity of an existing line, clamped to its stock ceiling.
    ///
    /// A quantity of zero removes the line.
    pub fn update_quantity(&mut self, product: &ProductId, quantity: u32) -> MutationOutcome {
        if quantity == 0 {
            return self.remove_item(product);
        }

        let Some(line) = self.items.iter_mut().find(|line| &line.product == product) else {
            return MutationOutcome::ItemNotFound;
        };

        let granted = quantity.min(line.count_in_stock);
        line.quantity = granted;

        self.recompute_totals();
        MutationOutcome::from_clamp(quantity, granted)
    }

    /// Empty the cart.
    ///
    /// Coupon, shipping address and payment method are kept.
    pub fn clear_items(&mut self) {
        self.items.clear();
        self.recompute_totals();
    }

    /// Return to a fresh cart, dropping coupon and checkout details too.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn recompute_totals(&mut self) {
        self.total_items = self.items.iter().map(|line| u64::from(line.quantity)).sum();
        self.total_price = self
            .items
            .iter()
            .map(CartItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add);
    }

    // =========================================================================
    // Checkout details
    // =========================================================================

    pub fn set_shipping_address(&mut self, address: ShippingAddress) {
        self.shipping_address = Some(address);
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    // =========================================================================
    // Coupon
    // =========================================================================

    /// Enter `Validating`. Any applied coupon stays until the result lands.
    pub fn begin_coupon_validation(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Store the coupon accepted by the validator.
    pub fn apply_coupon_grant(&mut self, coupon: AppliedCoupon) {
        self.coupon = Some(coupon);
        self.error = None;
        self.loading = false;
    }

    /// Record a failed validation. A previously applied coupon is dropped.
    pub fn fail_coupon(&mut self, message: impl Into<String>) {
        self.coupon = None;
        self.error = Some(message.into());
        self.loading = false;
    }

    /// Leave `Validating` without recording a result, e.g. when a pending
    /// validation has been superseded by a restore.
    pub fn cancel_coupon_validation(&mut self) {
        self.loading = false;
    }

    /// Drop the applied coupon without asking the server.
    pub fn remove_coupon(&mut self) {
        self.coupon = None;
    }

    /// Current position in the coupon flow.
    #[must_use]
    pub const fn coupon_status(&self) -> CouponStatus {
        if self.loading {
            CouponStatus::Validating
        } else if self.coupon.is_some() {
            CouponStatus::Applied
        } else if self.error.is_some() {
            CouponStatus::Failed
        } else {
            CouponStatus::NoCoupon
        }
    }

    /// The `(product, price, quantity)` projection sent to the validator.
    #[must_use]
    pub fn coupon_lines(&self) -> Vec<CouponLine> {
        self.items
            .iter()
            .map(|line| CouponLine {
                product: line.product.clone(),
                price: line.price,
                quantity: line.quantity,
            })
            .collect()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// The line for `product`, if present.
    #[must_use]
    pub fn item(&self, product: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|line| &line.product == product)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of line quantities.
    #[must_use]
    pub const fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub const fn total_price(&self) -> Decimal {
        self.total_price
    }

    #[must_use]
    pub const fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    #[must_use]
    pub const fn payment_method(&self) -> &PaymentMethod {
        &self.payment_method
    }

    #[must_use]
    pub const fn coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    /// Discount of the applied coupon, zero when none is applied.
    #[must_use]
    pub fn discount(&self) -> Decimal {
        self.coupon
            .as_ref()
            .map_or(Decimal::ZERO, |coupon| coupon.discount)
    }

    /// `total_price - discount`, never below zero.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.total_price
            .saturating_sub(self.discount())
            .max(Decimal::ZERO)
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message from the last failed coupon validation.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn item(product: &str, price: i64, quantity: u32, count_in_stock: u32) -> CartItem {
        CartItem::new(
            id(product),
            format!("Product {product}"),
            Decimal::from(price),
            quantity,
            count_in_stock,
        )
    }

    fn assert_totals_consistent(cart: &CartState) {
        let items: u64 = cart.items().iter().map(|i| u64::from(i.quantity)).sum();
        let price: Decimal = cart
            .items()
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum();
        assert_eq!(cart.total_items(), items);
        assert_eq!(cart.total_price(), price);
    }

    fn save10() -> AppliedCoupon {
        AppliedCoupon {
            code: "SAVE10".to_string(),
            discount: Decimal::from(5),
        }
    }

    // =========================================================================
    // Line items
    // =========================================================================

    #[test]
    fn test_add_to_empty_cart() {
        let mut cart = CartState::new();

        let outcome = cart.add_item(item("A", 10, 2, 5));

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item(&id("A")).unwrap().quantity, 2);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_price(), Decimal::from(20));
    }

    #[test]
    fn test_add_merges_and_clamps() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 2, 5));

        let outcome = cart.add_item(item("A", 10, 4, 5));

        assert_eq!(
            outcome,
            MutationOutcome::ClampedToStock {
                requested: 6,
                granted: 5
            }
        );
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_price(), Decimal::from(50));
    }

    #[test]
    fn test_add_new_item_clamped_to_its_own_stock() {
        let mut cart = CartState::new();

        let outcome = cart.add_item(item("B", 3, 9, 4));

        assert!(outcome.is_clamped());
        assert_eq!(cart.item(&id("B")).unwrap().quantity, 4);
    }

    #[test]
    fn test_merge_uses_incoming_stock_ceiling() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 4, 10));

        let outcome = cart.add_item(item("A", 10, 1, 3));

        assert_eq!(
            outcome,
            MutationOutcome::ClampedToStock {
                requested: 5,
                granted: 3
            }
        );
        let line = cart.item(&id("A")).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.count_in_stock, 3);
    }

    #[test]
    fn test_merge_takes_incoming_price_snapshot() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 1, 10));
        cart.add_item(item("A", 12, 1, 10));

        assert_eq!(cart.item(&id("A")).unwrap().price, Decimal::from(12));
        assert_eq!(cart.total_price(), Decimal::from(24));
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cart = CartState::new();
        cart.add_item(item("C", 1, 1, 9));
        cart.add_item(item("A", 1, 1, 9));
        cart.add_item(item("B", 1, 1, 9));
        cart.add_item(item("A", 1, 1, 9));

        let order: Vec<&str> = cart.items().iter().map(|i| i.product.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_add_out_of_stock_product_is_not_added() {
        let mut cart = CartState::new();

        assert_eq!(cart.add_item(item("Z", 10, 1, 0)), MutationOutcome::OutOfStock);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_zero_quantity_is_unchanged() {
        let mut cart = CartState::new();
        assert_eq!(cart.add_item(item("A", 10, 0, 5)), MutationOutcome::Unchanged);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_merge_with_zero_stock_removes_line() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 4, 10));
        cart.add_item(item("B", 2, 1, 10));

        assert_eq!(cart.add_item(item("A", 10, 1, 0)), MutationOutcome::Removed);

        assert!(cart.item(&id("A")).is_none());
        assert_eq!(cart.total_items(), 1);
        assert_eq!(cart.total_price(), Decimal::from(2));
    }

    #[test]
    fn test_merge_zero_quantity_still_lowers_ceiling() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 4, 10));

        let outcome = cart.add_item(item("A", 10, 0, 3));

        assert_eq!(
            outcome,
            MutationOutcome::ClampedToStock {
                requested: 4,
                granted: 3
            }
        );
        let line = cart.item(&id("A")).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.count_in_stock, 3);
        assert_eq!(cart.total_price(), Decimal::from(30));
    }

    #[test]
    fn test_merge_zero_quantity_refreshes_snapshot() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 2, 10));

        assert_eq!(cart.add_item(item("A", 12, 0, 10)), MutationOutcome::Applied);

        assert_eq!(cart.item(&id("A")).unwrap().quantity, 2);
        assert_eq!(cart.total_price(), Decimal::from(24));
    }

    #[test]
    fn test_huge_prices_saturate_totals() {
        let mut cart = CartState::new();
        let line = |product: &str| CartItem::new(id(product), "Gold", Decimal::MAX, 2, 5);

        cart.add_item(line("A"));
        cart.add_item(line("B"));

        assert_eq!(cart.total_items(), 4);
        assert_eq!(cart.total_price(), Decimal::MAX);
        assert_eq!(cart.grand_total(), Decimal::MAX);
    }

    #[test]
    fn test_remove_item_is_idempotent() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 2, 5));
        cart.add_item(item("B", 4, 1, 5));

        assert_eq!(cart.remove_item(&id("A")), MutationOutcome::Removed);
        let after_once = cart.clone();
        assert_eq!(cart.remove_item(&id("A")), MutationOutcome::ItemNotFound);

        assert_eq!(cart, after_once);
        assert_eq!(cart.total_items(), 1);
        assert_eq!(cart.total_price(), Decimal::from(4));
    }

    #[test]
    fn test_update_quantity_clamps() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 2, 5));

        let outcome = cart.update_quantity(&id("A"), 100);

        assert_eq!(
            outcome,
            MutationOutcome::ClampedToStock {
                requested: 100,
                granted: 5
            }
        );
        assert_eq!(cart.item(&id("A")).unwrap().quantity, 5);
        assert_eq!(cart.total_price(), Decimal::from(50));
    }

    #[test]
    fn test_update_quantity_lowers() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 4, 5));

        assert_eq!(cart.update_quantity(&id("A"), 1), MutationOutcome::Applied);
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 4, 5));

        assert_eq!(cart.update_quantity(&id("A"), 0), MutationOutcome::Removed);
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn test_update_missing_item_is_noop() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 1, 5));
        let before = cart.clone();

        assert_eq!(
            cart.update_quantity(&id("B"), 3),
            MutationOutcome::ItemNotFound
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_stock_invariant_over_mixed_sequence() {
        let mut cart = CartState::new();
        let products = ["A", "B", "C"];

        // Deterministic pseudo-random walk over adds and updates.
        let mut seed: u32 = 7;
        for step in 0..200_u32 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let product = products[(seed % 3) as usize];
            let quantity = (seed >> 8) % 12;
            let stock = 1 + (seed >> 16) % 9;

            if step % 3 == 0 {
                cart.update_quantity(&id(product), quantity);
            } else {
                cart.add_item(item(product, i64::from(stock), quantity, stock));
            }

            for line in cart.items() {
                assert!(line.quantity >= 1);
                assert!(line.quantity <= line.count_in_stock);
            }
            assert_totals_consistent(&cart);
        }
    }

    #[test]
    fn test_clear_keeps_coupon_and_checkout_details() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 5, 5));
        cart.set_payment_method(PaymentMethod::new("Stripe"));
        cart.begin_coupon_validation();
        cart.apply_coupon_grant(save10());

        cart.clear_items();

        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
        assert_eq!(cart.coupon().unwrap().code, "SAVE10");
        assert_eq!(cart.discount(), Decimal::from(5));
        assert_eq!(cart.payment_method().as_str(), "Stripe");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 5, 5));
        cart.apply_coupon_grant(save10());
        cart.set_payment_method(PaymentMethod::new("Stripe"));

        cart.reset();

        assert_eq!(cart, CartState::new());
    }

    // =========================================================================
    // Coupon
    // =========================================================================

    #[test]
    fn test_coupon_success_flow() {
        let mut cart = CartState::new();
        assert_eq!(cart.coupon_status(), CouponStatus::NoCoupon);

        cart.begin_coupon_validation();
        assert_eq!(cart.coupon_status(), CouponStatus::Validating);
        assert!(cart.is_loading());
        assert!(cart.error().is_none());

        cart.apply_coupon_grant(save10());
        assert_eq!(cart.coupon_status(), CouponStatus::Applied);
        assert_eq!(cart.discount(), Decimal::from(5));
        assert!(!cart.is_loading());
    }

    #[test]
    fn test_failed_revalidation_wipes_applied_coupon() {
        let mut cart = CartState::new();
        cart.apply_coupon_grant(save10());

        cart.begin_coupon_validation();
        // Still applied while the second code is in flight.
        assert_eq!(cart.coupon().unwrap().code, "SAVE10");

        cart.fail_coupon("Coupon expired");

        assert_eq!(cart.coupon_status(), CouponStatus::Failed);
        assert!(cart.coupon().is_none());
        assert_eq!(cart.discount(), Decimal::ZERO);
        assert_eq!(cart.error(), Some("Coupon expired"));
    }

    #[test]
    fn test_begin_validation_clears_previous_error() {
        let mut cart = CartState::new();
        cart.fail_coupon("nope");

        cart.begin_coupon_validation();

        assert!(cart.error().is_none());
    }

    #[test]
    fn test_remove_coupon() {
        let mut cart = CartState::new();
        cart.apply_coupon_grant(save10());

        cart.remove_coupon();

        assert_eq!(cart.coupon_status(), CouponStatus::NoCoupon);
        assert_eq!(cart.discount(), Decimal::ZERO);
    }

    #[test]
    fn test_cancel_validation_keeps_applied_coupon() {
        let mut cart = CartState::new();
        cart.apply_coupon_grant(save10());
        cart.begin_coupon_validation();

        cart.cancel_coupon_validation();

        assert!(!cart.is_loading());
        assert_eq!(cart.coupon_status(), CouponStatus::Applied);
    }

    #[test]
    fn test_grand_total_never_negative() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 3, 1, 5));
        cart.apply_coupon_grant(save10());

        assert_eq!(cart.grand_total(), Decimal::ZERO);

        cart.update_quantity(&id("A"), 4);
        assert_eq!(cart.grand_total(), Decimal::from(7));
    }

    #[test]
    fn test_coupon_lines_projection() {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 2, 5).with_image("/a.png"));

        let lines = cart.coupon_lines();

        assert_eq!(
            lines,
            vec![CouponLine {
                product: id("A"),
                price: Decimal::from(10),
                quantity: 2,
            }]
        );
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn test_deserialize_recomputes_totals() {
        let json = serde_json::json!({
            "items": [
                { "product": "A", "name": "a", "price": "10", "quantity": 2, "countInStock": 5 },
                { "product": "A", "name": "a", "price": "10", "quantity": 9, "countInStock": 5 }
            ],
            "totalItems": 999,
            "totalPrice": "1",
            "paymentMethod": "Stripe",
            "coupon": { "code": "SAVE10", "discount": "5" }
        });

        let cart: CartState = serde_json::from_value(json).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_price(), Decimal::from(50));
        assert_eq!(cart.payment_method().as_str(), "Stripe");
        assert_eq!(cart.discount(), Decimal::from(5));
        assert!(!cart.is_loading());
    }

    #[test]
    fn test_serialize_skips_loading() {
        let mut cart = CartState::new();
        cart.begin_coupon_validation();

        let json = serde_json::to_value(&cart).unwrap();

        assert!(json.get("loading").is_none());
        assert_eq!(json["paymentMethod"], "PayPal");
        assert_eq!(json["totalItems"], 0);
    }
}
