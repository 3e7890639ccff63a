//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar cart add WIDGET-1 -n "Widget" -p 19.99 -q 2 -s 5
//! bazaar cart update WIDGET-1 4
//! bazaar cart address "1 Main St" Springfield 12345 US
//! bazaar cart clear --all
//! ```

use std::io::Write;
use std::path::Path;

use bazaar_core::{
    CartItem, CartState, CouponStatus, CurrencyCode, PaymentMethod, Price, ProductId,
    ShippingAddress,
};
use rust_decimal::Decimal;

use super::{CommandError, describe, edit};
use bazaar_storefront::Snapshot;

fn money(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::default()).display()
}

/// Write a human-readable summary of `cart` to `out`.
pub fn render(cart: &CartState, out: &mut impl Write) -> std::io::Result<()> {
    if cart.is_empty() {
        writeln!(out, "Cart is empty")?;
    }
    for line in cart.items() {
        writeln!(
            out,
            "{:<16} {:<24} {:>3} x {:>9} = {:>10}",
            line.product.as_str(),
            line.name,
            line.quantity,
            money(line.price),
            money(line.line_total()),
        )?;
    }

    writeln!(out, "Items:       {}", cart.total_items())?;
    writeln!(out, "Subtotal:    {}", money(cart.total_price()))?;
    match cart.coupon_status() {
        CouponStatus::Applied => {
            if let Some(coupon) = cart.coupon() {
                writeln!(out, "Coupon:      {} (-{})", coupon.code, money(coupon.discount))?;
            }
        }
        CouponStatus::Failed => {
            writeln!(out, "Coupon:      none ({})", cart.error().unwrap_or_default())?;
        }
        CouponStatus::NoCoupon | CouponStatus::Validating => {}
    }
    writeln!(out, "Total:       {}", money(cart.grand_total()))?;

    if let Some(address) = cart.shipping_address() {
        writeln!(out, "Ship to:     {address}")?;
    }
    writeln!(out, "Payment:     {}", cart.payment_method())?;
    Ok(())
}

pub async fn show(file: &Path) -> Result<(), CommandError> {
    let snapshot = Snapshot::load(file).await?;
    render(&snapshot.cart, &mut std::io::stdout().lock())?;
    Ok(())
}

pub async fn add(file: &Path, item: CartItem) -> Result<(), CommandError> {
    let product = item.product.clone();
    let outcome = edit(file, |s| Ok(s.cart.add_item(item))).await?;
    tracing::info!(product = %product, ?outcome, "Added to cart");
    writeln!(std::io::stdout().lock(), "{}", describe(&product, outcome))?;
    Ok(())
}

pub async fn remove(file: &Path, product: &ProductId) -> Result<(), CommandError> {
    let outcome = edit(file, |s| Ok(s.cart.remove_item(product))).await?;
    writeln!(std::io::stdout().lock(), "{}", describe(product, outcome))?;
    Ok(())
}

pub async fn update(file: &Path, product: &ProductId, quantity: u32) -> Result<(), CommandError> {
    let outcome = edit(file, |s| Ok(s.cart.update_quantity(product, quantity))).await?;
    writeln!(std::io::stdout().lock(), "{}", describe(product, outcome))?;
    Ok(())
}

/// Empty the cart. With `all`, coupon and checkout details go too.
pub async fn clear(file: &Path, all: bool) -> Result<(), CommandError> {
    edit(file, |s| {
        if all {
            s.cart.reset();
        } else {
            s.cart.clear_items();
        }
        Ok(())
    })
    .await?;
    tracing::info!(all, "Cart cleared");
    Ok(())
}

pub async fn set_address(file: &Path, address: ShippingAddress) -> Result<(), CommandError> {
    edit(file, |s| {
        s.cart.set_shipping_address(address);
        Ok(())
    })
    .await
}

pub async fn set_payment(file: &Path, method: PaymentMethod) -> Result<(), CommandError> {
    edit(file, |s| {
        s.cart.set_payment_method(method);
        Ok(())
    })
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::AppliedCoupon;
    use tempfile::tempdir;

    use super::*;

    fn widget(quantity: u32) -> CartItem {
        CartItem::new(
            ProductId::parse("WIDGET-1").unwrap(),
            "Widget",
            Decimal::new(1999, 2),
            quantity,
            5,
        )
    }

    #[test]
    fn test_render_totals_and_coupon() {
        let mut cart = CartState::new();
        cart.add_item(widget(2));
        cart.apply_coupon_grant(AppliedCoupon {
            code: "SAVE10".to_string(),
            discount: Decimal::from(5),
        });

        let mut out = Vec::new();
        render(&cart, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("WIDGET-1"));
        assert!(text.contains("Subtotal:    $39.98"));
        assert!(text.contains("Coupon:      SAVE10 (-$5.00)"));
        assert!(text.contains("Total:       $34.98"));
        assert!(text.contains("Payment:     PayPal"));
    }

    #[test]
    fn test_render_failed_coupon() {
        let mut cart = CartState::new();
        cart.fail_coupon("Coupon expired");

        let mut out = Vec::new();
        render(&cart, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Cart is empty"));
        assert!(text.contains("Coupon:      none (Coupon expired)"));
    }

    #[tokio::test]
    async fn test_commands_persist_between_runs() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("cart.json");
        let product = ProductId::parse("WIDGET-1").unwrap();

        add(&file, widget(2)).await.unwrap();
        add(&file, widget(4)).await.unwrap();
        update(&file, &product, 3).await.unwrap();

        let cart = Snapshot::load(&file).await.unwrap().cart;
        assert_eq!(cart.total_items(), 3);

        clear(&file, false).await.unwrap();
        let cart = Snapshot::load(&file).await.unwrap().cart;
        assert!(cart.is_empty());
    }
}
