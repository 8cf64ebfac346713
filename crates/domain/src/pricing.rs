//! Deterministic distribution of an order-level discount across line items.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while pricing an order. All are validation failures; the
/// allocator has no transient failure mode.
#[derive(Debug, Error)]
pub enum PricingError {
    /// There is nothing to price.
    #[error("cannot price an order with no lines")]
    NoLines,

    /// Line quantities must be strictly positive.
    #[error("line for product {product_id} has zero quantity")]
    ZeroQuantity { product_id: ProductId },

    /// Discount inputs must be non-negative.
    #[error("line for product {product_id} has a negative discount")]
    NegativeDiscount { product_id: ProductId },

    /// A line's own discounts exceed its base amount.
    #[error(
        "discounts for product {product_id} ({discounts}) exceed its base amount ({base_amount})"
    )]
    LineDiscountExceedsBase {
        product_id: ProductId,
        discounts: Money,
        base_amount: Money,
    },

    /// The order-level coupon is larger than what remains after per-line
    /// discounts; it cannot be distributed.
    #[error(
        "order coupon discount {order_discount} exceeds the distributable remainder {distributable}"
    )]
    OrderDiscountExceedsDistributable {
        order_discount: Money,
        distributable: Money,
    },
}

/// One line of pricing input, in order-entry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingLine {
    /// The product being priced.
    pub product_id: ProductId,
    /// Ordered quantity.
    pub quantity: u32,
    /// Unit price.
    pub unit_price: Money,
    /// Promotion discount already applied to this line.
    pub promotion_discount: Money,
    /// Item-level coupon discount already applied to this line.
    pub item_coupon_discount: Money,
}

/// A fully priced line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    /// The priced product.
    pub product_id: ProductId,
    /// Ordered quantity.
    pub quantity: u32,
    /// Unit price.
    pub unit_price: Money,
    /// `unit_price × quantity`.
    pub base_amount: Money,
    /// Promotion discount on this line.
    pub promotion_discount: Money,
    /// Item-level coupon discount on this line.
    pub item_coupon_discount: Money,
    /// This line's share of the order-level coupon.
    pub order_coupon_share: Money,
    /// Sum of all three discounts.
    pub discount_amount: Money,
    /// `base_amount − discount_amount`.
    pub payment_amount: Money,
}

/// Totals plus per-line breakdown for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPricing {
    /// Sum of line base amounts.
    pub base_price: Money,
    /// Sum of line discount amounts.
    pub discount_amount: Money,
    /// Sum of line payment amounts; always `base_price − discount_amount`.
    pub payment_amount: Money,
    /// The priced lines, in input order.
    pub lines: Vec<PricedLine>,
}

/// Distributes `order_coupon_discount` across `lines` proportionally to what
/// remains of each line after its own discounts.
///
/// Shares are floored; the remainder lost to flooring is added to the last
/// line in input order, so the shares always sum exactly to the coupon
/// amount. The computation is pure and reproducible: identical inputs yield
/// identical output, which is what makes the per-line split auditable
/// against the order totals.
pub fn allocate(
    lines: &[PricingLine],
    order_coupon_discount: Money,
) -> Result<OrderPricing, PricingError> {
    if lines.is_empty() {
        return Err(PricingError::NoLines);
    }
    if order_coupon_discount.is_negative() {
        return Err(PricingError::NegativeDiscount {
            product_id: lines[0].product_id.clone(),
        });
    }

    // Validate each line and compute its distribution base: what is left of
    // the line after promotion and item-coupon discounts.
    let mut bases = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(PricingError::ZeroQuantity {
                product_id: line.product_id.clone(),
            });
        }
        if line.promotion_discount.is_negative() || line.item_coupon_discount.is_negative() {
            return Err(PricingError::NegativeDiscount {
                product_id: line.product_id.clone(),
            });
        }

        let base_amount = line.unit_price.multiply(line.quantity);
        let discounts = line.promotion_discount.add(line.item_coupon_discount);
        if discounts > base_amount {
            return Err(PricingError::LineDiscountExceedsBase {
                product_id: line.product_id.clone(),
                discounts,
                base_amount,
            });
        }

        bases.push(base_amount.subtract(discounts));
    }

    let distributable = Money::sum(bases.iter().copied());
    if order_coupon_discount > distributable {
        return Err(PricingError::OrderDiscountExceedsDistributable {
            order_discount: order_coupon_discount,
            distributable,
        });
    }

    let shares = distribute(&bases, distributable, order_coupon_discount);

    let priced: Vec<PricedLine> = lines
        .iter()
        .zip(bases.iter().zip(shares))
        .map(|(line, (dist_base, share))| {
            let base_amount = line.unit_price.multiply(line.quantity);
            let discount_amount = line
                .promotion_discount
                .add(line.item_coupon_discount)
                .add(share);
            PricedLine {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                base_amount,
                promotion_discount: line.promotion_discount,
                item_coupon_discount: line.item_coupon_discount,
                order_coupon_share: share,
                discount_amount,
                payment_amount: dist_base.subtract(share),
            }
        })
        .collect();

    Ok(OrderPricing {
        base_price: Money::sum(priced.iter().map(|l| l.base_amount)),
        discount_amount: Money::sum(priced.iter().map(|l| l.discount_amount)),
        payment_amount: Money::sum(priced.iter().map(|l| l.payment_amount)),
        lines: priced,
    })
}

/// Floored proportional shares; the flooring remainder goes to the last
/// line, so the shares sum exactly to `total`.
fn distribute(bases: &[Money], distributable: Money, total: Money) -> Vec<Money> {
    if total.is_zero() {
        return vec![Money::zero(); bases.len()];
    }

    let mut shares: Vec<Money> = bases
        .iter()
        .map(|base| {
            // i128 keeps the proportional multiply exact for any realistic
            // amount.
            let share = (base.cents() as i128 * total.cents() as i128)
                / distributable.cents() as i128;
            Money::from_cents(share as i64)
        })
        .collect();

    let allocated = Money::sum(shares.iter().copied());
    let remainder = total.subtract(allocated);
    if let Some(last) = shares.last_mut() {
        *last = last.add(remainder);
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(sku: &str, quantity: u32, unit_cents: i64) -> PricingLine {
        PricingLine {
            product_id: ProductId::new(sku),
            quantity,
            unit_price: Money::from_cents(unit_cents),
            promotion_discount: Money::zero(),
            item_coupon_discount: Money::zero(),
        }
    }

    #[test]
    fn test_two_line_coupon_split() {
        // Bases 10,000 and 5,000; coupon 100 → floored shares 66 and 33,
        // remainder 1 goes to the last line.
        let lines = vec![line("A", 1, 10_000), line("B", 1, 5_000)];
        let pricing = allocate(&lines, Money::from_cents(100)).unwrap();

        assert_eq!(pricing.lines[0].order_coupon_share, Money::from_cents(66));
        assert_eq!(pricing.lines[1].order_coupon_share, Money::from_cents(34));
        assert_eq!(pricing.discount_amount, Money::from_cents(100));
        assert_eq!(pricing.payment_amount, Money::from_cents(14_900));
    }

    #[test]
    fn test_zero_coupon_yields_zero_shares() {
        let lines = vec![line("A", 2, 1_000), line("B", 1, 2_500)];
        let pricing = allocate(&lines, Money::zero()).unwrap();

        assert!(pricing.lines.iter().all(|l| l.order_coupon_share.is_zero()));
        assert_eq!(pricing.base_price, Money::from_cents(4_500));
        assert_eq!(pricing.payment_amount, Money::from_cents(4_500));
    }

    #[test]
    fn test_remainder_goes_to_last_line() {
        // Three equal bases, coupon 100 → 33 + 33 + 34.
        let lines = vec![line("A", 1, 1_000), line("B", 1, 1_000), line("C", 1, 1_000)];
        let pricing = allocate(&lines, Money::from_cents(100)).unwrap();

        let shares: Vec<i64> = pricing
            .lines
            .iter()
            .map(|l| l.order_coupon_share.cents())
            .collect();
        assert_eq!(shares, vec![33, 33, 34]);
    }

    #[test]
    fn test_item_payments_reconcile_with_totals() {
        let mut lines = vec![line("A", 3, 1_234), line("B", 2, 567), line("C", 1, 8_901)];
        lines[0].promotion_discount = Money::from_cents(500);
        lines[1].item_coupon_discount = Money::from_cents(134);

        let pricing = allocate(&lines, Money::from_cents(777)).unwrap();

        let payment_sum = Money::sum(pricing.lines.iter().map(|l| l.payment_amount));
        let discount_sum = Money::sum(pricing.lines.iter().map(|l| l.discount_amount));
        assert_eq!(payment_sum, pricing.payment_amount);
        assert_eq!(discount_sum, pricing.discount_amount);
        assert_eq!(
            pricing.base_price.subtract(pricing.discount_amount),
            pricing.payment_amount
        );
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let lines = vec![line("A", 7, 3_331), line("B", 3, 997), line("C", 11, 41)];
        let first = allocate(&lines, Money::from_cents(1_000)).unwrap();
        let second = allocate(&lines, Money::from_cents(1_000)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_prior_discounts_shrink_distribution_base() {
        // Line A is fully discounted away; the whole coupon lands on B.
        let mut lines = vec![line("A", 1, 1_000), line("B", 1, 2_000)];
        lines[0].promotion_discount = Money::from_cents(1_000);

        let pricing = allocate(&lines, Money::from_cents(100)).unwrap();
        assert_eq!(pricing.lines[0].order_coupon_share, Money::zero());
        assert_eq!(pricing.lines[1].order_coupon_share, Money::from_cents(100));
    }

    #[test]
    fn test_coupon_can_consume_entire_remainder() {
        let lines = vec![line("A", 1, 300), line("B", 1, 700)];
        let pricing = allocate(&lines, Money::from_cents(1_000)).unwrap();

        assert_eq!(pricing.payment_amount, Money::zero());
        assert!(pricing.lines.iter().all(|l| l.payment_amount.is_zero()));
    }

    #[test]
    fn test_rejects_empty_lines() {
        assert!(matches!(
            allocate(&[], Money::zero()),
            Err(PricingError::NoLines)
        ));
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let lines = vec![line("A", 0, 1_000)];
        assert!(matches!(
            allocate(&lines, Money::zero()),
            Err(PricingError::ZeroQuantity { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_discount() {
        let mut lines = vec![line("A", 1, 1_000)];
        lines[0].promotion_discount = Money::from_cents(-1);
        assert!(matches!(
            allocate(&lines, Money::zero()),
            Err(PricingError::NegativeDiscount { .. })
        ));
    }

    #[test]
    fn test_rejects_line_discount_beyond_base() {
        let mut lines = vec![line("A", 1, 1_000)];
        lines[0].promotion_discount = Money::from_cents(600);
        lines[0].item_coupon_discount = Money::from_cents(500);
        assert!(matches!(
            allocate(&lines, Money::zero()),
            Err(PricingError::LineDiscountExceedsBase { .. })
        ));
    }

    #[test]
    fn test_rejects_coupon_beyond_distributable() {
        let mut lines = vec![line("A", 1, 1_000)];
        lines[0].promotion_discount = Money::from_cents(800);
        // Only 200 remains, coupon of 201 cannot be distributed.
        assert!(matches!(
            allocate(&lines, Money::from_cents(201)),
            Err(PricingError::OrderDiscountExceedsDistributable { .. })
        ));
    }

    #[test]
    fn test_non_dividing_totals_still_sum_exactly() {
        let lines = vec![line("A", 1, 333), line("B", 1, 333), line("C", 1, 334)];
        for coupon in [1, 7, 99, 250, 999] {
            let pricing = allocate(&lines, Money::from_cents(coupon)).unwrap();
            let share_sum = Money::sum(pricing.lines.iter().map(|l| l.order_coupon_share));
            assert_eq!(share_sum, Money::from_cents(coupon), "coupon {coupon}");
        }
    }
}
