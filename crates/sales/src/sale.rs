use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_catalog::Product;
use tillpoint_core::{
    CustomerId, DomainError, DomainResult, Entity, ProductId, SaleId, ShiftId, StoreId, UserId,
};

/// How a sale was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    /// Sold on account; the unpaid portion becomes customer debt.
    Credit,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
        PaymentMethod::Credit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Credit => "credit",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown payment method '{s}'")))
    }
}

/// Sale line with a name/price snapshot taken at the time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub line_total: i64,
}

impl SaleLine {
    /// Price a line from the catalog entry, optionally overriding the unit price.
    pub fn priced(product: &Product, quantity: i64, unit_price: Option<i64>) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        let unit_price = unit_price.unwrap_or(product.price);
        if unit_price < 0 {
            return Err(DomainError::validation("unit_price cannot be negative"));
        }
        let line_total = unit_price
            .checked_mul(quantity)
            .ok_or_else(|| DomainError::validation("line total overflows"))?;
        Ok(Self {
            product_id: product.id,
            name: product.name.clone(),
            quantity,
            unit_price,
            line_total,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub store_id: StoreId,
    pub lines: Vec<SaleLine>,
    pub total: i64,
    pub payment_method: PaymentMethod,
    /// Amount tendered by the customer.
    pub amount_paid: i64,
    pub change_given: i64,
    pub customer_id: Option<CustomerId>,
    pub cashier_id: UserId,
    pub shift_id: Option<ShiftId>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn store_id(&self) -> StoreId {
        self.store_id
    }
}

impl Sale {
    /// Unpaid portion carried as customer debt.
    pub fn debt_amount(&self) -> i64 {
        (self.total - self.amount_paid).max(0)
    }

    pub fn is_cash(&self) -> bool {
        self.payment_method == PaymentMethod::Cash
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSaleLine {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSale {
    pub lines: Vec<NewSaleLine>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub amount_paid: Option<i64>,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewSale {
    /// Shape checks that need no catalog lookup.
    pub fn validate(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("a sale needs at least one line"));
        }
        if self.lines.iter().any(|l| l.quantity <= 0) {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if self.lines.iter().any(|l| l.unit_price.is_some_and(|p| p < 0)) {
            return Err(DomainError::validation("unit_price cannot be negative"));
        }
        if self.amount_paid.is_some_and(|p| p < 0) {
            return Err(DomainError::validation("amount_paid cannot be negative"));
        }
        if self.payment_method == PaymentMethod::Credit && self.customer_id.is_none() {
            return Err(DomainError::validation("credit sales require a customer"));
        }
        Ok(())
    }

    /// Build the immutable sale from lines priced by the caller.
    ///
    /// Settlement rules: cash must cover the total and yields change; card and
    /// transfer settle exactly the total; credit may take a down payment up to
    /// the total.
    pub fn into_sale(
        self,
        lines: Vec<SaleLine>,
        store_id: StoreId,
        cashier_id: UserId,
        shift_id: Option<ShiftId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Sale> {
        self.validate()?;
        if lines.is_empty() {
            return Err(DomainError::validation("a sale needs at least one line"));
        }
        let total = lines.iter().try_fold(0i64, |acc, l| acc.checked_add(l.line_total)).ok_or_else(
            || DomainError::validation("sale total overflows"),
        )?;

        let (amount_paid, change_given) = match self.payment_method {
            PaymentMethod::Cash => {
                let paid = self.amount_paid.unwrap_or(total);
                if paid < total {
                    return Err(DomainError::validation(format!(
                        "cash tendered {paid} does not cover total {total}"
                    )));
                }
                (paid, paid - total)
            }
            PaymentMethod::Card | PaymentMethod::Transfer => {
                let paid = self.amount_paid.unwrap_or(total);
                if paid != total {
                    return Err(DomainError::validation(format!(
                        "{} payments must equal the total",
                        self.payment_method.as_str()
                    )));
                }
                (paid, 0)
            }
            PaymentMethod::Credit => {
                let paid = self.amount_paid.unwrap_or(0);
                if paid > total {
                    return Err(DomainError::validation("down payment exceeds the total"));
                }
                (paid, 0)
            }
        };

        Ok(Sale {
            id: SaleId::new(),
            store_id,
            lines,
            total,
            payment_method: self.payment_method,
            amount_paid,
            change_given,
            customer_id: self.customer_id,
            cashier_id,
            shift_id,
            note: self.note.filter(|n| !n.trim().is_empty()),
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tillpoint_catalog::NewProduct;

    fn product(price: i64) -> Product {
        NewProduct {
            sku: "GULA-1KG".into(),
            name: "Gula 1kg".into(),
            category_id: None,
            price,
            cost: 0,
            stock: 100,
            active: true,
        }
        .into_product(StoreId::new(), Utc::now())
        .unwrap()
    }

    fn new_sale(method: PaymentMethod, paid: Option<i64>, customer: Option<CustomerId>) -> NewSale {
        NewSale {
            lines: vec![NewSaleLine {
                product_id: ProductId::new(),
                quantity: 2,
                unit_price: None,
            }],
            payment_method: method,
            amount_paid: paid,
            customer_id: customer,
            note: None,
        }
    }

    fn build(input: NewSale) -> DomainResult<Sale> {
        let line = SaleLine::priced(&product(15_000), 2, None)?;
        input.into_sale(vec![line], StoreId::new(), UserId::new(), None, Utc::now())
    }

    #[test]
    fn cash_sale_computes_change() {
        let sale = build(new_sale(PaymentMethod::Cash, Some(50_000), None)).unwrap();
        assert_eq!(sale.total, 30_000);
        assert_eq!(sale.change_given, 20_000);
        assert_eq!(sale.debt_amount(), 0);
    }

    #[test]
    fn cash_short_of_total_is_rejected() {
        let err = build(new_sale(PaymentMethod::Cash, Some(10_000), None)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn credit_sale_requires_customer() {
        let err = build(new_sale(PaymentMethod::Credit, None, None)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn credit_sale_debt_is_unpaid_portion() {
        let sale =
            build(new_sale(PaymentMethod::Credit, Some(10_000), Some(CustomerId::new()))).unwrap();
        assert_eq!(sale.amount_paid, 10_000);
        assert_eq!(sale.debt_amount(), 20_000);
    }

    #[test]
    fn card_payment_must_match_total() {
        assert!(build(new_sale(PaymentMethod::Card, Some(29_000), None)).is_err());
        let sale = build(new_sale(PaymentMethod::Card, None, None)).unwrap();
        assert_eq!(sale.amount_paid, sale.total);
    }

    #[test]
    fn price_override_is_snapshotted() {
        let line = SaleLine::priced(&product(15_000), 3, Some(14_000)).unwrap();
        assert_eq!(line.unit_price, 14_000);
        assert_eq!(line.line_total, 42_000);
        assert_eq!(line.name, "Gula 1kg");
    }

    #[test]
    fn payment_method_round_trips_as_lowercase() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Transfer).unwrap(), "\"transfer\"");
        assert_eq!(PaymentMethod::parse("credit").unwrap(), PaymentMethod::Credit);
        assert!(PaymentMethod::parse("bitcoin").is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn cash_change_plus_total_equals_tendered(price in 1i64..100_000, qty in 1i64..20, extra in 0i64..1_000_000) {
                let line = SaleLine::priced(&product(price), qty, None).unwrap();
                let total = line.line_total;
                let sale = new_sale(PaymentMethod::Cash, Some(total + extra), None)
                    .into_sale(vec![line], StoreId::new(), UserId::new(), None, Utc::now())
                    .unwrap();
                prop_assert_eq!(sale.total, price * qty);
                prop_assert_eq!(sale.change_given + sale.total, sale.amount_paid);
                prop_assert_eq!(sale.debt_amount(), 0);
            }

            #[test]
            fn credit_debt_never_exceeds_total(price in 1i64..100_000, paid_pct in 0i64..=100) {
                let line = SaleLine::priced(&product(price), 1, None).unwrap();
                let paid = price * paid_pct / 100;
                let sale = new_sale(PaymentMethod::Credit, Some(paid), Some(CustomerId::new()))
                    .into_sale(vec![line], StoreId::new(), UserId::new(), None, Utc::now())
                    .unwrap();
                prop_assert!(sale.debt_amount() <= sale.total);
                prop_assert_eq!(sale.debt_amount(), price - paid);
            }
        }
    }
}
