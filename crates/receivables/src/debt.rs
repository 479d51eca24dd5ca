use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use tillpoint_core::CustomerId;
use tillpoint_customers::Customer;
use tillpoint_sales::{CashTransaction, Sale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtEntryKind {
    Sale,
    Payment,
}

impl DebtEntryKind {
    /// Same-instant ordering: sales are applied before payments.
    fn rank(self) -> u8 {
        match self {
            DebtEntryKind::Sale => 0,
            DebtEntryKind::Payment => 1,
        }
    }
}

/// One line of a customer's debt history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtEntry {
    #[serde(rename = "type")]
    pub kind: DebtEntryKind,
    pub reference_id: Uuid,
    pub date: DateTime<Utc>,
    /// Always positive; the sign is implied by `kind`.
    pub amount: i64,
    pub description: String,
    pub running_balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtSummary {
    pub customer_id: CustomerId,
    pub total_sales: i64,
    pub total_payments: i64,
    pub current_debt: i64,
    pub credit_limit: i64,
    pub available_credit: i64,
    pub over_limit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<DebtEntry>>,
}

/// Row of the store-wide debtor list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Debtor {
    pub customer_id: CustomerId,
    pub name: String,
    pub current_debt: i64,
    pub credit_limit: i64,
    pub over_limit: bool,
}

fn sale_entry(sale: &Sale) -> Option<DebtEntry> {
    let amount = sale.debt_amount();
    if amount == 0 {
        return None;
    }
    let description = match &sale.note {
        Some(note) => note.clone(),
        None => format!("Credit sale ({} items)", sale.lines.len()),
    };
    Some(DebtEntry {
        kind: DebtEntryKind::Sale,
        reference_id: *sale.id.as_uuid(),
        date: sale.created_at,
        amount,
        description,
        running_balance: 0,
    })
}

fn payment_entry(tx: &CashTransaction) -> Option<DebtEntry> {
    if !tx.is_debt_payment() {
        return None;
    }
    Some(DebtEntry {
        kind: DebtEntryKind::Payment,
        reference_id: *tx.id.as_uuid(),
        date: tx.created_at,
        amount: tx.amount,
        description: tx.description.clone().unwrap_or_else(|| "Debt payment".to_string()),
        running_balance: 0,
    })
}

fn chronological(a: &DebtEntry, b: &DebtEntry) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.kind.rank().cmp(&b.kind.rank()))
        .then_with(|| a.reference_id.cmp(&b.reference_id))
}

/// Merge the customer's sales and payments into a time-ordered history with
/// running balances.
///
/// Records belonging to other customers, fully paid sales and non debt
/// transactions are skipped.
pub fn debt_entries(
    customer_id: CustomerId,
    sales: &[Sale],
    payments: &[CashTransaction],
) -> Vec<DebtEntry> {
    let mut entries: Vec<DebtEntry> = sales
        .iter()
        .filter(|s| s.customer_id == Some(customer_id))
        .filter_map(sale_entry)
        .chain(
            payments
                .iter()
                .filter(|p| p.customer_id == Some(customer_id))
                .filter_map(payment_entry),
        )
        .collect();
    entries.sort_by(chronological);

    let mut balance = 0i64;
    for entry in &mut entries {
        balance = match entry.kind {
            DebtEntryKind::Sale => balance.saturating_add(entry.amount),
            DebtEntryKind::Payment => balance.saturating_sub(entry.amount),
        };
        entry.running_balance = balance;
    }
    entries
}

/// Compute a customer's debt position.
///
/// Deterministic: the same inputs always give the same summary.
pub fn summarize(
    customer: &Customer,
    sales: &[Sale],
    payments: &[CashTransaction],
    include_history: bool,
) -> DebtSummary {
    let entries = debt_entries(customer.id, sales, payments);

    let (total_sales, total_payments) =
        entries.iter().fold((0i64, 0i64), |(s, p), e| match e.kind {
            DebtEntryKind::Sale => (s.saturating_add(e.amount), p),
            DebtEntryKind::Payment => (s, p.saturating_add(e.amount)),
        });
    let current_debt = entries.last().map(|e| e.running_balance).unwrap_or(0);

    DebtSummary {
        customer_id: customer.id,
        total_sales,
        total_payments,
        current_debt,
        credit_limit: customer.credit_limit,
        available_credit: customer.credit_limit.saturating_sub(current_debt).max(0),
        over_limit: current_debt > customer.credit_limit,
        history: include_history.then_some(entries),
    }
}

/// Every customer who owes money, largest debt first. A customer in credit
/// (overpaid) is not a debtor.
pub fn debtors(customers: &[Customer], sales: &[Sale], payments: &[CashTransaction]) -> Vec<Debtor> {
    let mut balances: HashMap<CustomerId, i64> = HashMap::new();
    for sale in sales {
        if let Some(customer_id) = sale.customer_id {
            let debt = sale.debt_amount();
            if debt > 0 {
                let b = balances.entry(customer_id).or_insert(0);
                *b = b.saturating_add(debt);
            }
        }
    }
    for tx in payments.iter().filter(|t| t.is_debt_payment()) {
        if let Some(customer_id) = tx.customer_id {
            let b = balances.entry(customer_id).or_insert(0);
            *b = b.saturating_sub(tx.amount);
        }
    }

    let mut rows: Vec<Debtor> = customers
        .iter()
        .filter_map(|c| {
            let debt = balances.get(&c.id).copied().unwrap_or(0);
            (debt > 0).then(|| Debtor {
                customer_id: c.id,
                name: c.name.clone(),
                current_debt: debt,
                credit_limit: c.credit_limit,
                over_limit: debt > c.credit_limit,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.current_debt
            .cmp(&a.current_debt)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tillpoint_core::{ProductId, SaleId, StoreId, TransactionId, UserId};
    use tillpoint_customers::{ContactInfo, NewCustomer};
    use tillpoint_sales::{PaymentMethod, SaleLine, TransactionCategory};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn customer(limit: i64) -> Customer {
        NewCustomer {
            name: "Budi".into(),
            contact: ContactInfo::default(),
            credit_limit: limit,
        }
        .into_customer(StoreId::new(), t0())
        .unwrap()
    }

    fn credit_sale(c: &Customer, total: i64, paid: i64, at: DateTime<Utc>) -> Sale {
        Sale {
            id: SaleId::new(),
            store_id: c.store_id,
            lines: vec![SaleLine {
                product_id: ProductId::new(),
                name: "Beras".into(),
                quantity: 1,
                unit_price: total,
                line_total: total,
            }],
            total,
            payment_method: PaymentMethod::Credit,
            amount_paid: paid,
            change_given: 0,
            customer_id: Some(c.id),
            cashier_id: UserId::new(),
            shift_id: None,
            note: None,
            created_at: at,
        }
    }

    fn payment(c: &Customer, amount: i64, at: DateTime<Utc>) -> CashTransaction {
        CashTransaction {
            id: TransactionId::new(),
            store_id: c.store_id,
            amount,
            category: TransactionCategory::DebtPayment,
            description: None,
            customer_id: Some(c.id),
            user_id: UserId::new(),
            created_at: at,
        }
    }

    #[test]
    fn no_history_means_zero_debt() {
        let c = customer(100_000);
        let s = summarize(&c, &[], &[], true);
        assert_eq!(s.current_debt, 0);
        assert_eq!(s.available_credit, 100_000);
        assert!(!s.over_limit);
        assert_eq!(s.history, Some(vec![]));
    }

    #[test]
    fn running_balance_follows_date_order() {
        let c = customer(1_000_000);
        let sales = vec![
            credit_sale(&c, 200_000, 0, t0() + Duration::days(2)),
            credit_sale(&c, 100_000, 0, t0()),
        ];
        let payments = vec![payment(&c, 50_000, t0() + Duration::days(1))];

        let s = summarize(&c, &sales, &payments, true);
        let balances: Vec<i64> =
            s.history.unwrap().iter().map(|e| e.running_balance).collect();
        assert_eq!(balances, vec![100_000, 50_000, 250_000]);
        assert_eq!(s.total_sales, 300_000);
        assert_eq!(s.total_payments, 50_000);
        assert_eq!(s.current_debt, 250_000);
    }

    #[test]
    fn sale_precedes_payment_at_same_instant() {
        let c = customer(0);
        let sales = vec![credit_sale(&c, 10_000, 0, t0())];
        let payments = vec![payment(&c, 10_000, t0())];
        let history = debt_entries(c.id, &sales, &payments);
        assert_eq!(history[0].kind, DebtEntryKind::Sale);
        assert_eq!(history[0].running_balance, 10_000);
        assert_eq!(history[1].running_balance, 0);
    }

    #[test]
    fn only_unpaid_portion_counts() {
        let c = customer(0);
        let mut cash = credit_sale(&c, 40_000, 40_000, t0());
        cash.payment_method = PaymentMethod::Cash;
        let partial = credit_sale(&c, 40_000, 15_000, t0());
        let history = debt_entries(c.id, &[cash, partial], &[]);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, 25_000);
    }

    #[test]
    fn other_customers_and_categories_are_ignored() {
        let c = customer(0);
        let other = customer(0);
        let mut expense = payment(&c, 5_000, t0());
        expense.category = TransactionCategory::Deposit;
        let history = debt_entries(
            c.id,
            &[credit_sale(&other, 10_000, 0, t0())],
            &[expense, payment(&other, 1_000, t0())],
        );
        assert!(history.is_empty());
    }

    #[test]
    fn over_limit_is_strict() {
        let c = customer(100_000);
        let at_limit = summarize(&c, &[credit_sale(&c, 100_000, 0, t0())], &[], false);
        assert!(!at_limit.over_limit);
        assert_eq!(at_limit.available_credit, 0);
        assert!(at_limit.history.is_none());

        let over = summarize(&c, &[credit_sale(&c, 100_001, 0, t0())], &[], false);
        assert!(over.over_limit);
        assert_eq!(over.available_credit, 0);
    }

    #[test]
    fn debtors_are_sorted_by_debt_descending() {
        let a = customer(0);
        let mut b = customer(1_000_000);
        b.name = "Ani".into();
        let settled = customer(0);
        let sales = vec![
            credit_sale(&a, 10_000, 0, t0()),
            credit_sale(&b, 90_000, 0, t0()),
            credit_sale(&settled, 5_000, 0, t0()),
        ];
        let payments = vec![payment(&settled, 5_000, t0() + Duration::hours(1))];
        let rows = debtors(&[a.clone(), b.clone(), settled], &sales, &payments);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].customer_id, b.id);
        assert!(!rows[0].over_limit);
        assert_eq!(rows[1].customer_id, a.id);
        assert!(rows[1].over_limit);
    }

    #[test]
    fn overpaid_customers_are_not_debtors() {
        let owing = customer(0);
        let in_credit = customer(0);
        let sales = vec![
            credit_sale(&owing, 8_000, 0, t0()),
            credit_sale(&in_credit, 5_000, 0, t0()),
        ];
        let payments = vec![payment(&in_credit, 7_000, t0() + Duration::hours(1))];

        let rows = debtors(&[owing.clone(), in_credit.clone()], &sales, &payments);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].customer_id, owing.id);
        assert_eq!(summarize(&in_credit, &sales, &payments, false).current_debt, -2_000);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: final running balance equals Σsales − Σpayments and the reported debt.
            #[test]
            fn final_balance_is_sales_minus_payments(
                sales in prop::collection::vec((1i64..1_000_000, 0i64..10_000), 0..40),
                payments in prop::collection::vec((1i64..1_000_000, 0i64..10_000), 0..40),
            ) {
                let c = customer(500_000);
                let sales: Vec<Sale> = sales
                    .iter()
                    .map(|(amt, min)| credit_sale(&c, *amt, 0, t0() + Duration::minutes(*min)))
                    .collect();
                let payments: Vec<CashTransaction> = payments
                    .iter()
                    .map(|(amt, min)| payment(&c, *amt, t0() + Duration::minutes(*min)))
                    .collect();

                let expected: i64 = sales.iter().map(|s| s.total).sum::<i64>()
                    - payments.iter().map(|p| p.amount).sum::<i64>();
                let summary = summarize(&c, &sales, &payments, true);
                let history = summary.history.clone().unwrap_or_default();

                prop_assert_eq!(summary.current_debt, expected);
                prop_assert_eq!(history.last().map(|e| e.running_balance).unwrap_or(0), expected);
                prop_assert_eq!(summary.over_limit, expected > 500_000);
                prop_assert!(history.windows(2).all(|w| w[0].date <= w[1].date));
            }

            /// Property: computing twice without writes yields identical results.
            #[test]
            fn summary_is_idempotent(amounts in prop::collection::vec(1i64..100_000, 0..20)) {
                let c = customer(0);
                let sales: Vec<Sale> = amounts
                    .iter()
                    .enumerate()
                    .map(|(i, a)| credit_sale(&c, *a, 0, t0() + Duration::seconds(i as i64)))
                    .collect();
                let payments = vec![payment(&c, 1, t0())];
                prop_assert_eq!(
                    summarize(&c, &sales, &payments, true),
                    summarize(&c, &sales, &payments, true)
                );
            }
        }
    }
}
