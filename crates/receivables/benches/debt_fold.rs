use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{Duration, TimeZone, Utc};
use tillpoint_core::{ProductId, SaleId, StoreId, TransactionId, UserId};
use tillpoint_customers::{ContactInfo, Customer, NewCustomer};
use tillpoint_receivables::{debtors, summarize};
use tillpoint_sales::{CashTransaction, PaymentMethod, Sale, SaleLine, TransactionCategory};

fn history(customer: &Customer, n: usize) -> (Vec<Sale>, Vec<CashTransaction>) {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let sales = (0..n)
        .map(|i| Sale {
            id: SaleId::new(),
            store_id: customer.store_id,
            lines: vec![SaleLine {
                product_id: ProductId::new(),
                name: "Item".to_string(),
                quantity: 1,
                unit_price: 10_000,
                line_total: 10_000,
            }],
            total: 10_000,
            payment_method: PaymentMethod::Credit,
            amount_paid: 0,
            change_given: 0,
            customer_id: Some(customer.id),
            cashier_id: UserId::new(),
            shift_id: None,
            note: None,
            created_at: start + Duration::minutes(i as i64 * 2),
        })
        .collect();
    let payments = (0..n / 2)
        .map(|i| CashTransaction {
            id: TransactionId::new(),
            store_id: customer.store_id,
            amount: 7_500,
            category: TransactionCategory::DebtPayment,
            description: None,
            customer_id: Some(customer.id),
            user_id: UserId::new(),
            created_at: start + Duration::minutes(i as i64 * 4 + 1),
        })
        .collect();
    (sales, payments)
}

fn bench_debt_summary(c: &mut Criterion) {
    let customer = NewCustomer {
        name: "Bench".to_string(),
        contact: ContactInfo::default(),
        credit_limit: 1_000_000,
    }
    .into_customer(StoreId::new(), Utc::now())
    .unwrap();

    let mut group = c.benchmark_group("debt_summary");
    for n in [100usize, 1_000, 10_000] {
        let (sales, payments) = history(&customer, n);
        group.throughput(Throughput::Elements((sales.len() + payments.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| summarize(black_box(&customer), black_box(&sales), black_box(&payments), true));
        });
    }
    group.finish();
}

fn bench_debtor_list(c: &mut Criterion) {
    let customers: Vec<Customer> = (0..200)
        .map(|i| {
            NewCustomer {
                name: format!("Customer {i}"),
                contact: ContactInfo::default(),
                credit_limit: 50_000,
            }
            .into_customer(StoreId::new(), Utc::now())
            .unwrap()
        })
        .collect();
    let mut sales = Vec::new();
    let mut payments = Vec::new();
    for customer in &customers {
        let (s, p) = history(customer, 20);
        sales.extend(s);
        payments.extend(p);
    }

    c.bench_function("debtors_200_customers", |b| {
        b.iter(|| debtors(black_box(&customers), black_box(&sales), black_box(&payments)));
    });
}

criterion_group!(benches, bench_debt_summary, bench_debtor_list);
criterion_main!(benches);
