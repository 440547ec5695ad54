use std::collections::HashMap;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use splitledger_core::{ExpenseLedger, LedgerConfig, MemoryLedgerStore, NewExpense, SplitCalculator};
use splitledger_domain::{GroupId, Money, Percent, SplitPolicy, UserId};

fn build_sample_ledger(
    member_count: usize,
    expense_count: usize,
) -> (
    ExpenseLedger<MemoryLedgerStore, MemoryLedgerStore>,
    GroupId,
    Vec<UserId>,
) {
    let store = MemoryLedgerStore::new();
    let group = store.create_group().expect("create group");
    let members: Vec<UserId> = (0..member_count).map(|_| UserId::new()).collect();
    for member in &members {
        store.add_member(group, *member).expect("add member");
    }
    let ledger = ExpenseLedger::new(store.clone(), store.clone());

    let date = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");
    for idx in 0..expense_count {
        let payer = members[idx % member_count];
        ledger
            .create_expense(NewExpense::new(
                group,
                payer,
                "Benchmark expense",
                Money::from_minor(1_000 + (idx % 977) as i64),
                date,
            ))
            .expect("create expense");
    }

    (ledger, group, members)
}

fn bench_split_computation(c: &mut Criterion) {
    let participants: Vec<UserId> = (0..50).map(|_| UserId::new()).collect();
    let config = LedgerConfig::default();
    let total = Money::from_minor(123_457);

    c.bench_function("equal_split_50_members", |b| {
        b.iter(|| {
            let shares = SplitCalculator::compute(
                black_box(total),
                &participants,
                &SplitPolicy::Equal,
                &config,
            )
            .expect("equal split");
            black_box(shares);
        })
    });

    let mut percentages = HashMap::new();
    for member in &participants {
        percentages.insert(*member, Percent::from_basis_points(200));
    }
    let policy = SplitPolicy::Percentage(percentages);

    c.bench_function("percentage_split_50_members", |b| {
        b.iter(|| {
            let shares =
                SplitCalculator::compute(black_box(total), &participants, &policy, &config)
                    .expect("percentage split");
            black_box(shares);
        })
    });
}

fn bench_balance_queries(c: &mut Criterion) {
    let (ledger, group, members) = build_sample_ledger(8, 10_000);

    c.bench_function("group_balance_10k_expenses", |b| {
        b.iter(|| {
            let balance = ledger
                .group_balance(group, members[0])
                .expect("group balance");
            black_box(balance);
        })
    });

    c.bench_function("pairwise_balance_10k_expenses", |b| {
        b.iter(|| {
            let balance = ledger
                .pairwise_balance(group, members[0], members[1])
                .expect("pairwise balance");
            black_box(balance);
        })
    });
}

criterion_group!(benches, bench_split_computation, bench_balance_queries);
criterion_main!(benches);
