//! Totals computed from a user's transactions for the dashboard summary.

use std::collections::HashMap;

use crate::transaction::{Transaction, TransactionType};

/// Money earned and spent over a set of transactions.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(super) struct Totals {
    pub income: f64,
    pub expenses: f64,
}

impl Totals {
    /// Income minus expenses.
    pub fn balance(&self) -> f64 {
        self.income - self.expenses
    }
}

/// The total of one category.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryTotal {
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: f64,
    pub count: usize,
}

pub(super) fn calculate_totals(transactions: &[Transaction]) -> Totals {
    transactions
        .iter()
        .fold(Totals::default(), |mut totals, transaction| {
            match transaction.transaction_type {
                TransactionType::Income => totals.income += transaction.amount,
                TransactionType::Expense => totals.expenses += transaction.amount,
            }

            totals
        })
}

/// Sum the transactions of each type and category.
///
/// Income categories come first, then expenses. Within a type the largest
/// total comes first, ties are broken by category name.
pub(super) fn summarize_by_category(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<(TransactionType, &str), (f64, usize)> = HashMap::new();

    for transaction in transactions {
        let entry = totals
            .entry((transaction.transaction_type, transaction.category.as_str()))
            .or_default();
        entry.0 += transaction.amount;
        entry.1 += 1;
    }

    let mut summary: Vec<CategoryTotal> = totals
        .into_iter()
        .map(
            |((transaction_type, category), (amount, count))| CategoryTotal {
                transaction_type,
                category: category.to_owned(),
                amount,
                count,
            },
        )
        .collect();

    summary.sort_by(|a, b| {
        type_order(a.transaction_type)
            .cmp(&type_order(b.transaction_type))
            .then_with(|| b.amount.total_cmp(&a.amount))
            .then_with(|| a.category.cmp(&b.category))
    });

    summary
}

fn type_order(transaction_type: TransactionType) -> u8 {
    match transaction_type {
        TransactionType::Income => 0,
        TransactionType::Expense => 1,
    }
}
