//! Figures derived from the whole store for the dashboard and the export.
//!
//! Every ratio whose denominator is zero comes out as `0.0` rather than NaN or an
//! error. Callers that need to tell "no data" apart from a real zero have to check
//! the denominator themselves.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::GrowStore;
use crate::models::{ExpenseCategory, Plant};

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

pub fn total_yield(store: &GrowStore) -> f64 {
    store.plants.scan().iter().map(|p| p.trimmed_yield_g).sum()
}

pub fn total_expense(store: &GrowStore) -> f64 {
    store.expenses.scan().iter().map(|e| e.cost).sum()
}

pub fn total_income(store: &GrowStore) -> f64 {
    store.income.scan().iter().map(|i| i.total()).sum()
}

pub fn net_profit(store: &GrowStore) -> f64 {
    total_income(store) - total_expense(store)
}

pub fn cost_per_gram(store: &GrowStore) -> f64 {
    ratio(total_expense(store), total_yield(store))
}

pub fn avg_selling_price(store: &GrowStore) -> f64 {
    ratio(total_income(store), total_yield(store))
}

/// Money spent per category, biggest first. Ties keep the order the category was first seen.
pub fn expense_by_category(store: &GrowStore) -> Vec<(ExpenseCategory, f64)> {
    let mut order = Vec::new();
    let mut sums: HashMap<ExpenseCategory, f64> = HashMap::new();
    for expense in store.expenses.scan() {
        let sum = sums.entry(expense.category).or_insert_with(|| {
            order.push(expense.category);
            0.0
        });
        *sum += expense.cost;
    }
    let mut grouped: Vec<(ExpenseCategory, f64)> =
        order.into_iter().map(|c| (c, sums[&c])).collect();
    grouped.sort_by(|a, b| b.1.total_cmp(&a.1));
    grouped
}

/// Days between flip and harvest, when both are known.
pub fn flowering_days(plant: &Plant) -> Option<i64> {
    Some((plant.harvest? - plant.flip_flower?).num_days())
}

/// Days between germination and harvest, when both are known.
pub fn total_grow_days(plant: &Plant) -> Option<i64> {
    Some((plant.harvest? - plant.germination?).num_days())
}

/// How many records each collection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RecordCounts {
    pub plants: usize,
    pub strains: usize,
    pub expenses: usize,
    pub income: usize,
    pub stock: usize,
    pub feeding: usize,
}

impl RecordCounts {
    pub fn of(store: &GrowStore) -> Self {
        RecordCounts {
            plants: store.plants.len(),
            strains: store.strains.len(),
            expenses: store.expenses.len(),
            income: store.income.len(),
            stock: store.stock.len(),
            feeding: store.feeding.len(),
        }
    }
}

/// The headline numbers shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub counts: RecordCounts,
    pub total_yield: f64,
    pub total_expense: f64,
    pub total_income: f64,
    pub net_profit: f64,
    pub cost_per_gram: f64,
    pub avg_selling_price: f64,
}

impl Summary {
    pub fn of(store: &GrowStore) -> Self {
        let total_yield = total_yield(store);
        let total_expense = total_expense(store);
        let total_income = total_income(store);
        Summary {
            counts: RecordCounts::of(store),
            total_yield,
            total_expense,
            total_income,
            net_profit: total_income - total_expense,
            cost_per_gram: ratio(total_expense, total_yield),
            avg_selling_price: ratio(total_income, total_yield),
        }
    }

    /// Label/value pairs in the order they are displayed.
    pub fn metrics(&self) -> [(&'static str, f64); 6] {
        [
            ("Total Yield (g)", self.total_yield),
            ("Total Expenses", self.total_expense),
            ("Total Income", self.total_income),
            ("Net Profit", self.net_profit),
            ("Cost per Gram", self.cost_per_gram),
            ("Avg Selling Price per Gram", self.avg_selling_price),
        ]
    }
}
