//! KPI aggregation.
//!
//! Pure, side-effect-free reductions over a [`CleanTable`]. Recompute whenever
//! the underlying filtered table changes; nothing here mutates its input.

pub mod breakdowns;

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

use crate::ingest::CleanTable;

/// The dashboard's headline KPIs, recomputed from the current filtered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_revenue: Decimal,
    pub total_orders: usize,
    pub unique_customers: usize,
    pub distinct_products: usize,
    /// Mean revenue per distinct invoice; `None` for an empty table.
    pub avg_order_revenue: Option<Decimal>,
    /// Mean revenue per distinct customer; `None` for an empty table.
    pub avg_customer_revenue: Option<Decimal>,
}

/// Reduce `table` to its KPI snapshot.
pub fn aggregate(table: &CleanTable) -> MetricsSnapshot {
    let mut total_revenue = Decimal::ZERO;
    let mut orders = HashSet::new();
    let mut customers = HashSet::new();
    let mut products = HashSet::new();

    for row in table.iter() {
        total_revenue += row.total_price;
        orders.insert(row.invoice_no.as_str());
        customers.insert(row.customer_id.as_str());
        // Blank descriptions stay out of the product count.
        if !row.description.is_empty() {
            products.insert(row.description.as_str());
        }
    }

    // The mean of per-group revenue sums collapses to total / group count.
    let mean_over = |groups: usize| {
        if groups == 0 {
            None
        } else {
            Some(total_revenue / Decimal::from(groups as u64))
        }
    };

    MetricsSnapshot {
        total_revenue,
        total_orders: orders.len(),
        unique_customers: customers.len(),
        distinct_products: products.len(),
        avg_order_revenue: mean_over(orders.len()),
        avg_customer_revenue: mean_over(customers.len()),
    }
}
