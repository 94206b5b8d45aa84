//! Chart-feeding groupings.
//!
//! Each function reduces a [`CleanTable`] to the plain data behind one panel
//! of the dashboard; rendering stays with the caller. Orderings are
//! deterministic: ties are broken by key so repeated runs agree.

use chrono::Weekday;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::ingest::{dates::day_name, CleanTable};

/// Revenue and transaction count for one `YYYY-MM` bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Decimal,
    pub transactions: usize,
}

/// Per-month revenue series, ascending by month.
pub fn revenue_by_month(table: &CleanTable) -> Vec<MonthlyRevenue> {
    let mut buckets: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    for row in table.iter() {
        let entry = buckets.entry(row.year_month.as_str()).or_default();
        entry.0 += row.total_price;
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(month, (revenue, transactions))| MonthlyRevenue {
            month: month.to_string(),
            revenue,
            transactions,
        })
        .collect()
}

/// Units sold and revenue for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub description: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

/// The `n` best-selling products by unit count, descending.
pub fn top_products(table: &CleanTable, n: usize) -> Vec<ProductSales> {
    let mut by_product: HashMap<&str, (i64, Decimal)> = HashMap::new();
    for row in table.iter() {
        if row.description.is_empty() {
            continue;
        }
        let entry = by_product.entry(row.description.as_str()).or_default();
        entry.0 += row.quantity;
        entry.1 += row.total_price;
    }
    let mut products: Vec<ProductSales> = by_product
        .into_iter()
        .map(|(description, (quantity, revenue))| ProductSales {
            description: description.to_string(),
            quantity,
            revenue,
        })
        .collect();
    products.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.description.cmp(&b.description))
    });
    products.truncate(n);
    products
}

/// Revenue and line-item count for one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRevenue {
    pub customer_id: String,
    pub revenue: Decimal,
    pub purchases: usize,
}

/// The `n` highest-revenue customers, descending.
pub fn top_customers(table: &CleanTable, n: usize) -> Vec<CustomerRevenue> {
    let mut by_customer: HashMap<&str, (Decimal, usize)> = HashMap::new();
    for row in table.iter() {
        let entry = by_customer.entry(row.customer_id.as_str()).or_default();
        entry.0 += row.total_price;
        entry.1 += 1;
    }
    let mut customers: Vec<CustomerRevenue> = by_customer
        .into_iter()
        .map(|(customer_id, (revenue, purchases))| CustomerRevenue {
            customer_id: customer_id.to_string(),
            revenue,
            purchases,
        })
        .collect();
    customers.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    customers.truncate(n);
    customers
}

/// Revenue attributed to one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRevenue {
    pub country: String,
    pub revenue: Decimal,
}

/// The `n` highest-revenue countries, descending.
pub fn revenue_by_country(table: &CleanTable, n: usize) -> Vec<CountryRevenue> {
    let mut by_country: HashMap<&str, Decimal> = HashMap::new();
    for row in table.iter() {
        *by_country.entry(row.country.as_str()).or_default() += row.total_price;
    }
    let mut countries: Vec<CountryRevenue> = by_country
        .into_iter()
        .map(|(country, revenue)| CountryRevenue {
            country: country.to_string(),
            revenue,
        })
        .collect();
    countries.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.country.cmp(&b.country))
    });
    countries.truncate(n);
    countries
}

/// Revenue for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayRevenue {
    pub day: &'static str,
    pub revenue: Decimal,
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Revenue per weekday in fixed Monday..Sunday order, zero for absent days.
pub fn revenue_by_weekday(table: &CleanTable) -> Vec<WeekdayRevenue> {
    let mut by_day: HashMap<Weekday, Decimal> = HashMap::new();
    for row in table.iter() {
        *by_day.entry(row.day_of_week).or_default() += row.total_price;
    }
    WEEK.iter()
        .map(|day| WeekdayRevenue {
            day: day_name(*day),
            revenue: by_day.get(day).copied().unwrap_or(Decimal::ZERO),
        })
        .collect()
}

/// Mean units per transaction; `None` for an empty table.
pub fn mean_quantity(table: &CleanTable) -> Option<Decimal> {
    if table.is_empty() {
        return None;
    }
    let units: i64 = table.iter().map(|r| r.quantity).sum();
    Some(Decimal::from(units) / Decimal::from(table.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::clean_from_str;
    use rust_decimal_macros::dec;

    fn sample() -> CleanTable {
        clean_from_str(
            "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
536365,85123A,HOLDER,6,12/1/2010 8:26,2.00,17850,United Kingdom
536366,71053,LANTERN,6,12/6/2010 8:28,3.00,17850,United Kingdom
537000,22633,WARMER,4,1/4/2011 9:00,5.00,12583,France
537001,22633,WARMER,1,1/5/2011 9:00,5.00,12583,France
",
        )
        .unwrap()
    }

    #[test]
    fn monthly_series_is_ascending_with_counts() {
        let series = revenue_by_month(&sample());
        assert_eq!(
            series,
            vec![
                MonthlyRevenue {
                    month: "2010-12".into(),
                    revenue: dec!(30.00),
                    transactions: 2,
                },
                MonthlyRevenue {
                    month: "2011-01".into(),
                    revenue: dec!(25.00),
                    transactions: 2,
                },
            ]
        );
    }

    #[test]
    fn top_products_rank_by_units_with_name_tiebreak() {
        let top = top_products(&sample(), 2);
        assert_eq!(top.len(), 2);
        // HOLDER and LANTERN tie at 6 units; the name breaks the tie.
        assert_eq!(top[0].description, "HOLDER");
        assert_eq!(top[1].description, "LANTERN");
        assert_eq!(top[0].quantity, 6);
        assert_eq!(top[0].revenue, dec!(12.00));
    }

    #[test]
    fn top_customers_rank_by_revenue() {
        let top = top_customers(&sample(), 10);
        assert_eq!(top[0].customer_id, "17850");
        assert_eq!(top[0].revenue, dec!(30.00));
        assert_eq!(top[0].purchases, 2);
        assert_eq!(top[1].customer_id, "12583");
    }

    #[test]
    fn country_revenue_ranks_and_truncates() {
        let countries = revenue_by_country(&sample(), 1);
        assert_eq!(
            countries,
            vec![CountryRevenue {
                country: "United Kingdom".into(),
                revenue: dec!(30.00),
            }]
        );
    }

    #[test]
    fn weekday_revenue_covers_the_whole_week_in_order() {
        let week = revenue_by_weekday(&sample());
        let days: Vec<&str> = week.iter().map(|w| w.day).collect();
        assert_eq!(
            days,
            vec![
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday",
                "Sunday"
            ]
        );
        // 12/1/2010 was a Wednesday, 12/6 a Monday, 1/4/2011 a Tuesday, 1/5 a Wednesday.
        assert_eq!(week[2].revenue, dec!(17.00));
        assert_eq!(week[0].revenue, dec!(18.00));
        assert_eq!(week[5].revenue, Decimal::ZERO);
    }

    #[test]
    fn mean_quantity_is_absent_on_empty_input() {
        assert_eq!(mean_quantity(&CleanTable::default()), None);
        assert_eq!(mean_quantity(&sample()), Some(dec!(4.25)));
    }
}
