//! Back-office reports built from stored orders: sales and customers.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::aggregates::{OrderHeader, OrderStatus};
use crate::domain::value_objects::Price;

pub const WINDOW_DAYS: i64 = 30;
pub const DAILY_BUCKETS: usize = 7;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub count: usize,
    pub revenue: Price,
    pub revenue_display: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SalesReport {
    pub since: DateTime<Utc>,
    pub total_revenue: Price,
    pub total_revenue_display: String,
    pub total_orders: usize,
    pub delivered_orders: usize,
    pub pending_orders: usize,
    /// Distinct customer names.
    pub unique_customers: usize,
    /// Latest days that have orders, oldest first.
    pub daily: Vec<DailySales>,
}

impl SalesReport {
    pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> { now - Duration::days(WINDOW_DAYS) }

    /// Builds the report from orders; anything created before the window is ignored.
    pub fn from_orders(orders: &[OrderHeader], now: DateTime<Utc>) -> Self {
        let since = Self::window_start(now);
        let recent: Vec<&OrderHeader> = orders.iter().filter(|o| o.created_at >= since).collect();

        let total_revenue: Price = recent.iter().map(|o| o.total_amount).sum();
        let count_status = |status: OrderStatus| recent.iter().filter(|o| o.status == status).count();
        let unique_customers = recent.iter().map(|o| o.customer_name.as_str()).collect::<HashSet<_>>().len();

        let mut by_day: BTreeMap<NaiveDate, (usize, Price)> = BTreeMap::new();
        for order in &recent {
            let entry = by_day.entry(order.created_at.date_naive()).or_insert((0, Price::ZERO));
            entry.0 += 1;
            entry.1 = entry.1 + order.total_amount;
        }
        let skip = by_day.len().saturating_sub(DAILY_BUCKETS);
        let daily = by_day
            .into_iter()
            .skip(skip)
            .map(|(date, (count, revenue))| DailySales { date, count, revenue, revenue_display: revenue.to_string() })
            .collect();

        Self {
            since,
            total_revenue,
            total_revenue_display: total_revenue.to_string(),
            total_orders: recent.len(),
            delivered_orders: count_status(OrderStatus::Delivered),
            pending_orders: count_status(OrderStatus::Pending),
            unique_customers,
            daily,
        }
    }
}

/// One customer, keyed by the name given at checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerSummary {
    pub name: String,
    /// From the customer's latest order.
    pub address: String,
    /// `-` when the latest order carried no phone.
    pub phone: String,
    pub total_orders: usize,
    pub total_spent: Price,
    pub total_spent_display: String,
    pub last_order: DateTime<Utc>,
}

impl CustomerSummary {
    pub const NO_PHONE: &'static str = "-";

    /// Groups orders by customer name, biggest spenders first.
    pub fn from_orders(orders: &[OrderHeader]) -> Vec<Self> {
        let mut newest_first: Vec<&OrderHeader> = orders.iter().collect();
        newest_first.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut customers: Vec<CustomerSummary> = Vec::new();
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for order in newest_first {
            match by_name.get(order.customer_name.as_str()) {
                Some(&i) => {
                    let customer = &mut customers[i];
                    customer.total_orders += 1;
                    customer.total_spent = customer.total_spent + order.total_amount;
                }
                None => {
                    by_name.insert(&order.customer_name, customers.len());
                    customers.push(CustomerSummary {
                        name: order.customer_name.clone(),
                        address: order.customer_address.clone(),
                        phone: order.customer_phone.clone().unwrap_or_else(|| Self::NO_PHONE.to_string()),
                        total_orders: 1,
                        total_spent: order.total_amount,
                        total_spent_display: String::new(),
                        last_order: order.created_at,
                    });
                }
            }
        }
        customers.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));
        for customer in &mut customers {
            customer.total_spent_display = customer.total_spent.to_string();
        }
        customers
    }

    /// Case-insensitive match on name or address; phone matches as typed.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.address.to_lowercase().contains(&needle)
            || self.phone.contains(query)
    }
}
