//! Order statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::order::{Money, Order, OrderStatus, OrderType};

/// Count and revenue for one order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TypeStats {
    pub count: u64,
    #[serde(rename = "revenue_cents")]
    pub revenue: Money,
}

/// Aggregated figures over a set of orders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OrderStats {
    pub total_orders: u64,
    #[serde(rename = "total_revenue_cents")]
    pub total_revenue: Money,
    #[serde(rename = "average_order_value_cents")]
    pub average_order_value: Money,
    pub status_counts: BTreeMap<OrderStatus, u64>,
    pub order_type_stats: BTreeMap<OrderType, TypeStats>,
}

/// Orders sharing one status and order type, as produced by a grouped query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsGroup {
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub count: u64,
    pub revenue: Money,
}

impl OrderStats {
    /// Computes statistics over `orders`.
    ///
    /// Revenue includes every order regardless of status. The average is
    /// rounded down to the cent.
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        Self::from_groups(orders.into_iter().map(|order| StatsGroup {
            status: order.status(),
            order_type: order.order_type(),
            count: 1,
            revenue: order.total_amount(),
        }))
    }

    /// Combines pre-aggregated groups into statistics.
    pub fn from_groups(groups: impl IntoIterator<Item = StatsGroup>) -> Self {
        let mut stats = OrderStats::default();

        for group in groups {
            stats.total_orders += group.count;
            stats.total_revenue += group.revenue;
            *stats.status_counts.entry(group.status).or_default() += group.count;

            let by_type = stats.order_type_stats.entry(group.order_type).or_default();
            by_type.count += group.count;
            by_type.revenue += group.revenue;
        }

        if stats.total_orders > 0 {
            let orders = i64::try_from(stats.total_orders).unwrap_or(i64::MAX);
            stats.average_order_value = Money::from_cents(stats.total_revenue.cents() / orders);
        }

        stats
    }
}
