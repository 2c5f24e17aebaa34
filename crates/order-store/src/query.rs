use chrono::{DateTime, Utc};
use common::{RestaurantId, UserId};
use domain::{Order, OrderStatus, OrderType, Scope};

/// Builder for constructing order queries.
///
/// All filters are combined with AND. Results are ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Filter by ordering user.
    pub user_id: Option<UserId>,

    /// Filter by restaurant.
    pub restaurant_id: Option<RestaurantId>,

    /// Filter by assigned delivery person.
    pub delivery_person_id: Option<UserId>,

    /// Filter by status.
    pub status: Option<OrderStatus>,

    /// Filter by order type.
    pub order_type: Option<OrderType>,

    /// Orders created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,

    /// Orders created at or before this instant.
    pub created_to: Option<DateTime<Utc>>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,

    /// Set when the scope admits no orders at all.
    pub empty: bool,
}

impl OrderQuery {
    /// Creates a new empty query matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query restricted to what `scope` admits.
    pub fn for_scope(scope: &Scope) -> Self {
        Self::new().scope(scope)
    }

    /// Narrows the query to `scope`, on top of any filters already set.
    pub fn scope(mut self, scope: &Scope) -> Self {
        match scope {
            Scope::All => {}
            Scope::Restaurant(id) => self.restaurant_id = Some(id.clone()),
            Scope::Customer(id) => self.user_id = Some(id.clone()),
            Scope::DeliveryPerson(id) => self.delivery_person_id = Some(id.clone()),
            Scope::Nothing => self.empty = true,
        }
        self
    }

    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn restaurant(mut self, restaurant_id: RestaurantId) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self
    }

    pub fn delivery_person(mut self, delivery_person_id: UserId) -> Self {
        self.delivery_person_id = Some(delivery_person_id);
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }

    /// Filters by creation time range (inclusive on both ends).
    pub fn created_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first N results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Selects a 1-based page of `limit` orders.
    pub fn page(self, page: usize, limit: usize) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(limit);
        self.limit(limit).offset(offset)
    }

    /// Returns true if `order` passes every filter. Pagination is ignored.
    pub fn matches(&self, order: &Order) -> bool {
        if self.empty {
            return false;
        }
        if let Some(ref user_id) = self.user_id
            && order.user_id() != user_id
        {
            return false;
        }
        if let Some(ref restaurant_id) = self.restaurant_id
            && order.restaurant_id() != restaurant_id
        {
            return false;
        }
        if let Some(ref delivery_person_id) = self.delivery_person_id
            && order.delivery_person_id() != Some(delivery_person_id)
        {
            return false;
        }
        if let Some(status) = self.status
            && order.status() != status
        {
            return false;
        }
        if let Some(order_type) = self.order_type
            && order.order_type() != order_type
        {
            return false;
        }
        if let Some(from) = self.created_from
            && order.created_at() < from
        {
            return false;
        }
        if let Some(to) = self.created_to
            && order.created_at() > to
        {
            return false;
        }
        true
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Number of matching items before pagination.
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}
