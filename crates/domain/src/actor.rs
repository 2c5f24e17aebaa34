//! Actors and the capability check guarding order operations.

use common::{RestaurantId, UserId};
use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderError};

/// Platform role of the requesting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Customer,
    RestaurantOwner,
    DeliveryPerson,
    Admin,
}

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::RestaurantOwner => "restaurantOwner",
            Role::DeliveryPerson => "deliveryPerson",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "restaurantOwner" => Ok(Role::RestaurantOwner),
            "deliveryPerson" => Ok(Role::DeliveryPerson),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Something an actor may do with an existing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    View,
    Transition,
    Cancel,
    UpdatePayment,
    AssignDelivery,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::View => "view",
            Capability::Transition => "update the status of",
            Capability::Cancel => "cancel",
            Capability::UpdatePayment => "update the payment of",
            Capability::AssignDelivery => "assign a delivery person to",
        };
        f.write_str(name)
    }
}

/// The authenticated user making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,

    /// Restaurant managed by a restaurant owner.
    pub assigned_restaurant: Option<RestaurantId>,
}

impl Actor {
    pub fn new(user_id: impl Into<UserId>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            assigned_restaurant: None,
        }
    }

    pub fn customer(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn admin(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn owner_of(user_id: impl Into<UserId>, restaurant_id: impl Into<RestaurantId>) -> Self {
        Self {
            assigned_restaurant: Some(restaurant_id.into()),
            ..Self::new(user_id, Role::RestaurantOwner)
        }
    }

    pub fn delivery_person(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id, Role::DeliveryPerson)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns true if the actor owns the restaurant the order was placed at.
    pub fn owns_restaurant_of(&self, order: &Order) -> bool {
        self.role == Role::RestaurantOwner
            && self.assigned_restaurant.as_ref() == Some(order.restaurant_id())
    }

    /// Returns true if the actor may exercise `capability` on `order`.
    ///
    /// | capability      | admin | restaurant owner | customer (own order) | delivery person (assigned) |
    /// |-----------------|-------|------------------|----------------------|----------------------------|
    /// | view            | yes   | yes              | yes                  | yes                        |
    /// | transition      | yes   | yes              | no                   | no                         |
    /// | cancel          | yes   | yes              | yes                  | no                         |
    /// | update payment  | yes   | yes              | no                   | no                         |
    /// | assign delivery | yes   | no               | no                   | no                         |
    pub fn can(&self, capability: Capability, order: &Order) -> bool {
        if self.is_admin() {
            return true;
        }

        let owner = self.owns_restaurant_of(order);
        let customer = self.role == Role::Customer && &self.user_id == order.user_id();
        let courier =
            self.role == Role::DeliveryPerson && Some(&self.user_id) == order.delivery_person_id();

        match capability {
            Capability::View => owner || customer || courier,
            Capability::Transition | Capability::UpdatePayment => owner,
            Capability::Cancel => owner || customer,
            Capability::AssignDelivery => false,
        }
    }

    /// Like [`Actor::can`], but returns an error naming the denied capability.
    pub fn authorize(&self, capability: Capability, order: &Order) -> Result<(), OrderError> {
        if self.can(capability, order) {
            Ok(())
        } else {
            Err(OrderError::Unauthorized {
                capability,
                user_id: self.user_id.to_string(),
            })
        }
    }

    /// Restricts order listings to what the actor may see.
    pub fn listing_scope(&self) -> Scope {
        match self.role {
            Role::Admin => Scope::All,
            Role::RestaurantOwner => match &self.assigned_restaurant {
                Some(restaurant_id) => Scope::Restaurant(restaurant_id.clone()),
                None => Scope::Nothing,
            },
            Role::Customer => Scope::Customer(self.user_id.clone()),
            Role::DeliveryPerson => Scope::DeliveryPerson(self.user_id.clone()),
        }
    }

    /// Restricts statistics to what the actor may see.
    ///
    /// Only admins and owners with an assigned restaurant get statistics.
    pub fn stats_scope(&self) -> Scope {
        match self.role {
            Role::Admin | Role::RestaurantOwner => self.listing_scope(),
            Role::Customer | Role::DeliveryPerson => Scope::Nothing,
        }
    }
}

/// Subset of orders visible to an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Restaurant(RestaurantId),
    Customer(UserId),
    DeliveryPerson(UserId),
    Nothing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{
        ChangeStatus, CreateOrder, DeliveryAddress, Fulfillment, Money, OrderCode, OrderItem,
        OrderStatus, OrderType,
    };
    use chrono::Utc;
    use common::OrderId;

    fn order() -> Order {
        let address = DeliveryAddress {
            street: "1 Main St".to_string(),
            ..Default::default()
        };
        let cmd = CreateOrder::new(
            OrderType::Delivery,
            vec![OrderItem::new("m-1", 1, Money::from_cents(900))],
        )
        .deliver_to(address.clone());
        Order::place(
            OrderId::new(),
            OrderCode::from_sequence(1001),
            UserId::new("alice"),
            RestaurantId::new("r-1"),
            &cmd,
            Fulfillment::Delivery {
                delivery_address: address,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_admin_can_do_everything() {
        let order = order();
        let admin = Actor::admin("root");
        for capability in [
            Capability::View,
            Capability::Transition,
            Capability::Cancel,
            Capability::UpdatePayment,
            Capability::AssignDelivery,
        ] {
            assert!(admin.can(capability, &order));
        }
    }

    #[test]
    fn test_owner_limited_to_own_restaurant() {
        let order = order();
        let owner = Actor::owner_of("bob", "r-1");
        assert!(owner.can(Capability::Transition, &order));
        assert!(owner.can(Capability::UpdatePayment, &order));
        assert!(!owner.can(Capability::AssignDelivery, &order));

        let other = Actor::owner_of("carol", "r-2");
        assert!(!other.can(Capability::View, &order));
        assert!(matches!(
            other.authorize(Capability::Transition, &order),
            Err(OrderError::Unauthorized {
                capability: Capability::Transition,
                ..
            })
        ));

        let unassigned = Actor::new("dave", Role::RestaurantOwner);
        assert!(!unassigned.can(Capability::Transition, &order));
    }

    #[test]
    fn test_customer_can_view_and_cancel_own_order_only() {
        let order = order();
        let alice = Actor::customer("alice");
        assert!(alice.can(Capability::View, &order));
        assert!(alice.can(Capability::Cancel, &order));
        assert!(!alice.can(Capability::Transition, &order));

        let mallory = Actor::customer("mallory");
        assert!(!mallory.can(Capability::View, &order));
        assert!(!mallory.can(Capability::Cancel, &order));
    }

    #[test]
    fn test_courier_sees_only_assigned_orders() {
        let mut order = order();
        let courier = Actor::delivery_person("dan");
        assert!(!courier.can(Capability::View, &order));

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ] {
            order
                .change_status(&ChangeStatus::to(status), Utc::now())
                .unwrap();
        }
        order
            .change_status(&ChangeStatus::dispatch(UserId::new("dan")), Utc::now())
            .unwrap();

        assert!(courier.can(Capability::View, &order));
        assert!(!courier.can(Capability::Transition, &order));
    }

    #[test]
    fn test_scopes() {
        assert_eq!(Actor::admin("a").stats_scope(), Scope::All);
        assert_eq!(
            Actor::owner_of("o", "r-1").stats_scope(),
            Scope::Restaurant(RestaurantId::new("r-1"))
        );
        assert_eq!(Actor::customer("c").stats_scope(), Scope::Nothing);
        assert_eq!(
            Actor::customer("c").listing_scope(),
            Scope::Customer(UserId::new("c"))
        );
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(
            serde_json::to_string(&Role::RestaurantOwner).unwrap(),
            "\"restaurantOwner\""
        );
        assert_eq!("deliveryPerson".parse::<Role>().unwrap(), Role::DeliveryPerson);
        assert!("chef".parse::<Role>().is_err());
    }
}
