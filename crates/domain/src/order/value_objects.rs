//! Value objects for the order domain.

use chrono::NaiveDate;
use common::{MenuItemId, RestaurantId};
use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

// Saturates at the `i64` bounds. Order totals use the checked variants.
impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents = self.cents.saturating_add(rhs.cents);
    }
}

/// Human-readable, sequential order code such as `ORD001001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    /// Prefix shared by every order code.
    pub const PREFIX: &'static str = "ORD";

    /// Formats a sequence number as an order code, zero-padded to six digits.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("{}{:06}", Self::PREFIX, sequence))
    }

    /// Returns the numeric part of the code, if well formed.
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One priced choice inside an add-on group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonSelection {
    pub name: String,
    #[serde(rename = "price_cents")]
    pub price: Money,
}

/// Add-ons chosen from a named group (e.g. "Sauces").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedAddon {
    pub addon_group: String,
    #[serde(default)]
    pub selections: Vec<AddonSelection>,
}

/// A line item in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The menu item ordered.
    pub menu_item_id: MenuItemId,

    /// Quantity ordered, at least one.
    pub quantity: u32,

    /// Price per unit in cents, excluding add-ons.
    #[serde(rename = "unit_price_cents")]
    pub unit_price: Money,

    /// Add-ons, priced per unit on top of `unit_price`.
    #[serde(default)]
    pub selected_addons: Vec<SelectedAddon>,

    /// Free-text preparation instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

impl OrderItem {
    /// Creates a new line item without add-ons.
    pub fn new(menu_item_id: impl Into<MenuItemId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            quantity,
            unit_price,
            selected_addons: Vec::new(),
            special_instructions: None,
        }
    }

    /// Adds an add-on group selection.
    pub fn with_addon(mut self, addon: SelectedAddon) -> Self {
        self.selected_addons.push(addon);
        self
    }

    /// Returns the per-unit price of all selected add-ons, or `None` if it
    /// does not fit in an `i64` of cents.
    pub fn addons_price(&self) -> Option<Money> {
        self.selected_addons
            .iter()
            .flat_map(|group| group.selections.iter())
            .try_fold(Money::zero(), |acc, selection| acc.checked_add(selection.price))
    }

    /// Returns the total price for this line: quantity * (unit price + add-ons).
    ///
    /// `None` when the amount overflows.
    pub fn total_price(&self) -> Option<Money> {
        self.unit_price
            .checked_add(self.addons_price()?)?
            .checked_multiply(self.quantity)
    }
}

/// How an order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    Delivery,
    Pickup,
    DineIn,
}

impl OrderType {
    /// Returns the wire name of the order type.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Delivery => "delivery",
            OrderType::Pickup => "pickup",
            OrderType::DineIn => "dine-in",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(OrderType::Delivery),
            "pickup" => Ok(OrderType::Pickup),
            "dine-in" => Ok(OrderType::DineIn),
            other => Err(format!("unknown order type '{other}'")),
        }
    }
}

/// Postal address for delivery orders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeliveryAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, alias = "zipCode")]
    pub zip_code: String,
}

impl DeliveryAddress {
    /// Returns true if no address line is filled in.
    pub fn is_blank(&self) -> bool {
        [&self.street, &self.city, &self.state, &self.zip_code]
            .iter()
            .all(|part| part.trim().is_empty())
    }
}

/// Table booking attached to a dine-in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBooking {
    pub table_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_time: Option<String>,
}

/// Type-conditional fulfillment details.
///
/// Exactly one variant is stored per order, so an order can never carry a
/// delivery address and a table number at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "order_type", rename_all = "kebab-case")]
pub enum Fulfillment {
    Delivery { delivery_address: DeliveryAddress },
    Pickup { pickup_location: RestaurantId },
    DineIn(TableBooking),
}

impl Fulfillment {
    /// Returns the order type matching this fulfillment.
    pub fn order_type(&self) -> OrderType {
        match self {
            Fulfillment::Delivery { .. } => OrderType::Delivery,
            Fulfillment::Pickup { .. } => OrderType::Pickup,
            Fulfillment::DineIn(_) => OrderType::DineIn,
        }
    }

    /// Returns the table booking of a dine-in order.
    pub fn table_booking(&self) -> Option<&TableBooking> {
        match self {
            Fulfillment::DineIn(booking) => Some(booking),
            _ => None,
        }
    }
}
