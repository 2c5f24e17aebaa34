//! Order fulfillment saga constants.

/// The saga type identifier for order fulfillment.
pub const SAGA_TYPE: &str = "OrderFulfillment";

/// Step name: reserve the table of a dine-in order.
pub const STEP_RESERVE_TABLE: &str = "reserve_table";

/// Step name: release the table of a cancelled dine-in order.
pub const STEP_RELEASE_TABLE: &str = "release_table";

/// Step name: empty the customer's cart after placement.
pub const STEP_CLEAR_CART: &str = "clear_cart";

/// Step name: notify the customer.
pub const STEP_NOTIFY_CUSTOMER: &str = "notify_customer";

/// Step name: notify the owners of the restaurant.
pub const STEP_NOTIFY_OWNERS: &str = "notify_owners";

/// Step name: notify the assigned delivery person.
pub const STEP_NOTIFY_DELIVERY_PERSON: &str = "notify_delivery_person";

/// Step name: text the customer about a status change.
pub const STEP_SEND_SMS: &str = "send_sms";
