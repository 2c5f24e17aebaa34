//! Order fulfillment saga.
//!
//! Places orders and drives them through their lifecycle across the
//! collaborator services:
//! 1. Resolve the user and the restaurant (required)
//! 2. Persist the order
//! 3. Reserve the table, clear the cart and notify customer and owners
//!    (best effort)
//!
//! Required steps abort before anything is stored. Best-effort steps run as
//! independent tasks after persistence; their failures are logged and
//! reported in a [`SagaReport`] and never undo the order.

pub mod coordinator;
pub mod error;
pub mod fanout;
pub mod gateway;
pub mod http;
pub mod order_fulfillment;
pub mod outcome;
pub mod reservation;
pub mod services;

pub use coordinator::{PlacedOrder, SagaCoordinator, UpdatedOrder};
pub use error::{GatewayError, Result, SagaError};
pub use fanout::NotificationDispatcher;
pub use gateway::{DEFAULT_TIMEOUT, Gateway, InMemoryCollaborators};
pub use http::{
    HttpCartService, HttpNotificationService, HttpRestaurantService, HttpSmsService,
    HttpTableService, HttpUserService, SERVICE_KEY_HEADER, ServiceClient,
};
pub use outcome::{SagaReport, StepOutcome, StepStatus};
pub use reservation::TableReservationCoordinator;
pub use services::{
    CartService, InMemoryCartService, InMemoryNotificationService, InMemoryRestaurantService,
    InMemorySmsService, InMemoryTableService, InMemoryUserService, Notification,
    NotificationData, NotificationService, RestaurantService, RestaurantSummary, SmsRequest,
    SmsService, TableRelease, TableReservation, TableService, TableStatus, UserProfile,
    UserService,
};
