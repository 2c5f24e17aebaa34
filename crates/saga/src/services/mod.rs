//! Collaborator service traits and in-memory implementations.

pub mod cart;
pub mod notification;
pub mod restaurant;
pub mod sms;
pub mod table;
pub mod user;

pub use cart::{CartService, InMemoryCartService};
pub use notification::{
    InMemoryNotificationService, Notification, NotificationData, NotificationService,
};
pub use restaurant::{InMemoryRestaurantService, RestaurantService, RestaurantSummary};
pub use sms::{InMemorySmsService, SmsRequest, SmsService};
pub use table::{
    InMemoryTableService, TableRelease, TableReservation, TableService, TableStatus,
};
pub use user::{InMemoryUserService, UserProfile, UserService};
