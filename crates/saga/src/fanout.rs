//! Notification fan-out.
//!
//! Turns an order event into notifications for every audience that gets
//! copy for it. Delivery is best effort: each send ends as a
//! [`StepOutcome`], never as an error.

use common::UserId;
use domain::{Audience, Message, Order, OrderEvent, derive_message};
use futures_util::future::join_all;

use crate::gateway::Gateway;
use crate::order_fulfillment::{
    STEP_NOTIFY_CUSTOMER, STEP_NOTIFY_DELIVERY_PERSON, STEP_NOTIFY_OWNERS, STEP_SEND_SMS,
};
use crate::outcome::{StepOutcome, record, settle};
use crate::services::{Notification, SmsRequest};

#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    gateway: Gateway,
}

impl NotificationDispatcher {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Notifies every audience of `event` concurrently.
    pub async fn dispatch(&self, order: &Order, event: &OrderEvent) -> Vec<StepOutcome> {
        let sends = event.audiences().iter().filter_map(|audience| {
            derive_message(order, event, *audience)
                .map(|message| self.deliver(order, *audience, message))
        });

        join_all(sends).await.into_iter().flatten().collect()
    }

    async fn deliver(&self, order: &Order, audience: Audience, message: Message) -> Vec<StepOutcome> {
        match audience {
            Audience::Customer => {
                vec![
                    self.notify(order, order.user_id().clone(), message, STEP_NOTIFY_CUSTOMER)
                        .await,
                ]
            }
            Audience::DeliveryPerson => match order.delivery_person_id() {
                Some(courier) => vec![
                    self.notify(order, courier.clone(), message, STEP_NOTIFY_DELIVERY_PERSON)
                        .await,
                ],
                None => vec![skipped(STEP_NOTIFY_DELIVERY_PERSON)],
            },
            Audience::Owner => self.notify_owners(order, message).await,
        }
    }

    async fn notify(
        &self,
        order: &Order,
        user_id: UserId,
        message: Message,
        step: &'static str,
    ) -> StepOutcome {
        let notification = Notification::about(order, user_id, message);
        settle(order.id(), step, self.gateway.notify(&notification).await)
    }

    async fn notify_owners(&self, order: &Order, message: Message) -> Vec<StepOutcome> {
        let owners = match self.gateway.restaurant_owners(order.restaurant_id()).await {
            Ok(owners) => owners,
            Err(error) => return vec![settle(order.id(), STEP_NOTIFY_OWNERS, Err(error))],
        };

        if owners.is_empty() {
            tracing::debug!(
                order_id = %order.id(),
                restaurant_id = %order.restaurant_id(),
                "restaurant has no owners to notify"
            );
            return vec![skipped(STEP_NOTIFY_OWNERS)];
        }

        let sends = owners.into_iter().map(|owner| {
            self.notify(order, owner.id, message.clone(), STEP_NOTIFY_OWNERS)
        });
        join_all(sends).await
    }

    /// Texts the customer the new status if they registered a mobile number.
    pub async fn send_status_sms(&self, order: &Order) -> StepOutcome {
        if !self.gateway.has_sms() {
            return skipped(STEP_SEND_SMS);
        }

        let user = match self.gateway.get_user(order.user_id()).await {
            Ok(user) => user,
            Err(error) => return settle(order.id(), STEP_SEND_SMS, Err(error)),
        };
        if !user.has_mobile() {
            return skipped(STEP_SEND_SMS);
        }

        let request = SmsRequest::order_status(user.id, order.code().to_string(), order.status());
        settle(order.id(), STEP_SEND_SMS, self.gateway.send_sms(&request).await)
    }
}

fn skipped(step: &'static str) -> StepOutcome {
    let outcome = StepOutcome::skipped(step);
    record(&outcome);
    outcome
}
