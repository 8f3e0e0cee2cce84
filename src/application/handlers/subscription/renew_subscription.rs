//! RenewSubscriptionHandler - Command handler for starting a renewal checkout.
//!
//! Renewal is paid up front: this handler only issues a Helio pay link. The
//! period is extended when the resulting payment arrives by webhook.
//!
//! A lapsed subscription cannot be renewed while the user holds a newer
//! active subscription to the same model; the caller renews that one.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{RenewalDuration, SubscriptionError};
use crate::ports::{CatalogReader, PayLinkRequest, PaymentProvider, SubscriptionRepository};

/// Command to renew a subscription for a chosen duration.
#[derive(Debug, Clone)]
pub struct RenewSubscriptionCommand {
    pub user_id: UserId,
    pub subscription_id: SubscriptionId,
    pub duration: RenewalDuration,
}

/// Result of renewal checkout.
#[derive(Debug, Clone)]
pub struct RenewSubscriptionResult {
    pub subscription_id: SubscriptionId,
    pub payment_url: String,
    pub pay_link_id: String,
    pub price: Decimal,
    pub currency: String,
    pub duration: RenewalDuration,
}

/// Handler for renewal checkout.
pub struct RenewSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    catalog: Arc<dyn CatalogReader>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl RenewSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        catalog: Arc<dyn CatalogReader>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            subscriptions,
            catalog,
            payment_provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: RenewSubscriptionCommand,
    ) -> Result<RenewSubscriptionResult, SubscriptionError> {
        let now = Timestamp::now();

        let subscription = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or_else(|| SubscriptionError::not_found("Subscription"))?;

        if !subscription.is_owned_by(&cmd.user_id) {
            return Err(SubscriptionError::AccessDenied(
                "Subscription belongs to another user".to_string(),
            ));
        }

        if !subscription.is_renewable(now) {
            return Err(SubscriptionError::NotEligibleForRenewal {
                expires_at: subscription.current_period_end,
            });
        }

        if !subscription.is_active() {
            if let Some(active) = self
                .subscriptions
                .find_active(&subscription.user_id, &subscription.model_id)
                .await?
                .filter(|active| active.id != subscription.id)
            {
                tracing::info!(
                    subscription_id = %subscription.id,
                    active_subscription_id = %active.id,
                    "Renewal refused, pair has another active subscription"
                );
                return Err(SubscriptionError::ActiveSubscriptionExists {
                    active_subscription_id: Some(active.id.to_string()),
                });
            }
        }

        let plan = self
            .catalog
            .find_plan(&subscription.plan_id)
            .await?
            .ok_or_else(|| SubscriptionError::not_found("Plan"))?;
        let model_name = self
            .catalog
            .find_model(&subscription.model_id)
            .await?
            .map(|m| m.name)
            .unwrap_or_else(|| subscription.model_id.to_string());

        let price = cmd.duration.renewal_price(plan.base_price);

        let link = self
            .payment_provider
            .create_pay_link(PayLinkRequest {
                name: format!("{} {} renewal ({})", model_name, plan.name, cmd.duration),
                price,
                currency: plan.currency.clone(),
                user_id: subscription.user_id.clone(),
                model_id: subscription.model_id.clone(),
                plan_id: subscription.plan_id.clone(),
                duration: cmd.duration,
                subscription_id: Some(subscription.id),
            })
            .await
            .map_err(|e| {
                tracing::error!(subscription_id = %subscription.id, error = %e, "Pay link creation failed");
                SubscriptionError::PaymentProvider(e.to_string())
            })?;

        tracing::info!(
            subscription_id = %subscription.id,
            duration = %cmd.duration,
            price = %price,
            pay_link_id = %link.id,
            "Renewal checkout created"
        );

        Ok(RenewSubscriptionResult {
            subscription_id: subscription.id,
            payment_url: link.url,
            pay_link_id: link.id,
            price,
            currency: plan.currency,
            duration: cmd.duration,
        })
    }
}
