//! ConversationEngine — interprets events against session state.
//!
//! Every handler returns a `Reply`; user-triggerable failures are rendered
//! into the reply and never escape. State only changes after the collaborator
//! call a transition depends on has succeeded, so a failed catalog read or
//! submission leaves the session exactly where it was.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::catalog::{Catalog, Service, ServiceId};
use crate::config::BotConfig;
use crate::order::{Amount, Order, OrderDraft, OrderStore, OrderSubmission};
use crate::pricing;
use crate::retry::retry_with_backoff;

use super::event::{EditField, SessionEvent};
use super::reply::{self, Reply};
use super::state::{ConversationState, Session};
use super::validate;

/// The order-intake state machine. Shared by all session workers; holds no
/// per-user state itself.
pub struct ConversationEngine {
    catalog: Arc<dyn Catalog>,
    submission: Arc<dyn OrderSubmission>,
    orders: Arc<dyn OrderStore>,
    config: BotConfig,
}

impl ConversationEngine {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        submission: Arc<dyn OrderSubmission>,
        orders: Arc<dyn OrderStore>,
        config: BotConfig,
    ) -> Self {
        Self {
            catalog,
            submission,
            orders,
            config,
        }
    }

    /// Apply one event to a session and produce the next prompt.
    pub async fn handle(&self, session: &mut Session, event: SessionEvent) -> Reply {
        tracing::debug!(
            user = %session.user_id,
            state = session.state.name(),
            event = ?event,
            "Handling session event"
        );
        match event {
            SessionEvent::Start => self.restart(session).await,
            SessionEvent::SelectPlatform(name) => self.select_platform(session, name).await,
            SessionEvent::SelectService(id) => self.select_service(session, id).await,
            SessionEvent::Text(text) => self.free_text(session, text).await,
            SessionEvent::Edit(field) => self.begin_edit(session, field),
            SessionEvent::BackToSummary => self.back_to_summary(session),
            SessionEvent::BackToServices => self.back_to_services(session).await,
            SessionEvent::BackToPlatforms => self.back_to_platforms(session).await,
            SessionEvent::Confirm => self.confirm(session).await,
            SessionEvent::Cancel => self.cancel(session),
        }
    }

    // ── Menus and navigation ────────────────────────────────────────

    async fn restart(&self, session: &mut Session) -> Reply {
        session.reset();
        self.platform_menu("Welcome! Please select a platform:").await
    }

    async fn back_to_platforms(&self, session: &mut Session) -> Reply {
        session.reset();
        self.platform_menu("Please select a platform:").await
    }

    async fn platform_menu(&self, lead: &str) -> Reply {
        let platforms = match self.list_platforms().await {
            Ok(platforms) => platforms,
            Err(reply) => return reply,
        };
        if platforms.is_empty() {
            return Reply::text("No platforms available now.");
        }
        Reply::text(lead).with_actions(reply::platform_actions(&platforms))
    }

    async fn select_platform(&self, session: &mut Session, name: String) -> Reply {
        let platforms = match self.list_platforms().await {
            Ok(platforms) => platforms,
            Err(reply) => return reply,
        };
        if !platforms.iter().any(|p| p.name == name) {
            return Reply::text("That platform is not available.")
                .with_actions(reply::platform_actions(&platforms));
        }

        let services = match self.list_services(&name).await {
            Ok(services) => services,
            Err(reply) => return reply,
        };

        session.state = ConversationState::PlatformChosen {
            platform: name.clone(),
        };
        if services.is_empty() {
            return Reply::text("No services for this platform.")
                .with_actions(vec![reply::back_to_platforms()]);
        }
        Reply::text(format!("Platform selected: {name}\nPlease select a service:"))
            .with_actions(reply::service_actions(&services))
    }

    async fn select_service(&self, session: &mut Session, id: ServiceId) -> Reply {
        let Some(platform) = session.state.platform().map(str::to_string) else {
            return self.invariant_redirect(session, "service selected before platform");
        };

        let service = match self.get_service(id).await {
            Ok(service) => service,
            Err(reply) => return reply,
        };
        let Some(service) = service.filter(|s| s.platform == platform) else {
            return Reply::text("Service not found.");
        };

        let prompt = format!(
            "Service: {}\n{}\n\nPlease enter your target username (without @):",
            service.display_name, service.description
        );
        session.state = ConversationState::ServiceChosen { service };
        Reply::text(prompt).with_actions(vec![reply::back_to_services()])
    }

    async fn back_to_services(&self, session: &mut Session) -> Reply {
        let Some(platform) = session.state.platform().map(str::to_string) else {
            // Nothing chosen yet; the platform menu is the only way forward.
            return self.platform_menu("Please select a platform:").await;
        };

        let services = match self.list_services(&platform).await {
            Ok(services) => services,
            Err(reply) => return reply,
        };

        session.state = ConversationState::PlatformChosen {
            platform: platform.clone(),
        };
        if services.is_empty() {
            return Reply::text("No services for this platform.")
                .with_actions(vec![reply::back_to_platforms()]);
        }
        Reply::text(format!(
            "Platform selected: {platform}\nPlease select a service:"
        ))
        .with_actions(reply::service_actions(&services))
    }

    fn back_to_summary(&self, session: &mut Session) -> Reply {
        match session.state.clone() {
            ConversationState::Editing { draft, .. }
            | ConversationState::SummaryReady { draft } => {
                session.state = ConversationState::SummaryReady {
                    draft: draft.clone(),
                };
                summary_reply(&draft)
            }
            _ => self.invariant_redirect(session, "no summary to return to"),
        }
    }

    // ── Free text ───────────────────────────────────────────────────

    async fn free_text(&self, session: &mut Session, text: String) -> Reply {
        match session.state.clone() {
            ConversationState::Idle => Reply::text("Welcome! Send /start to begin."),
            ConversationState::PlatformChosen { .. } => {
                Reply::text("Please select a service from the menu.")
            }
            ConversationState::ServiceChosen { service } => {
                self.receive_target(session, service, &text)
            }
            ConversationState::AwaitingAmount { service, target } => {
                self.receive_amount(session, service, target, &text).await
            }
            ConversationState::SummaryReady { draft } => {
                Reply::text(format!(
                    "Use the buttons below to edit, confirm, or cancel.\n\n{}",
                    draft.summary()
                ))
                .with_actions(reply::summary_actions(&draft))
            }
            ConversationState::Editing { field, draft } => {
                self.receive_edit(session, field, draft, &text).await
            }
        }
    }

    fn receive_target(&self, session: &mut Session, service: Service, text: &str) -> Reply {
        let target = match validate::parse_target(text) {
            Ok(target) => target,
            Err(e) => {
                return Reply::text(e.to_string()).with_actions(vec![reply::back_to_services()]);
            }
        };

        let prompt = if service.kind.collects_comments() {
            "Please enter your comments, separated by commas (e.g. \"Nice pic!, Awesome!, Cool!\")"
        } else {
            "Please enter the quantity you want:"
        };
        session.state = ConversationState::AwaitingAmount { service, target };
        Reply::text(prompt).with_actions(vec![reply::back_to_services()])
    }

    async fn receive_amount(
        &self,
        session: &mut Session,
        service: Service,
        target: String,
        text: &str,
    ) -> Reply {
        let amount = if service.kind.collects_comments() {
            validate::parse_comments(text, &service).map(Amount::Comments)
        } else {
            validate::parse_quantity(text, &service).map(Amount::Quantity)
        };
        let amount = match amount {
            Ok(amount) => amount,
            Err(e) => {
                return Reply::text(e.to_string()).with_actions(vec![reply::back_to_services()]);
            }
        };

        let base_price = match self.price(&service, amount.quantity()).await {
            Ok(price) => price,
            Err(reply) => return reply,
        };

        let draft = OrderDraft::new(
            session.user_id.clone(),
            service,
            target,
            amount,
            base_price,
            self.config.fixed_fee,
        );
        session.state = ConversationState::SummaryReady {
            draft: draft.clone(),
        };
        summary_reply(&draft)
    }

    async fn receive_edit(
        &self,
        session: &mut Session,
        field: EditField,
        mut draft: OrderDraft,
        text: &str,
    ) -> Reply {
        match field {
            EditField::Target => {
                let target = match validate::parse_target(text) {
                    Ok(target) => target,
                    Err(e) => {
                        return Reply::text(e.to_string())
                            .with_actions(vec![reply::back_to_summary()]);
                    }
                };
                draft.set_target(target);
            }
            EditField::Quantity | EditField::Comments => {
                let amount = if field == EditField::Comments {
                    validate::parse_comments(text, &draft.service).map(Amount::Comments)
                } else {
                    validate::parse_quantity(text, &draft.service).map(Amount::Quantity)
                };
                let amount = match amount {
                    Ok(amount) => amount,
                    Err(e) => {
                        return Reply::text(e.to_string())
                            .with_actions(vec![reply::back_to_summary()]);
                    }
                };
                let base_price = match self.price(&draft.service, amount.quantity()).await {
                    Ok(price) => price,
                    Err(reply) => return reply,
                };
                draft.reprice(amount, base_price);
            }
        }

        session.state = ConversationState::SummaryReady {
            draft: draft.clone(),
        };
        summary_reply(&draft)
    }

    // ── Edits, confirm, cancel ──────────────────────────────────────

    fn begin_edit(&self, session: &mut Session, field: EditField) -> Reply {
        let draft = match session.state.clone() {
            ConversationState::SummaryReady { draft }
            | ConversationState::Editing { draft, .. } => draft,
            _ => return self.invariant_redirect(session, "edit requested without a draft"),
        };

        let applicable = match field {
            EditField::Target => true,
            EditField::Comments => draft.service.kind.collects_comments(),
            EditField::Quantity => !draft.service.kind.collects_comments(),
        };
        if !applicable {
            return Reply::text("That field cannot be edited for this order.")
                .with_actions(vec![reply::back_to_summary()]);
        }

        let prompt = match field {
            EditField::Target => "Please enter the new target username (without @):",
            EditField::Quantity => "Please enter the new quantity:",
            EditField::Comments => "Please enter your comments, separated by commas:",
        };
        session.state = ConversationState::Editing { field, draft };
        Reply::text(prompt).with_actions(vec![reply::back_to_summary()])
    }

    async fn confirm(&self, session: &mut Session) -> Reply {
        let ConversationState::SummaryReady { draft } = session.state.clone() else {
            return Reply::text("No order in progress. Send /start to begin.");
        };

        let submitted = retry_with_backoff(
            self.config.retry_attempts,
            self.config.retry_base_delay,
            || self.submission.submit(&draft),
        )
        .await;
        let order_id = match submitted {
            Ok(order_id) => order_id,
            Err(e) => {
                tracing::error!(
                    user = %session.user_id,
                    reference = %draft.correlation_id,
                    error = %e,
                    "Order submission failed after retries"
                );
                return Reply::text("Your order could not be submitted. Please try again.")
                    .with_actions(reply::summary_actions(&draft));
            }
        };

        let order = Order::confirmed(draft.clone(), order_id.clone());
        if let Err(e) = self.orders.insert(&order).await {
            // The provider already accepted the order; record-keeping must
            // not fail the confirmation.
            tracing::error!(
                order = %order.id,
                error = %e,
                "Failed to persist confirmed order"
            );
        }

        session.reset();
        let notice = format!(
            "New order {}: {} x{} for @{} on {} (total ${:.2})",
            order_id,
            draft.service.display_name,
            draft.amount.quantity(),
            draft.target,
            draft.platform,
            draft.total_price.round_dp(2),
        );
        Reply::text(format!(
            "✅ Order confirmed!\nOrder ID: {}\nTotal: ${:.2}\n\nSend /start to place another order.",
            order_id,
            draft.total_price.round_dp(2),
        ))
        .with_operator_notice(notice)
    }

    fn cancel(&self, session: &mut Session) -> Reply {
        session.reset();
        Reply::text("Order cancelled. You can start a new one with /start")
    }

    // ── Collaborator boundary ───────────────────────────────────────

    async fn list_platforms(&self) -> Result<Vec<crate::catalog::Platform>, Reply> {
        retry_with_backoff(
            self.config.retry_attempts,
            self.config.retry_base_delay,
            || self.catalog.list_platforms(),
        )
        .await
        .map_err(|e| self.collaborator_failure(e))
    }

    async fn list_services(&self, platform: &str) -> Result<Vec<Service>, Reply> {
        retry_with_backoff(
            self.config.retry_attempts,
            self.config.retry_base_delay,
            || self.catalog.list_services(platform),
        )
        .await
        .map_err(|e| self.collaborator_failure(e))
    }

    async fn get_service(&self, id: ServiceId) -> Result<Option<Service>, Reply> {
        retry_with_backoff(
            self.config.retry_attempts,
            self.config.retry_base_delay,
            || self.catalog.get_service(id),
        )
        .await
        .map_err(|e| self.collaborator_failure(e))
    }

    /// Fetch pricing rules and resolve a base price. Pricing failures are
    /// rendered for the user; the caller leaves session state untouched.
    async fn price(&self, service: &Service, quantity: u32) -> Result<Decimal, Reply> {
        let rules = retry_with_backoff(
            self.config.retry_attempts,
            self.config.retry_base_delay,
            || self.catalog.pricing_rules(service.id),
        )
        .await
        .map_err(|e| self.collaborator_failure(e))?;

        pricing::resolve(service, &rules, quantity).map_err(|e| {
            tracing::warn!(service = %service.id, quantity, error = %e, "Pricing resolution failed");
            Reply::text("Pricing is unavailable for this request. Try a different amount or go back.")
                .with_actions(vec![reply::back_to_services()])
        })
    }

    fn collaborator_failure(&self, err: impl std::fmt::Display) -> Reply {
        tracing::error!(error = %err, "Collaborator call failed after retries");
        Reply::text("Something went wrong on our side. Please try again in a moment.")
    }

    fn invariant_redirect(&self, session: &mut Session, context: &str) -> Reply {
        tracing::warn!(
            user = %session.user_id,
            state = session.state.name(),
            context,
            "Event not valid in current state; resetting session"
        );
        session.reset();
        Reply::text("Something went wrong. Please send /start to begin a new order.")
    }
}

fn summary_reply(draft: &OrderDraft) -> Reply {
    Reply::text(draft.summary()).with_actions(reply::summary_actions(draft))
}
