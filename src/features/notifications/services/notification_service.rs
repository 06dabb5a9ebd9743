use std::sync::Arc;

use minijinja::{context, Environment};

use super::mailer::{EmailMessage, Mailer};
use crate::core::error::{AppError, Result};
use crate::features::customers::models::Customer;
use crate::features::tickets::models::Ticket;
use crate::features::users::models::User;

const TICKET_ASSIGNED_TEMPLATE: &str = "ticket_assigned.html";

/// Renders notification emails and hands them to a [`Mailer`]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    from: String,
    templates: Environment<'static>,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, from: String) -> Result<Self> {
        // `.html` names get HTML auto-escaping
        let mut templates = Environment::new();
        templates
            .add_template(
                TICKET_ASSIGNED_TEMPLATE,
                include_str!("../../../../templates/emails/ticket_assigned.html.jinja"),
            )
            .map_err(|e| AppError::Internal(format!("Invalid email template: {}", e)))?;

        Ok(Self {
            mailer,
            from,
            templates,
        })
    }

    /// Tell `recipient` they were assigned `ticket`. Never fails the caller.
    pub async fn send_ticket_assignment(
        &self,
        recipient: &User,
        ticket: &Ticket,
        customer: &Customer,
        assigned_by: Option<&User>,
    ) {
        let result = async {
            let html = self.render_ticket_assignment(ticket, customer, assigned_by)?;
            let message = EmailMessage {
                from: self.from.clone(),
                to: recipient.email.clone(),
                subject: format!("Ticket Assigned: {}", ticket.title),
                html,
            };
            self.mailer.send(&message).await
        }
        .await;

        match result {
            Ok(()) => tracing::info!(
                "Assignment notification sent to {} for ticket {}",
                recipient.email,
                ticket.id
            ),
            Err(e) => tracing::error!("Failed to send assignment notification: {:?}", e),
        }
    }

    fn render_ticket_assignment(
        &self,
        ticket: &Ticket,
        customer: &Customer,
        assigned_by: Option<&User>,
    ) -> Result<String> {
        let template = self
            .templates
            .get_template(TICKET_ASSIGNED_TEMPLATE)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        template
            .render(context! {
                title => &ticket.title,
                description => &ticket.description,
                customer_name => &customer.name,
                priority => ticket.priority.to_string(),
                stage => ticket.stage.to_string(),
                due_date => ticket.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                assigned_by => assigned_by.map(|u| u.name.clone()),
            })
            .map_err(|e| AppError::Internal(format!("Failed to render email: {}", e)))
    }
}
