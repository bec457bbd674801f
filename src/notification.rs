use std::str::FromStr;

use lettre::{Address, message::Mailbox};
use log::{error, info};

use crate::{
    contact::ContactSubmission,
    email::{ArcEmailPort, EmailMessage, SendEmailError},
    templates::{
        ADMIN_SUBJECT, Branding, USER_SUBJECT, render_admin_notification,
        render_user_confirmation,
    },
};

/// Result of the two-step send.
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    Delivered,
    /// Nothing was sent.
    AdminFailed(SendEmailError),
    /// The operator was notified but the submitter got no confirmation.
    ConfirmationFailed(SendEmailError),
}

pub struct ContactNotifier {
    email: ArcEmailPort,
    admin_address: Address,
    branding: Branding,
}

impl ContactNotifier {
    pub fn new(email: ArcEmailPort, admin_address: Address, branding: Branding) -> Self {
        Self {
            email,
            admin_address,
            branding,
        }
    }

    /// Sends the operator notification, then the confirmation. The confirmation
    /// is only attempted once the notification went through.
    pub async fn notify(&self, submission: &ContactSubmission) -> DeliveryOutcome {
        let admin_message = self.admin_notification(submission);
        if let Err(e) = self.email.send(admin_message).await {
            error!("Error sending admin notification: {}", e);
            return DeliveryOutcome::AdminFailed(e);
        }

        let result = match self.user_confirmation(submission) {
            Ok(message) => self.email.send(message).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!(
                "Admin notified but confirmation to {} failed: {}",
                submission.email, e
            );
            return DeliveryOutcome::ConfirmationFailed(e);
        }

        info!("Contact emails sent for {}", submission.email);
        DeliveryOutcome::Delivered
    }

    fn admin_notification(&self, submission: &ContactSubmission) -> EmailMessage {
        EmailMessage {
            from: Mailbox::new(
                Some(self.branding.admin_sender_name.clone()),
                self.admin_address.clone(),
            ),
            to: Mailbox::new(None, self.admin_address.clone()),
            subject: ADMIN_SUBJECT.to_string(),
            html: render_admin_notification(&self.branding, submission),
        }
    }

    fn user_confirmation(
        &self,
        submission: &ContactSubmission,
    ) -> Result<EmailMessage, SendEmailError> {
        let to = Address::from_str(&submission.email).map_err(|e| {
            SendEmailError::InvalidToAddress(format!("{}: {}", submission.email, e))
        })?;
        Ok(EmailMessage {
            from: Mailbox::new(
                Some(self.branding.user_sender_name.clone()),
                self.admin_address.clone(),
            ),
            to: Mailbox::new(None, to),
            subject: USER_SUBJECT.to_string(),
            html: render_user_confirmation(&self.branding, submission),
        })
    }
}
