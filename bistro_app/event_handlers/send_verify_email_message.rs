use std::sync::Arc;

use bistro_core::ApplicationError;

use crate::{
    bootstrap::{Dependencies, Inject},
    config::Config,
    cqrs::{EventHandler, events::UserRegistered},
    email::{EmailMessage, EmailSender},
};

pub const VERIFY_EMAIL_SUBJECT: &str = "Email verification";

/// Sends the email verification link to a newly registered user.
pub struct SendVerifyEmailMessageEventHandler {
    email_sender: Arc<dyn EmailSender>,
    config: Arc<Config>,
}

impl SendVerifyEmailMessageEventHandler {
    pub fn new(email_sender: Arc<dyn EmailSender>, config: Arc<Config>) -> Self {
        Self {
            email_sender,
            config,
        }
    }
}

impl Inject for SendVerifyEmailMessageEventHandler {
    fn inject(dependencies: &Dependencies) -> Result<Self, ApplicationError> {
        Ok(Self::new(
            dependencies.require::<dyn EmailSender>()?,
            dependencies.require::<Config>()?,
        ))
    }
}

#[async_trait::async_trait]
impl EventHandler<UserRegistered> for SendVerifyEmailMessageEventHandler {
    async fn handle(&self, event: &UserRegistered) -> Result<(), ApplicationError> {
        let link = self.config.verify_email_link(event.user_id);
        let message = EmailMessage {
            to: event.email.clone(),
            subject: VERIFY_EMAIL_SUBJECT.to_string(),
            body: format!(
                "Hello, {}! To verify your email, follow the link: {}",
                event.username, link
            ),
        };

        tracing::debug!(user_id = event.user_id, "Sending verify email message");
        self.email_sender.send(message).await
    }
}
