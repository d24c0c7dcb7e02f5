use crate::db::SubmissionStore;
use crate::email::templates;
use crate::email::{Notifier, TransportError};
use crate::error::StoreError;
use crate::models::{NewSubmission, Submission};

use super::fields::ContactForm;

/// Notification step that was running when mail delivery gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyStage {
    /// No mail settings, or the transport could not be built.
    Transport,
    Verify,
    AdminNotice,
    Acknowledgment,
}

impl std::fmt::Display for NotifyStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotifyStage::Transport => "transport",
            NotifyStage::Verify => "verify",
            NotifyStage::AdminNotice => "admin notice",
            NotifyStage::Acknowledgment => "acknowledgment",
        };
        f.write_str(s)
    }
}

/// Terminal result of one submission.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Stored, both emails sent.
    Delivered(Submission),
    /// Stored, but notification stopped at `stage`.
    EmailFailed {
        submission: Submission,
        stage: NotifyStage,
        error: TransportError,
    },
    /// Nothing stored, nothing sent.
    Failed(StoreError),
}

impl SubmissionOutcome {
    pub fn submission(&self) -> Option<&Submission> {
        match self {
            SubmissionOutcome::Delivered(submission) => Some(submission),
            SubmissionOutcome::EmailFailed { submission, .. } => Some(submission),
            SubmissionOutcome::Failed(_) => None,
        }
    }
}

/// Persist the submission, then try to notify the admin and the submitter.
///
/// Steps run strictly in order: save, open transport, verify, admin notice,
/// acknowledgment. A failed save ends the run before any mail is attempted.
/// After a successful save, the first mail failure ends the run with
/// `EmailFailed`; later steps are skipped and nothing is retried.
pub async fn run(
    store: &dyn SubmissionStore,
    notifier: Option<&Notifier>,
    form: ContactForm,
) -> SubmissionOutcome {
    let candidate = NewSubmission::new(&form.name, &form.email, &form.message);

    let submission = match store.save(candidate).await {
        Ok(submission) => submission,
        Err(e) => {
            tracing::error!("Failed to store contact submission: {e}");
            return SubmissionOutcome::Failed(e);
        }
    };

    tracing::info!("Contact submission {} stored", submission.id);

    let Some(notifier) = notifier else {
        tracing::warn!(
            "Mail transport is not configured, skipping notifications for {}",
            submission.id
        );
        return SubmissionOutcome::EmailFailed {
            submission,
            stage: NotifyStage::Transport,
            error: TransportError::from("Mail transport is not configured"),
        };
    };

    match notify(notifier, &submission).await {
        Ok(()) => SubmissionOutcome::Delivered(submission),
        Err((stage, error)) => {
            tracing::warn!(
                "Email notification for {} failed at {stage}: {error}",
                submission.id
            );
            SubmissionOutcome::EmailFailed {
                submission,
                stage,
                error,
            }
        }
    }
}

async fn notify(
    notifier: &Notifier,
    submission: &Submission,
) -> Result<(), (NotifyStage, TransportError)> {
    let sender = notifier
        .mailer
        .open()
        .map_err(|e| (NotifyStage::Transport, e))?;

    sender
        .verify_connectivity()
        .await
        .map_err(|e| (NotifyStage::Verify, e))?;
    tracing::debug!("Mail transport verified for {}", submission.id);

    let admin_notice = templates::render_admin_notice(submission, &notifier.addresses)
        .map_err(|e| (NotifyStage::AdminNotice, e))?;
    sender
        .send(&admin_notice)
        .await
        .map_err(|e| (NotifyStage::AdminNotice, e))?;
    tracing::info!("Admin notification sent for {}", submission.id);

    let acknowledgment = templates::render_acknowledgment(submission, &notifier.addresses)
        .map_err(|e| (NotifyStage::Acknowledgment, e))?;
    sender
        .send(&acknowledgment)
        .await
        .map_err(|e| (NotifyStage::Acknowledgment, e))?;
    tracing::info!("Acknowledgment sent for {}", submission.id);

    Ok(())
}
