use serde::{Deserialize, Serialize};

use super::webhook::{FeedbackRequest, Resolution};
use crate::transcript::Transcript;

/// Screens of the post-call feedback dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum DialogState {
    /// "Did we resolve your issue today?"
    Asking,
    YesDetails,
    NoDetails,
    Submitting { resolved: Resolution },
    Success { message: String },
    Error { message: String },
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    Answer(Resolution),
    /// Free-text feedback typed on a details screen
    Comment(String),
    /// Contact email typed on a details screen
    Contact(String),
    Submit,
    Submitted,
    Failed,
    Retry,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{event:?} is not valid in state {state:?}")]
pub struct InvalidDialogEvent {
    pub state: DialogState,
    pub event: DialogEvent,
}

impl DialogState {
    /// Apply `event`, returning the next state
    ///
    /// Close is ignored while a submission is in flight.
    pub fn transition(self, event: DialogEvent) -> Result<DialogState, InvalidDialogEvent> {
        use DialogEvent as E;
        use DialogState as S;

        let next = match (self, event) {
            (S::Asking, E::Answer(Resolution::Yes)) => S::YesDetails,
            (S::Asking, E::Answer(Resolution::No)) => S::NoDetails,
            (state @ (S::YesDetails | S::NoDetails), E::Comment(_) | E::Contact(_)) => state,
            (S::YesDetails, E::Submit) => S::Submitting {
                resolved: Resolution::Yes,
            },
            (S::NoDetails, E::Submit) => S::Submitting {
                resolved: Resolution::No,
            },
            (S::Submitting { resolved }, E::Submitted) => S::Success {
                message: success_message(resolved).to_string(),
            },
            (S::Submitting { .. }, E::Failed) => S::Error {
                message: "Failed to submit feedback. Please try again.".to_string(),
            },
            (S::Error { .. }, E::Retry) => S::Asking,
            (state @ S::Submitting { .. }, E::Close) => state,
            (S::Closed, event) => {
                return Err(InvalidDialogEvent {
                    state: S::Closed,
                    event,
                })
            }
            (_, E::Close) => S::Closed,
            (state, event) => return Err(InvalidDialogEvent { state, event }),
        };

        Ok(next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DialogState::Success { .. } | DialogState::Closed)
    }

    /// Answer chosen so far, if the dialog is past the first screen
    pub fn resolution(&self) -> Option<Resolution> {
        match self {
            DialogState::YesDetails => Some(Resolution::Yes),
            DialogState::NoDetails => Some(Resolution::No),
            DialogState::Submitting { resolved } => Some(*resolved),
            _ => None,
        }
    }
}

fn success_message(resolved: Resolution) -> &'static str {
    match resolved {
        Resolution::Yes => {
            "Thank you for your feedback! We've recorded that your issue was resolved."
        }
        Resolution::No => {
            "Thank you for your feedback! We've recorded the issue and will work to improve our service."
        }
    }
}

/// What the user entered in the dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackAnswers {
    pub resolved: Resolution,
    pub comment: Option<String>,
    pub contact: Option<String>,
}

impl FeedbackAnswers {
    pub fn into_request(
        self,
        session_id: Option<String>,
        transcript: Option<Transcript>,
    ) -> FeedbackRequest {
        FeedbackRequest {
            resolved: Some(self.resolved),
            session_id,
            comment: self.comment,
            contact: self.contact,
            transcript,
        }
    }
}

/// Feedback dialog driving a submission closure
pub struct FeedbackDialog {
    state: DialogState,
    comment: Option<String>,
    contact: Option<String>,
}

impl Default for FeedbackDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackDialog {
    pub fn new() -> Self {
        Self {
            state: DialogState::Asking,
            comment: None,
            contact: None,
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn apply(&mut self, event: DialogEvent) -> Result<&DialogState, InvalidDialogEvent> {
        let next = self.state.clone().transition(event.clone())?;

        match event {
            DialogEvent::Comment(text) => self.comment = Some(text).filter(|t| !t.is_empty()),
            DialogEvent::Contact(text) => self.contact = Some(text).filter(|t| !t.is_empty()),
            _ => {}
        }

        self.state = next;
        Ok(&self.state)
    }

    /// Run `submit` with the user's answers and move to success or error
    pub async fn submit<F, Fut, T, E>(&mut self, submit: F) -> Result<&DialogState, InvalidDialogEvent>
    where
        F: FnOnce(FeedbackAnswers) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.apply(DialogEvent::Submit)?;
        let answers = FeedbackAnswers {
            resolved: self.state.resolution().unwrap_or(Resolution::No),
            comment: self.comment.clone(),
            contact: self.contact.clone(),
        };

        let event = match submit(answers).await {
            Ok(_) => DialogEvent::Submitted,
            Err(_) => DialogEvent::Failed,
        };
        self.apply(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_path_reaches_success() {
        let state = DialogState::Asking
            .transition(DialogEvent::Answer(Resolution::Yes))
            .unwrap()
            .transition(DialogEvent::Submit)
            .unwrap();
        assert_eq!(
            state,
            DialogState::Submitting {
                resolved: Resolution::Yes
            }
        );

        let state = state.transition(DialogEvent::Submitted).unwrap();
        assert!(matches!(state, DialogState::Success { .. }));
        assert!(state.is_terminal());
    }

    #[test]
    fn error_can_retry_or_close() {
        let error = DialogState::NoDetails
            .transition(DialogEvent::Submit)
            .unwrap()
            .transition(DialogEvent::Failed)
            .unwrap();
        assert!(matches!(error, DialogState::Error { .. }));

        assert_eq!(
            error.clone().transition(DialogEvent::Retry).unwrap(),
            DialogState::Asking
        );
        assert_eq!(
            error.transition(DialogEvent::Close).unwrap(),
            DialogState::Closed
        );
    }

    #[test]
    fn close_ignored_while_submitting() {
        let submitting = DialogState::Submitting {
            resolved: Resolution::No,
        };
        assert_eq!(
            submitting.clone().transition(DialogEvent::Close).unwrap(),
            submitting
        );
    }

    #[test]
    fn invalid_events_are_rejected() {
        assert!(DialogState::Asking.transition(DialogEvent::Submit).is_err());
        assert!(DialogState::YesDetails
            .transition(DialogEvent::Answer(Resolution::No))
            .is_err());
        assert!(DialogState::Closed.transition(DialogEvent::Close).is_err());
        let success = DialogState::Success {
            message: String::new(),
        };
        assert!(success.transition(DialogEvent::Retry).is_err());
    }

    #[tokio::test]
    async fn submit_failure_lands_in_error() {
        let mut dialog = FeedbackDialog::new();
        dialog.apply(DialogEvent::Answer(Resolution::Yes)).unwrap();

        let state = dialog
            .submit(|answers| async move {
                assert_eq!(answers.resolved, Resolution::Yes);
                Err::<(), _>("webhook down")
            })
            .await
            .unwrap();
        assert!(matches!(state, DialogState::Error { .. }));
    }

    #[tokio::test]
    async fn submit_success_lands_in_success() {
        let mut dialog = FeedbackDialog::new();
        dialog.apply(DialogEvent::Answer(Resolution::No)).unwrap();

        let state = dialog
            .submit(|_| async { Ok::<_, ()>(()) })
            .await
            .unwrap();
        match state {
            DialogState::Success { message } => assert!(message.contains("improve")),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn details_only_editable_on_details_screens() {
        assert_eq!(
            DialogState::NoDetails
                .transition(DialogEvent::Comment("slow".to_string()))
                .unwrap(),
            DialogState::NoDetails
        );
        assert!(DialogState::Asking
            .transition(DialogEvent::Contact("a@b.c".to_string()))
            .is_err());
    }

    #[tokio::test]
    async fn submit_carries_comment_and_contact() {
        let mut dialog = FeedbackDialog::new();
        dialog.apply(DialogEvent::Answer(Resolution::No)).unwrap();
        dialog
            .apply(DialogEvent::Comment("The video kept freezing".to_string()))
            .unwrap();
        dialog
            .apply(DialogEvent::Contact("user@example.com".to_string()))
            .unwrap();
        dialog.apply(DialogEvent::Contact(String::new())).unwrap();

        let mut seen = None;
        dialog
            .submit(|answers| {
                seen = Some(answers);
                async { Ok::<_, ()>(()) }
            })
            .await
            .unwrap();

        let answers = seen.unwrap();
        assert_eq!(answers.resolved, Resolution::No);
        assert_eq!(answers.comment.as_deref(), Some("The video kept freezing"));
        assert_eq!(answers.contact, None);

        let request = answers.into_request(Some("c-1".to_string()), None);
        assert_eq!(request.resolved, Some(Resolution::No));
        assert_eq!(request.comment.as_deref(), Some("The video kept freezing"));
    }
}
