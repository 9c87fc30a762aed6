//! Post-call feedback: webhook submission and the dialog state machine

mod dialog;
mod webhook;

pub use dialog::{DialogEvent, DialogState, FeedbackAnswers, FeedbackDialog, InvalidDialogEvent};
pub use webhook::{FeedbackClient, FeedbackPayload, FeedbackRequest, Resolution};
