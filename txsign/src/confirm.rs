//! User-confirmation collaborator.
//!
//! The signing core never draws anything. It asks a [`Confirm`]
//! implementation yes/no questions, one at a time, and stops at the first
//! "no". Each prompt is a separate approval checkpoint.

use std::collections::VecDeque;

use txsign_common::SignError;

/// Hint for how the device should present a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRequest {
    ConfirmOutput,
    SignTx,
    ConfirmMemo,
    ConfirmEosAction,
    ConfirmEosBudget,
    Other,
}

/// Blocking yes/no approval primitive.
pub trait Confirm {
    /// Shows `title`/`body` and waits for the user.
    ///
    /// Returns `Ok(false)` when the user cancels.
    fn confirm(&mut self, kind: ButtonRequest, title: &str, body: &str) -> Result<bool, SignError>;

    /// Shows an informational screen that the user can only acknowledge.
    fn review(&mut self, kind: ButtonRequest, title: &str, body: &str) -> Result<(), SignError>;
}

/// Runs a prompt and turns a cancel into [`SignError::RejectedByUser`].
pub fn require<C: Confirm + ?Sized>(
    ui: &mut C,
    kind: ButtonRequest,
    title: &str,
    body: &str,
) -> Result<(), SignError> {
    if ui.confirm(kind, title, body)? {
        Ok(())
    } else {
        log::warn!("user rejected '{}'", title);
        Err(SignError::RejectedByUser)
    }
}

// =============================================================================
// Mock Implementation
// =============================================================================

/// A prompt as it was shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: ButtonRequest,
    pub title: String,
    pub body: String,
    /// False for [`Confirm::review`] screens.
    pub cancellable: bool,
}

/// Scripted confirmation collaborator.
///
/// Records every prompt. Answers come from the script in order; once it
/// runs dry every prompt is approved.
#[derive(Debug, Default)]
pub struct MockUi {
    pub prompts: Vec<Prompt>,
    answers: VecDeque<bool>,
}

impl MockUi {
    /// Approves everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers the first prompts from `answers`, then approves.
    pub fn scripted(answers: &[bool]) -> Self {
        Self {
            prompts: Vec::new(),
            answers: answers.iter().copied().collect(),
        }
    }

    /// Number of yes/no prompts shown, review screens excluded.
    pub fn confirm_count(&self) -> usize {
        self.prompts.iter().filter(|p| p.cancellable).count()
    }

    pub fn bodies(&self) -> Vec<&str> {
        self.prompts.iter().map(|p| p.body.as_str()).collect()
    }
}

impl Confirm for MockUi {
    fn confirm(&mut self, kind: ButtonRequest, title: &str, body: &str) -> Result<bool, SignError> {
        println!("[MOCK] {}: {}", title, body);
        self.prompts.push(Prompt {
            kind,
            title: title.to_string(),
            body: body.to_string(),
            cancellable: true,
        });
        Ok(self.answers.pop_front().unwrap_or(true))
    }

    fn review(&mut self, kind: ButtonRequest, title: &str, body: &str) -> Result<(), SignError> {
        println!("[MOCK] review {}: {}", title, body);
        self.prompts.push(Prompt {
            kind,
            title: title.to_string(),
            body: body.to_string(),
            cancellable: false,
        });
        Ok(())
    }
}

/// Approves every prompt without showing it. INSECURE; test builds only.
#[cfg(feature = "autoapprove")]
#[derive(Debug, Default)]
pub struct AutoApprove;

#[cfg(feature = "autoapprove")]
impl Confirm for AutoApprove {
    fn confirm(&mut self, _kind: ButtonRequest, title: &str, body: &str) -> Result<bool, SignError> {
        log::info!("Auto-approving '{}': {}", title, body);
        Ok(true)
    }

    fn review(&mut self, _kind: ButtonRequest, _title: &str, _body: &str) -> Result<(), SignError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_default_approve() {
        let mut ui = MockUi::scripted(&[false]);
        assert!(!ui.confirm(ButtonRequest::Other, "a", "1").unwrap());
        assert!(ui.confirm(ButtonRequest::Other, "b", "2").unwrap());
        assert_eq!(ui.confirm_count(), 2);
        assert_eq!(ui.bodies(), vec!["1", "2"]);
    }

    #[test]
    fn test_require_maps_cancel() {
        let mut ui = MockUi::scripted(&[false]);
        assert_eq!(
            require(&mut ui, ButtonRequest::SignTx, "t", "b"),
            Err(SignError::RejectedByUser)
        );
        assert_eq!(require(&mut ui, ButtonRequest::SignTx, "t", "b"), Ok(()));
    }

    #[test]
    fn test_review_is_not_counted() {
        let mut ui = MockUi::new();
        ui.review(ButtonRequest::Other, "Warning", "x").unwrap();
        assert_eq!(ui.confirm_count(), 0);
        assert_eq!(ui.prompts.len(), 1);
    }
}
