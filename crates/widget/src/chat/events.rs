use crate::chat::hint::PageScroll;
use crate::chat::message::{RequestTarget, RequestTransition};

/// Input from the presentation layer into the widget controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open,
    Close,
    Toggle,
    EditDraft(String),
    /// Send the current draft (enter key or send button).
    SubmitDraft,
    Send(String),
    /// Activate the suggestion chip at this index.
    Suggestion(usize),
    Scroll(PageScroll),
    Reset,
}

/// Result of one completion call, already mapped into widget language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Reply(String),
    /// Diagnostic detail only; never shown to the user.
    Failed(String),
}

/// Emitted when the in-flight completion resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionFinished {
    pub target: RequestTarget,
    pub outcome: CompletionOutcome,
}

impl CompletionFinished {
    pub fn reply(target: RequestTarget, text: impl Into<String>) -> Self {
        Self {
            target,
            outcome: CompletionOutcome::Reply(text.into()),
        }
    }

    pub fn failed(target: RequestTarget, detail: impl Into<String>) -> Self {
        Self {
            target,
            outcome: CompletionOutcome::Failed(detail.into()),
        }
    }

    /// Maps the outcome to the request lifecycle transition it implies.
    pub fn transition(&self) -> RequestTransition {
        match self.outcome {
            CompletionOutcome::Reply(_) => RequestTransition::Complete(self.target),
            CompletionOutcome::Failed(_) => RequestTransition::Fail(self.target),
        }
    }
}
