use crate::chat::events::{CompletionFinished, CompletionOutcome};
use crate::chat::hint::{LandmarkLookup, Viewport, contextual_hint};
use crate::chat::message::{
    RequestId, RequestState, RequestTarget, RequestTransition, Transcript, Turn, TurnIndex,
};
use crate::content::{FALLBACK_REPLY, GREETING, SUGGESTIONS};

/// A send accepted by the widget that still needs a completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub target: RequestTarget,
    pub text: String,
}

/// Snapshot handed to the presentation layer after every state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub open: bool,
    pub pending: bool,
    pub draft: String,
    pub turns: Vec<Turn>,
    /// Already suppressed while the widget is open.
    pub hint: Option<&'static str>,
    pub can_submit: bool,
    pub suggestions_enabled: bool,
}

/// Owned widget state plus the rules that mutate it.
///
/// Every method is synchronous and side-effect free apart from `self`; issuing
/// the completion call for a [`PendingSend`] is the caller's job.
#[derive(Debug, Clone)]
pub struct ChatWidget {
    transcript: Transcript,
    greeting: String,
    open: bool,
    draft: String,
    contextual_hint: Option<&'static str>,
    request_state: RequestState,
    next_request_id: u64,
}

impl Default for ChatWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatWidget {
    pub fn new() -> Self {
        Self::with_greeting(GREETING)
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        Self {
            transcript: Transcript::with_greeting(greeting.clone()),
            greeting,
            open: false,
            draft: String::new(),
            contextual_hint: None,
            request_state: RequestState::Idle,
            next_request_id: 1,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_pending(&self) -> bool {
        self.request_state.is_pending()
    }

    pub fn request_state(&self) -> RequestState {
        self.request_state
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Stored hint, regardless of whether it is currently rendered.
    pub fn contextual_hint(&self) -> Option<&'static str> {
        self.contextual_hint
    }

    /// Hint as rendered: never shown while the chat window is open.
    pub fn visible_hint(&self) -> Option<&'static str> {
        if self.open {
            None
        } else {
            self.contextual_hint
        }
    }

    /// Opens the chat window. Returns false if it was already open.
    pub fn open(&mut self) -> bool {
        let changed = !self.open;
        self.open = true;
        changed
    }

    /// Closes the chat window; transcript and in-flight request are kept.
    pub fn close(&mut self) -> bool {
        let changed = self.open;
        self.open = false;
        changed
    }

    /// Flips the open state and returns the new value.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Send-button enablement.
    pub fn can_submit(&self) -> bool {
        !self.is_pending() && !self.draft.trim().is_empty()
    }

    /// Accepts a user send, or returns `None` for blank text or while a request is pending.
    pub fn begin_send(&mut self, text: impl Into<String>) -> Option<PendingSend> {
        let text = text.into();
        if text.trim().is_empty() || self.is_pending() {
            return None;
        }

        let target = RequestTarget::new(RequestId::new(self.next_request_id));
        match self.request_state.apply(RequestTransition::Start(target)) {
            Ok(next_state) => self.request_state = next_state,
            Err(rejection) => {
                tracing::debug!(?rejection, "send rejected by request state");
                return None;
            }
        }
        // Reserve the next id immediately so a later send never reuses a target.
        self.next_request_id = self.next_request_id.saturating_add(1);

        self.transcript.push(Turn::user(text.clone()));
        self.draft.clear();

        Some(PendingSend { target, text })
    }

    pub fn submit_draft(&mut self) -> Option<PendingSend> {
        let draft = self.draft.clone();
        self.begin_send(draft)
    }

    /// Sends the canned suggestion at `index`; unknown indices are ignored.
    pub fn send_suggestion(&mut self, index: usize) -> Option<PendingSend> {
        let suggestion = SUGGESTIONS.get(index)?;
        self.begin_send(*suggestion)
    }

    /// Applies a resolved completion and returns the index of the assistant turn it produced.
    ///
    /// Completions for anything other than the active request are dropped.
    pub fn finish_send(&mut self, completion: CompletionFinished) -> Option<TurnIndex> {
        let next_state = match self.request_state.apply(completion.transition()) {
            Ok(next_state) => next_state,
            Err(rejection) => {
                tracing::debug!(?rejection, "ignoring completion for inactive request");
                return None;
            }
        };
        self.request_state = next_state;

        let turn = match completion.outcome {
            CompletionOutcome::Reply(text) => Turn::assistant(text),
            CompletionOutcome::Failed(detail) => {
                tracing::warn!(
                    request_id = completion.target.request_id.0,
                    error = %detail,
                    "completion failed; showing fallback reply"
                );
                Turn::assistant(FALLBACK_REPLY)
            }
        };

        Some(self.transcript.push(turn))
    }

    /// Re-evaluates the contextual hint after a page scroll. Returns true if it changed.
    ///
    /// Ignored while open so the stored hint is left untouched.
    pub fn update_hint(&mut self, lookup: &dyn LandmarkLookup, viewport: Viewport) -> bool {
        if self.open {
            return false;
        }

        let hint = contextual_hint(lookup, viewport);
        let changed = hint != self.contextual_hint;
        self.contextual_hint = hint;
        changed
    }

    /// Drops the conversation back to the greeting. Refused while a request is in flight.
    pub fn reset(&mut self) -> bool {
        if self.is_pending() {
            return false;
        }

        self.transcript = Transcript::with_greeting(self.greeting.clone());
        self.draft.clear();
        self.contextual_hint = None;
        true
    }

    pub fn view(&self) -> WidgetView {
        WidgetView {
            open: self.open,
            pending: self.is_pending(),
            draft: self.draft.clone(),
            turns: self.transcript.turns().to_vec(),
            hint: self.visible_hint(),
            can_submit: self.can_submit(),
            suggestions_enabled: !self.is_pending(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::hint::{Landmark, LandmarkBounds, PageScroll};
    use crate::chat::message::Speaker;
    use crate::content::{FLOW_HINT, SALARY_HINT};

    fn reply_to(widget: &mut ChatWidget, pending: &PendingSend, text: &str) -> Option<TurnIndex> {
        widget.finish_send(CompletionFinished::reply(pending.target, text))
    }

    fn scroll_over(landmark: Landmark) -> PageScroll {
        PageScroll::new(Viewport::new(800.0))
            .with_landmark(landmark, LandmarkBounds::new(100.0, 700.0))
    }

    #[test]
    fn new_widget_starts_closed_with_greeting() {
        let widget = ChatWidget::new();
        assert!(!widget.is_open());
        assert!(!widget.is_pending());
        assert_eq!(widget.transcript().turns(), &[Turn::assistant(GREETING)]);
    }

    #[test]
    fn accepted_send_appends_user_turn_and_clears_draft() {
        let mut widget = ChatWidget::new();
        widget.set_draft("残業は本当にないの？");
        assert!(widget.can_submit());

        let pending = widget.submit_draft().expect("draft accepted");
        assert_eq!(pending.text, "残業は本当にないの？");
        assert!(widget.is_pending());
        assert_eq!(widget.draft(), "");
        assert!(!widget.can_submit());
        assert_eq!(
            widget.transcript().last().map(|(_, turn)| turn.clone()),
            Some(Turn::user("残業は本当にないの？"))
        );
    }

    #[test]
    fn blank_sends_are_ignored() {
        let mut widget = ChatWidget::new();
        assert!(widget.begin_send("").is_none());
        assert!(widget.begin_send(" \n\t ").is_none());
        widget.set_draft("   ");
        assert!(!widget.can_submit());
        assert!(widget.submit_draft().is_none());
        assert_eq!(widget.transcript().len(), 1);
        assert!(!widget.is_pending());
    }

    #[test]
    fn send_while_pending_is_a_no_op() {
        let mut widget = ChatWidget::new();
        let first = widget.begin_send("first").expect("first send");
        let before = widget.transcript().len();

        assert!(widget.begin_send("second").is_none());
        assert!(widget.send_suggestion(0).is_none());
        assert_eq!(widget.transcript().len(), before);
        assert_eq!(widget.request_state(), RequestState::Sending(first.target));
    }

    #[test]
    fn every_send_pairs_with_one_assistant_turn() {
        let mut widget = ChatWidget::new();
        for round in 0..4 {
            let pending = widget.begin_send(format!("question {round}")).expect("send");
            let completion = if round % 2 == 0 {
                CompletionFinished::reply(pending.target, "answer")
            } else {
                CompletionFinished::failed(pending.target, "network down")
            };
            assert!(widget.finish_send(completion).is_some());
        }

        assert_eq!(widget.transcript().len(), 2 * 4 + 1);
        let speakers = widget
            .transcript()
            .turns()
            .iter()
            .skip(1)
            .map(|turn| turn.speaker)
            .collect::<Vec<_>>();
        assert!(
            speakers
                .chunks(2)
                .all(|pair| pair == [Speaker::User, Speaker::Assistant])
        );
    }

    #[test]
    fn failure_appends_fallback_without_error_detail() {
        let mut widget = ChatWidget::new();
        let pending = widget.begin_send("hello").expect("send");
        widget.finish_send(CompletionFinished::failed(pending.target, "HTTP 503 upstream"));

        let (_, last) = widget.transcript().last().expect("last turn");
        assert_eq!(last, &Turn::assistant(FALLBACK_REPLY));
        assert!(!widget.is_pending());
        assert!(widget.begin_send("again").is_some());
    }

    #[test]
    fn stale_completion_is_dropped() {
        let mut widget = ChatWidget::new();
        let first = widget.begin_send("one").expect("send");
        reply_to(&mut widget, &first, "reply one").expect("applied");
        let second = widget.begin_send("two").expect("send");

        assert!(reply_to(&mut widget, &first, "late duplicate").is_none());
        assert!(widget.is_pending());
        assert_eq!(
            reply_to(&mut widget, &second, "reply two"),
            Some(TurnIndex::new(4))
        );
        assert!(reply_to(&mut widget, &second, "again").is_none());
        assert_eq!(widget.transcript().len(), 5);
    }

    #[test]
    fn suggestion_behaves_like_send() {
        let mut widget = ChatWidget::new();
        let pending = widget.send_suggestion(1).expect("chip");
        assert_eq!(pending.text, SUGGESTIONS[1]);
        assert_eq!(
            widget.transcript().last().map(|(_, turn)| turn.text.as_str()),
            Some(SUGGESTIONS[1])
        );
    }

    #[test]
    fn out_of_range_suggestion_is_ignored() {
        let mut widget = ChatWidget::new();
        assert!(widget.send_suggestion(SUGGESTIONS.len()).is_none());
        assert_eq!(widget.transcript().len(), 1);
    }

    #[test]
    fn toggling_preserves_transcript() {
        let mut widget = ChatWidget::new();
        assert!(widget.open());
        let pending = widget.begin_send("hi").expect("send");
        reply_to(&mut widget, &pending, "hello").expect("applied");
        let before = widget.transcript().clone();

        assert!(widget.close());
        assert!(!widget.close());
        assert!(widget.toggle());
        assert_eq!(widget.transcript(), &before);
    }

    #[test]
    fn completion_lands_after_close() {
        let mut widget = ChatWidget::new();
        widget.open();
        let pending = widget.begin_send("hi").expect("send");
        widget.close();

        assert!(reply_to(&mut widget, &pending, "hello").is_some());
        assert!(!widget.is_open());
        assert_eq!(widget.transcript().len(), 3);
    }

    #[test]
    fn hint_tracks_scroll_only_while_closed() {
        let mut widget = ChatWidget::new();
        let salary = scroll_over(Landmark::Salary);
        assert!(widget.update_hint(&salary, salary.viewport));
        assert_eq!(widget.visible_hint(), Some(SALARY_HINT));

        widget.open();
        assert_eq!(widget.visible_hint(), None);
        assert_eq!(widget.view().hint, None);

        let flow = scroll_over(Landmark::Flow);
        assert!(!widget.update_hint(&flow, flow.viewport));
        assert_eq!(widget.contextual_hint(), Some(SALARY_HINT));

        widget.close();
        assert!(widget.update_hint(&flow, flow.viewport));
        assert_eq!(widget.visible_hint(), Some(FLOW_HINT));

        let nothing = PageScroll::new(Viewport::new(800.0));
        assert!(widget.update_hint(&nothing, nothing.viewport));
        assert_eq!(widget.visible_hint(), None);
    }

    #[test]
    fn reset_is_refused_while_pending() {
        let mut widget = ChatWidget::new();
        let pending = widget.begin_send("hi").expect("send");
        assert!(!widget.reset());

        reply_to(&mut widget, &pending, "hello").expect("applied");
        widget.set_draft("draft");
        assert!(widget.reset());
        assert_eq!(widget.transcript().turns(), &[Turn::assistant(GREETING)]);
        assert_eq!(widget.draft(), "");
    }

    #[test]
    fn view_reflects_pending_state() {
        let mut widget = ChatWidget::new();
        widget.open();
        widget.set_draft("hi");
        let view = widget.view();
        assert!(view.can_submit);
        assert!(view.suggestions_enabled);

        widget.submit_draft().expect("send");
        let view = widget.view();
        assert!(view.pending);
        assert!(!view.can_submit);
        assert!(!view.suggestions_enabled);
        assert_eq!(view.turns.len(), 2);
    }
}
