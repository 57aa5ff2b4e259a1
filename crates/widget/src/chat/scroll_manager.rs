use crate::chat::message::{Speaker, TurnIndex};
use crate::chat::widget::ChatWidget;

/// Where the transcript view should scroll after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirective {
    /// Reveal the bottom of the transcript (loading indicator or latest user turn).
    ToEnd,
    /// Align the start of this turn with the top of the view.
    ToTurnStart(TurnIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScrollKey {
    turn_count: usize,
    pending: bool,
    open: bool,
}

/// Decides auto-scroll independently from message content.
///
/// A directive is produced only when the turn count, pending flag or open
/// state changed since the last observation, and only while open.
pub struct ScrollManager {
    last_key: Option<ScrollKey>,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self { last_key: None }
    }

    pub fn reset(&mut self) {
        self.last_key = None;
    }

    pub fn observe(&mut self, widget: &ChatWidget) -> Option<ScrollDirective> {
        let key = ScrollKey {
            turn_count: widget.transcript().len(),
            pending: widget.is_pending(),
            open: widget.is_open(),
        };

        if self.last_key == Some(key) {
            return None;
        }
        self.last_key = Some(key);

        Self::directive_for(widget)
    }

    fn directive_for(widget: &ChatWidget) -> Option<ScrollDirective> {
        if !widget.is_open() {
            return None;
        }

        if widget.is_pending() {
            return Some(ScrollDirective::ToEnd);
        }

        match widget.transcript().last() {
            // Long answers are read from their first line, not their last.
            Some((index, turn)) if turn.speaker == Speaker::Assistant => {
                Some(ScrollDirective::ToTurnStart(index))
            }
            Some(_) => Some(ScrollDirective::ToEnd),
            None => None,
        }
    }
}

impl Default for ScrollManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::events::CompletionFinished;

    #[test]
    fn closed_widget_never_scrolls() {
        let mut widget = ChatWidget::new();
        let mut scroll = ScrollManager::new();
        widget.begin_send("hi").expect("send");
        assert_eq!(scroll.observe(&widget), None);
    }

    #[test]
    fn opening_scrolls_to_greeting_start() {
        let mut widget = ChatWidget::new();
        let mut scroll = ScrollManager::new();
        widget.open();
        assert_eq!(
            scroll.observe(&widget),
            Some(ScrollDirective::ToTurnStart(TurnIndex::new(0)))
        );
        assert_eq!(scroll.observe(&widget), None);
    }

    #[test]
    fn pending_scrolls_to_end_then_reply_scrolls_to_its_start() {
        let mut widget = ChatWidget::new();
        let mut scroll = ScrollManager::new();
        widget.open();
        scroll.observe(&widget);

        let pending = widget.begin_send("長い答えをください").expect("send");
        assert_eq!(scroll.observe(&widget), Some(ScrollDirective::ToEnd));

        widget
            .finish_send(CompletionFinished::reply(pending.target, "とても長い答え"))
            .expect("applied");
        assert_eq!(
            scroll.observe(&widget),
            Some(ScrollDirective::ToTurnStart(TurnIndex::new(2)))
        );
        assert_eq!(scroll.observe(&widget), None);
    }

    #[test]
    fn reply_landing_while_closed_is_scrolled_to_on_reopen() {
        let mut widget = ChatWidget::new();
        let mut scroll = ScrollManager::new();
        widget.open();
        let pending = widget.begin_send("hi").expect("send");
        scroll.observe(&widget);
        widget.close();
        scroll.observe(&widget);
        widget
            .finish_send(CompletionFinished::reply(pending.target, "hello"))
            .expect("applied");
        assert_eq!(scroll.observe(&widget), None);

        widget.open();
        assert_eq!(
            scroll.observe(&widget),
            Some(ScrollDirective::ToTurnStart(TurnIndex::new(2)))
        );
    }
}
