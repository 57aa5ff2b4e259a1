/// Async driver owning one widget instance.
pub mod controller;
/// Event contracts for controller wiring.
pub mod events;
pub mod hint;
/// Domain entities and deterministic request state boundaries.
pub mod message;
pub mod scroll_manager;
pub mod widget;

pub use controller::{ChatController, Presenter, SessionSlot};
pub use events::{Command, CompletionFinished, CompletionOutcome};
pub use hint::{
    Landmark, LandmarkBounds, LandmarkLayout, LandmarkLookup, PageScroll, Viewport,
    contextual_hint,
};
pub use message::{
    RequestId, RequestState, RequestTarget, RequestTransition, RequestTransitionRejection,
    RequestTransitionResult, Speaker, Transcript, Turn, TurnIndex,
};
pub use scroll_manager::{ScrollDirective, ScrollManager};
pub use widget::{ChatWidget, PendingSend, WidgetView};
