#![deny(unsafe_code)]

/// Recruitment chat widget for the Smart Care site.
///
/// The widget is a headless controller: a presentation layer feeds it
/// [`chat::Command`]s and renders the [`chat::WidgetView`] snapshots it emits.
pub mod chat;
/// Fixed persona, greeting and hint copy.
pub mod content;
/// Provider settings persistence.
pub mod settings;
