use std::sync::Arc;

use smartcare_llm::{ChatSession, LlmProvider, SessionConfig, create_provider};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::chat::events::{Command, CompletionFinished};
use crate::chat::scroll_manager::{ScrollDirective, ScrollManager};
use crate::chat::widget::{ChatWidget, PendingSend, WidgetView};
use crate::settings::ProviderSettings;

/// Presentation layer notified after every widget state change.
pub trait Presenter: Send {
    fn present(&mut self, view: &WidgetView, scroll: Option<ScrollDirective>);
}

impl<F> Presenter for F
where
    F: FnMut(&WidgetView, Option<ScrollDirective>) + Send,
{
    fn present(&mut self, view: &WidgetView, scroll: Option<ScrollDirective>) {
        self(view, scroll)
    }
}

/// Nullable completion session, created on first use.
///
/// A failed creation leaves the slot empty so the next use retries.
#[derive(Default)]
pub struct SessionSlot {
    session: Option<Arc<dyn ChatSession>>,
}

impl SessionSlot {
    pub fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    pub fn ensure(
        &mut self,
        provider: &dyn LlmProvider,
        config: &SessionConfig,
    ) -> Option<Arc<dyn ChatSession>> {
        if let Some(session) = &self.session {
            return Some(session.clone());
        }

        match provider.open_session(config.clone()) {
            Ok(session) => {
                self.session = Some(session.clone());
                Some(session)
            }
            Err(error) => {
                tracing::error!(
                    provider_id = %provider.id(),
                    model_id = %config.model_id,
                    error = %error,
                    "failed to open completion session"
                );
                self.session = None;
                None
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.session = None;
    }
}

/// Event-driven owner of one widget instance.
///
/// All widget mutations happen on the caller's task; the only concurrency is the
/// single spawned completion call, whose result comes back over a channel.
pub struct ChatController<P> {
    widget: ChatWidget,
    scroll: ScrollManager,
    provider: Option<Arc<dyn LlmProvider>>,
    session_config: SessionConfig,
    session: SessionSlot,
    completion_tx: mpsc::UnboundedSender<CompletionFinished>,
    completion_rx: mpsc::UnboundedReceiver<CompletionFinished>,
    worker: Option<JoinHandle<()>>,
    presenter: P,
}

impl<P: Presenter> ChatController<P> {
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        session_config: SessionConfig,
        presenter: P,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            widget: ChatWidget::new(),
            scroll: ScrollManager::new(),
            provider,
            session_config,
            session: SessionSlot::default(),
            completion_tx,
            completion_rx,
            worker: None,
            presenter,
        }
    }

    /// Builds the provider from settings; without one every reply falls back.
    pub fn from_settings(settings: &ProviderSettings, presenter: P) -> Self {
        let provider = match settings.to_provider_config() {
            Some(config) => match create_provider(config) {
                Ok(provider) => {
                    tracing::info!(
                        provider_id = %provider.id(),
                        model_id = %settings.model().id,
                        "initialized completion provider"
                    );
                    Some(provider)
                }
                Err(error) => {
                    tracing::error!(error = %error, "failed to initialize completion provider");
                    None
                }
            },
            None => {
                tracing::warn!("no API key configured; chat replies will use the fallback text");
                None
            }
        };

        Self::new(provider, settings.session_config(), presenter)
    }

    pub fn widget(&self) -> &ChatWidget {
        &self.widget
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn has_session(&self) -> bool {
        self.session.is_ready()
    }

    pub fn handle(&mut self, command: Command) {
        let changed = match command {
            Command::Open => self.open(),
            Command::Close => self.widget.close(),
            Command::Toggle => {
                if self.widget.toggle() {
                    self.warm_session();
                }
                true
            }
            Command::EditDraft(text) => {
                if self.widget.draft() == text {
                    false
                } else {
                    self.widget.set_draft(text);
                    true
                }
            }
            Command::SubmitDraft => {
                let pending = self.widget.submit_draft();
                self.dispatch_send(pending)
            }
            Command::Send(text) => {
                let pending = self.widget.begin_send(text);
                self.dispatch_send(pending)
            }
            Command::Suggestion(index) => {
                let pending = self.widget.send_suggestion(index);
                self.dispatch_send(pending)
            }
            Command::Scroll(page) => self.widget.update_hint(&page, page.viewport),
            Command::Reset => self.reset(),
        };

        if changed {
            self.notify();
        }
    }

    /// Applies a resolved completion; stale ones are dropped by the widget.
    pub fn apply_completion(&mut self, completion: CompletionFinished) {
        if self.widget.finish_send(completion).is_some() {
            self.worker = None;
            self.notify();
        }
    }

    /// Waits for the in-flight completion, if any, and applies it.
    pub async fn settle(&mut self) {
        while self.widget.is_pending() {
            let Some(completion) = self.completion_rx.recv().await else {
                break;
            };
            self.apply_completion(completion);
        }
    }

    /// Serially processes UI commands and completions until the command channel closes.
    ///
    /// A reply still in flight when the channel closes is awaited and rendered.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.notify();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(completion) = self.completion_rx.recv() => self.apply_completion(completion),
            }
        }

        self.settle().await;

        tracing::debug!(
            turns = self.widget.transcript().len(),
            pending = self.widget.is_pending(),
            "chat controller shutting down"
        );
    }

    fn open(&mut self) -> bool {
        let changed = self.widget.open();
        if changed {
            self.warm_session();
        }
        changed
    }

    fn warm_session(&mut self) {
        if !self.session.is_ready() {
            let _ = self.ensure_session();
        }
    }

    fn reset(&mut self) -> bool {
        if !self.widget.reset() {
            return false;
        }

        // The service memory belongs to the discarded transcript.
        self.session.invalidate();
        self.scroll.reset();
        true
    }

    fn ensure_session(&mut self) -> Option<Arc<dyn ChatSession>> {
        let Some(provider) = self.provider.as_ref() else {
            tracing::warn!("no completion provider configured");
            return None;
        };
        self.session.ensure(provider.as_ref(), &self.session_config)
    }

    fn dispatch_send(&mut self, pending: Option<PendingSend>) -> bool {
        let Some(PendingSend { target, text }) = pending else {
            return false;
        };

        let Some(session) = self.ensure_session() else {
            // Routed through the channel so the pending state is rendered first.
            let _ = self.completion_tx.send(CompletionFinished::failed(
                target,
                "completion session unavailable",
            ));
            return true;
        };

        tracing::debug!(
            request_id = target.request_id.0,
            model_id = %session.model_id(),
            "dispatching completion request"
        );

        let completion_tx = self.completion_tx.clone();
        self.worker = Some(tokio::spawn(async move {
            let history_len = session.history_len().await;
            tracing::debug!(
                request_id = target.request_id.0,
                history_len,
                "session memory before request"
            );

            let completion = match session.send_message(&text).await {
                Ok(reply) => CompletionFinished::reply(target, reply),
                Err(error) => CompletionFinished::failed(target, error.to_string()),
            };

            if completion_tx.send(completion).is_err() {
                tracing::debug!(
                    request_id = target.request_id.0,
                    "widget dropped before completion landed"
                );
            }
        }));

        true
    }

    fn notify(&mut self) {
        let scroll = self.scroll.observe(&self.widget);
        let view = self.widget.view();
        self.presenter.present(&view, scroll);
    }
}

impl<P> Drop for ChatController<P> {
    fn drop(&mut self) {
        // Results are never applied to a widget that no longer exists.
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}
