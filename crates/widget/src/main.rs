use smartcare::chat::{
    ChatController, Command, Landmark, LandmarkLayout, Presenter, ScrollDirective, Speaker,
    Viewport, WidgetView,
};
use smartcare::content::{INPUT_PLACEHOLDER, SUGGESTIONS};
use smartcare::settings::SettingsStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

const VIEWPORT_HEIGHT: f32 = 800.0;
const COMMAND_HELP: &str = "/open /close /toggle /chip N /scroll Y /reset /quit";

/// Prints widget snapshots to stdout, emitting only what changed since the last one.
#[derive(Default)]
struct TerminalPresenter {
    printed_turns: usize,
    open: bool,
    pending: bool,
    hint: Option<&'static str>,
}

impl Presenter for TerminalPresenter {
    fn present(&mut self, view: &WidgetView, scroll: Option<ScrollDirective>) {
        if view.open != self.open {
            println!("{}", if view.open { "[採用ノート open]" } else { "[closed]" });
            if view.open {
                for (index, suggestion) in SUGGESTIONS.iter().enumerate() {
                    println!("  /chip {index}  {suggestion}");
                }
            }
            self.open = view.open;
        }

        if view.turns.len() < self.printed_turns {
            self.printed_turns = 0;
        }
        for turn in &view.turns[self.printed_turns..] {
            let speaker = match turn.speaker {
                Speaker::User => "you",
                Speaker::Assistant => "アイ",
            };
            println!("{speaker}> {}", turn.text);
        }
        self.printed_turns = view.turns.len();

        if view.pending && !self.pending {
            println!("アイ> ...");
        }
        self.pending = view.pending;

        if view.hint != self.hint {
            if let Some(hint) = view.hint {
                println!("(hint) {hint}");
            }
            self.hint = view.hint;
        }

        if let Some(scroll) = scroll {
            println!("{}", describe_scroll(scroll));
        }
    }
}

fn describe_scroll(scroll: ScrollDirective) -> String {
    match scroll {
        ScrollDirective::ToEnd => "(scroll) end".to_string(),
        ScrollDirective::ToTurnStart(index) => format!("(scroll) turn {} start", index.0),
    }
}

enum Input {
    Command(Command),
    Quit,
}

/// Document layout standing in for the landing page sections.
fn landing_page() -> LandmarkLayout {
    LandmarkLayout::new()
        .with_section(Landmark::Qa, 3600.0, 900.0)
        .with_section(Landmark::Salary, 4500.0, 1100.0)
        .with_section(Landmark::Flow, 6400.0, 900.0)
}

fn parse_line(line: &str, page: &LandmarkLayout) -> Option<Input> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Input::Command(Command::Send(line.to_string())));
    };

    let mut parts = rest.split_whitespace();
    let command = match (parts.next()?, parts.next()) {
        ("quit", _) => return Some(Input::Quit),
        ("open", _) => Command::Open,
        ("close", _) => Command::Close,
        ("toggle", _) => Command::Toggle,
        ("reset", _) => Command::Reset,
        ("chip", Some(index)) => Command::Suggestion(index.parse().ok()?),
        ("scroll", Some(offset)) => {
            let offset = offset.parse::<f32>().ok()?;
            Command::Scroll(page.sample(offset, Viewport::new(VIEWPORT_HEIGHT)))
        }
        _ => return None,
    };
    Some(Input::Command(command))
}

/// Forwards stdin to the controller. `/quit` is signalled separately so it can
/// abandon a reply that end of input would wait for.
async fn read_commands(
    command_tx: mpsc::UnboundedSender<Command>,
    quit_tx: oneshot::Sender<()>,
) {
    let page = landing_page();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{INPUT_PLACEHOLDER}  ({COMMAND_HELP})");
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                tracing::error!(error = %error, "failed to read stdin");
                break;
            }
        };

        match parse_line(&line, &page) {
            Some(Input::Command(command)) => {
                if command_tx.send(command).is_err() {
                    break;
                }
            }
            Some(Input::Quit) => {
                let _ = quit_tx.send(());
                return;
            }
            None => println!("unknown command: {line}"),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let store = SettingsStore::load();
    let settings = store.settings().as_ref().clone().with_process_environment();
    tracing::info!(
        config_path = ?store.config_path(),
        model_id = %settings.model().id,
        has_api_key = settings.is_valid(),
        "loaded chat settings"
    );

    let controller = ChatController::from_settings(&settings, TerminalPresenter::default());
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (quit_tx, quit_rx) = oneshot::channel();
    let reader = tokio::spawn(read_commands(command_tx, quit_tx));

    tokio::select! {
        _ = controller.run(command_rx) => {}
        Ok(()) = quit_rx => tracing::debug!("quit requested; abandoning any pending reply"),
    }
    reader.abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_sent() {
        let page = landing_page();
        assert!(matches!(
            parse_line("見学できますか？", &page),
            Some(Input::Command(Command::Send(text))) if text == "見学できますか？"
        ));
    }

    #[test]
    fn scroll_samples_landing_page() {
        let page = landing_page();
        let Some(Input::Command(Command::Scroll(sample))) = parse_line("/scroll 4400", &page)
        else {
            panic!("expected scroll command");
        };
        assert_eq!(sample.viewport, Viewport::new(VIEWPORT_HEIGHT));
        assert_eq!(
            smartcare::chat::contextual_hint(&sample, sample.viewport),
            Some(Landmark::Salary.message())
        );
    }

    #[test]
    fn help_lists_every_command() {
        for command in ["/open", "/close", "/toggle", "/chip", "/scroll", "/reset", "/quit"] {
            assert!(COMMAND_HELP.contains(command), "missing {command}");
        }
    }

    #[test]
    fn scroll_directives_are_printable() {
        assert_eq!(describe_scroll(ScrollDirective::ToEnd), "(scroll) end");
        assert_eq!(
            describe_scroll(ScrollDirective::ToTurnStart(smartcare::chat::TurnIndex::new(2))),
            "(scroll) turn 2 start"
        );
    }

    #[test]
    fn malformed_commands_are_rejected() {
        let page = landing_page();
        assert!(parse_line("/chip two", &page).is_none());
        assert!(parse_line("/dance", &page).is_none());
        assert!(matches!(parse_line("/quit", &page), Some(Input::Quit)));
    }
}
