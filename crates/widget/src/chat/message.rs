/// Author of one transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    User,
    Assistant,
}

/// Position of a turn inside the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnIndex(pub usize);

impl TurnIndex {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }
}

/// One immutable message in the visible conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text)
    }
}

/// Append-only turn log; insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Starts a transcript whose first turn is the assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::assistant(greeting)],
        }
    }

    pub fn push(&mut self, turn: Turn) -> TurnIndex {
        self.turns.push(turn);
        TurnIndex::new(self.turns.len() - 1)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, index: TurnIndex) -> Option<&Turn> {
        self.turns.get(index.0)
    }

    pub fn last(&self) -> Option<(TurnIndex, &Turn)> {
        self.turns
            .last()
            .map(|turn| (TurnIndex::new(self.turns.len() - 1), turn))
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Identifier of one send; never reused within a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Routing key used to reject completions that no longer belong to the active send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTarget {
    pub request_id: RequestId,
}

impl RequestTarget {
    pub const fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }
}

/// Lifecycle of the single completion request a widget may have outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Sending(RequestTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTransition {
    Start(RequestTarget),
    Complete(RequestTarget),
    Fail(RequestTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTransitionRejection {
    AlreadySending {
        active: RequestTarget,
        attempted: RequestTarget,
    },
    NoActiveRequest,
    TargetMismatch {
        active: RequestTarget,
        attempted: RequestTarget,
    },
}

pub type RequestTransitionResult = Result<RequestState, RequestTransitionRejection>;

impl RequestState {
    pub fn active_target(&self) -> Option<RequestTarget> {
        match self {
            Self::Sending(target) => Some(*target),
            Self::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Sending(_))
    }

    /// Applies one transition deterministically.
    ///
    /// Starting is only legal from `Idle`. Terminal transitions must name the
    /// active target exactly.
    pub fn apply(&self, transition: RequestTransition) -> RequestTransitionResult {
        match transition {
            RequestTransition::Start(target) => match self {
                Self::Sending(active) => Err(RequestTransitionRejection::AlreadySending {
                    active: *active,
                    attempted: target,
                }),
                Self::Idle => Ok(Self::Sending(target)),
            },
            RequestTransition::Complete(target) | RequestTransition::Fail(target) => {
                self.apply_finish(target)
            }
        }
    }

    fn apply_finish(&self, target: RequestTarget) -> RequestTransitionResult {
        match self {
            Self::Sending(active) if *active == target => Ok(Self::Idle),
            Self::Sending(active) => Err(RequestTransitionRejection::TargetMismatch {
                active: *active,
                attempted: target,
            }),
            Self::Idle => Err(RequestTransitionRejection::NoActiveRequest),
        }
    }
}
