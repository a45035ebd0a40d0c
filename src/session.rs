//! The upload → generate → result wizard.
//!
//! [`Session`] owns the two input images and the current [`SessionState`].
//! It changes only through the transition methods below; callers never
//! assign state directly.
//!
//! Generation is split in two halves so an event-loop front end can release
//! its borrow of the session while the call is in flight:
//!
//! 1. [`Session::begin_generation`] validates the inputs, enters
//!    `Generating` and hands out a [`PendingGeneration`] with a ticket.
//! 2. [`Session::complete_generation`] applies the outcome, but only for the
//!    ticket that is still outstanding. A reset in between makes the ticket
//!    stale and its outcome is dropped.
//!
//! [`Session::generate`] runs both halves against a [`GenerationClient`].

use crate::error::{ErrorKind, FlagPortraitError, Locale, Result};
use crate::generation::{GenerationClient, GenerationRequest};
use crate::image::{encode_file, ImageAsset};
use std::path::{Path, PathBuf};

/// File name used when the result is downloaded.
pub const DEFAULT_DOWNLOAD_NAME: &str = "national_pride_portrait.png";

/// The wizard's current step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing uploaded.
    #[default]
    Empty,
    /// Exactly one of the two images uploaded.
    PartiallyReady,
    /// Both images uploaded; generation may start.
    Ready,
    /// A generation call is in flight.
    Generating,
    /// The service returned a portrait.
    Succeeded(ImageAsset),
    /// The generation call failed.
    Failed(ErrorKind),
}

impl SessionState {
    /// Returns a short, stable name for logs and JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::PartiallyReady => "partially_ready",
            Self::Ready => "ready",
            Self::Generating => "generating",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Which of the two inputs an upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The personal portrait.
    Person,
    /// The national flag.
    Flag,
}

/// Whether an action changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Transition {
    /// The action was applied.
    Applied,
    /// The action is not valid in the current state and was dropped.
    Ignored,
}

/// Identifies one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// A generation call the caller must run and then report back.
#[derive(Debug)]
#[must_use = "report the outcome with Session::complete_generation"]
pub struct PendingGeneration {
    /// Ticket to pass to [`Session::complete_generation`].
    pub ticket: Ticket,
    /// The inputs for the call.
    pub request: GenerationRequest,
}

/// A result ready to be written outside the session.
#[derive(Debug, Clone)]
pub struct Download {
    /// Suggested file name.
    pub file_name: &'static str,
    /// The generated portrait.
    pub image: ImageAsset,
}

impl Download {
    /// Writes the image into `dir` under [`Download::file_name`].
    pub fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name);
        self.save_as(&path)?;
        Ok(path)
    }

    /// Writes the image to an explicit path.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.image.to_bytes()?)?;
        Ok(())
    }
}

/// State machine for one portrait session.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    person: Option<ImageAsset>,
    flag: Option<ImageAsset>,
    notice: Option<ErrorKind>,
    next_ticket: u64,
    in_flight: Option<Ticket>,
}

impl Session {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the uploaded portrait, if any.
    pub fn person(&self) -> Option<&ImageAsset> {
        self.person.as_ref()
    }

    /// Returns the uploaded flag, if any.
    pub fn flag(&self) -> Option<&ImageAsset> {
        self.flag.as_ref()
    }

    /// Returns the generated portrait once the session has succeeded.
    pub fn result(&self) -> Option<&ImageAsset> {
        match &self.state {
            SessionState::Succeeded(image) => Some(image),
            _ => None,
        }
    }

    /// Returns true if a generate action would start a call.
    pub fn can_generate(&self) -> bool {
        matches!(self.state, SessionState::Ready | SessionState::Failed(_))
            && self.person.is_some()
            && self.flag.is_some()
    }

    /// Returns true while a call is outstanding.
    pub fn is_generating(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Returns true if uploads are currently refused.
    ///
    /// Once a call has started, a reset is required before new uploads.
    pub fn uploads_locked(&self) -> bool {
        matches!(
            self.state,
            SessionState::Generating | SessionState::Succeeded(_) | SessionState::Failed(_)
        )
    }

    /// Returns the error to show the user, if any.
    pub fn error(&self) -> Option<ErrorKind> {
        match self.state {
            SessionState::Failed(kind) => Some(kind),
            _ => self.notice,
        }
    }

    /// Returns the localized message for [`Session::error`].
    pub fn error_message(&self, locale: Locale) -> Option<&'static str> {
        self.error().map(|kind| kind.user_message(locale))
    }

    /// Stores an encoded image in `slot`, replacing any earlier one.
    ///
    /// Ignored while uploads are locked. An empty asset is refused and
    /// reported as an encoding problem.
    pub fn upload(&mut self, slot: Slot, asset: ImageAsset) -> Transition {
        if self.uploads_locked() {
            tracing::debug!(state = self.state.name(), ?slot, "upload ignored");
            return Transition::Ignored;
        }
        if asset.is_empty() {
            self.notice = Some(ErrorKind::Encoding);
            return Transition::Ignored;
        }

        // The superseded asset is dropped here
        match slot {
            Slot::Person => self.person = Some(asset),
            Slot::Flag => self.flag = Some(asset),
        }
        self.notice = None;
        self.state = match (&self.person, &self.flag) {
            (Some(_), Some(_)) => SessionState::Ready,
            (None, None) => SessionState::Empty,
            _ => SessionState::PartiallyReady,
        };
        tracing::debug!(state = self.state.name(), ?slot, "image uploaded");
        Transition::Applied
    }

    /// Encodes the file at `path` and uploads it into `slot`.
    ///
    /// On an encoding failure the previous image and state are kept, the
    /// failure is surfaced through [`Session::error`], and the error returned.
    pub async fn upload_file(
        &mut self,
        slot: Slot,
        path: impl AsRef<Path>,
    ) -> Result<Transition> {
        if self.uploads_locked() {
            tracing::debug!(state = self.state.name(), ?slot, "upload ignored");
            return Ok(Transition::Ignored);
        }

        match encode_file(path).await {
            Ok(asset) => Ok(self.upload(slot, asset)),
            Err(e) => {
                self.notice = Some(e.kind());
                Err(e)
            }
        }
    }

    /// Starts a generation call.
    ///
    /// Returns `Ok(None)` while a call is already in flight or after success;
    /// the action is dropped, not queued. Without both images no call is
    /// started, the state is kept, and [`FlagPortraitError::MissingImages`]
    /// is returned.
    pub fn begin_generation(&mut self) -> Result<Option<PendingGeneration>> {
        match self.state {
            SessionState::Generating | SessionState::Succeeded(_) => {
                tracing::debug!(state = self.state.name(), "generate ignored");
                return Ok(None);
            }
            SessionState::Empty | SessionState::PartiallyReady => {
                self.notice = Some(ErrorKind::MissingImages);
                return Err(FlagPortraitError::MissingImages);
            }
            SessionState::Ready | SessionState::Failed(_) => {}
        }

        let request = match GenerationRequest::new(self.person.as_ref(), self.flag.as_ref()) {
            Ok(request) => request,
            Err(e) => {
                self.notice = Some(e.kind());
                return Err(e);
            }
        };

        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.in_flight = Some(ticket);
        self.notice = None;
        self.state = SessionState::Generating;
        tracing::debug!(ticket = ticket.0, "generation started");

        Ok(Some(PendingGeneration { ticket, request }))
    }

    /// Applies the outcome of the call identified by `ticket`.
    ///
    /// Outcomes for tickets that are no longer outstanding are ignored.
    pub fn complete_generation(
        &mut self,
        ticket: Ticket,
        outcome: Result<ImageAsset>,
    ) -> Transition {
        let outcome = outcome.map_err(|e| {
            tracing::debug!(ticket = ticket.0, "generation error: {e}");
            e.kind()
        });
        self.finish(ticket, outcome)
    }

    fn finish(
        &mut self,
        ticket: Ticket,
        outcome: std::result::Result<ImageAsset, ErrorKind>,
    ) -> Transition {
        if self.in_flight != Some(ticket) {
            tracing::debug!(ticket = ticket.0, "discarding stale generation outcome");
            return Transition::Ignored;
        }
        self.in_flight = None;

        self.state = match outcome {
            Ok(image) => {
                tracing::debug!(ticket = ticket.0, "generation succeeded");
                SessionState::Succeeded(image)
            }
            Err(kind) => {
                tracing::warn!(ticket = ticket.0, %kind, "generation failed");
                SessionState::Failed(kind)
            }
        };
        Transition::Applied
    }

    /// Runs one generation call against `client` and applies its outcome.
    ///
    /// On failure the session moves to `Failed` and the client's error is
    /// returned as well.
    pub async fn generate<C>(&mut self, client: &C) -> Result<Transition>
    where
        C: GenerationClient + ?Sized,
    {
        let Some(pending) = self.begin_generation()? else {
            return Ok(Transition::Ignored);
        };

        let request = &pending.request;
        match client.generate(&request.person, &request.flag).await {
            Ok(image) => Ok(self.finish(pending.ticket, Ok(image))),
            Err(e) => {
                tracing::debug!(ticket = pending.ticket.0, "generation error: {e}");
                let _ = self.finish(pending.ticket, Err(e.kind()));
                Err(e)
            }
        }
    }

    /// Returns the result for export, if the session has succeeded.
    ///
    /// Does not change the state.
    pub fn download(&self) -> Option<Download> {
        self.result().map(|image| Download {
            file_name: DEFAULT_DOWNLOAD_NAME,
            image: image.clone(),
        })
    }

    /// Discards both images and any result, returning to `Empty`.
    ///
    /// An in-flight call is abandoned; its outcome will be ignored.
    pub fn reset(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            tracing::debug!(ticket = ticket.0, "abandoning in-flight generation");
        }
        self.person = None;
        self.flag = None;
        self.notice = None;
        self.state = SessionState::Empty;
    }
}
