//! Paraphrase actions and the state they produce.
//!
//! The controller owns the selection tracker and the result state. Each
//! action takes the single in-flight slot; the slot is emptied when the
//! completion is applied in [`ParaphraseController::poll`], whatever the
//! outcome, so "processing" is exactly "the slot is occupied".

use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, TryRecvError};
use log::{debug, error, info};

use crate::editor::Editor;
use crate::selection_tracker::{SelectionSpan, SelectionTracker, locate_first};
use crate::service::{ParaphraseService, ServiceError};
use crate::worker::{self, Dispatch};

/// A selection-scoped result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParaphrasePair {
    pub original: String,
    pub paraphrased: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// What the result pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayedResult<'a> {
    Pair(&'a ParaphrasePair),
    Document(&'a str),
    Empty,
}

/// Active results. A pair shadows the document result while present; a new
/// document result clears the pair, a new pair leaves the document result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultState {
    pair: Option<ParaphrasePair>,
    document: Option<String>,
}

impl ResultState {
    pub fn pair(&self) -> Option<&ParaphrasePair> {
        self.pair.as_ref()
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn displayed(&self) -> DisplayedResult<'_> {
        match (&self.pair, &self.document) {
            (Some(pair), _) => DisplayedResult::Pair(pair),
            (None, Some(document)) => DisplayedResult::Document(document),
            (None, None) => DisplayedResult::Empty,
        }
    }

    /// The paraphrased text currently on display, if any.
    pub fn displayed_paraphrase(&self) -> Option<&str> {
        match self.displayed() {
            DisplayedResult::Pair(pair) => Some(&pair.paraphrased),
            DisplayedResult::Document(document) => Some(document),
            DisplayedResult::Empty => None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("a paraphrase is already in progress")]
    Busy,

    #[error("Select some text to paraphrase first")]
    NoSelection,

    #[error("Please enter some text to paraphrase")]
    EmptyDocument,
}

#[derive(Debug)]
pub enum ActionOutcome {
    SelectionParaphrased(ParaphrasePair),
    DocumentParaphrased,
    Failed(ServiceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The pair's paraphrase replaced its original in the editor.
    ReplacedSelection,
    /// The document paraphrase replaced the whole editor content.
    ReplacedDocument,
    /// The pair's original text is no longer in the editor.
    OriginalMissing,
    NothingToApply,
}

enum Target {
    Selection(SelectionSpan),
    Document,
}

struct InFlight {
    target: Target,
    rx: Receiver<Result<String, ServiceError>>,
}

pub struct ParaphraseController {
    service: Arc<dyn ParaphraseService>,
    dispatch: Dispatch,
    tracker: SelectionTracker,
    results: ResultState,
    in_flight: Option<InFlight>,
}

impl ParaphraseController {
    pub fn new(
        service: Arc<dyn ParaphraseService>,
        tracker: SelectionTracker,
        dispatch: Dispatch,
    ) -> Self {
        Self {
            service,
            dispatch,
            tracker,
            results: ResultState::default(),
            in_flight: None,
        }
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut SelectionTracker {
        &mut self.tracker
    }

    pub fn results(&self) -> &ResultState {
        &self.results
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Paraphrases the active selection.
    pub fn paraphrase_selection(&mut self) -> Result<(), ActionError> {
        if self.is_processing() {
            return Err(ActionError::Busy);
        }
        let span = self.tracker.active().cloned().ok_or(ActionError::NoSelection)?;
        info!(
            "Paraphrasing selection {}..{} ({} chars)",
            span.start_offset,
            span.end_offset,
            span.text.chars().count()
        );
        let text = span.text.clone();
        self.start(Target::Selection(span), text);
        Ok(())
    }

    /// Paraphrases the whole document.
    pub fn paraphrase_document(&mut self, full_text: &str) -> Result<(), ActionError> {
        if self.is_processing() {
            return Err(ActionError::Busy);
        }
        if full_text.trim().is_empty() {
            return Err(ActionError::EmptyDocument);
        }
        info!(
            "Paraphrasing document ({} chars)",
            full_text.chars().count()
        );
        self.start(Target::Document, full_text.to_string());
        Ok(())
    }

    fn start(&mut self, target: Target, text: String) {
        let service = Arc::clone(&self.service);
        let rx = worker::run(self.dispatch, "paraphrase", move || {
            service.paraphrase(&text)
        });
        self.in_flight = Some(InFlight { target, rx });
    }

    /// Applies a finished request, if there is one.
    pub fn poll(&mut self) -> Option<ActionOutcome> {
        let result = match self.in_flight.as_ref()?.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(ServiceError::WorkerLost),
        };
        self.finish(result)
    }

    /// Blocks up to `timeout` for the in-flight request to finish.
    pub fn wait(&mut self, timeout: Duration) -> Option<ActionOutcome> {
        let result = match self.in_flight.as_ref()?.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Err(ServiceError::WorkerLost),
        };
        self.finish(result)
    }

    fn finish(&mut self, result: Result<String, ServiceError>) -> Option<ActionOutcome> {
        let InFlight { target, .. } = self.in_flight.take()?;

        let outcome = match (target, result) {
            (Target::Selection(span), Ok(paraphrased)) => {
                let pair = ParaphrasePair {
                    original: span.text,
                    paraphrased,
                    start_offset: span.start_offset,
                    end_offset: span.end_offset,
                };
                self.results.pair = Some(pair.clone());
                self.tracker.clear();
                debug!("Selection paraphrase stored");
                ActionOutcome::SelectionParaphrased(pair)
            }
            (Target::Document, Ok(paraphrased)) => {
                self.results.document = Some(paraphrased);
                self.results.pair = None;
                debug!("Document paraphrase stored");
                ActionOutcome::DocumentParaphrased
            }
            (_, Err(e)) => {
                error!("Paraphrase failed: {e}");
                ActionOutcome::Failed(e)
            }
        };
        Some(outcome)
    }

    /// Writes the displayed result back into the editor.
    pub fn apply_result(&self, editor: &mut Editor) -> ApplyOutcome {
        match self.results.displayed() {
            DisplayedResult::Empty => ApplyOutcome::NothingToApply,
            DisplayedResult::Document(document) => {
                editor.set_text(document);
                ApplyOutcome::ReplacedDocument
            }
            DisplayedResult::Pair(pair) => {
                let content = editor.text();
                let recorded: String = content
                    .chars()
                    .skip(pair.start_offset)
                    .take(pair.end_offset - pair.start_offset)
                    .collect();
                let range = if recorded == pair.original {
                    Some((pair.start_offset, pair.end_offset))
                } else {
                    locate_first(&content, &pair.original)
                };
                match range {
                    Some((start, end)) if editor.replace_range(start, end, &pair.paraphrased) => {
                        ApplyOutcome::ReplacedSelection
                    }
                    _ => ApplyOutcome::OriginalMissing,
                }
            }
        }
    }
}
