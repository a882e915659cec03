//! Turns raw editor selection signals into a located, anchored span.
//!
//! The tracker never looks at the editor directly. The editor publishes a
//! [`SelectionSnapshot`] whenever its selection (or the on-screen position of
//! it) changes, the app publishes pointer-down events, and the tracker reads
//! both from its [`Subscription`]. Offsets are resolved against the content
//! passed to [`SelectionTracker::pump`] with a first-match search, so a
//! selection of a repeated phrase always maps to its first occurrence.

use log::debug;
use ratatui::layout::{Position, Rect};

use crate::feed::{Feed, Subscription};

/// What the editor reports about its selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub text: String,
    pub collapsed: bool,
    pub inside_region: bool,
    /// Screen cells covered by the selection, clipped to `region`.
    pub bounds: Rect,
    /// Screen area of the editable region.
    pub region: Rect,
}

impl SelectionSnapshot {
    pub fn empty(region: Rect) -> Self {
        Self {
            text: String::new(),
            collapsed: true,
            inside_region: true,
            bounds: Rect::default(),
            region,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionSignal {
    Changed(SelectionSnapshot),
    PointerDown { column: u16, row: u16 },
}

/// An accepted selection: text, character offsets into the content, and the
/// screen cell the paraphrase button hangs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSpan {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub anchor_x: u16,
    pub anchor_y: u16,
}

pub struct SelectionTracker {
    subscription: Subscription<SelectionSignal>,
    active: Option<SelectionSpan>,
    region: Option<Rect>,
    popover: Option<Rect>,
}

impl SelectionTracker {
    pub fn attach(feed: &Feed<SelectionSignal>) -> Self {
        Self {
            subscription: feed.subscribe(),
            active: None,
            region: None,
            popover: None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.subscription.has_pending()
    }

    /// Applies every queued signal. Returns true if the active span changed.
    pub fn pump(&mut self, content: &str) -> bool {
        let before = self.active.clone();
        for signal in self.subscription.drain() {
            self.handle(signal, content);
        }
        before != self.active
    }

    pub fn handle(&mut self, signal: SelectionSignal, content: &str) {
        match signal {
            SelectionSignal::Changed(snapshot) => {
                self.region = Some(snapshot.region);
                self.active = span_from_snapshot(&snapshot, content);
            }
            SelectionSignal::PointerDown { column, row } => {
                let point = Position::new(column, row);
                let in_region = self.region.is_some_and(|r| r.contains(point));
                let in_popover = self.popover.is_some_and(|r| r.contains(point));
                if !in_region && !in_popover && self.active.is_some() {
                    debug!("Pointer down outside editor at ({column}, {row}), dismissing selection");
                    self.active = None;
                }
            }
        }
    }

    pub fn active(&self) -> Option<&SelectionSpan> {
        self.active.as_ref()
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Where the paraphrase button was last drawn, for click-outside checks.
    pub fn set_popover_area(&mut self, area: Option<Rect>) {
        self.popover = area;
    }

    pub fn popover_area(&self) -> Option<Rect> {
        self.popover
    }
}

fn span_from_snapshot(snapshot: &SelectionSnapshot, content: &str) -> Option<SelectionSpan> {
    if snapshot.collapsed || !snapshot.inside_region || snapshot.text.trim().is_empty() {
        return None;
    }

    let Some((start_offset, end_offset)) = locate_first(content, &snapshot.text) else {
        debug!(
            "Selected text ({} chars) not found in editor content, ignoring",
            snapshot.text.chars().count()
        );
        return None;
    };

    let (anchor_x, anchor_y) = anchor_below(snapshot.bounds);
    Some(SelectionSpan {
        text: snapshot.text.clone(),
        start_offset,
        end_offset,
        anchor_x,
        anchor_y,
    })
}

/// Character offsets of the first occurrence of `needle` in `content`.
pub fn locate_first(content: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    let byte_start = content.find(needle)?;
    let start = content[..byte_start].chars().count();
    Some((start, start + needle.chars().count()))
}

/// Horizontally centred on `bounds`, on the row just below it.
pub fn anchor_below(bounds: Rect) -> (u16, u16) {
    (bounds.x + bounds.width / 2, bounds.bottom())
}
