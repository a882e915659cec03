use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::debug;

/// Destination for "copy" actions.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard. A fresh handle is opened per copy so a clipboard
/// that is unavailable at startup does not disable copying for the session.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("Failed to access clipboard")?;
        clipboard
            .set_text(text.to_string())
            .context("Failed to copy to clipboard")?;
        debug!("Copied {} chars to clipboard", text.chars().count());
        Ok(())
    }
}

/// Records copied text instead of touching the system clipboard.
///
/// Clones share one record, so a test can keep a handle after boxing a clone
/// into the app.
#[derive(Debug, Clone, Default)]
pub struct MockClipboard {
    copied: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            copied: Arc::default(),
            fail: true,
        }
    }

    pub fn copied(&self) -> Vec<String> {
        self.copied
            .lock()
            .map(|copied| copied.clone())
            .unwrap_or_default()
    }
}

impl ClipboardSink for MockClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.fail {
            anyhow::bail!("clipboard unavailable");
        }
        self.copied
            .lock()
            .map_err(|_| anyhow::anyhow!("clipboard record poisoned"))?
            .push(text.to_string());
        Ok(())
    }
}
