//! Clipboard link sources.

use arboard::Clipboard;
use gatekeeper::{LinkSource, MemoryLinkSource};

/// Link source for the running agent.
pub enum AgentClipboard {
    /// The desktop clipboard.
    System,
    /// Process-local clipboard, for headless runs.
    Memory(MemoryLinkSource),
}

impl AgentClipboard {
    pub fn memory() -> Self {
        AgentClipboard::Memory(MemoryLinkSource::new())
    }

    /// Put `text` on the clipboard.
    pub fn copy(&self, text: &str) -> anyhow::Result<()> {
        match self {
            AgentClipboard::System => {
                let mut clipboard = Clipboard::new()?;
                clipboard.set_text(text.to_owned())?;
            }
            AgentClipboard::Memory(source) => source.set_text(text),
        }
        Ok(())
    }
}

impl LinkSource for AgentClipboard {
    fn read_text(&self) -> Option<String> {
        match self {
            AgentClipboard::System => match Clipboard::new().and_then(|mut c| c.get_text()) {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::debug!(error = %e, "Clipboard has no readable text");
                    None
                }
            },
            AgentClipboard::Memory(source) => source.read_text(),
        }
    }

    fn clear(&self) {
        match self {
            AgentClipboard::System => {
                if let Err(e) = Clipboard::new().and_then(|mut c| c.clear()) {
                    tracing::warn!(error = %e, "Failed to clear clipboard");
                }
            }
            AgentClipboard::Memory(source) => source.clear(),
        }
    }
}
