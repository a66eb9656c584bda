use crate::app::{EstuaryError, Result};

/// Turns source markup into the plain text stored for entries.
pub trait TextConverter: Send + Sync {
    fn convert(&self, markup: &str) -> Result<String>;
}

/// Line width handed to html2text; wide enough that paragraphs stay on one
/// line so marker matching works per paragraph.
const RENDER_WIDTH: usize = 10_000;

#[derive(Debug, Clone, Default)]
pub struct Html2TextConverter;

impl Html2TextConverter {
    pub fn new() -> Self {
        Self
    }
}

impl TextConverter for Html2TextConverter {
    fn convert(&self, markup: &str) -> Result<String> {
        if markup.trim().is_empty() {
            return Ok(String::new());
        }

        let text = html2text::from_read(markup.as_bytes(), RENDER_WIDTH)
            .map_err(|e| EstuaryError::Conversion(e.to_string()))?;

        Ok(text.trim().to_string())
    }
}
