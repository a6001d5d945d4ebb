use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clipboard_rs::{common::RustImage, Clipboard, ClipboardContext, ContentFormat, RustImageData};

use clipd_core::snapshot::RawContent;

fn map_clipboard_err<T>(
    result: std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>,
) -> Result<T> {
    result.map_err(|e| anyhow!(e))
}

/// Thin wrapper over the OS clipboard used both by the watch drivers (read
/// side) and by `recall` (write side).
pub struct SystemClipboard {
    ctx: ClipboardContext,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let ctx = ClipboardContext::new().map_err(|e| anyhow!(e))?;
        Ok(Self { ctx })
    }

    /// Read the current clipboard content.
    ///
    /// Text wins when both text and image formats are offered; images are
    /// normalized to PNG bytes. `Ok(None)` means the clipboard holds nothing
    /// this manager understands (or nothing at all).
    pub fn read_raw(&mut self) -> Result<Option<RawContent>> {
        if self.ctx.has(ContentFormat::Text) {
            if let Ok(text) = self.ctx.get_text() {
                if !text.is_empty() {
                    return Ok(Some(RawContent::Text(text)));
                }
            }
        }

        if self.ctx.has(ContentFormat::Image) {
            if let Ok(img) = self.ctx.get_image() {
                if let Ok(png) = img.to_png() {
                    return Ok(Some(RawContent::ImagePng(png.get_bytes().to_vec())));
                }
            }
        }

        Ok(None)
    }

    pub fn write_text(&mut self, text: &str) -> Result<()> {
        map_clipboard_err(self.ctx.set_text(text.to_string()))
    }

    /// Put a cached PNG back on the clipboard.
    pub fn write_image_file(&mut self, path: &Path) -> Result<()> {
        let bytes = fs::read(path)
            .with_context(|| format!("reading cached image {}", path.display()))?;
        let img = RustImageData::from_bytes(&bytes).map_err(|e| anyhow!(e))?;
        map_clipboard_err(self.ctx.set_image(img))
    }
}
