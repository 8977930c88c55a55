use std::{
    fmt::Write as _,
    io::{self, Write},
    ops::Range,
};

use client_core::{
    render::{Glyph, Rect},
    Framebuffer, Rgb, Surface,
};

/// Presents a [`Framebuffer`] on stdout, two pixel rows per text row.
/// Only text rows touched since the last `present` are rewritten.
pub struct AnsiSurface {
    frame: Framebuffer,
    needs_clear: bool,
    dirty: Option<Range<u32>>,
}

impl Default for AnsiSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl AnsiSurface {
    pub fn new() -> Self {
        Self {
            frame: Framebuffer::new(0, 0),
            needs_clear: true,
            dirty: None,
        }
    }

    fn text_rows(&self) -> u32 {
        self.frame.height().div_ceil(2)
    }

    fn mark(&mut self, rect: Rect) {
        let start = rect.y.min(self.frame.height());
        let end = rect.y.saturating_add(rect.height).min(self.frame.height());
        if start >= end {
            return;
        }
        self.dirty = Some(match self.dirty.take() {
            Some(rows) => rows.start.min(start)..rows.end.max(end),
            None => start..end,
        });
    }

    /// Escape sequence for everything pending; empty when nothing changed.
    fn take_frame(&mut self) -> String {
        let mut out = String::new();
        let rows = if self.needs_clear {
            self.needs_clear = false;
            self.dirty = None;
            out.push_str("\x1b[H\x1b[2J");
            0..self.text_rows()
        } else {
            match self.dirty.take() {
                Some(pixels) => pixels.start / 2..pixels.end.div_ceil(2),
                None => return out,
            }
        };

        for row in rows {
            let _ = write!(out, "\x1b[{};1H", row + 1);
            for x in 0..self.frame.width() {
                let top = self.frame.pixel(x, row * 2).unwrap_or(Rgb(0, 0, 0));
                let bottom = self.frame.pixel(x, row * 2 + 1).unwrap_or(Rgb(0, 0, 0));
                let _ = write!(
                    out,
                    "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m\u{2580}",
                    top.0, top.1, top.2, bottom.0, bottom.1, bottom.2
                );
            }
            out.push_str("\x1b[0m");
        }
        // Park the cursor under the board so log lines and input echo do not overwrite it.
        let _ = write!(out, "\x1b[{};1H", self.text_rows() + 1);
        out
    }
}

impl Surface for AnsiSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.frame.resize(width, height);
        self.needs_clear = true;
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.frame.fill_rect(rect, color);
        self.mark(rect);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb) {
        self.frame.stroke_rect(rect, color);
        self.mark(rect);
    }

    fn draw_glyph(&mut self, rect: Rect, glyph: Glyph, color: Rgb) {
        self.frame.draw_glyph(rect, glyph, color);
        self.mark(rect);
    }

    fn present(&mut self) {
        let frame = self.take_frame();
        if frame.is_empty() {
            return;
        }
        let mut stdout = io::stdout().lock();
        if let Err(err) = stdout
            .write_all(frame.as_bytes())
            .and_then(|_| stdout.flush())
        {
            tracing::warn!(error = %err, "failed to present board");
        }
    }
}
