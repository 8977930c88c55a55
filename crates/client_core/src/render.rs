use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use shared::domain::{BoardView, Cell, Role};
use tracing::{debug, trace};

use crate::error::ClientError;

pub const MIN_CELL_PX: u32 = 3;
/// Keeps `side_px` of the largest board well inside `u32` and the framebuffer small.
pub const MAX_CELL_PX: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl FromStr for Rgb {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ClientError::InvalidColor(raw.to_string());
        let hex = raw.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    Piece(Role),
    Target,
}

pub trait Surface {
    fn resize(&mut self, width: u32, height: u32);
    fn fill_rect(&mut self, rect: Rect, color: Rgb);
    fn stroke_rect(&mut self, rect: Rect, color: Rgb);
    fn draw_glyph(&mut self, rect: Rect, glyph: Glyph, color: Rgb);
    fn present(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Rgb,
    pub light: Rgb,
    pub dark: Rgb,
    pub grid: Rgb,
    pub red: Rgb,
    pub blue: Rgb,
    pub target: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb(0x1b, 0x1b, 0x1f),
            light: Rgb(0xee, 0xee, 0xd2),
            dark: Rgb(0xb5, 0xb5, 0xa0),
            grid: Rgb(0x44, 0x44, 0x44),
            red: Rgb(0xff, 0x4d, 0x4f),
            blue: Rgb(0x4d, 0xa6, 0xff),
            target: Rgb(0xff, 0x98, 0x00),
        }
    }
}

impl Palette {
    pub fn piece(&self, role: Role) -> Rgb {
        match role {
            Role::R => self.red,
            Role::B => self.blue,
        }
    }
}

/// Pixel layout of a `size x size` board; neighbouring cells share their border line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub size: u32,
    pub cell_px: u32,
}

impl Geometry {
    pub fn side_px(&self) -> u32 {
        self.size * self.cell_px + 1
    }

    pub fn cell_rect(&self, cell: Cell) -> Rect {
        Rect::new(
            cell.x * self.cell_px,
            cell.y * self.cell_px,
            self.cell_px + 1,
            self.cell_px + 1,
        )
    }

    pub fn interior(&self, cell: Cell) -> Rect {
        let outer = self.cell_rect(cell);
        Rect::new(outer.x + 1, outer.y + 1, self.cell_px - 1, self.cell_px - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repaint {
    Skipped,
    Full,
    Cells(usize),
}

pub struct IncrementalRenderer<S> {
    surface: Option<S>,
    palette: Palette,
    cell_px: u32,
    drawn: Option<Geometry>,
}

impl<S: Surface> IncrementalRenderer<S> {
    pub fn new(palette: Palette, cell_px: u32) -> Self {
        Self {
            surface: None,
            palette,
            cell_px: cell_px.clamp(MIN_CELL_PX, MAX_CELL_PX),
            drawn: None,
        }
    }

    pub fn with_surface(palette: Palette, cell_px: u32, surface: S) -> Self {
        let mut renderer = Self::new(palette, cell_px);
        renderer.attach_surface(surface);
        renderer
    }

    pub fn attach_surface(&mut self, surface: S) {
        self.surface = Some(surface);
        self.drawn = None;
    }

    pub fn detach_surface(&mut self) -> Option<S> {
        self.drawn = None;
        self.surface.take()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn geometry_for(&self, view: &BoardView) -> Geometry {
        Geometry {
            size: view.size,
            cell_px: self.cell_px,
        }
    }

    pub fn draw_all(&mut self, view: &BoardView) -> Repaint {
        let geometry = self.geometry_for(view);
        let palette = self.palette;
        let Some(surface) = self.surface.as_mut() else {
            return Repaint::Skipped;
        };

        if self.drawn != Some(geometry) {
            surface.resize(geometry.side_px(), geometry.side_px());
        }
        surface.fill_rect(
            Rect::new(0, 0, geometry.side_px(), geometry.side_px()),
            palette.background,
        );
        for y in 0..view.size {
            for x in 0..view.size {
                paint_cell(surface, &palette, geometry, Cell::new(x, y), view);
            }
        }
        surface.present();
        self.drawn = Some(geometry);
        debug!(size = view.size, "full board repaint");
        Repaint::Full
    }

    pub fn apply_delta(&mut self, prev: &BoardView, next: &BoardView) -> Repaint {
        if self.surface.is_none() {
            return Repaint::Skipped;
        }
        let geometry = self.geometry_for(next);
        if prev.size != next.size || self.drawn != Some(geometry) {
            return self.draw_all(next);
        }

        let touched = touched_cells(prev, next);
        if touched.is_empty() {
            return Repaint::Cells(0);
        }
        let palette = self.palette;
        let Some(surface) = self.surface.as_mut() else {
            return Repaint::Skipped;
        };
        for cell in &touched {
            trace!(%cell, "repainting cell");
            paint_cell(surface, &palette, geometry, *cell, next);
        }
        surface.present();
        Repaint::Cells(touched.len())
    }
}

pub fn touched_cells(prev: &BoardView, next: &BoardView) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(6);
    let mut push = |cell: Option<Cell>| {
        if let Some(cell) = cell {
            if !cells.contains(&cell) {
                cells.push(cell);
            }
        }
    };
    for role in Role::ALL {
        let (before, after) = (prev.positions.get(role), next.positions.get(role));
        if before != after {
            push(before);
            push(after);
        }
    }
    if prev.target != next.target {
        push(prev.target);
        push(next.target);
    }
    cells
}

// Both repaint paths go through here, so a delta always matches a full repaint.
fn paint_cell<S: Surface + ?Sized>(
    surface: &mut S,
    palette: &Palette,
    geometry: Geometry,
    cell: Cell,
    view: &BoardView,
) {
    let fill = if cell.is_dark() {
        palette.dark
    } else {
        palette.light
    };
    let interior = geometry.interior(cell);
    surface.fill_rect(interior, fill);
    surface.stroke_rect(geometry.cell_rect(cell), palette.grid);
    if let Some(role) = view.positions.occupant(cell) {
        surface.draw_glyph(interior, Glyph::Piece(role), palette.piece(role));
    }
    // Target goes last so a stale piece fill never hides it.
    if view.target == Some(cell) {
        surface.draw_glyph(interior, Glyph::Target, palette.target);
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
