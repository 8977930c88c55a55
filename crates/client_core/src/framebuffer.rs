use crate::render::{Glyph, Rect, Rgb, Surface};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb(0, 0, 0); (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    pub fn row(&self, y: u32) -> &[Rgb] {
        if y >= self.height {
            return &[];
        }
        let start = self.index(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    fn put(&mut self, x: u32, y: u32, color: Rgb) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.pixels[index] = color;
        }
    }

    fn each_in(&mut self, rect: Rect, mut f: impl FnMut(&mut Self, u32, u32)) {
        let x_end = rect.x.saturating_add(rect.width).min(self.width);
        let y_end = rect.y.saturating_add(rect.height).min(self.height);
        for y in rect.y..y_end {
            for x in rect.x..x_end {
                f(self, x, y);
            }
        }
    }
}

impl Surface for Framebuffer {
    fn resize(&mut self, width: u32, height: u32) {
        *self = Framebuffer::new(width, height);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.each_in(rect, |fb, x, y| fb.put(x, y, color));
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        let right = rect.x + rect.width - 1;
        let bottom = rect.y + rect.height - 1;
        for x in rect.x..=right {
            self.put(x, rect.y, color);
            self.put(x, bottom, color);
        }
        for y in rect.y..=bottom {
            self.put(rect.x, y, color);
            self.put(right, y, color);
        }
    }

    fn draw_glyph(&mut self, rect: Rect, glyph: Glyph, color: Rgb) {
        // Doubled coordinates keep pixel centres on integers.
        let side = i64::from(rect.width.min(rect.height));
        let cx = 2 * i64::from(rect.x) + i64::from(rect.width);
        let cy = 2 * i64::from(rect.y) + i64::from(rect.height);
        let inside: Box<dyn Fn(i64, i64) -> bool> = match glyph {
            Glyph::Piece(_) => {
                let radius = side * 7 / 10;
                Box::new(move |dx, dy| dx * dx + dy * dy <= radius * radius)
            }
            Glyph::Target => {
                let reach = side * 6 / 10;
                Box::new(move |dx, dy| dx.abs() + dy.abs() <= reach)
            }
        };
        self.each_in(rect, |fb, x, y| {
            let dx = 2 * i64::from(x) + 1 - cx;
            let dy = 2 * i64::from(y) + 1 - cy;
            if inside(dx, dy) {
                fb.put(x, y, color);
            }
        });
    }
}
