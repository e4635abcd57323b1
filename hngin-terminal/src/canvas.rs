/// Half-block terminal canvas: two pixels per character cell
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use hngin_core::{FrameBuffer, Rgb, ScreenPoint, Viewport};
use std::io::{self, Write};

/// Upper half block: foreground paints the top pixel, background the bottom
const HALF_BLOCK: char = '▀';

/// Pixel buffer rendered with `▀` cells and 24-bit colors
pub struct TerminalCanvas<W: Write> {
    out: W,
    columns: usize,
    rows: usize,
    pixels: Vec<Rgb>,
    overlay: Vec<String>,
}

impl<W: Write> TerminalCanvas<W> {
    pub fn new(out: W, columns: u16, rows: u16) -> Self {
        let mut canvas = Self {
            out,
            columns: 0,
            rows: 0,
            pixels: Vec::new(),
            overlay: Vec::new(),
        };
        canvas.resize(columns, rows);
        canvas
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.columns = columns as usize;
        self.rows = rows as usize;
        self.pixels = vec![Rgb::BLACK; self.width() * self.height()];
    }

    pub fn width(&self) -> usize {
        self.columns
    }

    pub fn height(&self) -> usize {
        self.rows * 2
    }

    /// Projection surface matching the pixel grid
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width() as u32, self.height() as u32)
    }

    /// Text printed over the top rows on the next `present`
    pub fn set_overlay(&mut self, lines: Vec<String>) {
        self.overlay = lines;
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        (x < self.width() && y < self.height()).then(|| self.pixels[y * self.width() + x])
    }

    fn plot(&mut self, x: i64, y: i64, color: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height() {
            let width = self.width();
            self.pixels[y as usize * width + x as usize] = color;
        }
    }

    fn fill_triangle(&mut self, corners: [ScreenPoint; 3], color: Rgb) {
        let [v0, v1, v2] = corners.map(|p| (p.x as f64, p.y as f64));

        // Bounding box, clipped to the canvas
        let min_x = v0.0.min(v1.0).min(v2.0).max(0.0) as i64;
        let max_x = v0.0.max(v1.0).max(v2.0).min(self.width() as f64 - 1.0) as i64;
        let min_y = v0.1.min(v1.1).min(v2.1).max(0.0) as i64;
        let max_y = v0.1.max(v1.1).max(v2.1).min(self.height() as f64 - 1.0) as i64;

        let Some(weights) = Barycentric::new(v0, v1, v2) else {
            // Zero-area triangle: draw its outline so it stays visible
            self.outline(corners, color);
            return;
        };

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (w0, w1, w2) = weights.at((x as f64, y as f64));
                let inside = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
                if inside {
                    self.plot(x, y, color);
                }
            }
        }
    }

    fn outline(&mut self, [a, b, c]: [ScreenPoint; 3], color: Rgb) {
        self.line(a, b, color);
        self.line(b, c, color);
        self.line(c, a, color);
    }

    pub fn draw(&mut self) -> io::Result<()> {
        let width = self.width();
        let mut colors: Option<(Rgb, Rgb)> = None;

        for row in 0..self.rows {
            self.out.queue(cursor::MoveTo(0, row as u16))?;
            for x in 0..width {
                let top = self.pixels[2 * row * width + x];
                let bottom = self.pixels[(2 * row + 1) * width + x];
                if colors != Some((top, bottom)) {
                    self.out.queue(SetForegroundColor(to_color(top)))?;
                    self.out.queue(SetBackgroundColor(to_color(bottom)))?;
                    colors = Some((top, bottom));
                }
                self.out.queue(Print(HALF_BLOCK))?;
            }
        }
        self.out.queue(ResetColor)?;

        for (row, line) in self.overlay.iter().enumerate().take(self.rows) {
            let text: String = line.chars().take(width).collect();
            self.out
                .queue(cursor::MoveTo(0, row as u16))?
                .queue(SetForegroundColor(Color::Yellow))?
                .queue(Print(text))?
                .queue(ResetColor)?;
        }

        self.out.flush()
    }
}

impl<W: Write> FrameBuffer for TerminalCanvas<W> {
    type Error = io::Error;

    fn clear(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    fn point(&mut self, center: ScreenPoint, radius: u32, color: Rgb) {
        let r = radius as i64;
        let (cx, cy) = (center.x as i64, center.y as i64);
        let (w, h) = (self.width() as i64, self.height() as i64);
        for dy in (-r).max(-cy)..=r.min(h - 1 - cy) {
            for dx in (-r).max(-cx)..=r.min(w - 1 - cx) {
                if dx * dx + dy * dy <= r * r {
                    self.plot(cx + dx, cy + dy, color);
                }
            }
        }
    }

    fn line(&mut self, from: ScreenPoint, to: ScreenPoint, color: Rgb) {
        let bounds = (self.width() as f64 - 1.0, self.height() as f64 - 1.0);
        let Some(((mut x0, mut y0), (x1, y1))) = clip_line(from, to, bounds) else {
            return;
        };

        // Bresenham
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn triangle(&mut self, corners: [ScreenPoint; 3], color: Rgb, filled: bool) {
        if filled {
            self.fill_triangle(corners, color);
        } else {
            self.outline(corners, color);
        }
    }

    fn present(&mut self) -> io::Result<()> {
        self.draw()
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

/// Barycentric weights of a fixed triangle
struct Barycentric {
    v0: (f64, f64),
    v1: (f64, f64),
    v2: (f64, f64),
    denom: f64,
}

impl Barycentric {
    fn new(v0: (f64, f64), v1: (f64, f64), v2: (f64, f64)) -> Option<Self> {
        let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);
        if denom.abs() < 1e-9 {
            return None;
        }
        Some(Self { v0, v1, v2, denom })
    }

    fn at(&self, p: (f64, f64)) -> (f64, f64, f64) {
        let (v0, v1, v2) = (self.v0, self.v1, self.v2);
        let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / self.denom;
        let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / self.denom;
        (w0, w1, 1.0 - w0 - w1)
    }
}

/// Cohen-Sutherland clip of a segment to `[0, max_x] × [0, max_y]`
fn clip_line(from: ScreenPoint, to: ScreenPoint, (max_x, max_y): (f64, f64)) -> Option<((i64, i64), (i64, i64))> {
    const LEFT: u8 = 1;
    const RIGHT: u8 = 2;
    const TOP: u8 = 4;
    const BOTTOM: u8 = 8;

    if max_x < 0.0 || max_y < 0.0 {
        return None;
    }

    let code = |x: f64, y: f64| {
        let mut c = 0;
        if x < 0.0 {
            c |= LEFT;
        } else if x > max_x {
            c |= RIGHT;
        }
        if y < 0.0 {
            c |= TOP;
        } else if y > max_y {
            c |= BOTTOM;
        }
        c
    };

    let (mut x0, mut y0) = (from.x as f64, from.y as f64);
    let (mut x1, mut y1) = (to.x as f64, to.y as f64);
    let mut c0 = code(x0, y0);
    let mut c1 = code(x1, y1);

    loop {
        if c0 | c1 == 0 {
            let round = |v: f64| v.round() as i64;
            return Some(((round(x0), round(y0)), (round(x1), round(y1))));
        }
        if c0 & c1 != 0 {
            return None;
        }

        let out = if c0 != 0 { c0 } else { c1 };
        let (x, y) = if out & BOTTOM != 0 {
            (x0 + (x1 - x0) * (max_y - y0) / (y1 - y0), max_y)
        } else if out & TOP != 0 {
            (x0 + (x1 - x0) * (0.0 - y0) / (y1 - y0), 0.0)
        } else if out & RIGHT != 0 {
            (max_x, y0 + (y1 - y0) * (max_x - x0) / (x1 - x0))
        } else {
            (0.0, y0 + (y1 - y0) * (0.0 - x0) / (x1 - x0))
        };

        if out == c0 {
            (x0, y0) = (x, y);
            c0 = code(x0, y0);
        } else {
            (x1, y1) = (x, y);
            c1 = code(x1, y1);
        }
    }
}
