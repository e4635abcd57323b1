/// The raster surface the renderer draws onto
use crate::color::Rgb;
use crate::projection::ScreenPoint;

/// Drawing target for one frame.
///
/// Draw calls are infallible; a backend buffers them and reports failures
/// from `present`.
pub trait FrameBuffer {
    type Error;

    fn clear(&mut self, color: Rgb);
    fn point(&mut self, center: ScreenPoint, radius: u32, color: Rgb);
    fn line(&mut self, from: ScreenPoint, to: ScreenPoint, color: Rgb);
    fn triangle(&mut self, corners: [ScreenPoint; 3], color: Rgb, filled: bool);
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    Clear(Rgb),
    Point {
        center: ScreenPoint,
        radius: u32,
        color: Rgb,
    },
    Line {
        from: ScreenPoint,
        to: ScreenPoint,
        color: Rgb,
    },
    Triangle {
        corners: [ScreenPoint; 3],
        color: Rgb,
        filled: bool,
    },
}

/// Frame buffer that records draw calls instead of rasterizing them
#[derive(Debug, Default)]
pub struct RecordingBuffer {
    pub commands: Vec<DrawCommand>,
    pub presented: usize,
}

impl RecordingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triangles(&self) -> impl Iterator<Item = (&[ScreenPoint; 3], Rgb)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Triangle { corners, color, .. } => Some((corners, *color)),
            _ => None,
        })
    }
}

impl FrameBuffer for RecordingBuffer {
    type Error = std::convert::Infallible;

    fn clear(&mut self, color: Rgb) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn point(&mut self, center: ScreenPoint, radius: u32, color: Rgb) {
        self.commands.push(DrawCommand::Point { center, radius, color });
    }

    fn line(&mut self, from: ScreenPoint, to: ScreenPoint, color: Rgb) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn triangle(&mut self, corners: [ScreenPoint; 3], color: Rgb, filled: bool) {
        self.commands.push(DrawCommand::Triangle {
            corners,
            color,
            filled,
        });
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.presented += 1;
        Ok(())
    }
}
