//! Paint field: the pixel surface the drawing canvas paints into and the fan
//! sweeps crumbs out of

use glam::Vec2;
use serde::Serialize;

use super::entity::Color;

/// One RGBA cell per surface unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaintField {
    width: usize,
    height: usize,
    cells: Vec<[u8; 4]>,
}

/// Raw image handed to the classification collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    /// Row-major RGBA bytes
    pub rgba: Vec<u8>,
}

impl PaintField {
    /// Blank (fully transparent) field
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![[0; 4]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            None
        } else {
            Some(y as usize * self.width + x as usize)
        }
    }

    /// Cell at integer coordinates, `None` outside the field
    pub fn cell(&self, x: i64, y: i64) -> Option<[u8; 4]> {
        self.index(x, y).map(|i| self.cells[i])
    }

    pub fn set_cell(&mut self, x: i64, y: i64, rgba: [u8; 4]) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = rgba;
        }
    }

    /// Fill a disc with a solid color
    pub fn paint_disc(&mut self, center: Vec2, radius: f32, color: Color, alpha: u8) {
        let r = radius.max(0.0);
        let x0 = (center.x - r).floor() as i64;
        let x1 = (center.x + r).ceil() as i64;
        let y0 = (center.y - r).floor() as i64;
        let y1 = (center.y + r).ceil() as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32, y as f32).distance(center);
                if d <= r {
                    self.set_cell(x, y, [color.r, color.g, color.b, alpha]);
                }
            }
        }
    }

    /// Paint a round-capped line between two points
    pub fn stroke(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        let radius = width * 0.5;
        let len = from.distance(to);
        let steps = (len / radius.max(0.5)).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.paint_disc(from.lerp(to, t), radius, color, 255);
        }
    }

    /// Number of cells with visible paint
    pub fn painted_cells(&self) -> usize {
        self.cells.iter().filter(|c| c[3] >= 10).count()
    }

    pub fn clear(&mut self) {
        self.cells.fill([0; 4]);
    }

    /// Copy out as an RGBA image
    pub fn to_image(&self) -> Image {
        Image {
            width: self.width,
            height: self.height,
            rgba: self.cells.iter().flatten().copied().collect(),
        }
    }
}
