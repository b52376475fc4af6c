use std::fmt;
use std::str::FromStr;

/// A point in global point space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

/// A rectangle in global point space. Displays and selections share this
/// coordinate system, with y growing upwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn mid_point(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Half-open containment: the left and bottom edges belong to the rect,
    /// the right and top edges belong to the neighbour.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.origin.x && p.x < self.max_x() && p.y >= self.origin.y && p.y < self.max_y()
    }

    pub fn is_finite(&self) -> bool {
        self.origin.x.is_finite()
            && self.origin.y.is_finite()
            && self.size.width.is_finite()
            && self.size.height.is_finite()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.origin.x, self.origin.y, self.size.width, self.size.height
        )
    }
}

/// Parses `x,y,width,height`.
impl FromStr for Rect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid number in region {:?}: {}", s, e))?;

        match parts.as_slice() {
            [x, y, w, h] => Ok(Rect::new(*x, *y, *w, *h)),
            _ => Err(format!(
                "region must have 4 comma-separated values (x,y,width,height), got {}",
                parts.len()
            )),
        }
    }
}

/// Pixel-space crop rectangle of a captured frame (top-left origin).
///
/// The origin is signed: a selection that hangs off the chosen display maps
/// to a negative origin, which the bounds check then rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        CropRect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the rect lies entirely inside a `width` x `height` pixel buffer.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + i64::from(self.width) <= i64::from(width)
            && self.y + i64::from(self.height) <= i64::from(height)
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at {},{}", self.width, self.height, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(99.9, 49.9)));
        assert!(!r.contains(Point::new(100.0, 10.0)));
        assert!(!r.contains(Point::new(10.0, 50.0)));
    }

    #[test]
    fn mid_point_of_offset_rect() {
        let r = Rect::new(-200.0, 100.0, 400.0, 300.0);
        assert_eq!(r.mid_point(), Point::new(0.0, 250.0));
    }

    #[test]
    fn parse_region() {
        let r: Rect = "100, 200,400,300".parse().unwrap();
        assert_eq!(r, Rect::new(100.0, 200.0, 400.0, 300.0));

        assert!("1,2,3".parse::<Rect>().is_err());
        assert!("1,2,three,4".parse::<Rect>().is_err());
    }

    #[test]
    fn crop_rect_bounds() {
        assert!(CropRect::new(0, 0, 100, 100).fits_within(100, 100));
        assert!(!CropRect::new(1, 0, 100, 100).fits_within(100, 100));
        assert!(!CropRect::new(-1, 0, 10, 10).fits_within(100, 100));
        assert!(CropRect::new(5, 5, 0, 10).is_empty());
    }
}
