use serde::{Deserialize, Serialize};

/// Absolute screen rectangle. `right`/`bottom` are `left + width` and
/// `top + height`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn from_origin_size(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            right: left.saturating_add(width),
            bottom: top.saturating_add(height),
        }
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// All-zero rectangles are reported for windows that are not really on
    /// screen.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_from_edges() {
        let rect = Rect::new(100, 50, 900, 650);
        assert_eq!(rect.width(), 800);
        assert_eq!(rect.height(), 600);
        assert_eq!(Rect::from_origin_size(100, 50, 800, 600), rect);
    }

    #[test]
    fn test_negative_origin() {
        // Windows on a monitor left of the primary one
        let rect = Rect::new(-1920, 0, -960, 1080);
        assert_eq!(rect.width(), 960);
        assert!(!rect.is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(Rect::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, serde_json::json!({"left": 1, "top": 2, "right": 3, "bottom": 4}));
    }
}
