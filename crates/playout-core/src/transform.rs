//! Geometric transforms and easing curves

/// 2D vector used for positions and scale factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Edge insets as fractions of the frame, all zero when uncropped
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Crop {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Crop {
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            left: self.left + (other.left - self.left) * t,
            top: self.top + (other.top - self.top) * t,
            right: self.right + (other.right - self.right) * t,
            bottom: self.bottom + (other.bottom - self.bottom) * t,
        }
    }
}

/// Geometric description applied to a layer's frame when compositing.
///
/// `position` and `scale` place the unit square of the frame in normalized
/// channel coordinates; `crop` trims its edges; `opacity` blends it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub scale: Vec2,
    pub crop: Crop,
    pub opacity: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec2::ZERO,
        scale: Vec2::ONE,
        crop: Crop {
            left: 0.0,
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
        },
        opacity: 1.0,
    };

    /// Componentwise interpolation toward `other` at eased progress `t`
    pub fn lerp(&self, other: &Transform, t: f64) -> Transform {
        Transform {
            position: self.position.lerp(other.position, t),
            scale: self.scale.lerp(other.scale, t),
            crop: self.crop.lerp(other.crop, t),
            opacity: self.opacity + (other.opacity - self.opacity) * t,
        }
    }

    /// Map a point in channel coordinates back into the layer's unit
    /// coordinate space. `None` when the transform is degenerate.
    pub fn invert_point(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.scale.x == 0.0 || self.scale.y == 0.0 {
            return None;
        }
        Some((
            (x - self.position.x) / self.scale.x,
            (y - self.position.y) / self.scale.y,
        ))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InSine,
    OutSine,
    InOutSine,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InSine => 1.0 - (t * std::f64::consts::FRAC_PI_2).cos(),
            Self::OutSine => (t * std::f64::consts::FRAC_PI_2).sin(),
            Self::InOutSine => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
        }
    }

    /// Parse a curve by its command-protocol name, e.g. `"easeinquad"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "easeinquad" => Some(Self::InQuad),
            "easeoutquad" => Some(Self::OutQuad),
            "easeinoutquad" => Some(Self::InOutQuad),
            "easeincubic" => Some(Self::InCubic),
            "easeoutcubic" => Some(Self::OutCubic),
            "easeinoutcubic" => Some(Self::InOutCubic),
            "easeinsine" => Some(Self::InSine),
            "easeoutsine" => Some(Self::OutSine),
            "easeinoutsine" => Some(Self::InOutSine),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_lerp() {
        let dst = Transform {
            position: Vec2::new(1.0, 2.0),
            scale: Vec2::new(2.0, 2.0),
            crop: Crop::default(),
            opacity: 0.0,
        };
        let mid = Transform::IDENTITY.lerp(&dst, 0.5);
        assert_eq!(mid.position, Vec2::new(0.5, 1.0));
        assert_eq!(mid.scale, Vec2::new(1.5, 1.5));
        assert_eq!(mid.opacity, 0.5);
    }

    #[test]
    fn test_ease_endpoints() {
        for ease in [
            Ease::Linear,
            Ease::InQuad,
            Ease::OutQuad,
            Ease::InOutQuad,
            Ease::InCubic,
            Ease::OutCubic,
            Ease::InOutCubic,
            Ease::InSine,
            Ease::OutSine,
            Ease::InOutSine,
        ] {
            assert!(ease.apply(0.0).abs() < 1e-9, "{ease:?} at 0");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-9, "{ease:?} at 1");
        }
    }

    #[test]
    fn test_ease_clamps_out_of_range_progress() {
        assert_eq!(Ease::Linear.apply(-1.0), 0.0);
        assert_eq!(Ease::Linear.apply(2.0), 1.0);
    }

    #[test]
    fn test_invert_point() {
        let transform = Transform {
            position: Vec2::new(0.25, 0.25),
            scale: Vec2::new(0.5, 0.5),
            crop: Crop::default(),
            opacity: 1.0,
        };
        assert_eq!(transform.invert_point(0.5, 0.5), Some((0.5, 0.5)));
        assert_eq!(transform.invert_point(0.25, 0.25), Some((0.0, 0.0)));

        let degenerate = Transform {
            scale: Vec2::ZERO,
            ..Transform::IDENTITY
        };
        assert_eq!(degenerate.invert_point(0.5, 0.5), None);
    }

    #[test]
    fn test_ease_from_name() {
        assert_eq!(Ease::from_name("LINEAR"), Some(Ease::Linear));
        assert_eq!(Ease::from_name("easeInOutSine"), Some(Ease::InOutSine));
        assert_eq!(Ease::from_name("bounce"), None);
    }
}
