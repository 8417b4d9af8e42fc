use serde::Serialize;
use serde_json::Value;

/// Screen aspect classes used to pick a rectangle profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AspectBucket {
    #[default]
    Wide16x9,
    Ultrawide21x9,
    SuperUltrawide32x9,
}

impl AspectBucket {
    pub const ALL: [AspectBucket; 3] = [
        AspectBucket::Wide16x9,
        AspectBucket::Ultrawide21x9,
        AspectBucket::SuperUltrawide32x9,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AspectBucket::Wide16x9 => "16:9",
            AspectBucket::Ultrawide21x9 => "21:9",
            AspectBucket::SuperUltrawide32x9 => "32:9",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.label() == label)
    }

    pub fn default_ratio(self) -> RectRatio {
        match self {
            AspectBucket::Wide16x9 => RectRatio {
                rx: 0.30859375,
                ry: 0.14583333333333334,
                rw: 0.383984375,
                rh: 0.6833333333333333,
            },
            AspectBucket::Ultrawide21x9 => RectRatio {
                rx: 0.35625,
                ry: 0.14722222222222223,
                rw: 0.287109375,
                rh: 0.6814814814814815,
            },
            AspectBucket::SuperUltrawide32x9 => RectRatio {
                rx: 0.404296875,
                ry: 0.14722222222222223,
                rw: 0.191015625,
                rh: 0.6791666666666667,
            },
        }
    }
}

impl std::fmt::Display for AspectBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket the screen by width/height ratio.
///
/// `>= 3.20` is 32:9, `>= 2.20` is 21:9, anything else (including a
/// degenerate height) is treated as 16:9.
pub fn detect_aspect(width: i32, height: i32) -> AspectBucket {
    if height <= 0 {
        return AspectBucket::Wide16x9;
    }
    let ratio = width as f64 / height as f64;
    if ratio >= 3.20 {
        AspectBucket::SuperUltrawide32x9
    } else if ratio >= 2.20 {
        AspectBucket::Ultrawide21x9
    } else {
        AspectBucket::Wide16x9
    }
}

/// Overlay rectangle expressed as fractions of the screen size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectRatio {
    pub rx: f64,
    pub ry: f64,
    pub rw: f64,
    pub rh: f64,
}

impl RectRatio {
    /// Read a ratio from a config value. All four fields must be finite numbers.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |name: &str| obj.get(name).and_then(Value::as_f64).filter(|v| v.is_finite());
        Some(Self {
            rx: field("rx")?,
            ry: field("ry")?,
            rw: field("rw")?,
            rh: field("rh")?,
        })
    }

    pub fn to_pixels(self, screen_w: i32, screen_h: i32) -> PixelRect {
        let w = screen_w as f64;
        let h = screen_h as f64;
        PixelRect {
            x: (self.rx * w).floor() as i32,
            y: (self.ry * h).floor() as i32,
            width: ((self.rw * w).floor() as i32).max(1),
            height: ((self.rh * h).floor() as i32).max(1),
        }
    }
}

/// Default ratio for a raw bucket label, falling back to 16:9 for unknown labels.
pub fn default_ratio_for_label(label: &str) -> RectRatio {
    AspectBucket::from_label(label)
        .unwrap_or_default()
        .default_ratio()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    /// Pixel position of a normalized `(u, v)` point inside this rectangle.
    pub fn project(&self, u: f64, v: f64) -> (f64, f64) {
        (
            self.x as f64 + u * self.width as f64,
            self.y as f64 + v * self.height as f64,
        )
    }
}

/// Compute the overlay rectangle for one map profile.
///
/// `stored` is the profile's ratio for `label`, if it had a well-formed one.
/// Otherwise the built-in ratio for the label is used.
pub fn resolve_rect(stored: Option<RectRatio>, label: &str, screen_w: i32, screen_h: i32) -> PixelRect {
    let ratio = match stored {
        Some(ratio) => ratio,
        None => {
            tracing::debug!(aspect = label, "using built-in rect ratio");
            default_ratio_for_label(label)
        }
    };
    ratio.to_pixels(screen_w, screen_h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_aspect_buckets() {
        assert_eq!(detect_aspect(3840, 1080), AspectBucket::SuperUltrawide32x9);
        assert_eq!(detect_aspect(2560, 1080), AspectBucket::Ultrawide21x9);
        assert_eq!(detect_aspect(3440, 1440), AspectBucket::Ultrawide21x9);
        assert_eq!(detect_aspect(1920, 1080), AspectBucket::Wide16x9);
        assert_eq!(detect_aspect(1920, 1200), AspectBucket::Wide16x9);
        assert_eq!(detect_aspect(100, 0), AspectBucket::Wide16x9);
        assert_eq!(detect_aspect(100, -5), AspectBucket::Wide16x9);
    }

    #[test]
    fn labels_roundtrip() {
        for bucket in AspectBucket::ALL {
            assert_eq!(AspectBucket::from_label(bucket.label()), Some(bucket));
        }
        assert_eq!(AspectBucket::from_label("4:3"), None);
    }

    #[test]
    fn stored_ratio_is_floored_into_pixels() {
        let stored = RectRatio::from_value(&json!({"rx": 0.25, "ry": 0.1, "rw": 0.5, "rh": 0.33}));
        assert!(stored.is_some());
        let rect = resolve_rect(stored, "16:9", 1920, 1080);
        assert_eq!(
            rect,
            PixelRect {
                x: 480,
                y: 108,
                width: 960,
                height: 356
            }
        );
    }

    #[test]
    fn malformed_ratio_falls_back_to_bucket_default() {
        let stored = RectRatio::from_value(&json!({"rx": "left", "ry": 0.1, "rw": 0.5}));
        assert_eq!(stored, None);
        let rect = resolve_rect(stored, "21:9", 2560, 1080);
        assert_eq!(
            rect,
            AspectBucket::Ultrawide21x9.default_ratio().to_pixels(2560, 1080)
        );
    }

    #[test]
    fn unknown_label_uses_16_9_default() {
        let rect = resolve_rect(None, "5:4", 1920, 1080);
        assert_eq!(rect, AspectBucket::Wide16x9.default_ratio().to_pixels(1920, 1080));
        assert_eq!(rect.x, 592);
        assert_eq!(rect.y, 157);
        assert_eq!(rect.width, 737);
    }

    #[test]
    fn zero_sized_ratio_keeps_one_pixel() {
        let stored = RectRatio {
            rx: 0.0,
            ry: 0.0,
            rw: 0.0,
            rh: 0.0001,
        };
        let rect = resolve_rect(Some(stored), "16:9", 1920, 1080);
        assert_eq!(rect.width, 1);
        assert_eq!(rect.height, 1);
    }
}
