#![forbid(unsafe_code)]

/// Display color when a task's first department has no registry entry.
pub const FALLBACK_COLOR: &str = "#1b18b6";

pub const TEXT_DARK: &str = "#000";
pub const TEXT_LIGHT: &str = "#fff";

/// Backgrounds lighter than this get near-black text.
const LUMINANCE_THRESHOLD: f64 = 0.65;

/// Ordered department -> display color registry. Built from configuration at
/// startup and injected wherever colors are resolved; the first department on
/// a task decides its background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<(String, String)>,
    fallback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayColor<'a> {
    pub background: &'a str,
    pub text: &'static str,
}

impl Palette {
    #[must_use]
    pub fn new(entries: Vec<(String, String)>, fallback: impl Into<String>) -> Self {
        Self {
            entries,
            fallback: fallback.into(),
        }
    }

    #[must_use]
    pub fn departments(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn color_of(&self, department: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == department)
            .map(|(_, color)| color.as_str())
    }

    /// Background for a task's department list: registry color of the first
    /// department, or the fallback when the list is empty or unknown.
    #[must_use]
    pub fn background_for(&self, departments: &[String]) -> &str {
        departments
            .first()
            .and_then(|d| self.color_of(d))
            .unwrap_or(&self.fallback)
    }

    /// Background plus a readable text color for it.
    #[must_use]
    pub fn resolve<'a>(&'a self, departments: &[String]) -> DisplayColor<'a> {
        let background = self.background_for(departments);
        DisplayColor {
            background,
            text: text_color_for_bg(background),
        }
    }

    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

/// RGB channels of a `#RRGGBB` (or `#RRGGBBAA`, alpha ignored) hex color.
/// `None` when the string has fewer than six hex digits.
#[must_use]
pub fn rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() < 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Perceptual luminance in 0.0..=1.0.
#[must_use]
pub fn luminance(hex: &str) -> Option<f64> {
    let (r, g, b) = rgb(hex)?;
    Some((0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0)
}

/// Near-black text on light backgrounds, near-white on dark or unparseable
/// ones. Threshold and channel weights are part of the color contract.
#[must_use]
pub fn text_color_for_bg(hex: &str) -> &'static str {
    match luminance(hex) {
        Some(l) if l > LUMINANCE_THRESHOLD => TEXT_DARK,
        _ => TEXT_LIGHT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Palette {
        Palette::new(
            vec![
                ("Design Electric".to_owned(), "#33C1FF".to_owned()),
                ("Teste".to_owned(), "#3a33ffff".to_owned()),
            ],
            FALLBACK_COLOR,
        )
    }

    #[test]
    fn white_gets_dark_text_and_black_gets_light_text() {
        assert_eq!(text_color_for_bg("#FFFFFF"), TEXT_DARK);
        assert_eq!(text_color_for_bg("#000000"), TEXT_LIGHT);
    }

    #[test]
    fn luminance_uses_exact_perceptual_weights() {
        let l = luminance("#FFFFFF").unwrap();
        assert!((l - 1.0).abs() < 1e-9);
        // Pure green: 0.587 * 255 / 255.
        let g = luminance("#00FF00").unwrap();
        assert!((g - 0.587).abs() < 1e-9);
    }

    #[test]
    fn eight_digit_hex_ignores_alpha() {
        assert_eq!(luminance("#3a33ffff"), luminance("#3a33ff"));
    }

    #[test]
    fn short_or_garbage_hex_falls_back_to_light_text() {
        assert_eq!(text_color_for_bg("#000"), TEXT_LIGHT);
        assert_eq!(text_color_for_bg("not-a-color"), TEXT_LIGHT);
        assert_eq!(text_color_for_bg(""), TEXT_LIGHT);
    }

    #[test]
    fn resolves_first_department_with_fallback() {
        let p = palette();
        let c = p.resolve(&["Design Electric".to_owned(), "Teste".to_owned()]);
        assert_eq!(c.background, "#33C1FF");
        // Luminance of #33C1FF is below the threshold, so text stays white.
        assert_eq!(c.text, TEXT_LIGHT);

        let unknown = p.resolve(&["Forging".to_owned()]);
        assert_eq!(unknown.background, FALLBACK_COLOR);
        assert_eq!(p.resolve(&[]).background, FALLBACK_COLOR);
    }
}
