// Theme -> color assignment

use crate::error::{DashboardError, Result};
use plotters::style::RGBColor;
use std::collections::HashMap;

/// Color for themes outside the canonical list
pub const FALLBACK_COLOR: RGBColor = RGBColor(128, 128, 128);

/// Theme to color pairing, built once from the configured lists
#[derive(Debug, Clone)]
pub struct ThemeColorMap {
    order: Vec<String>,
    colors: HashMap<String, RGBColor>,
}

/// Pair `themes[i]` with `hex_colors[i]`
pub fn build_color_map(themes: &[String], hex_colors: &[String]) -> Result<ThemeColorMap> {
    if themes.len() != hex_colors.len() {
        return Err(DashboardError::ConfigurationError(format!(
            "Theme list has {} entries but palette has {}",
            themes.len(),
            hex_colors.len()
        )));
    }

    let mut colors = HashMap::with_capacity(themes.len());
    for (theme, hex) in themes.iter().zip(hex_colors) {
        let color = parse_hex_color(hex).ok_or_else(|| {
            DashboardError::ConfigurationError(format!("Invalid color '{}' for theme '{}'", hex, theme))
        })?;
        if colors.insert(theme.clone(), color).is_some() {
            return Err(DashboardError::ConfigurationError(format!(
                "Theme '{}' listed twice",
                theme
            )));
        }
    }

    Ok(ThemeColorMap {
        order: themes.to_vec(),
        colors,
    })
}

impl ThemeColorMap {
    pub fn color(&self, theme: &str) -> Option<RGBColor> {
        self.colors.get(theme).copied()
    }

    pub fn color_or_fallback(&self, theme: &str) -> RGBColor {
        self.color(theme).unwrap_or(FALLBACK_COLOR)
    }

    /// Themes in canonical order
    pub fn themes(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Parse hex color (#RRGGBB or #RGB)
pub fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}

pub fn to_hex(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#1f77b4"), Some(RGBColor(31, 119, 180)));
        assert_eq!(parse_hex_color("#FF0000"), Some(RGBColor(255, 0, 0)));
        assert_eq!(parse_hex_color("#F00"), Some(RGBColor(255, 0, 0)));
        assert_eq!(parse_hex_color("1f77b4"), None);
        assert_eq!(parse_hex_color("#1f77b"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(RGBColor(31, 119, 180)), "#1f77b4");
    }

    #[test]
    fn test_build_color_map() {
        let map = build_color_map(
            &strings(&["City", "Technic", "Castle"]),
            &strings(&["#1f77b4", "#ff7f0e", "#2ca02c"]),
        )
        .unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.color("City"), Some(RGBColor(31, 119, 180)));
        assert_eq!(map.color("Castle"), Some(RGBColor(44, 160, 44)));
        assert_eq!(map.color("Pirates"), None);
        assert_eq!(map.color_or_fallback("Pirates"), FALLBACK_COLOR);
        assert_eq!(map.themes(), &strings(&["City", "Technic", "Castle"])[..]);
    }

    #[test]
    fn test_length_mismatch() {
        let err = build_color_map(&strings(&["City", "Technic"]), &strings(&["#1f77b4"])).unwrap_err();
        assert!(matches!(err, DashboardError::ConfigurationError(_)));
    }

    #[test]
    fn test_invalid_hex_in_palette() {
        let err = build_color_map(&strings(&["City"]), &strings(&["blue"])).unwrap_err();
        assert!(matches!(err, DashboardError::ConfigurationError(_)));
    }

    #[test]
    fn test_default_palette_covers_every_theme() {
        let config = crate::config::DashboardConfig::default();
        let map = build_color_map(&config.themes, &config.colors).unwrap();
        assert_eq!(map.len(), config.themes.len());
        for theme in &config.themes {
            assert!(map.color(theme).is_some(), "no color for {}", theme);
        }
    }
}
