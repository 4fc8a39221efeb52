//! Inline style handling
//!
//! Text runs carry a list of CSS-like declarations (`font-size: 20px;`).
//! Styles arriving from pasted content pass through allow-list validators
//! that accept only well-formed length/color syntax; anything else is
//! silently dropped. Default values (15px text, white background, black
//! color) are elided so only deviations from the defaults are stored.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Font size applied when no explicit size is set.
pub const DEFAULT_FONT_SIZE: &str = "15px";
/// Background color applied when no explicit background is set.
pub const DEFAULT_BACKGROUND_COLOR: &str = "rgb(255, 255, 255)";
/// Text color applied when no explicit color is set.
pub const DEFAULT_TEXT_COLOR: &str = "rgb(0, 0, 0)";

const MIN_FONT_SIZE_PX: f64 = 8.0;
const MAX_FONT_SIZE_PX: f64 = 72.0;

static FONT_SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)px$").expect("font size regex"));

static RGB_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^rgb\((\d+),\s*(\d+),\s*(\d+)\)$").expect("rgb color regex"));

/// Validate a pixel font size, returning it unchanged when acceptable.
///
/// Only `<number>px` within 8..=72 passes. Everything else is rejected.
pub fn parse_allowed_font_size(input: &str) -> Option<&str> {
    let captures = FONT_SIZE_RE.captures(input)?;
    let size: f64 = captures.get(1)?.as_str().parse().ok()?;
    if (MIN_FONT_SIZE_PX..=MAX_FONT_SIZE_PX).contains(&size) {
        Some(input)
    } else {
        None
    }
}

/// Validate an `rgb(r, g, b)` color, returning it in canonical spacing.
///
/// Whitespace after the commas is optional on input; the result always
/// uses `rgb(r, g, b)` form so comparisons against the defaults hold.
pub fn parse_allowed_color(input: &str) -> Option<String> {
    let captures = RGB_COLOR_RE.captures(input.trim())?;
    let (r, g, b) = (&captures[1], &captures[2], &captures[3]);
    for channel in [r, g, b] {
        let value: u32 = channel.parse().ok()?;
        if value > 255 {
            return None;
        }
    }
    Some(format!("rgb({}, {}, {})", r, g, b))
}

/// Styles recognized on imported text-bearing nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtraStyleSource<'a> {
    pub font_size: Option<&'a str>,
    pub background_color: Option<&'a str>,
    pub color: Option<&'a str>,
}

/// Compute the style text to append to an imported run.
///
/// Each recognized property goes through its allow-list validator; values
/// equal to the system default are elided entirely.
pub fn extra_styles(source: ExtraStyleSource<'_>) -> String {
    let mut extra = String::new();
    if let Some(font_size) = source.font_size.and_then(parse_allowed_font_size) {
        if font_size != DEFAULT_FONT_SIZE {
            extra.push_str(&format!("font-size: {};", font_size));
        }
    }
    if let Some(background) = source.background_color.and_then(|v| parse_allowed_color(v)) {
        if background != DEFAULT_BACKGROUND_COLOR {
            extra.push_str(&format!("background-color: {};", background));
        }
    }
    if let Some(color) = source.color.and_then(|v| parse_allowed_color(v)) {
        if color != DEFAULT_TEXT_COLOR {
            extra.push_str(&format!("color: {};", color));
        }
    }
    extra
}

/// One `property: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProperty {
    pub name: String,
    pub value: String,
}

/// An ordered list of CSS-like declarations attached to a text run.
///
/// Appending concatenates declarations; duplicate property names are kept
/// in order rather than merged, matching how imported extra styles are
/// tacked onto whatever the run already carried.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleList(Vec<StyleProperty>);

impl StyleList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a declaration string such as `font-size: 20px; color: red;`.
    ///
    /// Malformed fragments (no colon, empty name or value) are skipped.
    pub fn parse(text: &str) -> Self {
        let mut properties = Vec::new();
        for declaration in text.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() || value.is_empty() {
                continue;
            }
            properties.push(StyleProperty {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        Self(properties)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn properties(&self) -> &[StyleProperty] {
        &self.0
    }

    /// Last declared value for a property, the one that wins when rendered.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Append declarations parsed from `text`, keeping duplicates.
    pub fn append_str(&mut self, text: &str) {
        self.0.extend(Self::parse(text).0);
    }
}

impl fmt::Display for StyleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for property in &self.0 {
            write!(f, "{}: {};", property.name, property.value)?;
        }
        Ok(())
    }
}

impl Serialize for StyleList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for StyleList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_allow_list() {
        assert_eq!(parse_allowed_font_size("20px"), Some("20px"));
        assert_eq!(parse_allowed_font_size("8px"), Some("8px"));
        assert_eq!(parse_allowed_font_size("72px"), Some("72px"));
        assert_eq!(parse_allowed_font_size("10.5px"), Some("10.5px"));

        assert_eq!(parse_allowed_font_size("7px"), None);
        assert_eq!(parse_allowed_font_size("73px"), None);
        assert_eq!(parse_allowed_font_size("20"), None);
        assert_eq!(parse_allowed_font_size("20em"), None);
        assert_eq!(parse_allowed_font_size("large"), None);
        assert_eq!(parse_allowed_font_size(""), None);
    }

    #[test]
    fn test_color_allow_list() {
        assert_eq!(
            parse_allowed_color("rgb(10, 20, 30)").as_deref(),
            Some("rgb(10, 20, 30)")
        );
        // Missing spaces are normalized, not rejected
        assert_eq!(
            parse_allowed_color("rgb(10,20,30)").as_deref(),
            Some("rgb(10, 20, 30)")
        );

        assert_eq!(parse_allowed_color("rgb(256, 0, 0)"), None);
        assert_eq!(parse_allowed_color("#ff0000"), None);
        assert_eq!(parse_allowed_color("red"), None);
        assert_eq!(parse_allowed_color("rgba(0, 0, 0, 0.5)"), None);
        assert_eq!(parse_allowed_color(""), None);
    }

    #[test]
    fn test_extra_styles_elides_defaults() {
        let extra = extra_styles(ExtraStyleSource {
            font_size: Some("15px"),
            background_color: Some("rgb(255,255,255)"),
            color: Some("rgb(0,0,0)"),
        });
        assert_eq!(extra, "");
    }

    #[test]
    fn test_extra_styles_keeps_deviations() {
        let extra = extra_styles(ExtraStyleSource {
            font_size: Some("20px"),
            ..Default::default()
        });
        assert_eq!(extra, "font-size: 20px;");

        let extra = extra_styles(ExtraStyleSource {
            font_size: Some("20px"),
            background_color: Some("rgb(200, 200, 0)"),
            color: Some("rgb(0, 0, 255)"),
        });
        assert_eq!(
            extra,
            "font-size: 20px;background-color: rgb(200, 200, 0);color: rgb(0, 0, 255);"
        );
    }

    #[test]
    fn test_extra_styles_drops_malformed_silently() {
        let extra = extra_styles(ExtraStyleSource {
            font_size: Some("huge"),
            background_color: Some("#abcdef"),
            color: Some("rgb(300, 0, 0)"),
        });
        assert_eq!(extra, "");
    }

    #[test]
    fn test_style_list_parse_and_display() {
        let style = StyleList::parse("font-size: 20px; color:red ;; broken");
        assert_eq!(style.len(), 2);
        assert_eq!(style.get("font-size"), Some("20px"));
        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.to_string(), "font-size: 20px;color: red;");
    }

    #[test]
    fn test_style_list_append_keeps_duplicates() {
        let mut style = StyleList::parse("color: red;");
        style.append_str("color: blue;");
        assert_eq!(style.len(), 2);
        // Later declaration wins
        assert_eq!(style.get("color"), Some("blue"));
        assert_eq!(style.to_string(), "color: red;color: blue;");
    }

    #[test]
    fn test_style_list_serde_round_trip() {
        let style = StyleList::parse("font-size: 20px;color: rgb(0, 0, 255);");
        let json = serde_json::to_string(&style).unwrap();
        assert_eq!(json, "\"font-size: 20px;color: rgb(0, 0, 255);\"");
        let back: StyleList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, style);
    }
}
