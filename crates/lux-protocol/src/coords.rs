//! Coordinate and scroll-argument extraction helpers for executors.
//!
//! Unlike the tolerant reply parser, these return `None` on any failure and
//! callers are expected to treat that as a hard replay error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+").expect("valid integer regex"));

/// Scroll direction token from a normalized scroll argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn integers(input: &str) -> impl Iterator<Item = i64> + '_ {
    INT_RE
        .find_iter(input)
        .filter_map(|m| m.as_str().parse().ok())
}

/// Extract a normalized `(x, y)` pair from a point argument.
pub fn parse_coords(input: &str) -> Option<(u32, u32)> {
    let nums: Vec<i64> = integers(input).take(2).collect();
    if nums.len() < 2 {
        return None;
    }
    Some((u32::try_from(nums[0]).ok()?, u32::try_from(nums[1]).ok()?))
}

/// Extract a `(x1, y1, x2, y2)` quad from a drag argument.
pub fn parse_drag_coords(input: &str) -> Option<(u32, u32, u32, u32)> {
    let nums: Vec<i64> = integers(input).take(4).collect();
    if nums.len() < 4 {
        return None;
    }
    Some((
        u32::try_from(nums[0]).ok()?,
        u32::try_from(nums[1]).ok()?,
        u32::try_from(nums[2]).ok()?,
        u32::try_from(nums[3]).ok()?,
    ))
}

/// Parse a normalized `x,y,direction` scroll argument.
pub fn parse_scroll(input: &str) -> Option<(u32, u32, ScrollDirection)> {
    let fields: Vec<&str> = input.split(',').map(str::trim).collect();
    if fields.len() != 3 {
        return None;
    }
    let x = fields[0].parse::<u32>().ok()?;
    let y = fields[1].parse::<u32>().ok()?;
    let direction = ScrollDirection::from_name(&fields[2].to_ascii_lowercase())?;
    Some((x, y, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_extracts_first_two_integers() {
        assert_eq!(parse_coords("120, 340"), Some((120, 340)));
        assert_eq!(parse_coords("(5,9)"), Some((5, 9)));
        assert_eq!(parse_coords("just one: 7"), None);
        assert_eq!(parse_coords("no digits"), None);
    }

    #[test]
    fn coords_rejects_negatives() {
        assert_eq!(parse_coords("-3, 40"), None);
    }

    #[test]
    fn drag_requires_four_integers() {
        assert_eq!(parse_drag_coords("1, 2, 3, 4"), Some((1, 2, 3, 4)));
        assert_eq!(parse_drag_coords("1, 2, 3"), None);
    }

    #[test]
    fn scroll_parses_normalized_argument() {
        assert_eq!(
            parse_scroll("120,340,down"),
            Some((120, 340, ScrollDirection::Down))
        );
        assert_eq!(
            parse_scroll("0, 0, UP"),
            Some((0, 0, ScrollDirection::Up))
        );
        assert_eq!(parse_scroll("120,340,sideways"), None);
        assert_eq!(parse_scroll("120,340"), None);
    }
}
