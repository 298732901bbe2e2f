//! Composite frame identifiers.
//!
//! GIF-mode frames are addressed as `gif-frame-<adSizeId>-<frameNumber>`.
//! Ad-size ids may contain hyphens themselves (`frame-1`), so the final
//! token is always the frame number and everything between the prefix and
//! that token is the ad-size id. The legacy short form `gif-frame-<n>-<m>`
//! is the same grammar with a numeric ad-size id.

use std::fmt;

/// Fixed prefix of every GIF frame id.
pub const GIF_FRAME_PREFIX: &str = "gif-frame-";

/// The parsed parts of a valid GIF frame id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameAddress {
    pub ad_size_id: String,
    pub frame_number: u32,
}

impl FrameAddress {
    pub fn new(ad_size_id: impl Into<String>, frame_number: u32) -> Self {
        Self {
            ad_size_id: ad_size_id.into(),
            frame_number,
        }
    }
}

impl fmt::Display for FrameAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}-{}", GIF_FRAME_PREFIX, self.ad_size_id, self.frame_number)
    }
}

/// Parses a composite frame id.
///
/// Malformed input yields `None` rather than an error, so an invalid id can
/// never be dereferenced for its parts.
pub fn parse_frame_id(id: &str) -> Option<FrameAddress> {
    let rest = id.strip_prefix(GIF_FRAME_PREFIX)?;
    let (ad_size_id, number) = rest.rsplit_once('-')?;
    if ad_size_id.is_empty() || number.is_empty() {
        return None;
    }
    if !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let frame_number = number.parse().ok()?;
    Some(FrameAddress::new(ad_size_id, frame_number))
}

/// Builds a composite frame id. Left inverse of [`parse_frame_id`].
pub fn build_frame_id(ad_size_id: &str, frame_number: u32) -> String {
    format!("{}{}-{}", GIF_FRAME_PREFIX, ad_size_id, frame_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hyphenated_ad_size() {
        let addr = parse_frame_id("gif-frame-frame-1-3").unwrap();
        assert_eq!(addr.ad_size_id, "frame-1");
        assert_eq!(addr.frame_number, 3);
    }

    #[test]
    fn parses_legacy_short_form() {
        let addr = parse_frame_id("gif-frame-2-7").unwrap();
        assert_eq!(addr, FrameAddress::new("2", 7));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(parse_frame_id("not-a-valid-id"), None);
        assert_eq!(parse_frame_id("gif-frame-5"), None);
        assert_eq!(parse_frame_id("gif-frame--5"), None);
        assert_eq!(parse_frame_id("gif-frame-frame-1-"), None);
        assert_eq!(parse_frame_id("gif-frame-frame-1-x2"), None);
        assert_eq!(parse_frame_id("gif-frame-frame-1-+2"), None);
        assert_eq!(parse_frame_id(""), None);
    }

    #[test]
    fn build_is_left_inverse_of_parse() {
        for (ad, n) in [("frame-1", 1), ("300x250", 12), ("a-b-c", 0), ("4", 9)] {
            let id = build_frame_id(ad, n);
            assert_eq!(parse_frame_id(&id), Some(FrameAddress::new(ad, n)));
            assert_eq!(FrameAddress::new(ad, n).to_string(), id);
        }
    }
}
