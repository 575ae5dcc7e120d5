use serde::{Deserialize, Serialize};

/// Output encodings the optimizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
    /// Pass-through only; animations are never re-encoded.
    Gif,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::WebP => "webp",
            ImageKind::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::WebP => "image/webp",
            ImageKind::Gif => "image/gif",
        }
    }

    /// Whether the encoding can represent an alpha channel.
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, ImageKind::Jpeg)
    }

    /// Tie-break order for equally sized smart-format candidates: the modern
    /// hybrid format wins, then the lossy photographic one, then lossless.
    pub(crate) fn preference_rank(&self) -> u8 {
        match self {
            ImageKind::WebP => 0,
            ImageKind::Jpeg => 1,
            ImageKind::Png => 2,
            ImageKind::Gif => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
            ImageKind::WebP => "webp",
            ImageKind::Gif => "gif",
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_support() {
        assert!(!ImageKind::Jpeg.supports_alpha());
        assert!(ImageKind::Png.supports_alpha());
        assert!(ImageKind::WebP.supports_alpha());
    }

    #[test]
    fn test_preference_order() {
        assert!(ImageKind::WebP.preference_rank() < ImageKind::Jpeg.preference_rank());
        assert!(ImageKind::Jpeg.preference_rank() < ImageKind::Png.preference_rank());
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&ImageKind::WebP).unwrap(), "\"webp\"");
        let parsed: ImageKind = serde_json::from_str("\"jpeg\"").unwrap();
        assert_eq!(parsed, ImageKind::Jpeg);
    }
}
