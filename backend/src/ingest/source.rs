//! Pure derivations: where to download from and where to store

use common_types::{ContentProvider, ImageMessage};

/// Content API of the LINE platform
pub const LINE_CONTENT_API_BASE: &str = "https://api-data.line.me/v2/bot/message";

/// Image formats with a dedicated file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum ImageFormat {
    /// Also the fallback for unknown content types
    #[strum(serialize = "jpg")]
    Jpeg,
    /// PNG
    #[strum(serialize = "png")]
    Png,
    /// GIF
    #[strum(serialize = "gif")]
    Gif,
}

impl ImageFormat {
    /// Picks the format from a `Content-Type` header value
    ///
    /// Parameters such as `charset` are ignored. Anything that is not PNG or GIF is
    /// stored as JPEG.
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(mime) = content_type.and_then(|value| value.parse::<mime::Mime>().ok()) else {
            return Self::Jpeg;
        };

        match mime.essence_str() {
            "image/png" => Self::Png,
            "image/gif" => Self::Gif,
            _ => Self::Jpeg,
        }
    }

    /// File extension without the leading dot
    #[must_use]
    pub fn extension(self) -> &'static str {
        self.into()
    }
}

/// URL the image bytes can be downloaded from, if the provider is supported
#[must_use]
pub fn content_url(message: &ImageMessage) -> Option<String> {
    match &message.content_provider {
        ContentProvider::Line => Some(format!("{LINE_CONTENT_API_BASE}/{}/content", message.id)),
        ContentProvider::External {
            original_content_url,
            ..
        } => original_content_url.clone(),
        ContentProvider::Unknown => None,
    }
}

/// Bucket key for an image: `{user_id}/images/{message_id}.{extension}`
#[must_use]
pub fn storage_key(user_id: &str, message_id: &str, format: ImageFormat) -> String {
    format!("{user_id}/images/{message_id}.{}", format.extension())
}
