use serde::{Deserialize, Serialize};
use url::Url;

/// Where the image for one recognition item comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ImageSourceBody")]
pub enum ImageSource {
    Url(Url),
    Base64(String),
    Bytes(Vec<u8>),
}

/// Wire shape of an [`ImageSource`]: an object carrying one of `url`,
/// `bytes` or `base64`.
///
/// When several keys are present, `url` wins over `bytes`, which wins over
/// `base64`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[schema(as = ImageSource)]
pub struct ImageSourceBody {
    /// Remote image location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "https://i.imgur.com/example.png")]
    pub url: Option<Url>,
    /// Raw image bytes as an array of numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
    /// Standard-alphabet, padded base64 of the image bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
}

impl TryFrom<ImageSourceBody> for ImageSource {
    type Error = String;

    fn try_from(body: ImageSourceBody) -> Result<Self, Self::Error> {
        if let Some(url) = body.url {
            Ok(Self::Url(url))
        } else if let Some(bytes) = body.bytes {
            Ok(Self::Bytes(bytes))
        } else if let Some(base64) = body.base64 {
            Ok(Self::Base64(base64))
        } else {
            Err("Invalid Image Source".to_string())
        }
    }
}

impl From<ImageSource> for ImageSourceBody {
    fn from(source: ImageSource) -> Self {
        match source {
            ImageSource::Url(url) => Self {
                url: Some(url),
                ..Default::default()
            },
            ImageSource::Base64(base64) => Self {
                base64: Some(base64),
                ..Default::default()
            },
            ImageSource::Bytes(bytes) => Self {
                bytes: Some(bytes),
                ..Default::default()
            },
        }
    }
}

impl Serialize for ImageSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ImageSourceBody::from(self.clone()).serialize(serializer)
    }
}

impl ImageSource {
    /// Short label for logs; never includes the payload itself.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Base64(_) => "base64",
            Self::Bytes(_) => "bytes",
        }
    }
}
