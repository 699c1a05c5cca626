// Drive v2 API types

use serde::{Deserialize, Deserializer, Serialize};

/// One file resource as returned by `GET /drive/v2/files`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveFile {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(rename = "mimeType", default)]
    pub mime_type: String,

    /// Absent for Google-native documents
    #[serde(rename = "downloadUrl", default)]
    pub download_url: Option<String>,

    /// Drive encodes int64 fields as decimal strings
    #[serde(rename = "fileSize", default, deserialize_with = "deserialize_file_size")]
    pub file_size: u64,

    #[serde(rename = "originalFilename", default)]
    pub original_filename: Option<String>,
}

impl DriveFile {
    /// Name used for the job: the uploaded filename, else the Drive title
    pub fn filename(&self) -> &str {
        self.original_filename.as_deref().unwrap_or(&self.title)
    }
}

/// One page of a file listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilePage {
    #[serde(default)]
    pub items: Vec<DriveFile>,

    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

fn deserialize_file_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeRepr {
        Text(String),
        Number(u64),
    }

    match Option::<SizeRepr>::deserialize(deserializer)? {
        None => Ok(0),
        Some(SizeRepr::Number(n)) => Ok(n),
        Some(SizeRepr::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
