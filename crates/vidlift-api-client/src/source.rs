use bytes::Bytes;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::pin::Pin;
use tokio::io::AsyncRead;
use vidlift_core::UploadMetadata;

pub type UploadReader = Pin<Box<dyn AsyncRead + Send + Sync>>;

/// The bytes to upload together with their declared name, type and length.
pub struct UploadFile {
    file_name: String,
    content_type: String,
    length: u64,
    reader: UploadReader,
}

impl UploadFile {
    pub fn from_reader(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        length: u64,
        reader: impl AsyncRead + Send + Sync + 'static,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            length,
            reader: Box::pin(reader),
        }
    }

    pub fn from_bytes(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        let length = data.len() as u64;
        Self::from_reader(file_name, content_type, length, Cursor::new(data))
    }

    /// Open a file on disk. The name sent to the backend is the final path component.
    pub async fn open(path: impl AsRef<Path>, content_type: impl Into<String>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
            })?;
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        Ok(Self::from_reader(file_name, content_type, length, file))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Metadata for the credential request, without duration or thumbnail.
    pub fn metadata(&self) -> UploadMetadata {
        UploadMetadata::new(&self.file_name, self.length, &self.content_type)
    }

    pub(crate) fn into_reader(self) -> UploadReader {
        self.reader
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}
