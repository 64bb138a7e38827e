//! Single-file multipart upload stage.
//!
//! ```rust,ignore
//! scope.post("/upload", vec![upload::single("file", store)], Self::upload_file);
//! ```
//!
//! The stage reads the part named `field` out of a `multipart/form-data`
//! body, hands it to the configured [`UploadStore`], and attaches the
//! resulting [`StoredFile`](crate::upload::StoredFile) to the request. Other
//! parts are skipped.

use std::sync::Arc;

use async_trait::async_trait;
use multer::{Constraints, Multipart, SizeLimit};

use super::{BoxedMiddleware, Middleware};
use crate::error::Error;
use crate::request::Request;
use crate::upload::{IncomingFile, UploadStore};

/// Default per-file size limit (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub struct Upload {
    field: String,
    store: Arc<dyn UploadStore>,
    max_size: u64,
}

/// Accept exactly one file under `field`.
pub fn single(field: impl Into<String>, store: Arc<dyn UploadStore>) -> BoxedMiddleware {
    Arc::new(Upload::new(field, store))
}

impl Upload {
    pub fn new(field: impl Into<String>, store: Arc<dyn UploadStore>) -> Self {
        Self { field: field.into(), store, max_size: DEFAULT_MAX_FILE_SIZE }
    }

    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    async fn read_field(&self, req: &Request) -> Result<IncomingFile, Error> {
        let content_type = req
            .header("content-type")
            .ok_or_else(|| Error::invalid(&self.field, "expected a multipart/form-data body"))?;
        let boundary = multer::parse_boundary(content_type)
            .map_err(|e| Error::invalid(&self.field, format!("expected a multipart/form-data body: {e}")))?;

        let body = req.body().clone();
        let stream = futures_util::stream::once(async move { Ok::<_, std::io::Error>(body) });
        let constraints = Constraints::new().size_limit(SizeLimit::new().per_field(self.max_size));
        let mut multipart = Multipart::with_constraints(stream, boundary, constraints);

        while let Some(part) = multipart.next_field().await.map_err(|e| self.malformed(e))? {
            if part.name() != Some(self.field.as_str()) {
                continue;
            }
            let file_name = part.file_name().map(str::to_owned);
            let content_type = part.content_type().map(ToString::to_string);
            let data = part.bytes().await.map_err(|e| self.malformed(e))?;
            return Ok(IncomingFile { field: self.field.clone(), file_name, content_type, data });
        }

        Err(Error::invalid(&self.field, "no file uploaded under this field"))
    }

    fn malformed(&self, err: multer::Error) -> Error {
        Error::invalid(&self.field, format!("unreadable multipart body: {err}"))
    }
}

#[async_trait]
impl Middleware for Upload {
    fn name(&self) -> &str {
        "upload"
    }

    async fn handle(&self, mut req: Request) -> Result<Request, Error> {
        let incoming = self.read_field(&req).await?;
        let stored = self.store.store(incoming).await?;
        req.set_file(stored);
        Ok(req)
    }
}
