//! Object store that refuses every write.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{self, FutureExt};
use futures::stream::BoxStream;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore,
    PutMultipartOptions, PutOptions, PutPayload, PutResult, Result, UploadPart,
};

/// Reads succeed, writes and parts fail. Remembers aborted multipart uploads.
#[derive(Debug, Default)]
pub struct RefusingStore {
    inner: InMemory,
    aborted: Arc<AtomicBool>,
}

impl RefusingStore {
    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

impl fmt::Display for RefusingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefusingStore")
    }
}

fn refused() -> object_store::Error {
    object_store::Error::Generic {
        store: "RefusingStore",
        source: "connection reset by peer".into(),
    }
}

#[async_trait]
impl ObjectStore for RefusingStore {
    async fn put_opts(&self, _: &Path, _: PutPayload, _: PutOptions) -> Result<PutResult> {
        Err(refused())
    }

    async fn put_multipart_opts(
        &self,
        _: &Path,
        _: PutMultipartOptions,
    ) -> Result<Box<dyn MultipartUpload>> {
        Ok(Box::new(RefusedUpload {
            aborted: Arc::clone(&self.aborted),
        }))
    }

    async fn get_opts(&self, location: &Path, options: GetOptions) -> Result<GetResult> {
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &Path) -> Result<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&Path>) -> BoxStream<'static, Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(&self, prefix: Option<&Path>) -> Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, _: &Path, _: &Path) -> Result<()> {
        Err(refused())
    }

    async fn copy_if_not_exists(&self, _: &Path, _: &Path) -> Result<()> {
        Err(refused())
    }
}

#[derive(Debug)]
struct RefusedUpload {
    aborted: Arc<AtomicBool>,
}

#[async_trait]
impl MultipartUpload for RefusedUpload {
    fn put_part(&mut self, _: PutPayload) -> UploadPart {
        future::ready(Err(refused())).boxed()
    }

    async fn complete(&mut self) -> Result<PutResult> {
        Err(refused())
    }

    async fn abort(&mut self) -> Result<()> {
        self.aborted.store(true, Ordering::SeqCst);
        Ok(())
    }
}
