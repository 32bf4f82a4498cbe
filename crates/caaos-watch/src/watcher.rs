use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use caaos_model::{Attributes, Etag};

use crate::{errors::WatchError, transport::MetadataTransport};

/// Source of workload attributes that blocks until they change.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Wait for attributes newer than `etag`.
    ///
    /// On return `etag` holds the token of the last answered poll.
    /// `Ok(None)` means the wait was cancelled and should simply be retried.
    async fn watch(
        &self,
        ctx: &CancellationToken,
        etag: &mut Etag,
    ) -> Result<Option<Attributes>, WatchError>;
}

#[async_trait]
impl<S: ConfigSource + ?Sized> ConfigSource for std::sync::Arc<S> {
    async fn watch(
        &self,
        ctx: &CancellationToken,
        etag: &mut Etag,
    ) -> Result<Option<Attributes>, WatchError> {
        (**self).watch(ctx, etag).await
    }
}

/// Long-poll watcher over a [`MetadataTransport`].
///
/// Answers carrying the same token as the one we sent are swallowed and polled again,
/// so callers only ever see real changes.
pub struct ConfigWatcher<T> {
    transport: T,
}

impl<T: MetadataTransport> ConfigWatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: MetadataTransport> ConfigSource for ConfigWatcher<T> {
    async fn watch(
        &self,
        ctx: &CancellationToken,
        etag: &mut Etag,
    ) -> Result<Option<Attributes>, WatchError> {
        loop {
            if ctx.is_cancelled() {
                return Ok(None);
            }

            let response = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Ok(None),
                res = self.transport.fetch(etag) => res,
            };
            let response = match response {
                Ok(r) => r,
                Err(e) if ctx.is_cancelled() => {
                    trace!(error = %e, "metadata request aborted by cancellation");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            let fresh = Etag::from_header(response.etag.as_deref());
            if fresh == *etag {
                trace!(%etag, "metadata unchanged; polling again");
                continue;
            }
            debug!(old = %etag, new = %fresh, "metadata changed");
            *etag = fresh;

            return Ok(Some(Attributes::from_json(&response.body)?));
        }
    }
}
