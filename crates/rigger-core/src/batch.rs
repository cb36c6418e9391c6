//! Sequential chunked processing for bulk calls that must stay under a
//! per-transaction size limit.

use crate::log::Topic;
use std::{future::Future, num::NonZeroUsize};

/// Run `handler` over consecutive chunks of at most `size` items, in order.
/// Stops at the first error. Returns the number of chunks handled.
pub async fn process_batches<T, F, Fut, E>(
    items: &[T],
    size: NonZeroUsize,
    mut handler: F,
) -> Result<usize, E>
where
    F: FnMut(usize, &[T]) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let total = items.len().div_ceil(size.get());

    for (index, chunk) in items.chunks(size.get()).enumerate() {
        log!(
            Topic::Tx,
            Debug,
            "batch {}/{total} ({} items)",
            index + 1,
            chunk.len()
        );
        handler(index, chunk).await?;
    }

    Ok(total)
}

///
/// TESTS
///
