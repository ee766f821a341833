//! Bounded-concurrency executor shared by the probe and enrichment pools.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Run `f` over every item with at most `concurrency` futures in flight
/// at any instant. Results are returned in completion order.
pub async fn run<I, T, F, Fut>(items: Vec<I>, concurrency: usize, f: F) -> Vec<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T>,
{
    stream::iter(items)
        .map(|item| f(item))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}
