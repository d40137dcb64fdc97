//! Batch fan-out over utterances.
//!
//! With the `parallel` feature, work is spread over rayon's global pool;
//! otherwise it runs sequentially. Results always come back in input order.

/// Size the global pool. Only the first call takes effect; later calls report
/// the pool that is already running.
#[cfg(feature = "parallel")]
pub fn configure_thread_pool(num_threads: Option<usize>) -> usize {
    let builder = rayon::ThreadPoolBuilder::new();
    let builder = match num_threads {
        Some(n) => builder.num_threads(n),
        None => builder,
    };
    if builder.build_global().is_err() {
        tracing::debug!("rayon global pool already initialized");
    }
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
pub fn configure_thread_pool(num_threads: Option<usize>) -> usize {
    let _ = num_threads;
    1
}

#[cfg(feature = "parallel")]
pub fn parallel_map<T, U, F>(items: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(usize, &T) -> U + Send + Sync,
{
    use rayon::prelude::*;
    items.par_iter().enumerate().map(|(i, item)| f(i, item)).collect()
}

#[cfg(not(feature = "parallel"))]
pub fn parallel_map<T, U, F>(items: &[T], f: F) -> Vec<U>
where
    F: Fn(usize, &T) -> U,
{
    items.iter().enumerate().map(|(i, item)| f(i, item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_map_keeps_input_order() {
        let items: Vec<u64> = (0..257).collect();
        let out = parallel_map(&items, |i, v| (i as u64) * 1000 + v * 2);
        let expected: Vec<u64> = (0..257).map(|v| v * 1000 + v * 2).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn parallel_map_empty() {
        let items: Vec<u8> = Vec::new();
        assert!(parallel_map(&items, |_, v| *v).is_empty());
    }

    #[test]
    fn configure_thread_pool_reports_threads() {
        assert!(configure_thread_pool(None) >= 1);
    }
}
