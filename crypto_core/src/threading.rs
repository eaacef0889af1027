//! Splitting batches of independent work across a fixed-size thread pool.

use rayon::ThreadPool;

/// Index range of work items assigned to one thread.
///
/// Returns the half-open interval `[start, end)` of `num_items` items that
/// thread `thread_id` out of `num_threads` is responsible for. The ranges
/// are contiguous, disjoint and cover `0..num_items` exactly once; the
/// first `num_items % num_threads` threads hold one extra item.
pub fn partition(num_items: usize, num_threads: usize, thread_id: usize) -> (usize, usize) {
    debug_assert!(num_threads > 0);
    let base_len = num_items / num_threads;
    let rest = num_items % num_threads;
    let start = thread_id * base_len + thread_id.min(rest);
    let end = (thread_id + 1) * base_len + (thread_id + 1).min(rest);
    (start, end)
}

/// Evaluate `func` on every index in `0..num_items` across `pool`.
///
/// One task per partitioned range is submitted; each task walks its range
/// sequentially. Results come back in index order. The calling thread
/// blocks until every range has finished; a panic inside any range
/// resurfaces here once the remaining tasks have completed.
pub fn compute<T, F>(pool: &ThreadPool, num_items: usize, num_threads: usize, func: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let mut parts: Vec<Vec<T>> = (0..num_threads).map(|_| Vec::new()).collect();
    pool.scope(|scope| {
        for (thread_id, part) in parts.iter_mut().enumerate() {
            let func = &func;
            scope.spawn(move |_| {
                let (start, end) = partition(num_items, num_threads, thread_id);
                *part = (start..end).map(func).collect();
            });
        }
    });
    parts.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::ThreadPoolBuilder;

    #[test]
    fn test_partition_covers_exactly() {
        for num_items in 1..=40usize {
            for num_threads in 1..=num_items {
                let mut covered = Vec::new();
                let base_len = num_items / num_threads;
                for thread_id in 0..num_threads {
                    let (start, end) = partition(num_items, num_threads, thread_id);
                    assert!(start <= end);
                    let len = end - start;
                    assert!(len == base_len || len == base_len + 1);
                    covered.extend(start..end);
                }
                let expected: Vec<usize> = (0..num_items).collect();
                assert_eq!(covered, expected);
            }
        }
    }

    #[test]
    fn test_partition_extra_items_go_first() {
        // 10 items over 4 threads: 3, 3, 2, 2
        assert_eq!(partition(10, 4, 0), (0, 3));
        assert_eq!(partition(10, 4, 1), (3, 6));
        assert_eq!(partition(10, 4, 2), (6, 8));
        assert_eq!(partition(10, 4, 3), (8, 10));
    }

    #[test]
    fn test_partition_more_threads_than_items() {
        let mut covered = Vec::new();
        for thread_id in 0..8 {
            let (start, end) = partition(3, 8, thread_id);
            covered.extend(start..end);
        }
        assert_eq!(covered, vec![0, 1, 2]);
    }

    #[test]
    fn test_compute_matches_sequential() {
        let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        for num_threads in 1..=5 {
            let result = compute(&pool, 23, num_threads, |i| i * i);
            let expected: Vec<usize> = (0..23).map(|i| i * i).collect();
            assert_eq!(result, expected);
        }
    }

    #[test]
    fn test_compute_empty() {
        let pool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let result = compute(&pool, 0, 2, |i| i);
        assert!(result.is_empty());
    }

    #[test]
    #[should_panic]
    fn test_compute_propagates_panics() {
        let pool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        compute(&pool, 8, 2, |i| {
            if i == 5 {
                panic!("boom");
            }
            i
        });
    }
}
