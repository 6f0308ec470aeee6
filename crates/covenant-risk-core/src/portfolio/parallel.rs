//! Conditional parallel iteration over loans.
//!
//! Uses rayon when the `parallel` feature is enabled and the config says the
//! collection is large enough. Output order always matches input order.

use crate::config::EngineConfig;

#[allow(unused_variables)]
pub fn maybe_parallel_map<T, U, F>(items: &[T], config: &EngineConfig, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if config.should_parallelize(items.len()) {
            return items.par_iter().map(f).collect();
        }
    }

    items.iter().map(f).collect()
}
