pub mod geo;

pub use geo::*;

use rayon::prelude::*;

pub trait Identifiable {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn normalized_name(&self) -> &str;
}

/// Case-insensitive substring scan over a data set, matching against the
/// normalized name or the id. An empty needle matches everything, which is
/// what browsing wants. Input order is preserved.
pub fn search<'a, T>(needle: &str, haystack: &'a [T]) -> Vec<&'a T>
where
    T: Send + Sync + Identifiable,
{
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return haystack.iter().collect();
    }
    haystack
        .par_iter()
        .filter(|hay| {
            hay.normalized_name().contains(&needle) || hay.id().to_lowercase().contains(&needle)
        })
        .collect()
}
