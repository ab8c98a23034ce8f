mod cache;
mod debounce;
mod fetcher;
mod path;

pub use cache::CompletionCache;
pub use fetcher::{Completion, CompletionFetcher, CompletionUpdate};
pub use path::{normalize_dir, resolve_tab, TabResolution};
