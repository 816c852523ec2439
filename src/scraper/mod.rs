pub mod fetcher;
pub mod live;
pub mod normalizer;

pub use fetcher::BatchFetcher;
pub use live::LiveBatcher;
pub use normalizer::normalize;
