mod article;
mod feed;
mod scan_progress;

pub use article::ArticleRepository;
pub use feed::{FeedRepository, FeedScanUpdate};
pub use scan_progress::ScanProgressRepository;
