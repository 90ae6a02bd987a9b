pub mod block_set;
pub mod genomic_region;
pub mod site_index;
pub mod site_range;

// re-export for cleaner imports
pub use self::block_set::{Block, BlockSet};
pub use self::genomic_region::GenomicRegion;
pub use self::site_index::SiteIndex;
pub use self::site_range::SiteRange;
