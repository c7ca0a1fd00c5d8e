//! Static analysis: detection, responsibility grouping, import indexing,
//! and recommendations.

pub mod detector;
pub mod imports;
pub mod recommend;
pub mod responsibility;

pub use detector::{scan_tree, Detection, DetectionRecord};
pub use imports::{module_path_of, ReverseImportIndex};
pub use recommend::recommend;
pub use responsibility::{group_declarations, to_snake_case};
