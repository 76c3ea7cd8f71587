pub mod filter;
pub mod options;
pub mod record;
pub mod selection;

pub use filter::{apply_filters, apply_filters_at, DateRange, DateWindow, FilterCriteria, FilterForm};
pub use options::ObjectTypeOptions;
pub use record::{DetectionRecord, Direction};
pub use selection::{SelectionSet, SelectionSummary};
