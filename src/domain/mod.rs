pub mod category;
pub mod changes;
pub mod interest;
pub mod normalize;
pub mod sync;

pub use category::Category;
pub use changes::{ChangeEvent, ChangeType};
pub use interest::{InterestRecord, NormalizedRecord};
pub use normalize::{FieldPolicy, RawRow};
pub use sync::{Datasets, InterestStore, SyncEngine, SyncStats};
