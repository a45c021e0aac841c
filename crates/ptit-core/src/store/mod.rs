mod collection;

pub use collection::{EntityCollection, Snapshot};
