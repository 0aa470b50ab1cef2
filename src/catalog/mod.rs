// Catalog module - the fingerprint store
//
// A catalog is an explicitly owned identifier -> record mapping. It is built
// in one pass by the batch loader (or from precomputed rows) and served
// through a CatalogHandle, which only ever swaps whole collections.

mod collection;
mod handle;
mod loader;
mod source;

pub use collection::{FingerprintCollection, ReferenceRecord, StorageRef};
pub use handle::CatalogHandle;
pub use loader::{extract_entry, load_all, BatchReport, ItemOutcome, SkippedItem};
pub use source::{
    CatalogEntry, CatalogSource, DirectorySource, EntryFilter, ExtensionFilter, MemorySource,
};
