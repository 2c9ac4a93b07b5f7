// Session Collection: ranking, aggregate stats, and the Collection Manager that owns
// deletion reconciliation with the collaborator.

pub mod manager;
pub mod ranking;

pub use manager::{
    CollectionManager, DeleteOutcome, SessionError, SessionReset, SessionView,
};
pub use ranking::SortKey;
