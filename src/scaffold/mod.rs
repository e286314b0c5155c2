pub mod assemble;
pub mod record;
pub mod store;

pub use assemble::{generate_sequence, ScaffoldOpt};
pub use record::{LinkDir, Orientation, ScaffoldLink, ScaffoldRecord};
pub use store::SequenceStore;
