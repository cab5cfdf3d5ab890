// ── Domain model ──

pub mod capability;
pub mod fault;
pub mod handle;
pub mod object;

pub use capability::Capabilities;
pub use fault::Faults;
pub use handle::{Handle, ROOT};
pub use object::{ObjectRecord, Params, merge_params};
