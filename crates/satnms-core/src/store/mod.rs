// ── Session-local storage ──

mod repository;

pub use repository::ObjectRepository;
