//! Project tasks.

pub mod root;

pub use self::root::handler as root;
