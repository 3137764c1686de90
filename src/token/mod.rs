pub mod claims;
mod coordinator;
mod policy;

pub use coordinator::RefreshCoordinator;
pub use policy::RefreshPolicy;
