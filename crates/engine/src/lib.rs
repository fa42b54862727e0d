pub mod attempts;
pub mod devices;
pub mod directory;
pub mod pipeline;
pub mod policy;
pub mod scheduler;
