pub mod backend;
pub mod builder;
pub mod defaults;
pub mod parallel;
pub mod runtime;
pub mod traits;
