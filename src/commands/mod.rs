pub mod plan;
pub mod post;
pub mod run;
pub mod status;

// Re-export command functions for convenience
pub use plan::plan;
pub use post::post;
pub use run::run;
pub use status::status;
