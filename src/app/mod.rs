pub mod models;
pub mod output;
pub mod run;

pub use models::Report;
pub use run::run;
