pub mod cli;
pub mod collector;
pub mod writer;

pub use cli::Args;
pub use collector::{collect, exit_status, load_credentials, CollectRequest, Outcome};
