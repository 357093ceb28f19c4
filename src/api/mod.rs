pub mod cli;
pub mod http;

pub use cli::{AddOutcome, Cli, CliError, CliHandler, Commands, RemoveOutcome, WalletRegistry};
pub use http::{router, ApiError, ApiServer, AppState, StatusResponse, WalletsResponse};
