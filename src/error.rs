//! Binary error types.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("failed to load configuration")]
    Config,
    /// Opening the archive, database or catalog failed.
    #[display("failed to start")]
    Startup,
    #[display("command failed")]
    Command,
    #[display("failed to write output")]
    Output,
}
