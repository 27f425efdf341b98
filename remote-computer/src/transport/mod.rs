//! SSH transport layer wrapping russh.
//!
//! This module provides connection setup, authentication, host key policy
//! and one-shot command execution over PTY session channels. The
//! [`Connector`] and [`RemoteSession`] traits are the seam the shutdown
//! handler talks to.

pub mod config;
mod ssh;

use std::future::Future;

use bytes::Bytes;

pub use config::{HostKeyVerification, SshConfig};
pub use ssh::{SshConnector, SshTransport};

use crate::error::ConnectionError;

/// Output of a remote command run to completion.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Combined stdout and stderr.
    pub output: Bytes,

    /// Exit status, if the server reported one before closing the channel.
    pub exit_status: Option<u32>,
}

/// Opens authenticated sessions to a remote host.
pub trait Connector: Send + Sync {
    type Session: RemoteSession;

    /// Connect and authenticate.
    fn connect(
        &self,
        config: SshConfig,
    ) -> impl Future<Output = Result<Self::Session, ConnectionError>> + Send;
}

/// An authenticated connection that can run commands.
pub trait RemoteSession: Send {
    /// Run a command on its own channel, feed it `input`, and wait for it
    /// to finish.
    fn exec(
        &mut self,
        command: &str,
        input: &[u8],
    ) -> impl Future<Output = Result<CommandOutput, ConnectionError>> + Send;

    /// Close the connection.
    fn close(self) -> impl Future<Output = Result<(), ConnectionError>> + Send;
}
