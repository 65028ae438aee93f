//! Physical link to the realtime endpoint.
//!
//! The session core only sees the [`Transport`] trait; everything that
//! knows about concrete media or networking libraries lives behind it,
//! one adapter per platform binding. The shipped adapter is
//! [`realtime::RealtimeTransport`], the headless websocket binding.

pub mod capture;
pub mod credentials;
pub mod realtime;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::protocol::{ClientEvent, ServerEvent};
use crate::VoiceError;

/// A bidirectional audio+data link.
///
/// One transport serves one connection; restarts create a fresh one
/// through a [`TransportFactory`].
#[async_trait]
pub trait Transport: Send {
    /// Acquire local media, exchange credentials, and establish the link.
    /// Returns the inbound protocol event stream.
    ///
    /// Call once per transport; a restart builds a new one.
    async fn start(&mut self) -> Result<mpsc::Receiver<ServerEvent>, VoiceError>;

    /// Wait until the data channel accepts writes, bounded by `timeout`.
    async fn wait_open(&mut self, timeout: Duration) -> Result<(), VoiceError>;

    fn is_open(&self) -> bool;

    /// Write a structured message on the data channel. Requires the
    /// channel to be open.
    async fn send(&mut self, event: ClientEvent) -> Result<(), VoiceError>;

    /// Tear everything down: data channel, connection, media tracks,
    /// metering. Idempotent and safe to call from any state, including
    /// mid-negotiation.
    async fn stop(&mut self);
}

/// Builds a fresh [`Transport`] for each (re)start.
pub trait TransportFactory: Send {
    fn create(&self) -> Box<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Box<dyn Transport> + Send,
{
    fn create(&self) -> Box<dyn Transport> {
        (self)()
    }
}
