//! Headless realtime transport: credential broker + websocket data channel.
//!
//! The sequence mirrors the session bootstrap contract: acquire the local
//! capture device, obtain a short-lived credential from the broker, then
//! establish the realtime link and start pumping audio out and protocol
//! events in.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use stump_common::{Event, EventBus};

use super::capture::{encode_frame, rms_level, AudioCapture};
use super::credentials::CredentialBroker;
use super::Transport;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::VoiceError;

/// Connection settings for [`RealtimeTransport`].
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub broker_url: String,
    pub realtime_url: String,
    pub model: String,
    pub connect_timeout: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            broker_url: "http://127.0.0.1:8787/session".into(),
            realtime_url: "wss://api.openai.com/v1/realtime".into(),
            model: "gpt-4o-realtime-preview".into(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Websocket binding of the [`Transport`] seam.
pub struct RealtimeTransport {
    config: RealtimeConfig,
    capture: Box<dyn AudioCapture>,
    bus: Arc<EventBus>,
    open: Arc<watch::Sender<bool>>,
    out_tx: Option<mpsc::Sender<Message>>,
    tasks: Vec<JoinHandle<()>>,
    started: bool,
}

impl RealtimeTransport {
    pub fn new(config: RealtimeConfig, capture: Box<dyn AudioCapture>, bus: Arc<EventBus>) -> Self {
        let (open, _) = watch::channel(false);
        Self {
            config,
            capture,
            bus,
            open: Arc::new(open),
            out_tx: None,
            tasks: Vec::new(),
            started: false,
        }
    }
}

#[async_trait]
impl Transport for RealtimeTransport {
    async fn start(&mut self) -> Result<mpsc::Receiver<ServerEvent>, VoiceError> {
        if self.started {
            return Err(VoiceError::Transport("transport already started".into()));
        }
        self.started = true;

        // 1. Local media first; nothing to tear down yet if this fails.
        let mut frames = self.capture.acquire().await?;

        // 2. Short-lived credential from the trusted broker.
        let broker = CredentialBroker::new(&self.config.broker_url);
        let credential = match broker.issue(&self.config.model).await {
            Ok(c) => c,
            Err(e) => {
                self.capture.release().await;
                return Err(e);
            }
        };

        // 3. Establish the data channel.
        let url = format!("{}?model={}", self.config.realtime_url, self.config.model);
        let request = match build_request(&url, &credential.client_secret) {
            Ok(r) => r,
            Err(e) => {
                self.capture.release().await;
                return Err(e);
            }
        };

        tracing::info!(url = %self.config.realtime_url, model = %self.config.model, "connecting realtime transport");
        let connect = tokio::time::timeout(self.config.connect_timeout, connect_async(request));
        let (ws, _) = match connect.await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                self.capture.release().await;
                return Err(VoiceError::Negotiation(format!("connect failed: {e}")));
            }
            Err(_) => {
                self.capture.release().await;
                return Err(VoiceError::Negotiation("connect timed out".into()));
            }
        };

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);
        let (event_tx, event_rx) = mpsc::channel::<ServerEvent>(256);

        self.open.send_replace(true);

        // Writer: program-order sends onto the channel.
        let open = self.open.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if let Err(e) = sink.send(msg).await {
                    tracing::warn!(error = %e, "data channel write failed");
                    open.send_replace(false);
                    break;
                }
            }
        }));

        // Reader: parse protocol events, tolerate unknown kinds.
        let open = self.open.clone();
        let pong_tx = out_tx.clone();
        self.tasks.push(tokio::spawn(async move {
            loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => {
                                if event_tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "unparseable server event");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = pong_tx.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("realtime endpoint closed the channel");
                        open.send_replace(false);
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "data channel read failed");
                        open.send_replace(false);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }));

        // Capture pump: level metering plus outbound audio.
        let bus = self.bus.clone();
        let audio_tx = out_tx.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                bus.publish(Event::MicLevel(rms_level(&frame)));
                if frame.samples.is_empty() {
                    continue;
                }
                let event = ClientEvent::InputAudioBufferAppend {
                    audio: encode_frame(&frame),
                };
                let json = serde_json::to_string(&event).unwrap();
                if audio_tx.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }));

        self.out_tx = Some(out_tx);
        Ok(event_rx)
    }

    async fn wait_open(&mut self, timeout: Duration) -> Result<(), VoiceError> {
        let mut rx = self.open.subscribe();
        if *rx.borrow() {
            return Ok(());
        }
        let opened = tokio::time::timeout(timeout, async {
            loop {
                if *rx.borrow() {
                    return true;
                }
                if rx.changed().await.is_err() {
                    return false;
                }
            }
        })
        .await;
        match opened {
            Ok(true) => Ok(()),
            Ok(false) => Err(VoiceError::Transport("transport closed".into())),
            Err(_) => Err(VoiceError::ChannelTimeout(timeout)),
        }
    }

    fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    async fn send(&mut self, event: ClientEvent) -> Result<(), VoiceError> {
        let Some(tx) = &self.out_tx else {
            return Err(VoiceError::Transport("transport not started".into()));
        };
        if !self.is_open() {
            return Err(VoiceError::Transport("data channel closed".into()));
        }
        let json = serde_json::to_string(&event)
            .map_err(|e| VoiceError::Transport(format!("serialize failed: {e}")))?;
        tx.send(Message::Text(json.into()))
            .await
            .map_err(|_| VoiceError::Transport("data channel closed".into()))
    }

    async fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.out_tx = None;
        self.open.send_replace(false);
        self.capture.release().await;
    }
}

impl Drop for RealtimeTransport {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn build_request(
    url: &str,
    secret: &str,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, VoiceError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| VoiceError::Negotiation(format!("bad realtime url: {e}")))?;
    let auth = HeaderValue::from_str(&format!("Bearer {secret}"))
        .map_err(|e| VoiceError::Negotiation(format!("bad credential: {e}")))?;
    request.headers_mut().insert("Authorization", auth);
    request
        .headers_mut()
        .insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));
    Ok(request)
}
