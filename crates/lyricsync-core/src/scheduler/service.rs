use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, ScrollConfig};
use crate::engine::LyricSync;
use crate::event::LayoutReason;
use crate::lyrics::{LyricsProvider, ParsedLyrics};
use crate::observe::SyncObserver;
use crate::position::PositionSource;
use crate::render::{Layout, LineMeasurer, RenderSink};
use crate::{Error, Result};

use super::frame::{Scheduler, TickHandle};

/// Messages processed, in order, by the sync service task
#[derive(Debug, Clone)]
pub enum SyncCommand {
    /// Draw-loop frame
    Tick,
    /// A new track started; its lyrics are fetched in the background
    LoadTrack { track_id: String, start_ms: u64 },
    /// Fetch result for a requested track
    LyricsLoaded {
        track_id: String,
        start_ms: u64,
        lyrics: Option<ParsedLyrics>,
    },
    LayoutChanged(LayoutReason),
    /// The authoritative playback engine is switching
    EngineHandover,
    SetScrollConfig(ScrollConfig),
}

/// Cloneable sender side of a running [`SyncService`]
#[derive(Debug, Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<SyncCommand>,
}

impl SyncHandle {
    pub fn send(&self, command: SyncCommand) -> Result<()> {
        self.tx.send(command).map_err(|_| Error::ChannelClosed)
    }

    pub fn load_track(&self, track_id: impl Into<String>, start_ms: u64) -> Result<()> {
        self.send(SyncCommand::LoadTrack {
            track_id: track_id.into(),
            start_ms,
        })
    }

    pub fn layout_changed(&self, reason: LayoutReason) -> Result<()> {
        self.send(SyncCommand::LayoutChanged(reason))
    }

    pub fn engine_handover(&self) -> Result<()> {
        self.send(SyncCommand::EngineHandover)
    }

    pub fn set_scroll_config(&self, config: ScrollConfig) -> Result<()> {
        self.send(SyncCommand::SetScrollConfig(config))
    }
}

/// The single task that owns the sync engine and the transform-write path.
///
/// Position ticks, layout signals and track changes all arrive on one
/// channel, so transform writes are serialized without a lock.
pub struct SyncService<P, G, S> {
    engine: LyricSync,
    source: P,
    geometry: G,
    sink: S,
    provider: Arc<dyn LyricsProvider>,
    scheduler: Box<dyn Scheduler>,
    tx: mpsc::UnboundedSender<SyncCommand>,
    rx: mpsc::UnboundedReceiver<SyncCommand>,
    current_track: Option<String>,
    tick_handle: Option<TickHandle>,
}

impl<P, G, S> SyncService<P, G, S>
where
    P: PositionSource + Send + 'static,
    G: LineMeasurer + Layout + Send + 'static,
    S: RenderSink + Send + 'static,
{
    pub fn new(
        config: &AppConfig,
        source: P,
        geometry: G,
        sink: S,
        provider: Arc<dyn LyricsProvider>,
        scheduler: Box<dyn Scheduler>,
    ) -> (Self, SyncHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SyncHandle { tx: tx.clone() };
        let service = Self {
            engine: LyricSync::new(config),
            source,
            geometry,
            sink,
            provider,
            scheduler,
            tx,
            rx,
            current_track: None,
            tick_handle: None,
        };
        (service, handle)
    }

    /// Set the observability sink for dispatch decisions
    pub fn with_observer(mut self, observer: Box<dyn SyncObserver>) -> Self {
        self.engine = self.engine.with_observer(observer);
        self
    }

    /// Process commands until the shutdown signal fires
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Lyric sync service started");
        self.request_frame();

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Lyric sync service received shutdown signal");
                        break;
                    }
                }

                command = self.rx.recv() => {
                    match command {
                        Some(command) => self.handle(command),
                        None => break,
                    }
                }
            }
        }

        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }
        info!("Lyric sync service stopped");
    }

    fn handle(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::Tick => {
                self.tick_handle = None;
                self.engine
                    .tick(&self.source, &self.geometry, &self.geometry, &mut self.sink);
                self.request_frame();
            }
            SyncCommand::LoadTrack { track_id, start_ms } => {
                debug!(track_id = %track_id, "Loading lyrics for track");
                self.current_track = Some(track_id.clone());
                self.engine.clear_lyrics();
                self.fetch_lyrics(track_id, start_ms);
            }
            SyncCommand::LyricsLoaded {
                track_id,
                start_ms,
                lyrics,
            } => {
                if self.current_track.as_deref() != Some(track_id.as_str()) {
                    debug!(track_id = %track_id, "Discarding lyrics for a track that is no longer playing");
                    return;
                }
                match lyrics {
                    Some(lyrics) => self.engine.load_lyrics(Arc::new(lyrics), start_ms),
                    None => info!(track_id = %track_id, "No lyrics for track"),
                }
            }
            SyncCommand::LayoutChanged(reason) => {
                self.engine
                    .layout_changed(reason, &self.geometry, &self.geometry, &mut self.sink);
            }
            SyncCommand::EngineHandover => self.engine.notify_engine_handover(),
            SyncCommand::SetScrollConfig(config) => self.engine.set_scroll_config(&config),
        }
    }

    fn fetch_lyrics(&self, track_id: String, start_ms: u64) {
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let lyrics = match provider.get_parsed_lyrics(&track_id).await {
                Ok(lyrics) => lyrics,
                Err(e) => {
                    warn!(track_id = %track_id, "Failed to load lyrics: {}", e);
                    None
                }
            };
            let loaded = SyncCommand::LyricsLoaded {
                track_id,
                start_ms,
                lyrics,
            };
            if tx.send(loaded).is_err() {
                debug!("Sync service gone before lyrics arrived");
            }
        });
    }

    fn request_frame(&mut self) {
        if self.tick_handle.is_some() {
            return;
        }
        let tx = self.tx.clone();
        self.tick_handle = Some(self.scheduler.schedule_tick(Box::new(move || {
            let _ = tx.send(SyncCommand::Tick);
        })));
    }
}
