use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::info;

use lyricsync_core::{
    AppConfig, ChannelSink, EngineId, LayoutReason, PositionSource, RenderCommand, ScrollPreset,
    SharedGeometry, StaticLyricsProvider, SyncHandle, SyncService, TokioFrameScheduler,
    TracingObserver,
};

use crate::scenario::{LayoutKind, Scenario, Step};

const TRACK_ID: &str = "scenario";

#[derive(Debug)]
struct Playhead {
    base_ms: f64,
    started: Option<Instant>,
    engine: EngineId,
}

/// Wall-clock playback position shared between the timeline driver and the sync service
#[derive(Debug, Clone)]
struct LiveClock {
    playhead: Arc<Mutex<Playhead>>,
}

impl LiveClock {
    fn new(start_ms: u64) -> Self {
        Self {
            playhead: Arc::new(Mutex::new(Playhead {
                base_ms: start_ms as f64,
                started: None,
                engine: EngineId::Native,
            })),
        }
    }

    fn play(&self) {
        let mut playhead = self.playhead.lock();
        if playhead.started.is_none() {
            playhead.started = Some(Instant::now());
        }
    }

    fn pause(&self) {
        let mut playhead = self.playhead.lock();
        if let Some(started) = playhead.started.take() {
            playhead.base_ms += started.elapsed().as_secs_f64() * 1000.0;
        }
    }

    fn seek(&self, position_ms: u64) {
        let mut playhead = self.playhead.lock();
        playhead.base_ms = position_ms as f64;
        if playhead.started.is_some() {
            playhead.started = Some(Instant::now());
        }
    }

    fn set_engine(&self, engine: EngineId) {
        self.playhead.lock().engine = engine;
    }
}

impl PositionSource for LiveClock {
    fn position_ms(&self) -> f64 {
        let playhead = self.playhead.lock();
        let running = playhead
            .started
            .map_or(0.0, |started| started.elapsed().as_secs_f64() * 1000.0);
        playhead.base_ms + running
    }

    fn current_engine(&self) -> EngineId {
        self.playhead.lock().engine
    }
}

/// Play a scenario in real time through the sync service
pub async fn run(config: &AppConfig, path: &Path, preset: Option<ScrollPreset>) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let mut config = config.clone();
    if let Some(preset) = preset {
        config.scroll.preset = preset;
    }

    let provider = StaticLyricsProvider::new();
    provider.insert(TRACK_ID, scenario.lyrics());
    let lyrics = scenario.lyrics();

    let clock = LiveClock::new(scenario.start_ms);
    let geometry = SharedGeometry::new();
    geometry.replace(scenario.centers(), scenario.midpoint_px);
    let (sink, mut commands) = ChannelSink::channel();
    let frame = scenario.frame_interval(&config.scroll);

    let (service, handle) = SyncService::new(
        &config,
        clock.clone(),
        geometry.clone(),
        sink,
        Arc::new(provider),
        Box::new(TokioFrameScheduler::new(frame)),
    );
    let service = service.with_observer(Box::new(TracingObserver));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let service_task = tokio::spawn(service.run(shutdown_rx));

    let started = Instant::now();
    let printer = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            let elapsed = started.elapsed().as_millis();
            match command {
                RenderCommand::Transform(t) if t.is_instant() => {
                    println!("[{:>7} ms] snap to {:.1}px", elapsed, t.offset_px)
                }
                RenderCommand::Transform(t) => println!(
                    "[{:>7} ms] scroll to {:.1}px over {}ms",
                    elapsed, t.offset_px, t.duration_ms
                ),
                RenderCommand::Highlight(h) => {
                    let text = h
                        .current
                        .and_then(|i| lyrics.lines.get(i))
                        .map_or("-", |line| line.text.as_str());
                    println!("[{:>7} ms] now singing: {}", elapsed, text)
                }
            }
        }
    });

    handle.load_track(TRACK_ID, scenario.start_ms)?;
    drive(&scenario, &clock, &geometry, &handle).await?;

    // let the last transition land before stopping
    let settle = Duration::from_millis(config.scroll.duration_model().max_ms) + frame;
    tokio::time::sleep(settle).await;
    info!("Timeline finished");
    let _ = shutdown_tx.send(true);
    service_task.await?;
    // dropping the service closed the render channel
    printer.await?;
    Ok(())
}

async fn drive(
    scenario: &Scenario,
    clock: &LiveClock,
    geometry: &SharedGeometry,
    handle: &SyncHandle,
) -> Result<()> {
    let base_centers = scenario.centers();
    for step in &scenario.timeline {
        match *step {
            Step::Play { duration_ms } => {
                clock.play();
                tokio::time::sleep(Duration::from_millis(duration_ms)).await;
                clock.pause();
            }
            Step::Pause { duration_ms } => {
                clock.pause();
                tokio::time::sleep(Duration::from_millis(duration_ms)).await;
            }
            Step::Seek { to_ms } => clock.seek(to_ms),
            Step::Handover {
                engine,
                position_ms,
            } => {
                // the clock must read the new engine before the notification goes out
                clock.set_engine(engine);
                if let Some(position_ms) = position_ms {
                    clock.seek(position_ms);
                }
                handle.engine_handover()?;
            }
            Step::Layout {
                reason,
                scale,
                midpoint_px,
            } => {
                if let Some(scale) = scale {
                    let centers = base_centers.iter().map(|c| c.map(|c| c * scale)).collect();
                    let midpoint_px = midpoint_px.unwrap_or(scenario.midpoint_px);
                    geometry.replace(centers, midpoint_px);
                } else if let Some(midpoint_px) = midpoint_px {
                    geometry.set_midpoint(midpoint_px);
                }
                handle.layout_changed(match reason {
                    LayoutKind::Font => LayoutReason::Font,
                    LayoutKind::Window => LayoutReason::Window,
                    LayoutKind::Lyrics => LayoutReason::Lyrics,
                })?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricsync_core::{
        DispatchOutcome, ManualScheduler, ScrollEvent, SyncObserver, TransformCommand,
    };
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct Kinds(Arc<Mutex<Vec<&'static str>>>);

    impl SyncObserver for Kinds {
        fn on_dispatch(&self, event: &ScrollEvent, _outcome: &DispatchOutcome) {
            self.0.lock().push(event.kind());
        }
    }

    /// Run frames until the service goes quiet; returns the transforms written
    async fn pump(
        scheduler: &ManualScheduler,
        commands: &mut mpsc::UnboundedReceiver<RenderCommand>,
    ) -> Vec<TransformCommand> {
        let mut transforms = Vec::new();
        for _ in 0..50 {
            scheduler.fire();
            tokio::task::yield_now().await;
            while let Ok(command) = commands.try_recv() {
                if let RenderCommand::Transform(t) = command {
                    transforms.push(t);
                }
            }
        }
        transforms
    }

    #[tokio::test]
    async fn test_handover_to_new_position_is_not_a_seek() {
        let scenario = Scenario::parse(
            r#"
            [[lines]]
            timestamp_ms = 0
            text = "one"
            center_px = 10.0

            [[lines]]
            timestamp_ms = 3000
            text = "two"
            center_px = 40.0

            [[lines]]
            timestamp_ms = 6000
            text = "three"
            center_px = 70.0

            [[lines]]
            timestamp_ms = 9000
            text = "four"
            center_px = 100.0

            [[timeline]]
            action = "handover"
            engine = "native"
            position_ms = 9200
        "#,
        )
        .unwrap();

        let provider = StaticLyricsProvider::new();
        provider.insert(TRACK_ID, scenario.lyrics());
        let clock = LiveClock::new(500);
        let geometry = SharedGeometry::new();
        geometry.replace(scenario.centers(), scenario.midpoint_px);
        let scheduler = ManualScheduler::new();
        let (sink, mut commands) = ChannelSink::channel();
        let kinds = Kinds::default();

        let (service, handle) = SyncService::new(
            &AppConfig::default(),
            clock.clone(),
            geometry.clone(),
            sink,
            Arc::new(provider),
            Box::new(scheduler.clone()),
        );
        let service = service.with_observer(Box::new(kinds.clone()));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(service.run(shutdown_rx));

        handle.load_track(TRACK_ID, 500).unwrap();
        assert_eq!(pump(&scheduler, &mut commands).await, vec![TransformCommand::instant(-90.0)]);

        drive(&scenario, &clock, &geometry, &handle).await.unwrap();
        assert_eq!(pump(&scheduler, &mut commands).await, vec![TransformCommand::instant(0.0)]);
        assert_eq!(*kinds.0.lock(), vec!["index_change", "engine_handover"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_only_while_playing() {
        let clock = LiveClock::new(1000);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(clock.position_ms(), 1000.0);

        clock.play();
        tokio::time::sleep(Duration::from_millis(250)).await;
        clock.pause();
        assert!((clock.position_ms() - 1250.0).abs() < 1e-6);

        clock.seek(9000);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(clock.position_ms(), 9000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_while_playing_keeps_running() {
        let clock = LiveClock::new(0);
        clock.play();
        tokio::time::sleep(Duration::from_millis(100)).await;
        clock.seek(5000);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!((clock.position_ms() - 5100.0).abs() < 1e-6);
        clock.set_engine(EngineId::InProcess);
        assert_eq!(clock.current_engine(), EngineId::InProcess);
    }
}
