use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use log::{debug, info};
use thiserror::Error;

use crate::config::ConsumptionConfig;
use crate::items::CraftCounter;
use crate::ui::UiSink;
use crate::viewpoint::Viewpoint;
use crate::visual::{spawn_or_placeholder, Pose, SceneHost, VisualHandle, VisualKind};

/// View-space anchor of the held unit at rest.
const REST_OFFSET: Vec3 = Vec3::new(0.2, -0.15, -0.5);
/// View-space anchor of the held unit raised to the mouth.
const MOUTH_OFFSET: Vec3 = Vec3::new(0.05, -0.05, -0.3);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConsumptionError {
    #[error("You have no cigarette to smoke!")]
    NoUnits,
    #[error("You can't smoke while rolling!")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumptionEvent {
    Started,
    Stopped { fully_consumed: bool },
}

/// One slot of the smoke pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub visual: VisualHandle,
    pub active: bool,
    pub position: Vec3,
    pub velocity: Vec3,
    pub age: f32,
    pub lifespan: f32,
}

impl Particle {
    fn pose(&self) -> Pose {
        let fraction = (self.age / self.lifespan).clamp(0.0, 1.0);
        Pose {
            scale: Vec3::splat(0.05 + 0.2 * fraction),
            opacity: 0.7 * (1.0 - fraction),
            visible: self.active,
            ..Pose::at(self.position)
        }
    }
}

/// Fixed-capacity pool of smoke puffs; slots are recycled, never grown.
#[derive(Debug)]
pub struct SmokePool {
    particles: Vec<Particle>,
}

impl SmokePool {
    fn new(capacity: usize, scene: &dyn SceneHost) -> Self {
        let particles = (0..capacity)
            .map(|_| Particle {
                visual: spawn_or_placeholder(scene, VisualKind::SmokePuff, Pose::default().hidden()),
                active: false,
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
                age: 0.0,
                lifespan: 1.0,
            })
            .collect();
        Self { particles }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Activates a free slot at `origin`. Returns false when the pool is full.
    fn emit(
        &mut self,
        origin: Vec3,
        config: &ConsumptionConfig,
        rng: &mut fastrand::Rng,
        scene: &dyn SceneHost,
    ) -> bool {
        let Some(particle) = self.particles.iter_mut().find(|p| !p.active) else {
            return false;
        };
        particle.active = true;
        particle.position = origin;
        particle.velocity = Vec3::new(
            (rng.f32() - 0.5) * 0.05,
            0.05 + rng.f32() * 0.05,
            (rng.f32() - 0.5) * 0.05,
        );
        particle.age = 0.0;
        particle.lifespan = config.min_lifespan + rng.f32() * (config.max_lifespan - config.min_lifespan);
        scene.update_visual(particle.visual, particle.pose());
        true
    }

    fn update(&mut self, dt: f32, scene: &dyn SceneHost) {
        for particle in self.particles.iter_mut().filter(|p| p.active) {
            particle.age += dt;
            if particle.age >= particle.lifespan {
                particle.active = false;
            } else {
                particle.position += particle.velocity * dt;
            }
            scene.update_visual(particle.visual, particle.pose());
        }
    }

    fn release(self, scene: &dyn SceneHost) {
        for particle in self.particles {
            scene.remove_visual(particle.visual);
        }
    }
}

#[derive(Debug)]
struct Session {
    held: VisualHandle,
    length: f32,
    elapsed: f32,
    last_emission: Option<Duration>,
    pool: SmokePool,
}

/// Idle/active state machine for consuming a crafted unit.
pub struct Consumption {
    config: ConsumptionConfig,
    message_duration: Duration,
    session: Option<Session>,
    rng: fastrand::Rng,
    scene: Arc<dyn SceneHost>,
    ui: Arc<dyn UiSink>,
}

impl Consumption {
    pub fn new(
        config: ConsumptionConfig,
        message_duration: Duration,
        rng: fastrand::Rng,
        scene: Arc<dyn SceneHost>,
        ui: Arc<dyn UiSink>,
    ) -> Self {
        Self {
            config,
            message_duration,
            session: None,
            rng,
            scene,
            ui,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Remaining length of the unit being consumed.
    pub fn remaining(&self) -> Option<f32> {
        self.session.as_ref().map(|session| session.length)
    }

    pub fn pool(&self) -> Option<&SmokePool> {
        self.session.as_ref().map(|session| &session.pool)
    }

    /// Starts consuming, or stops early if already active.
    pub fn toggle(
        &mut self,
        counter: &mut CraftCounter,
        view: &Viewpoint,
    ) -> Result<ConsumptionEvent, ConsumptionError> {
        if self.is_active() {
            return Ok(self.stop(false, counter));
        }
        self.start(counter, view)
    }

    fn start(
        &mut self,
        counter: &CraftCounter,
        view: &Viewpoint,
    ) -> Result<ConsumptionEvent, ConsumptionError> {
        if counter.get() == 0 {
            return Err(ConsumptionError::NoUnits);
        }
        let scene = self.scene.as_ref();
        let held = spawn_or_placeholder(scene, VisualKind::HeldUnit, Pose::at(view.to_world(REST_OFFSET)));
        self.session = Some(Session {
            held,
            length: self.config.initial_length,
            elapsed: 0.0,
            last_emission: None,
            pool: SmokePool::new(self.config.pool_capacity, scene),
        });
        info!("consumption started ({} units left)", counter.get());
        self.ui
            .show_message("You light up a cigarette.", self.message_duration);
        Ok(ConsumptionEvent::Started)
    }

    /// Advances an active session by `dt` seconds at simulated time `now`.
    pub fn tick(
        &mut self,
        dt: f32,
        now: Duration,
        view: &Viewpoint,
        counter: &mut CraftCounter,
    ) -> Option<ConsumptionEvent> {
        let config = &self.config;
        let scene = self.scene.as_ref();
        let session = self.session.as_mut()?;

        session.elapsed += dt;
        let puff = ((session.elapsed * config.bob_frequency).sin() + 1.0) / 2.0;
        let position = view.to_world(REST_OFFSET.lerp(MOUTH_OFFSET, puff));
        let scale = session.length / config.initial_length;
        scene.update_visual(
            session.held,
            Pose {
                scale: Vec3::new(1.0, scale, 1.0),
                ..Pose::at(position)
            },
        );

        let interval_elapsed = session
            .last_emission
            .map_or(true, |last| now.saturating_sub(last) >= config.emission_interval);
        if puff > config.puff_threshold && interval_elapsed {
            let origin = position + view.forward * (session.length / 2.0);
            if !session.pool.emit(origin, config, &mut self.rng, scene) {
                debug!("smoke pool exhausted");
            }
            session.last_emission = Some(now);
        }
        session.pool.update(dt, scene);

        session.length -= config.rate * dt;
        if session.length <= config.floor_length {
            session.length = config.floor_length;
            return Some(self.stop(true, counter));
        }
        None
    }

    /// Ends the session; a full consumption uses up one crafted unit.
    pub fn stop(&mut self, fully_consumed: bool, counter: &mut CraftCounter) -> ConsumptionEvent {
        if let Some(session) = self.session.take() {
            let scene = self.scene.as_ref();
            scene.remove_visual(session.held);
            session.pool.release(scene);
            if fully_consumed {
                let left = counter.consume_one();
                self.ui.update_craft_counter(left);
                self.ui
                    .show_message("You finished your cigarette.", self.message_duration);
                info!("unit fully consumed, {left} left");
            } else {
                self.ui
                    .show_message("You put out your cigarette.", self.message_duration);
                info!("consumption stopped early");
            }
        }
        ConsumptionEvent::Stopped { fully_consumed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::SceneModel;
    use crate::ui::MessageLog;

    fn view() -> Viewpoint {
        Viewpoint {
            position: Vec3::new(0.0, 1.8, 0.0),
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        }
    }

    fn consumption() -> (Consumption, SceneModel, MessageLog) {
        let scene = SceneModel::new();
        let ui = MessageLog::new();
        let consumption = Consumption::new(
            ConsumptionConfig::default(),
            Duration::from_secs(3),
            fastrand::Rng::with_seed(3),
            Arc::new(scene.clone()),
            Arc::new(ui.clone()),
        );
        (consumption, scene, ui)
    }

    #[test]
    fn cannot_start_without_units() {
        let (mut consumption, scene, _ui) = consumption();
        let mut counter = CraftCounter::default();
        assert_eq!(
            consumption.toggle(&mut counter, &view()),
            Err(ConsumptionError::NoUnits)
        );
        assert!(!consumption.is_active());
        assert!(scene.is_empty());
    }

    #[test]
    fn toggle_twice_stops_early_without_using_a_unit() {
        let (mut consumption, scene, ui) = consumption();
        let mut counter = CraftCounter::new(1);
        assert_eq!(
            consumption.toggle(&mut counter, &view()),
            Ok(ConsumptionEvent::Started)
        );
        assert_eq!(scene.count(|k| *k == VisualKind::HeldUnit), 1);
        assert_eq!(scene.count(|k| *k == VisualKind::SmokePuff), 50);
        assert_eq!(
            consumption.toggle(&mut counter, &view()),
            Ok(ConsumptionEvent::Stopped {
                fully_consumed: false
            })
        );
        assert_eq!(counter.get(), 1);
        assert!(scene.is_empty());
        assert!(ui.saw("put out"));
    }

    #[test]
    fn runs_to_the_floor_then_stops_once() {
        let (mut consumption, _scene, ui) = consumption();
        let mut counter = CraftCounter::new(2);
        consumption.toggle(&mut counter, &view()).unwrap();

        // (0.4 - 0.05) / (0.02 * 0.3) = 58.3, so the 59th tick ends it.
        let dt = 0.3;
        let mut now = Duration::ZERO;
        let mut stops = Vec::new();
        for tick in 1..=80 {
            now += Duration::from_millis(300);
            if let Some(event) = consumption.tick(dt, now, &view(), &mut counter) {
                stops.push((tick, event));
            }
        }
        assert_eq!(
            stops,
            vec![(
                59,
                ConsumptionEvent::Stopped {
                    fully_consumed: true
                }
            )]
        );
        assert_eq!(counter.get(), 1);
        assert_eq!(ui.snapshot().craft_count, 1);
        assert!(!consumption.is_active());
    }

    #[test]
    fn puffs_respect_threshold_and_interval() {
        let (mut consumption, _scene, _ui) = consumption();
        let mut counter = CraftCounter::new(1);
        consumption.toggle(&mut counter, &view()).unwrap();

        // sin(0.5 t) first exceeds 0.6 near t = 1.29s; step 10ms to t = 2s.
        let mut now = Duration::ZERO;
        for _ in 0..200 {
            now += Duration::from_millis(10);
            consumption.tick(0.01, now, &view(), &mut counter);
        }
        let pool = consumption.pool().unwrap();
        let active = pool.active_count();
        // Roughly 0.71s above threshold at one puff per 300ms.
        assert!((2..=3).contains(&active), "active puffs: {active}");
        assert_eq!(pool.capacity(), 50);
        for particle in pool.particles().iter().filter(|p| p.active) {
            assert!(particle.lifespan >= 2.0 && particle.lifespan <= 5.0);
        }
    }

    #[test]
    fn particles_fade_and_retire() {
        let scene = SceneModel::new();
        let config = ConsumptionConfig::default();
        let mut rng = fastrand::Rng::with_seed(1);
        let mut pool = SmokePool::new(2, &scene);
        assert!(pool.emit(Vec3::ZERO, &config, &mut rng, &scene));
        assert!(pool.emit(Vec3::ZERO, &config, &mut rng, &scene));
        assert!(!pool.emit(Vec3::ZERO, &config, &mut rng, &scene), "pool is full");

        pool.update(1.0, &scene);
        let first = &pool.particles()[0];
        let pose = scene.get(first.visual).unwrap().pose;
        let fraction = first.age / first.lifespan;
        assert!((pose.opacity - 0.7 * (1.0 - fraction)).abs() < 1e-5);
        assert!((pose.scale.x - (0.05 + 0.2 * fraction)).abs() < 1e-5);

        let visual = first.visual;
        pool.update(5.0, &scene);
        assert_eq!(pool.active_count(), 0);
        assert!(!scene.get(visual).unwrap().pose.visible);
    }

    #[test]
    fn stop_on_empty_counter_saturates() {
        let (mut consumption, _scene, _ui) = consumption();
        let mut counter = CraftCounter::new(1);
        consumption.toggle(&mut counter, &view()).unwrap();
        counter.consume_one();
        consumption.stop(true, &mut counter);
        assert_eq!(counter.get(), 0);
    }
}
