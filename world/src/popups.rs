//! Pooled score popups shown when a player absorbs something.

use std::time::Duration;

use devour_core::{config::PopupConfig, Category, DVec2, EntityId, Event};
use rand::Rng;
use tracing::warn;

use crate::pool::{EntityPool, Placement, Poolable, RespawnPolicy};

/// Floating score label drifting upwards.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Popup {
    pub(crate) position: DVec2,
    pub(crate) points: i64,
    pub(crate) elapsed: Duration,
}

impl Poolable for Popup {
    fn origin(&self) -> DVec2 {
        self.position
    }

    fn reset(&mut self) {
        self.points = 0;
        self.elapsed = Duration::ZERO;
    }

    fn activate(&mut self, position: DVec2) {
        self.position = position;
    }
}

#[derive(Debug)]
pub(crate) struct PopupFeedback {
    config: PopupConfig,
    pub(crate) pool: EntityPool<Popup>,
}

impl PopupFeedback {
    pub(crate) fn new(config: PopupConfig) -> Self {
        let mut pool = EntityPool::new(Category::Popup);
        pool.warm_up(config.capacity, |_| Popup {
            position: DVec2::ZERO,
            points: 0,
            elapsed: Duration::ZERO,
        });
        Self { config, pool }
    }

    /// Shows `points`, truncated to a whole number, at `position`.
    ///
    /// An exhausted pool drops the popup with a warning.
    pub(crate) fn show(
        &mut self,
        position: DVec2,
        points: f64,
        rng: &mut impl Rng,
        out: &mut Vec<Event>,
    ) {
        let popup = match self.pool.acquire(Placement::At(position), rng) {
            Ok(popup) => popup,
            Err(error) => {
                warn!(%error, "score popup dropped");
                return;
            }
        };

        let points = points.trunc() as i64;
        if let Some(item) = self.pool.get_mut(popup) {
            item.points = points;
        }
        out.push(Event::PopupShown {
            popup,
            position,
            points,
        });
    }

    /// Moves every popup upwards and releases the ones whose time ran out.
    pub(crate) fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let rise = self.config.rise_speed * dt.as_secs_f64();
        let duration = self.config.duration;
        let mut expired: Vec<EntityId> = Vec::new();

        for (id, popup) in self.pool.iter_active_mut() {
            popup.position.y += rise;
            popup.elapsed = popup.elapsed.saturating_add(dt);
            if popup.elapsed >= duration {
                expired.push(id);
            }
        }

        for popup in expired {
            if self
                .pool
                .release(popup, Duration::ZERO, RespawnPolicy::Never)
                .is_ok()
            {
                out.push(Event::PopupExpired { popup });
            }
        }
    }
}
