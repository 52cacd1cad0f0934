//! Resources that exist only while a reader connection is open.

use bytes::BytesMut;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use crate::manager::ConnectionConfig;

/// Receive buffer starting capacity; a frame is at most 262 bytes.
const READ_BUFFER_CAPACITY: usize = 1024;

/// Socket, receive buffer and timers of one Connected period.
///
/// Dropping a session closes the socket and stops every timer, so leaving
/// the Connected state is just `session = None`.
pub(crate) struct Session<S> {
    pub(crate) stream: S,
    pub(crate) buffer: BytesMut,
    pub(crate) heartbeat: Interval,
    pub(crate) poll: Interval,
    pub(crate) health: Interval,
    /// When to send the post-connect commands; cleared once sent.
    pub(crate) settle_at: Option<Instant>,
    pub(crate) last_rx: Instant,
    /// When we last wrote a heartbeat, until a reply consumes it.
    pub(crate) last_heartbeat: Option<Instant>,
}

impl<S> Session<S> {
    pub(crate) fn open(stream: S, config: &ConnectionConfig) -> Self {
        let now = Instant::now();
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            heartbeat: periodic(now, config.heartbeat_interval),
            poll: periodic(now, config.poll_interval),
            health: periodic(now, config.health_check_interval),
            settle_at: Some(now + config.settle_delay),
            last_rx: now,
            last_heartbeat: None,
        }
    }

    /// Whether nothing has been received for longer than `stale_after`.
    pub(crate) fn is_stale(&self, stale_after: Duration) -> bool {
        self.last_rx.elapsed() > stale_after
    }

    /// Whether a heartbeat arriving now answers one we sent within `window`.
    /// A reply consumes the pending heartbeat.
    pub(crate) fn take_heartbeat_reply(&mut self, window: Duration) -> bool {
        match self.last_heartbeat {
            Some(sent) if sent.elapsed() < window => {
                self.last_heartbeat = None;
                true
            }
            _ => false,
        }
    }
}

/// Interval whose first tick is one full period away.
fn periodic(now: Instant, period: Duration) -> Interval {
    let mut interval = interval_at(now + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
