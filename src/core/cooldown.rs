//! Per-user command cooldowns.
//!
//! One [`CooldownService`] is built at start-up and shared by every dispatch. The map
//! is only ever overwritten, never pruned, so it grows with the number of distinct
//! active users. State is lost on restart.

use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, mapref::entry::Entry};

/// A window started by [`CooldownService::try_reserve`] while the command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    user_id: u64,
    reserved_at: DateTime<Utc>,
    previous: Option<DateTime<Utc>>,
}

/// Tracks the last successful non-exempt command of each user.
#[derive(Debug)]
pub struct CooldownService {
    window: Duration,
    last_used: DashMap<u64, DateTime<Utc>>,
}

impl CooldownService {
    /// Creates a service with a window of `seconds`.
    #[must_use]
    pub fn new(seconds: i64) -> Self {
        Self {
            window: Duration::seconds(seconds),
            last_used: DashMap::new(),
        }
    }

    /// Length of the cooldown window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// True while `now` has not yet passed `last + window`.
    #[must_use]
    pub fn is_on_cooldown(&self, user_id: u64, now: DateTime<Utc>) -> bool {
        self.last_used
            .get(&user_id)
            .is_some_and(|last| now < *last + self.window)
    }

    /// Starts a new window for the user at `now`.
    pub fn touch(&self, user_id: u64, now: DateTime<Utc>) {
        self.last_used.insert(user_id, now);
    }

    /// Checks the window and starts a new one in a single step.
    ///
    /// Returns `None` while the user is on cooldown. Concurrent calls for the same
    /// user cannot both succeed because the entry stays locked between the check
    /// and the write. Hand the reservation to [`Self::release`] if the command fails.
    #[must_use]
    pub fn try_reserve(&self, user_id: u64, now: DateTime<Utc>) -> Option<Reservation> {
        let previous = match self.last_used.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let last = *entry.get();
                if now < last + self.window {
                    return None;
                }
                entry.insert(now);
                Some(last)
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                None
            }
        };
        Some(Reservation {
            user_id,
            reserved_at: now,
            previous,
        })
    }

    /// Gives back a reservation, restoring the window that was active before it.
    ///
    /// Does nothing if the user's window was restarted in the meantime.
    pub fn release(&self, reservation: Reservation) {
        if let Entry::Occupied(mut entry) = self.last_used.entry(reservation.user_id) {
            if *entry.get() != reservation.reserved_at {
                return;
            }
            match reservation.previous {
                Some(previous) => {
                    entry.insert(previous);
                }
                None => {
                    entry.remove();
                }
            }
        }
    }

    /// When the user's current window ends, if any was ever started.
    #[must_use]
    pub fn expires_at(&self, user_id: u64) -> Option<DateTime<Utc>> {
        self.last_used.get(&user_id).map(|last| *last + self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_user_is_not_on_cooldown() {
        let cooldowns = CooldownService::new(30);
        assert!(!cooldowns.is_on_cooldown(1, Utc::now()));
        assert!(cooldowns.expires_at(1).is_none());
    }

    #[test]
    fn test_window_boundaries() {
        let cooldowns = CooldownService::new(30);
        let t = Utc::now();
        cooldowns.touch(7, t);

        assert!(cooldowns.is_on_cooldown(7, t));
        assert!(cooldowns.is_on_cooldown(7, t + Duration::seconds(29)));
        assert!(!cooldowns.is_on_cooldown(7, t + Duration::seconds(30)));
        assert!(!cooldowns.is_on_cooldown(7, t + Duration::seconds(31)));
        assert_eq!(cooldowns.expires_at(7), Some(t + Duration::seconds(30)));
    }

    #[test]
    fn test_touch_overwrites_previous_window() {
        let cooldowns = CooldownService::new(10);
        let t = Utc::now();
        cooldowns.touch(7, t);
        cooldowns.touch(7, t + Duration::seconds(8));

        assert!(cooldowns.is_on_cooldown(7, t + Duration::seconds(12)));
        assert!(!cooldowns.is_on_cooldown(8, t + Duration::seconds(12)));
    }

    #[test]
    fn test_reserve_is_exclusive_within_window() {
        let cooldowns = CooldownService::new(30);
        let t = Utc::now();

        let first = cooldowns.try_reserve(7, t);
        assert!(first.is_some());
        assert!(cooldowns.try_reserve(7, t + Duration::seconds(5)).is_none());
        assert!(cooldowns.try_reserve(7, t + Duration::seconds(30)).is_some());
    }

    #[test]
    fn test_release_restores_previous_window() {
        let cooldowns = CooldownService::new(30);
        let t = Utc::now();

        let fresh = cooldowns.try_reserve(1, t);
        if let Some(reservation) = fresh {
            cooldowns.release(reservation);
        }
        assert!(cooldowns.expires_at(1).is_none());

        cooldowns.touch(2, t - Duration::seconds(40));
        let later = cooldowns.try_reserve(2, t);
        if let Some(reservation) = later {
            cooldowns.release(reservation);
        }
        assert_eq!(cooldowns.expires_at(2), Some(t - Duration::seconds(10)));
    }

    #[test]
    fn test_release_keeps_a_newer_window() {
        let cooldowns = CooldownService::new(30);
        let t = Utc::now();
        let reservation = cooldowns.try_reserve(3, t);
        cooldowns.touch(3, t + Duration::seconds(1));
        if let Some(reservation) = reservation {
            cooldowns.release(reservation);
        }
        assert_eq!(cooldowns.expires_at(3), Some(t + Duration::seconds(31)));
    }

    #[test]
    fn test_concurrent_reservations_admit_one_caller() {
        let cooldowns = std::sync::Arc::new(CooldownService::new(10));
        let now = Utc::now();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cooldowns = std::sync::Arc::clone(&cooldowns);
                std::thread::spawn(move || cooldowns.try_reserve(42, now).is_some())
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(std::thread::JoinHandle::join)
            .filter(|joined| matches!(joined, Ok(true)))
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn test_concurrent_touches_do_not_corrupt_the_map() {
        let cooldowns = std::sync::Arc::new(CooldownService::new(10));
        let now = Utc::now();
        let handles: Vec<_> = (0..8u64)
            .map(|thread| {
                let cooldowns = std::sync::Arc::clone(&cooldowns);
                std::thread::spawn(move || {
                    for user in 0..100u64 {
                        cooldowns.touch(thread * 1000 + user, now);
                        let _ = cooldowns.is_on_cooldown(user, now);
                    }
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().is_ok());
        }
        assert!(cooldowns.is_on_cooldown(7099, now));
    }
}
