//! Tween scheduler
//!
//! Owns every tween inserted into it and advances the registered ("live")
//! ones each tick. Tweens are addressed by [`TweenId`]:
//!
//! - `insert` hands a tween to the scheduler, detached and idle
//! - `start` arms it and registers it for ticking
//! - `tick` advances every live tween and drops the ones that finish
//! - `stop` cancels it and unregisters it
//! - `remove` drops it for good
//!
//! A finished or stopped tween stays stored until removed, so it can be
//! started again. [`AnimatedTween`] wraps an id and removes the tween on drop.
//! Fire-and-forget tweens go through `spawn` instead, which drops the tween
//! as soon as it leaves the active set.
//!
//! Tween callbacks run with the scheduler unlocked. Any scheduler operation a
//! callback issues against the tween being advanced is queued and applied as
//! soon as that advance returns. A tween can therefore restart itself from
//! `on_complete` or stop itself from `on_update`. A `tick` issued while
//! another `tick` of the same scheduler is running returns without advancing
//! anything.

use crate::tween::{Tween, TweenPhase};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use thiserror::Error;
use twixt_core::{Clock, MonotonicClock, Properties};

// ============================================================================
// Global Tween Scheduler
// ============================================================================

/// Process-wide default scheduler
static GLOBAL_SCHEDULER: OnceLock<TweenScheduler> = OnceLock::new();

/// Scheduler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The global scheduler was already created or installed
    #[error("Global tween scheduler already initialized")]
    AlreadyInitialized,
}

/// Install `scheduler` as the process-wide default.
///
/// Must happen before anything touches [`global_scheduler`], which otherwise
/// creates a default one on first use.
pub fn init_global_scheduler(scheduler: TweenScheduler) -> Result<(), SchedulerError> {
    GLOBAL_SCHEDULER
        .set(scheduler)
        .map_err(|_| SchedulerError::AlreadyInitialized)?;
    tracing::debug!("global tween scheduler installed");
    Ok(())
}

/// The process-wide default scheduler, created on first use with a
/// [`MonotonicClock`]
pub fn global_scheduler() -> &'static TweenScheduler {
    GLOBAL_SCHEDULER.get_or_init(TweenScheduler::new)
}

/// Check if the global scheduler has been created or installed
pub fn is_scheduler_initialized() -> bool {
    GLOBAL_SCHEDULER.get().is_some()
}

/// Tick the global scheduler, see [`TweenScheduler::tick`].
///
/// Tweens handed to the global scheduler with [`TweenScheduler::spawn`] are
/// dropped once they finish; ones added with `start_tween` stay stored until
/// removed.
pub fn tick(now: Option<f64>) -> bool {
    global_scheduler().tick(now)
}

new_key_type! {
    /// Handle to a tween stored in a scheduler
    pub struct TweenId;
}

// ============================================================================
// Scheduler internals
// ============================================================================

/// Registration change requested by an operation on a tween
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Registration {
    Keep,
    Register,
    Unregister,
    Remove,
}

/// Operation run against a checked-out tween
type TweenOp = Box<dyn FnOnce(&mut Tween) -> Registration + Send>;

/// What to do with an operation aimed at a tween that is already checked out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WhenBusy {
    /// Queue it behind whatever is running
    Defer,
    /// Drop it (a tick must not advance a tween twice)
    Skip,
}

enum TweenSlot {
    Parked(Box<Tween>),
    /// Checked out by an operation; later operations wait here
    CheckedOut(SmallVec<[TweenOp; 2]>),
}

impl TweenSlot {
    /// Take the tween out, leaving the slot checked out
    fn check_out(&mut self) -> Option<Box<Tween>> {
        match std::mem::replace(self, TweenSlot::CheckedOut(SmallVec::new())) {
            TweenSlot::Parked(tween) => Some(tween),
            busy => {
                *self = busy;
                None
            }
        }
    }
}

struct SchedulerInner {
    tweens: SlotMap<TweenId, TweenSlot>,
    /// Registered tweens in tick order
    live: IndexSet<TweenId>,
    /// Spawned tweens, dropped once they leave `live`
    transient: FxHashSet<TweenId>,
    /// Running count of ids taken out of `live`, lets a tick find its place again
    unregistered: usize,
    /// Set while a tick is running
    ticking: bool,
}

impl SchedulerInner {
    fn register(&mut self, id: TweenId) {
        self.live.insert(id);
    }

    fn unregister(&mut self, id: TweenId) {
        if self.live.shift_remove(&id) {
            self.unregistered = self.unregistered.wrapping_add(1);
        }
    }

    fn apply(&mut self, id: TweenId, registration: Registration) {
        match registration {
            Registration::Keep => {}
            Registration::Register => self.register(id),
            Registration::Unregister | Registration::Remove => self.unregister(id),
        }
    }
}

// ============================================================================
// Tween Scheduler
// ============================================================================

/// The active set of tweens.
///
/// Cheap to clone; clones share the same tweens.
///
/// # Example
///
/// ```rust
/// use twixt_animation::{Tween, TweenScheduler};
/// use twixt_core::{lock_properties, Properties};
///
/// let scheduler = TweenScheduler::new();
/// let target = Properties::new().with("x", 0.0).into_shared();
///
/// let id = scheduler.insert(Tween::new(target.clone()).to([("x", 100.0)], Some(1000.0)));
/// scheduler.start(id, Some(0.0));
///
/// assert!(scheduler.tick(Some(500.0)));
/// assert_eq!(lock_properties(&target).get("x"), Some(50.0));
///
/// scheduler.tick(Some(1000.0));
/// assert!(!scheduler.is_registered(id));
/// assert!(!scheduler.tick(Some(1500.0)));
/// ```
#[derive(Clone)]
pub struct TweenScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    clock: Arc<dyn Clock>,
}

impl TweenScheduler {
    /// Create a scheduler timed by a [`MonotonicClock`]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock::new()))
    }

    /// Create a scheduler that reads `clock` whenever a time is not given
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                tweens: SlotMap::with_key(),
                live: IndexSet::new(),
                transient: FxHashSet::default(),
                unregistered: 0,
                ticking: false,
            })),
            clock,
        }
    }

    /// Get a weak handle for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
            clock: Arc::clone(&self.clock),
        }
    }

    /// Current time according to the scheduler's clock
    pub fn now(&self) -> f64 {
        self.clock.now_ms()
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Store a tween without starting or registering it
    pub fn insert(&self, tween: Tween) -> TweenId {
        self.lock()
            .tweens
            .insert(TweenSlot::Parked(Box::new(tween)))
    }

    /// Store a tween and start it at `now` (clock time when `None`).
    ///
    /// The tween stays stored after it finishes, so it can be restarted;
    /// `remove` it when done.
    pub fn start_tween(&self, tween: Tween, now: Option<f64>) -> TweenId {
        let id = self.insert(tween);
        self.start(id, now);
        id
    }

    /// Start a fire-and-forget tween at `now` (clock time when `None`).
    ///
    /// The tween is dropped, callbacks and target included, as soon as it
    /// leaves the active set: when it completes, is stopped or unregistered.
    /// Restarting it from its own `on_complete` keeps it alive.
    pub fn spawn(&self, tween: Tween, now: Option<f64>) -> TweenId {
        let id = {
            let mut inner = self.lock();
            let id = inner.tweens.insert(TweenSlot::Parked(Box::new(tween)));
            inner.transient.insert(id);
            id
        };
        self.start(id, now);
        id
    }

    /// Unregister and drop a tween. No callback fires.
    ///
    /// Returns false if the id is unknown.
    pub fn remove(&self, id: TweenId) -> bool {
        self.run(id, Box::new(|_| Registration::Remove), WhenBusy::Defer)
    }

    // =========================================================================
    // Active set
    // =========================================================================

    /// Add a stored tween to the active set. Already registered is a no-op.
    pub fn register(&self, id: TweenId) -> bool {
        self.run(id, Box::new(|_| Registration::Register), WhenBusy::Defer)
    }

    /// Take a tween out of the active set. Not registered is a no-op.
    pub fn unregister(&self, id: TweenId) -> bool {
        self.run(id, Box::new(|_| Registration::Unregister), WhenBusy::Defer)
    }

    pub fn is_registered(&self, id: TweenId) -> bool {
        self.lock().live.contains(&id)
    }

    /// Number of registered tweens
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Number of stored tweens, registered or not
    pub fn tween_count(&self) -> usize {
        self.lock().tweens.len()
    }

    /// Check if any tween is registered
    pub fn has_active_tweens(&self) -> bool {
        !self.lock().live.is_empty()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start (or restart) a tween at `now` and register it.
    ///
    /// Returns false if the id is unknown.
    pub fn start(&self, id: TweenId, now: Option<f64>) -> bool {
        let now = now.unwrap_or_else(|| self.clock.now_ms());
        self.run(
            id,
            Box::new(move |tween| {
                tween.start(now);
                Registration::Register
            }),
            WhenBusy::Defer,
        )
    }

    /// Stop a playing tween and unregister it. A tween that is not playing
    /// is left alone and its `on_stop` does not fire.
    ///
    /// Returns false if the id is unknown.
    pub fn stop(&self, id: TweenId) -> bool {
        self.run(
            id,
            Box::new(|tween| {
                if tween.stop() {
                    Registration::Unregister
                } else {
                    Registration::Keep
                }
            }),
            WhenBusy::Defer,
        )
    }

    /// Reconfigure a stored tween in place
    pub fn configure<F>(&self, id: TweenId, f: F) -> bool
    where
        F: FnOnce(&mut Tween) + Send + 'static,
    {
        self.run(
            id,
            Box::new(|tween| {
                f(tween);
                Registration::Keep
            }),
            WhenBusy::Defer,
        )
    }

    /// Replace a tween's end values, optionally overriding its duration
    pub fn retarget(&self, id: TweenId, end_values: Properties, duration_ms: Option<f64>) -> bool {
        self.configure(id, move |tween| tween.set_end_values(end_values, duration_ms))
    }

    /// Read a stored tween.
    ///
    /// Returns `None` if the id is unknown or the tween is mid-advance (that
    /// is, when called from one of its own callbacks).
    pub fn with_tween<F, R>(&self, id: TweenId, f: F) -> Option<R>
    where
        F: FnOnce(&Tween) -> R,
    {
        match self.lock().tweens.get(id)? {
            TweenSlot::Parked(tween) => Some(f(tween)),
            TweenSlot::CheckedOut(_) => None,
        }
    }

    pub fn phase(&self, id: TweenId) -> Option<TweenPhase> {
        self.with_tween(id, Tween::phase)
    }

    /// Advance every registered tween to `now` (clock time when `None`).
    ///
    /// Tweens that finish are unregistered in the same pass. Tweens
    /// registered by callbacks during the pass are advanced in it too. No
    /// tween is advanced twice.
    ///
    /// A tick issued while this scheduler is already ticking (from a tween
    /// callback, or from another thread) is ignored.
    ///
    /// Returns false, doing nothing, when no tween is registered, and true
    /// otherwise.
    pub fn tick(&self, now: Option<f64>) -> bool {
        {
            let mut inner = self.lock();
            if inner.live.is_empty() {
                return false;
            }
            if inner.ticking {
                tracing::trace!("nested tween tick ignored");
                return true;
            }
            inner.ticking = true;
        }
        let _ticking = TickGuard(self);

        let now = now.unwrap_or_else(|| self.clock.now_ms());
        // Ids re-registered after being advanced come round again at the back
        let mut visited: FxHashSet<TweenId> = FxHashSet::default();
        let mut cursor = 0;

        loop {
            let (next, unregistered) = {
                let inner = self.lock();
                (inner.live.get_index(cursor).copied(), inner.unregistered)
            };
            let Some(id) = next else {
                break;
            };
            if !visited.insert(id) {
                cursor += 1;
                continue;
            }

            self.run(
                id,
                Box::new(move |tween| {
                    if tween.advance(now) {
                        Registration::Keep
                    } else {
                        Registration::Unregister
                    }
                }),
                WhenBusy::Skip,
            );

            // Everything before the cursor was advanced already. If this
            // tween left the active set, step back over whatever else left
            // with it; visited ids are skipped on the way forward again.
            let inner = self.lock();
            cursor = match inner.live.get_index_of(&id) {
                Some(index) => index + 1,
                None => {
                    let removed = inner.unregistered.wrapping_sub(unregistered);
                    cursor.saturating_sub(removed.saturating_sub(1))
                }
            };
        }

        tracing::trace!(now, advanced = visited.len(), "tween tick");
        true
    }

    /// Check a tween out, run `op` on it with the scheduler unlocked, then
    /// run whatever operations queued up against it meanwhile.
    ///
    /// Returns false if the id is unknown.
    fn run(&self, id: TweenId, op: TweenOp, when_busy: WhenBusy) -> bool {
        let mut tween = {
            let mut inner = self.lock();
            let Some(slot) = inner.tweens.get_mut(id) else {
                return false;
            };
            match slot.check_out() {
                Some(tween) => tween,
                None => {
                    if when_busy == WhenBusy::Defer {
                        if let TweenSlot::CheckedOut(pending) = slot {
                            pending.push(op);
                        }
                    }
                    return true;
                }
            }
        };

        let mut ops: SmallVec<[TweenOp; 2]> = SmallVec::new();
        ops.push(op);

        loop {
            let mut changes: SmallVec<[Registration; 2]> = SmallVec::new();
            for op in ops.drain(..) {
                let change = op(&mut tween);
                changes.push(change);
                if change == Registration::Remove {
                    break;
                }
            }

            let mut inner = self.lock();
            for change in changes.iter().copied() {
                inner.apply(id, change);
            }

            if changes.contains(&Registration::Remove) {
                let slot = inner.tweens.remove(id);
                inner.transient.remove(&id);
                drop(inner);
                // Callbacks may own handles into this scheduler
                drop(slot);
                drop(tween);
                tracing::trace!("tween removed");
                return true;
            }

            match inner.tweens.get_mut(id) {
                Some(TweenSlot::CheckedOut(pending)) if !pending.is_empty() => {
                    ops = std::mem::take(pending);
                    continue;
                }
                Some(_) => {}
                None => return true,
            }

            if !inner.live.contains(&id) && inner.transient.remove(&id) {
                inner.tweens.remove(id);
                drop(inner);
                drop(tween);
                tracing::trace!("spawned tween dropped");
            } else if let Some(slot) = inner.tweens.get_mut(id) {
                *slot = TweenSlot::Parked(tween);
            }
            return true;
        }
    }
}

/// Clears the ticking flag, even if a callback panics mid-tick
struct TickGuard<'a>(&'a TweenScheduler);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().ticking = false;
    }
}

impl Default for TweenScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Scheduler Handle
// ============================================================================

/// A weak handle to a tween scheduler
///
/// This is passed to components that need to run tweens. It won't prevent
/// the scheduler from being dropped; once it is, every operation is a no-op.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
    clock: Arc<dyn Clock>,
}

impl SchedulerHandle {
    /// The scheduler, if it is still alive
    pub fn upgrade(&self) -> Option<TweenScheduler> {
        self.inner.upgrade().map(|inner| TweenScheduler {
            inner,
            clock: Arc::clone(&self.clock),
        })
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn insert(&self, tween: Tween) -> Option<TweenId> {
        self.upgrade().map(|scheduler| scheduler.insert(tween))
    }

    pub fn start(&self, id: TweenId, now: Option<f64>) -> bool {
        self.upgrade()
            .is_some_and(|scheduler| scheduler.start(id, now))
    }

    pub fn stop(&self, id: TweenId) -> bool {
        self.upgrade().is_some_and(|scheduler| scheduler.stop(id))
    }

    pub fn remove(&self, id: TweenId) -> bool {
        self.upgrade().is_some_and(|scheduler| scheduler.remove(id))
    }

    pub fn configure<F>(&self, id: TweenId, f: F) -> bool
    where
        F: FnOnce(&mut Tween) + Send + 'static,
    {
        self.upgrade()
            .is_some_and(|scheduler| scheduler.configure(id, f))
    }

    pub fn phase(&self, id: TweenId) -> Option<TweenPhase> {
        self.upgrade().and_then(|scheduler| scheduler.phase(id))
    }

    pub fn is_registered(&self, id: TweenId) -> bool {
        self.upgrade()
            .is_some_and(|scheduler| scheduler.is_registered(id))
    }
}

// ============================================================================
// Animated Tween
// ============================================================================

/// A tween that lives in a scheduler for as long as this value does
///
/// # Example
///
/// ```rust
/// use twixt_animation::{AnimatedTween, Easing, Tween, TweenScheduler};
/// use twixt_core::{lock_properties, Properties};
///
/// let scheduler = TweenScheduler::new();
/// let target = Properties::new().with("opacity", 1.0).into_shared();
///
/// let fade = AnimatedTween::new(
///     scheduler.handle(),
///     Tween::new(target.clone())
///         .to([("opacity", 0.0)], Some(200.0))
///         .easing(Easing::EaseOut),
/// );
/// fade.start_at(0.0);
///
/// scheduler.tick(Some(200.0));
/// assert_eq!(lock_properties(&target).get("opacity"), Some(0.0));
///
/// drop(fade);
/// assert_eq!(scheduler.tween_count(), 0);
/// ```
pub struct AnimatedTween {
    handle: SchedulerHandle,
    id: Option<TweenId>,
}

impl AnimatedTween {
    /// Store `tween` in the handle's scheduler. If the scheduler is gone, the
    /// tween is dropped and every method becomes a no-op.
    pub fn new(handle: SchedulerHandle, tween: Tween) -> Self {
        let id = handle.insert(tween);
        Self { handle, id }
    }

    pub fn id(&self) -> Option<TweenId> {
        self.id
    }

    /// Start (or restart) at the scheduler's current time
    pub fn start(&self) -> &Self {
        self.start_with(None)
    }

    /// Start (or restart) at an explicit time
    pub fn start_at(&self, now: f64) -> &Self {
        self.start_with(Some(now))
    }

    fn start_with(&self, now: Option<f64>) -> &Self {
        if let Some(id) = self.id {
            self.handle.start(id, now);
        }
        self
    }

    pub fn stop(&self) -> &Self {
        if let Some(id) = self.id {
            self.handle.stop(id);
        }
        self
    }

    /// Replace the end values, optionally overriding the duration
    pub fn retarget(&self, end_values: Properties, duration_ms: Option<f64>) -> &Self {
        self.configure(move |tween| tween.set_end_values(end_values, duration_ms))
    }

    pub fn configure<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&mut Tween) + Send + 'static,
    {
        if let Some(id) = self.id {
            self.handle.configure(id, f);
        }
        self
    }

    pub fn phase(&self) -> Option<TweenPhase> {
        self.id.and_then(|id| self.handle.phase(id))
    }

    pub fn is_playing(&self) -> bool {
        self.phase().is_some_and(|phase| phase.is_playing())
    }

    /// Check if the tween is in the active set
    pub fn is_registered(&self) -> bool {
        self.id.is_some_and(|id| self.handle.is_registered(id))
    }
}

impl Drop for AnimatedTween {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.handle.remove(id);
        }
    }
}
