//! # Draft Session State
//!
//! The bulk-invoice session: one `DraftBook` for the month being billed.
//!
//! ## Why a tokio Mutex?
//! Publishing holds the lock from `begin_publish` until `mark_sent`, across
//! the database transaction, so an edit cannot slip in between the snapshot
//! that was persisted and the row being locked.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Session Operations                             │
//! │                                                                         │
//! │  Command                      Session change                            │
//! │  ───────                      ──────────────                            │
//! │  initialize_drafts(month) ──► Some(DraftBook::initialize(..))           │
//! │  set_electricity(room, v) ──► row recomputed, status pending/ready      │
//! │  use_previous_for_all()   ──► every unsent row new = previous           │
//! │  publish_single(room)     ──► row sent (after DB commit)                │
//! │                                                                         │
//! │  NOTE: Until initialize_drafts runs, every edit is DraftsNotInitialized │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use nhatro_core::draft::DraftBook;
use nhatro_core::{CoreError, CoreResult};

/// The current book plus a counter bumped whenever it is swapped out, so a
/// long-running batch can tell its session was replaced under it.
#[derive(Debug, Default)]
struct Session {
    generation: u64,
    book: Option<DraftBook>,
}

#[derive(Debug, Clone, Default)]
pub struct DraftState {
    session: Arc<Mutex<Session>>,
}

impl DraftState {
    pub fn new() -> Self {
        DraftState::default()
    }

    /// Replaces the session with a freshly initialized book.
    pub async fn replace(&self, book: DraftBook) {
        let mut session = self.session.lock().await;
        session.generation += 1;
        session.book = Some(book);
    }

    pub async fn clear(&self) {
        let mut session = self.session.lock().await;
        session.generation += 1;
        session.book = None;
    }

    pub async fn is_initialized(&self) -> bool {
        self.session.lock().await.book.is_some()
    }

    /// Runs `f` against the session under the lock.
    pub async fn with_book<F, R>(&self, f: F) -> CoreResult<R>
    where
        F: FnOnce(&mut DraftBook) -> CoreResult<R>,
    {
        let mut session = self.session.lock().await;
        let book = session.book.as_mut().ok_or(CoreError::DraftsNotInitialized)?;
        f(book)
    }

    /// Holds the lock for a multi-step operation that awaits in between.
    pub async fn lock(&self) -> DraftGuard<'_> {
        DraftGuard {
            guard: self.session.lock().await,
        }
    }
}

/// Exclusive access to the session while publishing.
pub struct DraftGuard<'a> {
    guard: MutexGuard<'a, Session>,
}

impl DraftGuard<'_> {
    pub fn book(&mut self) -> CoreResult<&mut DraftBook> {
        self.guard.book.as_mut().ok_or(CoreError::DraftsNotInitialized)
    }

    /// Changes on every `replace` or `clear`.
    pub fn generation(&self) -> u64 {
        self.guard.generation
    }
}
