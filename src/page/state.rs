//! Page state snapshots.
//!
//! The bridge never inspects the page itself. A [`PageStateProvider`]
//! answers "who am I" and "where am I" with best-effort snapshots, and
//! [`SharedPageState`] is an in-memory provider a host can keep current from
//! whatever scraping it does.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// ============================================================================
// UserInfo
// ============================================================================

/// Identity of the user the page is logged in as.
///
/// Any field may be empty when the page lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    /// Display name.
    pub name: String,
    /// Page-assigned user id.
    pub id: String,
    /// Tripcode shown next to the name.
    pub tripcode: String,
    /// Avatar icon name.
    pub icon: String,
}

impl UserInfo {
    /// Creates a user snapshot with only a name.
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// RoomInfo
// ============================================================================

/// Room the page is currently in, with its member roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomInfo {
    /// Room title.
    pub name: String,
    /// Room description.
    pub description: String,
    /// Room id taken from the page URL.
    pub id: String,
    /// Member names in roster order.
    pub users: Vec<String>,
}

impl RoomInfo {
    /// Returns `true` if nothing about the room could be read.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.description.is_empty()
            && self.id.is_empty()
            && self.users.is_empty()
    }
}

// ============================================================================
// PageStateProvider
// ============================================================================

/// Source of page state snapshots.
///
/// Implementations must not fail: a lookup that finds nothing returns empty
/// fields.
#[async_trait]
pub trait PageStateProvider: Send + Sync {
    /// Current user identity.
    async fn user_info(&self) -> UserInfo;

    /// Current room and roster.
    async fn room_info(&self) -> RoomInfo;
}

// ============================================================================
// SharedPageState
// ============================================================================

/// In-memory [`PageStateProvider`] updated by the host.
///
/// Cloning shares the same underlying snapshot.
#[derive(Debug, Clone, Default)]
pub struct SharedPageState {
    inner: Arc<RwLock<Snapshot>>,
}

#[derive(Debug, Default)]
struct Snapshot {
    user: UserInfo,
    room: RoomInfo,
}

impl SharedPageState {
    /// Creates an empty page state.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a page state with initial snapshots.
    #[must_use]
    pub fn with(user: UserInfo, room: RoomInfo) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Snapshot { user, room })),
        }
    }

    /// Replaces the user snapshot.
    pub fn set_user(&self, user: UserInfo) {
        self.inner.write().user = user;
    }

    /// Replaces the room snapshot.
    pub fn set_room(&self, room: RoomInfo) {
        self.inner.write().room = room;
    }

    /// Edits the room snapshot in place.
    pub fn update_room(&self, f: impl FnOnce(&mut RoomInfo)) {
        f(&mut self.inner.write().room);
    }
}

#[async_trait]
impl PageStateProvider for SharedPageState {
    async fn user_info(&self) -> UserInfo {
        self.inner.read().user.clone()
    }

    async fn room_info(&self) -> RoomInfo {
        self.inner.read().room.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
