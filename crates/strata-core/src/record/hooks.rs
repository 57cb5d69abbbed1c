use crate::{Error, Result};

use std::{fmt, ops};

/// Lifecycle callbacks a record may opt into.
///
/// Only the events named in the schema's [`HookSet`] are dispatched. A hook
/// error aborts the write: before-hooks prevent the statement from running,
/// after-hooks roll back the enclosing transaction.
pub trait Hooks {
    fn before_save(&mut self) -> Result<()> {
        Ok(())
    }

    fn before_insert(&mut self) -> Result<()> {
        Ok(())
    }

    fn before_update(&mut self) -> Result<()> {
        Ok(())
    }

    fn before_delete(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_save(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_insert(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_update(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_delete(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    BeforeSave,
    BeforeInsert,
    BeforeUpdate,
    BeforeDelete,
    AfterSave,
    AfterInsert,
    AfterUpdate,
    AfterDelete,
}

/// The set of hook events a schema declares.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct HookSet(u8);

impl HookSet {
    pub const NONE: HookSet = HookSet(0);
    pub const BEFORE_SAVE: HookSet = HookSet(1 << 0);
    pub const BEFORE_INSERT: HookSet = HookSet(1 << 1);
    pub const BEFORE_UPDATE: HookSet = HookSet(1 << 2);
    pub const BEFORE_DELETE: HookSet = HookSet(1 << 3);
    pub const AFTER_SAVE: HookSet = HookSet(1 << 4);
    pub const AFTER_INSERT: HookSet = HookSet(1 << 5);
    pub const AFTER_UPDATE: HookSet = HookSet(1 << 6);
    pub const AFTER_DELETE: HookSet = HookSet(1 << 7);

    const ALL: [HookEvent; 8] = [
        HookEvent::BeforeSave,
        HookEvent::BeforeInsert,
        HookEvent::BeforeUpdate,
        HookEvent::BeforeDelete,
        HookEvent::AfterSave,
        HookEvent::AfterInsert,
        HookEvent::AfterUpdate,
        HookEvent::AfterDelete,
    ];

    pub fn contains(self, other: HookSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn has(self, event: HookEvent) -> bool {
        self.contains(HookSet::from(event))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if an after-event fired by inserts or updates is declared.
    /// `AfterDelete` only concerns deletes.
    pub fn has_after_write_events(self) -> bool {
        self.0 & (Self::AFTER_SAVE.0 | Self::AFTER_INSERT.0 | Self::AFTER_UPDATE.0) != 0
    }

    pub fn events(self) -> impl Iterator<Item = HookEvent> {
        Self::ALL.into_iter().filter(move |event| self.has(*event))
    }

    /// Rejects declarations whose relative ordering is ambiguous: a `Save`
    /// hook together with an `Insert` or `Update` hook on the same side of
    /// the write.
    pub fn validate(self, table: &str) -> Result<()> {
        let pairs = [
            (HookEvent::BeforeSave, HookEvent::BeforeInsert),
            (HookEvent::BeforeSave, HookEvent::BeforeUpdate),
            (HookEvent::AfterSave, HookEvent::AfterInsert),
            (HookEvent::AfterSave, HookEvent::AfterUpdate),
        ];

        for (first, second) in pairs {
            if self.has(first) && self.has(second) {
                return Err(Error::event_conflict(table, first.name(), second.name()));
            }
        }

        Ok(())
    }
}

impl HookEvent {
    pub fn name(self) -> &'static str {
        match self {
            HookEvent::BeforeSave => "BeforeSave",
            HookEvent::BeforeInsert => "BeforeInsert",
            HookEvent::BeforeUpdate => "BeforeUpdate",
            HookEvent::BeforeDelete => "BeforeDelete",
            HookEvent::AfterSave => "AfterSave",
            HookEvent::AfterInsert => "AfterInsert",
            HookEvent::AfterUpdate => "AfterUpdate",
            HookEvent::AfterDelete => "AfterDelete",
        }
    }

    /// Invokes the matching callback.
    pub fn dispatch(self, hooks: &mut dyn Hooks) -> Result<()> {
        match self {
            HookEvent::BeforeSave => hooks.before_save(),
            HookEvent::BeforeInsert => hooks.before_insert(),
            HookEvent::BeforeUpdate => hooks.before_update(),
            HookEvent::BeforeDelete => hooks.before_delete(),
            HookEvent::AfterSave => hooks.after_save(),
            HookEvent::AfterInsert => hooks.after_insert(),
            HookEvent::AfterUpdate => hooks.after_update(),
            HookEvent::AfterDelete => hooks.after_delete(),
        }
    }
}

impl From<HookEvent> for HookSet {
    fn from(event: HookEvent) -> Self {
        HookSet(1 << (event as u8))
    }
}

impl ops::BitOr for HookSet {
    type Output = HookSet;

    fn bitor(self, rhs: HookSet) -> HookSet {
        HookSet(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for HookSet {
    fn bitor_assign(&mut self, rhs: HookSet) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.events().map(HookEvent::name))
            .finish()
    }
}
