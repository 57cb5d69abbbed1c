//! Dispatch of record lifecycle hooks.
//!
//! A hook runs only when the record's schema declares its event and the
//! record exposes [`Hooks`](strata_core::record::Hooks).

use strata_core::{record::HookEvent, Record, Result};

/// Runs `BeforeSave`, then `BeforeInsert` or `BeforeUpdate` depending on
/// whether the record is persisted.
pub fn apply_before_events(record: &mut dyn Record) -> Result<()> {
    fire(record, HookEvent::BeforeSave)?;

    if record.persisted() {
        fire(record, HookEvent::BeforeUpdate)
    } else {
        fire(record, HookEvent::BeforeInsert)
    }
}

/// Runs `AfterInsert` or `AfterUpdate`, then `AfterSave`. `was_persisted`
/// must be captured before the write.
pub fn apply_after_events(record: &mut dyn Record, was_persisted: bool) -> Result<()> {
    if was_persisted {
        fire(record, HookEvent::AfterUpdate)?;
    } else {
        fire(record, HookEvent::AfterInsert)?;
    }

    fire(record, HookEvent::AfterSave)
}

pub fn apply_before_delete(record: &mut dyn Record) -> Result<()> {
    fire(record, HookEvent::BeforeDelete)
}

pub fn apply_after_delete(record: &mut dyn Record) -> Result<()> {
    fire(record, HookEvent::AfterDelete)
}

fn fire(record: &mut dyn Record, event: HookEvent) -> Result<()> {
    if !record.schema().hooks().has(event) {
        return Ok(());
    }

    match record.hooks() {
        Some(hooks) => event.dispatch(hooks),
        None => Ok(()),
    }
}
