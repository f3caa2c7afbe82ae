//! Internal events: each one logs through `tracing` and records `metrics` counters.

pub mod prelude;

pub trait InternalEvent: Sized {
    fn emit(self);

    fn name(&self) -> Option<&'static str> {
        None
    }
}

pub fn emit(event: impl InternalEvent) {
    event.emit();
}

#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::internal_events::emit($event)
    };
}

// Modules that require emit! macro so they need to be defined after the macro.
mod gelf;
mod udp;

pub use self::gelf::*;
pub use self::udp::*;
