//! Inline keyboard widgets for chat bots
//!
//! Stateful date, time, checklist and paged-list pickers rendered as inline
//! button grids. Button presses come back as short callback payloads which the
//! [`Router`] decodes and routes to the widget instance that rendered them.

pub mod clock;
pub mod codec;
pub mod error;
pub mod host;
pub mod i18n;
pub mod keyboard;
pub mod registry;
pub mod widgets;

mod router;

pub use router::*;
