//! # Event Bus Module
//!
//! Publish/subscribe plumbing used by firmware runners.
//!
//! ## Overview
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers register per event kind and get a [`ListenerId`] back
//! - Listeners run synchronously, in registration order
//! - An optional broadcast receiver serves async relays
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marlinkit_core::event_bus::EventEmitter;
//!
//! let emitter: EventEmitter<MarlinEvent> = EventEmitter::new();
//! let id = emitter.on(MarlinEventKind::Ok, |event| {
//!     println!("ack: {}", event.raw());
//! });
//!
//! emitter.emit(event);
//! emitter.off(id);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
