pub mod animation;
pub mod event;
pub mod handoff;
pub mod serie;
pub mod session;
pub mod timer;
