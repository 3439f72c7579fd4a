/// Application controller owning the session.
pub mod app;
/// Audio playback and voice capture capabilities.
pub mod audio;
/// Stdio host adapter implementing the capabilities.
pub mod host_bridge;
/// Player-facing copy.
pub mod messages;
/// Flashcard audio sequencing.
pub mod playback;
/// Star counter.
pub mod rewards;
/// Speech synthesis and fallback.
pub mod speech;
/// Presentation surface seam.
pub mod surface;
