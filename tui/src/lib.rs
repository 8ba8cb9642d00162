//! Judge TUI - Terminal surface for the courtroom judge simulator
//!
//! Renders the scale and gavel driven by `court-core` in a full-screen
//! terminal, or as JSON lines when no terminal is wanted.
//!
//! # Architecture
//!
//! - **App**: [`TerminalRenderer`], the ratatui implementation of
//!   [`court_core::Renderer`]
//! - **Artwork**: Sprite and procedural drawings of the props
//! - **Headless**: JSON-lines renderer
//! - **Input**: Key presses and Ctrl-C to driver signals

pub mod app;
pub mod artwork;
pub mod headless;
pub mod input;
pub mod theme;

pub use app::TerminalRenderer;
pub use artwork::{select_artwork, ArtStyle, Artwork, AssetError};
pub use headless::HeadlessRenderer;
