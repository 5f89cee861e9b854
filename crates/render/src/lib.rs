//! Template management and rendering.
//!
//! A [`TemplateSet`] names every template a site renders with — embedded
//! defaults overridden by user files — and carries a BLAKE3 fingerprint per
//! template body so the build engine can detect template changes. A
//! [`Renderer`] compiles the whole set eagerly and renders both per-unit
//! pages and whole-corpus [`Aggregate`] artifacts deterministically.

mod assets;
pub mod error;
mod renderer;
mod set;

pub use crate::assets::Defaults;
pub use crate::renderer::{Aggregate, Renderer};
pub use crate::set::{Template, TemplateSet};
