//! Slidecast Job Model
//!
//! Defines the core data contracts for Slidecast jobs:
//! - **Job:** One generation request and its stage machine
//! - **Media:** Probed image/audio sources, decoupled from any renderer
//! - **Timeline:** Image slots, subtitle segments, and the resulting plan
//! - **Scene:** The declarative, renderer-agnostic composition
//! - **Workspace:** Per-job namespacing of inputs and outputs on disk
//!
//! All times are seconds as `f64`; all geometry is in output pixels.

pub mod geometry;
pub mod job;
pub mod media;
pub mod scene;
pub mod timeline;
pub mod workspace;

pub use geometry::*;
pub use job::*;
pub use media::*;
pub use scene::*;
pub use timeline::*;
pub use workspace::*;
