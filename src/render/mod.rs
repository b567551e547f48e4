//! The rendering pipeline: framebuffer storage, pipeline values, rasterisation, shading styles
//! and the per-frame session loop.

pub mod algorithm;
pub mod filter;
pub mod fragment;
pub mod framebuffer;
pub mod parameters;
pub mod raster;
pub mod renderer;
pub mod session;
pub mod viewport;
