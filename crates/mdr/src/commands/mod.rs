//! CLI command implementations.

pub(crate) mod profile;
pub(crate) mod render;

pub(crate) use profile::ProfileCommand;
pub(crate) use render::RenderArgs;
