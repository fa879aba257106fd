//! Launch plan data model and builder

pub mod builder;
pub mod directive;
pub mod event;
pub mod launch_plan;

pub use builder::*;
pub use directive::*;
pub use event::*;
pub use launch_plan::*;
