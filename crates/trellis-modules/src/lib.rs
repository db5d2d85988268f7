//! The built-in attribute-namespace modules.
//!
//! Each module owns exactly one namespace of the attribute bag and
//! translates old/new differences into [`AttrEdit`](trellis_core::AttrEdit)s
//! at the lifecycle points the patch engine dispatches. The engine never
//! inspects namespace contents, so adding a namespace means adding a module
//! here, not touching the engine.

mod class;
mod listeners;
mod props;
mod style;

pub use class::ClassModule;
pub use listeners::ListenerModule;
pub use props::PropsModule;
pub use style::StyleModule;

use trellis_core::Module;

/// The default module set, in dispatch order.
pub fn default_modules() -> Vec<Box<dyn Module>> {
    vec![
        Box::new(ClassModule),
        Box::new(StyleModule),
        Box::new(PropsModule),
        Box::new(ListenerModule),
    ]
}
