#![doc = r"The hooks runtime: stateful function components for Trellis.

A component is a plain function `(props, context) -> VNode`. The context
threads per-instance storage through the call: every hook primitive claims
the next slot in call order, so across renders of one instance the sequence
of hook calls must stay identical in count and kind. That ordering contract
belongs to the caller; when validation is enabled the context checks slot
parity per render and surfaces a violation instead of silently reading the
wrong state.

A [`ComponentInstance`] owns one hook context and one committed virtual
tree; state setters and [`UpdateHandle`]s re-run the component function and
feed the result through the patch engine. Effect bodies never run during a
render: they are deferred onto the runtime task queue and drained once the
cycle has committed."]

mod context;
mod effects;
mod instance;

pub use context::{HookContext, HookError, HookOptions, SetState};
pub use effects::{EffectResult, EffectScope};
pub use instance::{ComponentInstance, InstanceError, Lifecycle, UpdateHandle};

pub use trellis_core::Owned;

#[cfg(test)]
mod tests;
