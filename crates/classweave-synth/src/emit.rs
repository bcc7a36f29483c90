//! Abstract code-emission capability.
//!
//! [`ClassEmitter`] is the seam between the orchestration core and whatever
//! actually materializes the synthesized class. The core drives it through
//! a fixed vocabulary: member lifecycle, a small operand-stack instruction
//! set, labels for branching, and a pair of switch helpers. Any backend
//! able to turn this vocabulary into a loadable, callable type satisfies
//! the contract; the core never depends on a byte layout.
//!
//! Two contract points matter to the engine:
//!
//! - **Declarations may arrive at any time before `end_class`.** Per-slot
//!   storage is declared lazily at the first emitted reference, which
//!   happens in the middle of generating a method body.
//! - **Instruction emission is infallible**; configuration problems are
//!   reported by the lifecycle methods.

use std::sync::Arc;

use classweave_core::{
    CallbackSlot, ConstructionError, ConstructorDescriptor, DispatchError, MethodDescriptor,
    Modifiers, ParamType, SynthesisError, TypeDescriptor,
};

/// Backend capability for emitting one synthesized class.
///
/// Stack effects are written `[before] -> [after]`, top of stack on the
/// right.
pub trait ClassEmitter {
    /// Branch target handle.
    type Label: Copy + Eq;
    /// The finalized synthesized type.
    type Output;

    // ==========================================================================
    // Class and member lifecycle
    // ==========================================================================

    /// Begin the class declaration.
    fn begin_class(
        &mut self,
        modifiers: Modifiers,
        name: &str,
        superclass: &Arc<TypeDescriptor>,
        interfaces: &[Arc<TypeDescriptor>],
    ) -> Result<(), SynthesisError>;

    /// Finalize the class. After this the type is immutable.
    fn end_class(self) -> Result<Self::Output, SynthesisError>;

    /// Declare a field. `STATIC` in the modifiers makes it class-level.
    fn declare_field(&mut self, modifiers: Modifiers, ty: ParamType, name: &str);

    /// Declare the per-thread transfer cell for a slot.
    fn declare_transfer_cell(&mut self, slot: CallbackSlot, name: &str);

    /// Begin a forwarding-constructor body.
    fn begin_constructor(&mut self, params: &[ParamType]);

    /// Begin a method body. `STATIC` in the modifiers makes it class-level.
    fn begin_method(&mut self, modifiers: Modifiers, method: &MethodDescriptor);

    /// Begin the static-initialization body.
    fn begin_static_init(&mut self);

    /// Finish the member currently being emitted.
    fn end_member(&mut self);

    // ==========================================================================
    // Operand stack
    // ==========================================================================

    /// `[] -> [this]`
    fn load_this(&mut self);
    /// `[] -> [arg_i]`
    fn load_arg(&mut self, index: usize);
    /// `[] -> [arg_0, .., arg_n]`
    fn load_args(&mut self);
    /// `[a] -> [a, a]`
    fn dup(&mut self);
    /// `[a, b] -> [a, b, a, b]`
    fn dup2(&mut self);
    /// `[a, b] -> [b, a]`
    fn swap(&mut self);
    /// `[a] -> []`
    fn pop(&mut self);
    /// `[a, b] -> []`
    fn pop2(&mut self);
    fn push_int(&mut self, value: i64);
    fn push_bool(&mut self, value: bool);
    fn push_null(&mut self);
    /// Push a method-descriptor constant.
    fn push_method(&mut self, method: &MethodDescriptor);

    // ==========================================================================
    // Fields and transfer cells
    // ==========================================================================

    /// `[obj] -> [value]`
    fn get_field(&mut self, name: &str);
    /// `[obj, value] -> []`
    fn put_field(&mut self, name: &str);
    /// `[] -> [value]`
    fn get_static(&mut self, name: &str);
    /// `[value] -> []`
    fn put_static(&mut self, name: &str);
    /// Read the slot's cell for the calling thread. `[] -> [value|null]`
    fn cell_load(&mut self, slot: CallbackSlot);
    /// Write the slot's cell for the calling thread. `[value] -> []`
    fn cell_store(&mut self, slot: CallbackSlot);

    // ==========================================================================
    // Calls and construction
    // ==========================================================================

    /// Read a handler out of a bundle. `[bundle, slot] -> [handler|null]`
    fn bundle_get(&mut self);
    /// `[this, args..] -> []`
    fn invoke_super_constructor(&mut self, params: &[ParamType]);
    /// Allocate an uninitialized instance of the class being emitted.
    /// `[] -> [instance]`
    fn new_instance_self(&mut self);
    /// `[instance, args..] -> []`
    fn invoke_constructor_self(&mut self, params: &[ParamType]);
    /// Virtual call on the class being emitted. `[this, args..] -> [ret]`
    fn invoke_self(&mut self, method: &MethodDescriptor);
    /// Static call on the class being emitted. `[args..] -> [ret]`
    fn invoke_static_self(&mut self, method: &MethodDescriptor);
    /// Call the base type's implementation. `[this, args..] -> [ret]`
    fn invoke_super(&mut self, method: &MethodDescriptor);
    /// Invoke a handler with the receiver, a method-descriptor constant,
    /// and `argc` arguments. `[handler, this, method, args..] -> [ret]`
    fn invoke_callback(&mut self, argc: usize);
    /// Checked cast to the slot's declared handler type. `[v] -> [v]`
    fn check_callback_cast(&mut self, slot: CallbackSlot);

    // ==========================================================================
    // Control flow
    // ==========================================================================

    fn make_label(&mut self) -> Self::Label;
    /// Bind a label to the current position.
    fn mark(&mut self, label: Self::Label);
    fn jump(&mut self, label: Self::Label);
    /// `[v] -> []`, jumps when `v` is null.
    fn jump_if_null(&mut self, label: Self::Label);
    /// `[v] -> []`, jumps when `v` is non-null.
    fn jump_if_non_null(&mut self, label: Self::Label);
    /// `[v] -> []`, jumps when `v` is boolean true.
    fn jump_if_true(&mut self, label: Self::Label);
    /// `[int] -> []`, jumps to the target whose key matches, else default.
    fn jump_table(&mut self, keys: &[i64], targets: &[Self::Label], default: Self::Label);
    /// `[typelist] -> []`, jumps to the case whose parameter types match
    /// structurally, else default.
    fn constructor_table(&mut self, cases: &[(Vec<ParamType>, Self::Label)], default: Self::Label);
    /// Index into a value list. `[list, int] -> [element]`
    fn list_get(&mut self);
    /// Checked structural cast of an argument value. `[v] -> [v]`
    fn cast_param(&mut self, ty: &ParamType);
    /// Abort the current call with a construction error.
    fn throw_construction(&mut self, error: ConstructionError);
    /// Abort the current call with a dispatch error.
    fn throw_dispatch(&mut self, error: DispatchError);
    /// Return the top of stack (or void for an empty stack).
    fn return_value(&mut self);

    // ==========================================================================
    // Provided switch helpers
    // ==========================================================================

    /// Emit an integer switch. Each case body receives the shared `end`
    /// label and must leave the stack in the same shape as the default
    /// body before jumping there.
    fn switch_int<C, D>(&mut self, keys: &[i64], mut case: C, default: D) -> Result<(), SynthesisError>
    where
        Self: Sized,
        C: FnMut(&mut Self, i64, Self::Label) -> Result<(), SynthesisError>,
        D: FnOnce(&mut Self) -> Result<(), SynthesisError>,
    {
        let end = self.make_label();
        let fallback = self.make_label();
        let targets: Vec<Self::Label> = keys.iter().map(|_| self.make_label()).collect();
        self.jump_table(keys, &targets, fallback);
        for (target, &key) in targets.iter().zip(keys) {
            self.mark(*target);
            case(self, key, end)?;
        }
        self.mark(fallback);
        default(self)?;
        self.mark(end);
        Ok(())
    }

    /// Emit a constructor-selection switch over structural parameter-type
    /// matches.
    fn switch_constructors<C, D>(
        &mut self,
        constructors: &[ConstructorDescriptor],
        mut case: C,
        default: D,
    ) -> Result<(), SynthesisError>
    where
        Self: Sized,
        C: FnMut(&mut Self, &ConstructorDescriptor, Self::Label) -> Result<(), SynthesisError>,
        D: FnOnce(&mut Self) -> Result<(), SynthesisError>,
    {
        let end = self.make_label();
        let fallback = self.make_label();
        let cases: Vec<(Vec<ParamType>, Self::Label)> = constructors
            .iter()
            .map(|c| (c.params.clone(), self.make_label()))
            .collect();
        self.constructor_table(&cases, fallback);
        for ((_, target), ctor) in cases.iter().zip(constructors) {
            self.mark(*target);
            case(self, ctor, end)?;
        }
        self.mark(fallback);
        default(self)?;
        self.mark(end);
        Ok(())
    }
}
