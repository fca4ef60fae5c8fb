use crate::error::{Result, RuntimeError};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// Storage shared between one producer and its consumers.
///
/// The pipeline owns the slot while wiring; each port keeps a handle to it.
/// There is no queue: a consumer always sees the latest value written.
#[derive(Debug, Default)]
pub struct Slot<T>(Rc<RefCell<T>>);

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Slot<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }
}

fn bind_once<T>(target: &mut Option<Slot<T>>, slot: &Slot<T>, kind: &str) -> Result<()> {
    if target.is_some() {
        return Err(RuntimeError::failed_precondition(format!(
            "{kind} port is already bound"
        )));
    }
    *target = Some(slot.clone());
    Ok(())
}

/// Write side of a binding.
#[derive(Debug)]
pub struct OutputPort<T> {
    slot: Option<Slot<T>>,
}

impl<T> Default for OutputPort<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> OutputPort<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, slot: &Slot<T>) -> Result<()> {
        bind_once(&mut self.slot, slot, "Output")
    }

    pub fn is_bound(&self) -> bool {
        self.slot.is_some()
    }

    /// Mutable access to the bound slot, `None` when unbound.
    pub fn get(&self) -> Option<RefMut<'_, T>> {
        self.slot.as_ref().map(Slot::borrow_mut)
    }
}

/// Read side of a binding.
#[derive(Debug)]
pub struct InputPort<T> {
    slot: Option<Slot<T>>,
}

impl<T> Default for InputPort<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> InputPort<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, slot: &Slot<T>) -> Result<()> {
        bind_once(&mut self.slot, slot, "Input")
    }

    pub fn is_bound(&self) -> bool {
        self.slot.is_some()
    }

    pub fn get(&self) -> Option<Ref<'_, T>> {
        self.slot.as_ref().map(Slot::borrow)
    }
}
