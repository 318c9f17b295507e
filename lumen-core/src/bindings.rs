// lumen-core - Dynamic binding frame management
// Copyright (c) 2025 lumen-core contributors. MIT licensed.

//! Thread-local binding frames for dynamic vars.
//!
//! Each thread has a stack of frames held in a `thread_local!`. A pushed
//! frame holds every binding of the frame below it plus the new ones, so a
//! lookup only ever consults the top frame. Frames are immutable and shared;
//! the per-var value lives in a [`BindingCell`] so `set!` can assign it
//! without rebuilding the stack.
//!
//! The top frame can be captured with [`clone_thread_binding_frame`] and
//! installed on another thread with [`reset_thread_binding_frame`] to convey
//! bindings into work run elsewhere. Conveyed bindings are readable on the
//! receiving thread, but `set!` there fails: each cell belongs to the thread
//! that pushed it.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::value::Value;
use crate::var::Var;

struct BindingCell {
    thread: ThreadId,
    value: Mutex<Value>,
}

impl BindingCell {
    fn new(value: Value) -> Self {
        BindingCell {
            thread: thread::current().id(),
            value: Mutex::new(value),
        }
    }
}

struct Frame {
    /// Every binding visible in this frame, including inherited ones
    bindings: im::HashMap<Var, Arc<BindingCell>>,
    /// Frame to restore on pop
    prev: Option<Arc<Frame>>,
}

impl Frame {
    fn depth(&self) -> usize {
        let mut depth = 1;
        let mut frame = self.prev.as_deref();
        while let Some(f) = frame {
            depth += 1;
            frame = f.prev.as_deref();
        }
        depth
    }
}

thread_local! {
    /// Top of this thread's binding stack. None when nothing is bound.
    static CURRENT_FRAME: RefCell<Option<Arc<Frame>>> = const { RefCell::new(None) };
}

fn current_frame() -> Option<Arc<Frame>> {
    CURRENT_FRAME.with(|cell| cell.borrow().clone())
}

fn lookup_cell(var: &Var) -> Option<Arc<BindingCell>> {
    if !var.maybe_thread_bound() {
        return None;
    }
    CURRENT_FRAME.with(|cell| {
        cell.borrow()
            .as_ref()
            .and_then(|frame| frame.bindings.get(var).cloned())
    })
}

// ============================================================================
// Push / pop
// ============================================================================

/// Push a frame binding each var to its value on the calling thread.
///
/// Every var must be dynamic. On error nothing is pushed.
pub fn push_thread_bindings<I>(bindings: I) -> Result<()>
where
    I: IntoIterator<Item = (Var, Value)>,
{
    let bindings: Vec<(Var, Value)> = bindings.into_iter().collect();
    if let Some((var, _)) = bindings.iter().find(|(var, _)| !var.is_dynamic()) {
        return Err(Error::NonDynamicBinding(var.qualified_name()));
    }

    CURRENT_FRAME.with(|cell| {
        let prev = cell.borrow().clone();
        let mut visible = prev
            .as_ref()
            .map(|frame| frame.bindings.clone())
            .unwrap_or_default();
        for (var, value) in &bindings {
            var.mark_thread_bound();
            visible.insert(var.clone(), Arc::new(BindingCell::new(value.clone())));
        }
        let frame = Frame {
            bindings: visible,
            prev,
        };
        tracing::trace!(depth = frame.depth(), vars = bindings.len(), "pushed thread bindings");
        *cell.borrow_mut() = Some(Arc::new(frame));
    });
    Ok(())
}

/// Push bindings from a map value whose keys are vars.
pub fn push_thread_bindings_map(bindings: &Value) -> Result<()> {
    let map = bindings
        .as_map()
        .ok_or_else(|| Error::type_error_in("push-thread-bindings", "map", bindings.type_name()))?;
    let mut pairs = Vec::with_capacity(map.len());
    for (k, v) in map.iter() {
        match k {
            Value::Var(var) => pairs.push((var.clone(), v.clone())),
            other => {
                return Err(Error::type_error_in(
                    "push-thread-bindings",
                    "var",
                    other.type_name(),
                ));
            }
        }
    }
    push_thread_bindings(pairs)
}

/// Pop the top frame of the calling thread.
pub fn pop_thread_bindings() -> Result<()> {
    CURRENT_FRAME.with(|cell| {
        let mut top = cell.borrow_mut();
        match top.take() {
            Some(frame) => {
                tracing::trace!(depth = frame.depth(), "popped thread bindings");
                *top = frame.prev.clone();
                Ok(())
            }
            None => Err(Error::BindingStackUnderflow),
        }
    })
}

/// Pops the frame pushed by [`push_bindings`] when dropped.
///
/// Not `Send`: the frame belongs to the thread that pushed it.
#[must_use = "the bindings are popped as soon as the guard is dropped"]
pub struct BindingGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for BindingGuard {
    fn drop(&mut self) {
        if pop_thread_bindings().is_err() {
            tracing::warn!("binding guard dropped with an empty binding stack");
        }
    }
}

/// Push bindings for the lifetime of the returned guard.
pub fn push_bindings<I>(bindings: I) -> Result<BindingGuard>
where
    I: IntoIterator<Item = (Var, Value)>,
{
    push_thread_bindings(bindings)?;
    Ok(BindingGuard {
        _not_send: PhantomData,
    })
}

/// Run `f` with `bindings` in effect. The frame is popped however `f` exits.
pub fn with_bindings<I, T, F>(bindings: I, f: F) -> Result<T>
where
    I: IntoIterator<Item = (Var, Value)>,
    F: FnOnce() -> Result<T>,
{
    let _guard = push_bindings(bindings)?;
    f()
}

// ============================================================================
// Lookup and assignment
// ============================================================================

/// The calling thread's binding for `var`, if any.
pub fn get_thread_binding(var: &Var) -> Option<Value> {
    lookup_cell(var).map(|cell| cell.value.lock().clone())
}

pub fn has_thread_binding(var: &Var) -> bool {
    lookup_cell(var).is_some()
}

/// `set!` on the calling thread's binding of `var`.
pub fn set_thread_binding(var: &Var, value: Value) -> Result<()> {
    let cell = lookup_cell(var).ok_or_else(|| Error::VarNotThreadBound(var.qualified_name()))?;
    if cell.thread != thread::current().id() {
        return Err(Error::SetFromForeignThread(var.qualified_name()));
    }
    *cell.value.lock() = value;
    Ok(())
}

/// The top frame as a map from var to value.
pub fn get_thread_bindings() -> Value {
    match current_frame() {
        Some(frame) => Value::map(
            frame
                .bindings
                .iter()
                .map(|(var, cell)| (Value::Var(var.clone()), cell.value.lock().clone())),
        ),
        None => Value::map([]),
    }
}

/// Number of frames on the calling thread's stack.
pub fn thread_binding_depth() -> usize {
    current_frame().map_or(0, |frame| frame.depth())
}

// ============================================================================
// Conveyance
// ============================================================================

/// A captured binding stack, sendable to another thread.
#[derive(Clone, Default)]
pub struct BindingFrame {
    frame: Option<Arc<Frame>>,
}

impl BindingFrame {
    pub fn is_empty(&self) -> bool {
        self.frame.is_none()
    }
}

/// Capture the calling thread's binding stack.
pub fn clone_thread_binding_frame() -> BindingFrame {
    BindingFrame {
        frame: current_frame(),
    }
}

/// Install `frame` as the calling thread's binding stack. Returns the stack
/// it replaced so the caller can restore it.
pub fn reset_thread_binding_frame(frame: BindingFrame) -> BindingFrame {
    CURRENT_FRAME.with(|cell| BindingFrame {
        frame: std::mem::replace(&mut *cell.borrow_mut(), frame.frame),
    })
}
