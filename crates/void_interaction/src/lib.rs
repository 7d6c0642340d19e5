//! # void_interaction - Input Action State Machine
//!
//! A small engine mapping `(state, input event)` to an action:
//! - Actions are registered per state with an input trigger
//! - An optional availability predicate gates each action
//! - Availability is evaluated when the state changes, not on every event
//! - Dispatch fires at most one action, the first match in registration order
//!
//! Handlers receive the caller's context and may request a transition by
//! returning the next state.
//!
//! # Example
//!
//! ```ignore
//! use void_interaction::prelude::*;
//!
//! let mut machine = ActionMachine::<Mode, Key, Editor>::new(Mode::Idle);
//! machine.define_guarded_action(
//!     Mode::Idle,
//!     KeyTrigger::Click,
//!     |ctx: &Editor| ctx.has_selection(),
//!     |ctx, _event| {
//!         ctx.start_drag();
//!         Some(Mode::Dragging)
//!     },
//! );
//! machine.dispatch(&mut editor, &Key::Click);
//! ```

use std::fmt::Debug;
use std::hash::Hash;

/// A state of the machine. Any cloneable, comparable value qualifies.
pub trait State: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> State for T {}

/// An input event that can be matched against registered triggers
pub trait InputEvent {
    /// Identity used to match actions (e.g. button + modifier)
    type Trigger: PartialEq + Debug;

    /// Trigger identity of this event
    fn trigger(&self) -> Self::Trigger;
}

/// Action handler. Returning `Some(state)` requests a transition.
pub type ActionHandler<S, E, C> = Box<dyn FnMut(&mut C, &E) -> Option<S>>;

/// Availability predicate
pub type Availability<C> = Box<dyn Fn(&C) -> bool>;

/// Called after a transition has been applied: `(context, from, to)`
pub type TransitionListener<S, C> = Box<dyn FnMut(&mut C, &S, &S)>;

/// Identifies a registered action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(usize);

impl ActionId {
    /// Registration index of the action
    pub fn index(&self) -> usize {
        self.0
    }
}

struct Action<S, E: InputEvent, C> {
    state: S,
    trigger: E::Trigger,
    handler: ActionHandler<S, E, C>,
    availability: Option<Availability<C>>,
}

impl<S, E: InputEvent, C> Action<S, E, C> {
    fn is_available(&self, context: &C) -> bool {
        self.availability.as_ref().map_or(true, |available| available(context))
    }
}

/// Input-driven action state machine
pub struct ActionMachine<S, E, C>
where
    S: State,
    E: InputEvent,
{
    /// Current state
    current: S,
    /// Previous state
    previous: Option<S>,
    /// All actions in registration order
    actions: Vec<Action<S, E, C>>,
    /// Indices of the actions active in the current state
    active: Vec<usize>,
    /// Set when actions were registered since the last refresh
    stale: bool,
    /// After-transition listeners
    listeners: Vec<TransitionListener<S, C>>,
}

impl<S, E, C> ActionMachine<S, E, C>
where
    S: State,
    E: InputEvent,
{
    /// Create a new machine in the initial state
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            previous: None,
            actions: Vec::new(),
            active: Vec::new(),
            stale: true,
            listeners: Vec::new(),
        }
    }

    /// Register an action that is always available in `state`
    pub fn define_action<F>(&mut self, state: S, trigger: E::Trigger, handler: F) -> ActionId
    where
        F: FnMut(&mut C, &E) -> Option<S> + 'static,
    {
        self.push_action(state, trigger, Box::new(handler), None)
    }

    /// Register an action gated by an availability predicate
    pub fn define_guarded_action<A, F>(
        &mut self,
        state: S,
        trigger: E::Trigger,
        availability: A,
        handler: F,
    ) -> ActionId
    where
        A: Fn(&C) -> bool + 'static,
        F: FnMut(&mut C, &E) -> Option<S> + 'static,
    {
        self.push_action(state, trigger, Box::new(handler), Some(Box::new(availability)))
    }

    fn push_action(
        &mut self,
        state: S,
        trigger: E::Trigger,
        handler: ActionHandler<S, E, C>,
        availability: Option<Availability<C>>,
    ) -> ActionId {
        let id = ActionId(self.actions.len());
        self.actions.push(Action {
            state,
            trigger,
            handler,
            availability,
        });
        self.stale = true;
        id
    }

    /// Register a listener run after every transition
    pub fn on_transition<F>(&mut self, listener: F)
    where
        F: FnMut(&mut C, &S, &S) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Get current state
    pub fn current(&self) -> &S {
        &self.current
    }

    /// Get previous state
    pub fn previous(&self) -> Option<&S> {
        self.previous.as_ref()
    }

    /// Check if in a specific state
    pub fn is_in(&self, state: &S) -> bool {
        &self.current == state
    }

    /// Move to `state` and recompute the active action list.
    ///
    /// Setting the current state again only refreshes availability; listeners
    /// are not notified.
    pub fn set_state(&mut self, context: &mut C, state: S) {
        if state == self.current {
            self.refresh(context);
            return;
        }

        log::trace!("Interaction transition {:?} -> {:?}", self.current, state);
        let from = std::mem::replace(&mut self.current, state);
        self.previous = Some(from.clone());
        self.refresh(context);

        let to = self.current.clone();
        for listener in &mut self.listeners {
            listener(context, &from, &to);
        }
    }

    /// Re-evaluate availability for the current state
    pub fn refresh(&mut self, context: &C) {
        self.active = self
            .actions
            .iter()
            .enumerate()
            .filter(|(_, action)| action.state == self.current && action.is_available(context))
            .map(|(index, _)| index)
            .collect();
        self.stale = false;
    }

    /// Dispatch an input event. Returns the action that fired, if any.
    pub fn dispatch(&mut self, context: &mut C, event: &E) -> Option<ActionId> {
        if self.stale {
            self.refresh(context);
        }

        let trigger = event.trigger();
        for position in 0..self.active.len() {
            let index = self.active[position];
            let next = {
                let action = &mut self.actions[index];
                if action.trigger != trigger || !action.is_available(context) {
                    continue;
                }
                (action.handler)(context, event)
            };

            if let Some(next) = next {
                self.set_state(context, next);
            }
            return Some(ActionId(index));
        }

        None
    }

    /// Triggers of the actions active in the current state, in order
    pub fn active_triggers(&self) -> impl Iterator<Item = &E::Trigger> {
        self.active.iter().map(move |&index| &self.actions[index].trigger)
    }

    /// Number of registered actions
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{ActionId, ActionMachine, InputEvent, State};
}
