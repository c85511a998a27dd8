//! Permission-gated view fragments.
//!
//! An [`AccessGate`] owns a [`ViewSlot`] (the insertion point plus the fragment
//! it can instantiate) and keeps it attached exactly while the current session
//! satisfies the gate's [`Requirement`]. It re-evaluates when the requirement is
//! replaced and whenever the session store reports a transition, so views do
//! not need to re-mount after login, logout or a restored session.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use staffdesk_auth::{PermissionQuery, Session, SessionStore, SessionSubscription};

/// Which permissions unlock a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Exactly this permission.
    Single(String),
    /// At least one of these permissions (an empty list never grants).
    AnyOf(Vec<String>),
}

impl Requirement {
    pub fn is_satisfied_by<Q: PermissionQuery + ?Sized>(&self, subject: &Q) -> bool {
        match self {
            Requirement::Single(name) => subject.has_permission(name),
            Requirement::AnyOf(names) => subject.has_any_permission(names),
        }
    }
}

impl From<&str> for Requirement {
    fn from(value: &str) -> Self {
        Requirement::Single(value.to_string())
    }
}

impl From<String> for Requirement {
    fn from(value: String) -> Self {
        Requirement::Single(value)
    }
}

impl From<Vec<String>> for Requirement {
    fn from(value: Vec<String>) -> Self {
        Requirement::AnyOf(value)
    }
}

impl From<Vec<&str>> for Requirement {
    fn from(value: Vec<&str>) -> Self {
        Requirement::AnyOf(value.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Requirement {
    fn from(value: [&str; N]) -> Self {
        Requirement::AnyOf(value.into_iter().map(str::to_string).collect())
    }
}

/// Insertion point for a guarded fragment.
///
/// `attach` instantiates the fragment; `detach` must tear it down completely
/// (event handlers included), not merely hide it.
pub trait ViewSlot {
    fn attach(&mut self);
    fn detach(&mut self);
}

struct GateState<V> {
    requirement: Requirement,
    slot: V,
    attached: bool,
}

impl<V: ViewSlot> GateState<V> {
    fn reconcile(&mut self, session: &Session) {
        let granted = self.requirement.is_satisfied_by(session);
        match (granted, self.attached) {
            (true, false) => {
                self.slot.attach();
                self.attached = true;
            }
            (false, true) => {
                self.slot.detach();
                self.attached = false;
            }
            _ => {}
        }
    }
}

/// Gate state plus the latest session seen while the state was borrowed.
///
/// A slot's `attach`/`detach` may itself change the session (a fragment that
/// logs out on mount, say). That notification arrives while the state is
/// borrowed, so it is parked in `pending` and applied once the borrow ends.
struct GateCell<V> {
    state: RefCell<GateState<V>>,
    pending: RefCell<Option<Session>>,
}

impl<V: ViewSlot> GateCell<V> {
    fn update(&self, session: &Session, change: impl FnOnce(&mut GateState<V>)) {
        match self.state.try_borrow_mut() {
            Ok(mut state) => {
                change(&mut state);
                state.reconcile(session);
            }
            Err(_) => {
                tracing::debug!("access gate busy; re-evaluation deferred");
                *self.pending.borrow_mut() = Some(session.clone());
                return;
            }
        }
        self.settle();
    }

    /// Apply notifications that arrived during the last reconcile.
    fn settle(&self) {
        loop {
            let next = self.pending.borrow_mut().take();
            let Some(session) = next else {
                break;
            };
            match self.state.try_borrow_mut() {
                Ok(mut state) => state.reconcile(&session),
                Err(_) => {
                    *self.pending.borrow_mut() = Some(session);
                    break;
                }
            }
        }
    }
}

/// Keeps a [`ViewSlot`] in sync with a permission requirement.
///
/// Dropping the gate unsubscribes from the store and detaches the fragment.
pub struct AccessGate<V: ViewSlot + 'static> {
    cell: Rc<GateCell<V>>,
    store: SessionStore,
    _subscription: SessionSubscription,
}

impl<V: ViewSlot + 'static> AccessGate<V> {
    pub fn new(store: &SessionStore, requirement: impl Into<Requirement>, slot: V) -> Self {
        let cell = Rc::new(GateCell {
            state: RefCell::new(GateState {
                requirement: requirement.into(),
                slot,
                attached: false,
            }),
            pending: RefCell::new(None),
        });

        let weak: Weak<GateCell<V>> = Rc::downgrade(&cell);
        let subscription = store.subscribe(move |session| {
            if let Some(cell) = weak.upgrade() {
                cell.update(session, |_| {});
            }
        });

        cell.update(&store.session(), |_| {});

        Self {
            cell,
            store: store.clone(),
            _subscription: subscription,
        }
    }

    /// Replace the requirement and re-evaluate against the current session.
    pub fn set_requirement(&self, requirement: impl Into<Requirement>) {
        let requirement = requirement.into();
        self.cell
            .update(&self.store.session(), |state| state.requirement = requirement);
    }

    pub fn requirement(&self) -> Requirement {
        self.cell.state.borrow().requirement.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.cell.state.borrow().attached
    }

    pub fn with_slot<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.cell.state.borrow().slot)
    }
}

impl<V: ViewSlot + 'static> Drop for AccessGate<V> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.cell.state.try_borrow_mut() {
            if state.attached {
                state.slot.detach();
                state.attached = false;
            }
        }
    }
}

impl<V: ViewSlot + 'static> core::fmt::Debug for AccessGate<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.cell.state.borrow();
        f.debug_struct("AccessGate")
            .field("requirement", &state.requirement)
            .field("attached", &state.attached)
            .finish()
    }
}
