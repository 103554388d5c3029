use crate::core::{Event, State, Trigger, TransitionError};

/// Per-event record handed to observers.
///
/// Created when the worker dequeues an event and dropped once its
/// notifications have been delivered.
#[derive(Debug)]
pub struct TransitionContext<S: State, E: Trigger> {
    event: Event<E>,
    active: Vec<S>,
    source: Option<S>,
    target: Option<S>,
    transition: Option<String>,
    errors: Vec<TransitionError>,
}

impl<S: State, E: Trigger> TransitionContext<S, E> {
    pub(crate) fn new(event: Event<E>, active: Vec<S>) -> Self {
        Self {
            event,
            active,
            source: None,
            target: None,
            transition: None,
            errors: Vec::new(),
        }
    }

    pub(crate) fn select(&mut self, source: S, target: Option<S>, description: String) {
        self.source = Some(source);
        self.target = target;
        self.transition = Some(description);
    }

    pub(crate) fn fail(&mut self, error: TransitionError) {
        self.errors.push(error);
    }

    pub fn event(&self) -> &Event<E> {
        &self.event
    }

    pub fn trigger(&self) -> &E {
        self.event.trigger()
    }

    /// Active leaves when processing of the event began.
    pub fn active(&self) -> &[S] {
        &self.active
    }

    /// State owning the selected transition.
    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    /// Target of the selected transition; `None` for internal transitions
    /// or when nothing was selected.
    pub fn target(&self) -> Option<&S> {
        self.target.as_ref()
    }

    /// Human-readable description of the selected transition.
    pub fn transition(&self) -> Option<&str> {
        self.transition.as_deref()
    }

    /// Errors captured so far, in the order they occurred.
    pub fn errors(&self) -> &[TransitionError] {
        &self.errors
    }

    /// True when a step after selection failed.
    pub fn has_failed(&self) -> bool {
        self.errors.iter().any(|e| !e.is_guard_fault())
    }
}
