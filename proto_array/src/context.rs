use crate::Error;
use std::time::Instant;

/// An advisory deadline threaded through fork-choice operations.
///
/// Fork choice has no suspension points of its own — every operation runs to completion while
/// holding the store's lock — so `Context` is not a cooperative-cancellation token in the async
/// sense. It exists so that the handful of genuinely deep traversals (`AncestorRoot`'s parent
/// walk, `Prune`'s reachability walk) can bail out of a pathological case (a caller-supplied slot
/// far below the tree, a huge unpruned tree) without blocking a caller that has already given up.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// No deadline; traversals always run to completion.
    pub fn none() -> Self {
        Self { deadline: None }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// Returns `Err(Error::Cancelled)` if the deadline has passed.
    pub fn check(&self) -> Result<(), Error> {
        match self.deadline {
            Some(deadline) if Instant::now() > deadline => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::none()
    }
}
