use std::time::Duration;

/// Whole-state undo history. States are recorded once the document has
/// sat still for the quiescence window, and a state equal to the stack
/// top is never recorded, so edits that bounce back within one window
/// leave no trace.
pub struct SnapshotHistory<State> {
    undo_stack: Vec<State>,
    redo_stack: Vec<State>,
    quiescence: Duration,
    last_match: f64,
}

impl<State> SnapshotHistory<State> {
    pub fn new(quiescence: Duration) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            quiescence,
            last_match: 0.0,
        }
    }

    pub fn has_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn has_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

impl<State: Clone + PartialEq> SnapshotHistory<State> {
    /// Document load boundary: both stacks are dropped and the freshly
    /// loaded state becomes the floor undo can reach.
    pub fn reset(&mut self, initial: State) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push(initial);
        self.last_match = 0.0;
    }

    pub fn record(&mut self, current: &State) {
        if self.undo_stack.last() != Some(current) {
            self.undo_stack.push(current.clone());
        }
    }

    /// Feed the live state once per tick; `current_time` is in seconds.
    /// The state is recorded after it has differed from the stack top
    /// for longer than the quiescence window.
    pub fn feed(&mut self, current_time: f64, current: &State) {
        match self.undo_stack.last() {
            None => {
                self.undo_stack.push(current.clone());
                self.last_match = current_time;
            }
            Some(top) if top == current => {
                self.last_match = current_time;
            }
            Some(_) => {
                if current_time - self.last_match > self.quiescence.as_secs_f64() {
                    self.undo_stack.push(current.clone());
                    self.last_match = current_time;
                }
            }
        }
    }

    /// Returns the state to restore, or `None` when history is
    /// exhausted. The caller passes the live state so that stack tops
    /// it already matches (un-recorded live edits, repeated no-op
    /// settles) are skipped over.
    pub fn undo(&mut self, current: &State) -> Option<State> {
        Self::step(&mut self.undo_stack, &mut self.redo_stack, current)
    }

    pub fn redo(&mut self, current: &State) -> Option<State> {
        Self::step(&mut self.redo_stack, &mut self.undo_stack, current)
    }

    fn step(source: &mut Vec<State>, destination: &mut Vec<State>, current: &State) -> Option<State> {
        let stashed = source.last().cloned();

        while source.last() == Some(current) {
            source.pop();
        }

        let target = source.pop()?;

        // the pre-step top goes across first so stepping back the other
        // way can find its way home
        if let Some(stashed) = stashed {
            destination.push(stashed);
        }
        destination.push(target.clone());

        Some(target)
    }
}
