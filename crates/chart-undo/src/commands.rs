/// A reversible single-field edit. Lives on its own stack pair in
/// [`Commands`], entirely separate from snapshot history.
///
/// [`Commands`]: crate::Commands
pub trait EditCommand<State> {
    fn apply(&self, state: &mut State);
    fn revert(&self, state: &mut State);

    /// Redo defaults to re-applying; override when redo needs to differ
    /// from the first application.
    fn reapply(&self, state: &mut State) {
        self.apply(state);
    }
}

/// Closure-backed [`EditCommand`] for the common case.
pub struct Command<State> {
    apply: Box<dyn Fn(&mut State)>,
    revert: Box<dyn Fn(&mut State)>,
    reapply: Option<Box<dyn Fn(&mut State)>>,
}

impl<State> Command<State> {
    pub fn new(
        apply: impl Fn(&mut State) + 'static,
        revert: impl Fn(&mut State) + 'static,
    ) -> Self {
        Self {
            apply: Box::new(apply),
            revert: Box::new(revert),
            reapply: None,
        }
    }

    pub fn with_redo(
        apply: impl Fn(&mut State) + 'static,
        revert: impl Fn(&mut State) + 'static,
        reapply: impl Fn(&mut State) + 'static,
    ) -> Self {
        Self {
            apply: Box::new(apply),
            revert: Box::new(revert),
            reapply: Some(Box::new(reapply)),
        }
    }
}

impl<State> EditCommand<State> for Command<State> {
    fn apply(&self, state: &mut State) {
        (self.apply)(state);
    }

    fn revert(&self, state: &mut State) {
        (self.revert)(state);
    }

    fn reapply(&self, state: &mut State) {
        match &self.reapply {
            Some(reapply) => reapply(state),
            None => (self.apply)(state),
        }
    }
}

/// Undo/redo stacks for scalar commands.
pub struct Commands<State> {
    undo_stack: Vec<Box<dyn EditCommand<State>>>,
    redo_stack: Vec<Box<dyn EditCommand<State>>>,
}

impl<State> Default for Commands<State> {
    fn default() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }
}

impl<State> Commands<State> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn run(&mut self, state: &mut State, command: Box<dyn EditCommand<State>>) {
        command.apply(state);
        self.undo_stack.push(command);
        self.redo_stack.clear();
    }

    pub fn undo(&mut self, state: &mut State) -> bool {
        match self.undo_stack.pop() {
            Some(command) => {
                command.revert(state);
                self.redo_stack.push(command);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self, state: &mut State) -> bool {
        match self.redo_stack.pop() {
            Some(command) => {
                command.reapply(state);
                self.undo_stack.push(command);
                true
            }
            None => false,
        }
    }
}
