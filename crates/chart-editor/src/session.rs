use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use log::info;

use chart_state::{ChartEvent, Clipboard, NotePosition, PasteError, Snapshot, State, Tempo};
use chart_undo::{Commands, EditCommand, SnapshotHistory};

use crate::save_load;

/// What the session needs to know about the loaded audio clip. Decoding
/// and playback live with the host; only the dimensions matter here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipInfo {
    pub sample_rate: u32,
    pub total_samples: i64,
}

/// One editing session for one loaded track. The host UI forwards
/// intents here and redraws from the drained events; nothing in the
/// session blocks or runs off the caller's thread.
///
/// Two undo mechanisms coexist on purpose: snapshot history covers
/// document edits through [`reconcile`](State::reconcile), while view
/// scalars (pan/zoom) go through their own reversible-command stack and
/// never touch the snapshot stacks.
pub struct EditorSession {
    state: State,
    clip: ClipInfo,
    history: SnapshotHistory<Snapshot>,
    view_commands: Commands<State>,
    clipboard: Clipboard,
}

impl EditorSession {
    pub const QUIESCENCE: Duration = Duration::from_millis(500);

    pub fn new(clip: ClipInfo) -> Self {
        let state = State::default();
        let mut history = SnapshotHistory::new(Self::QUIESCENCE);
        history.reset(state.snapshot());

        Self {
            state,
            clip,
            history,
            view_commands: Commands::new(),
            clipboard: Clipboard::default(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn clip(&self) -> ClipInfo {
        self.clip
    }

    pub fn tempo(&self) -> Tempo {
        self.state.tempo(self.clip.sample_rate)
    }

    /// Starts a fresh chart for a newly loaded track.
    pub fn load_track(&mut self, name: &str, clip: ClipInfo) {
        self.state.clear();
        self.state.set_music_name(name);
        self.clip = clip;
        self.view_commands.clear();
        self.history.reset(self.state.snapshot());

        info!("loaded track {name}");
    }

    /// Opens a saved chart. A malformed file fails here without
    /// touching the current document.
    pub fn open(&mut self, path: &Path) -> anyhow::Result<()> {
        let loaded = save_load::load(path)?;

        self.state = loaded;
        self.view_commands.clear();
        self.history.reset(self.state.snapshot());

        Ok(())
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        save_load::save(&self.state, self.clip.sample_rate, path)
    }

    /// Once per host tick; settles pending edits into history.
    pub fn tick(&mut self, now_seconds: f64) {
        let snapshot = self.state.snapshot();
        self.history.feed(now_seconds, &snapshot);
    }

    pub fn undo(&mut self) {
        let current = self.state.snapshot();
        if let Some(target) = self.history.undo(&current) {
            let mutations = self.state.reconcile(&target);
            info!("undo applied {mutations} graph mutations");
        }
    }

    pub fn redo(&mut self) {
        let current = self.state.snapshot();
        if let Some(target) = self.history.redo(&current) {
            let mutations = self.state.reconcile(&target);
            info!("redo applied {mutations} graph mutations");
        }
    }

    pub fn run_view_command(&mut self, command: Box<dyn EditCommand<State>>) {
        self.view_commands.run(&mut self.state, command);
    }

    pub fn undo_view(&mut self) -> bool {
        self.view_commands.undo(&mut self.state)
    }

    pub fn redo_view(&mut self) -> bool {
        self.view_commands.redo(&mut self.state)
    }

    pub fn copy(&mut self, selection: &HashSet<NotePosition>) {
        self.state.copy(&mut self.clipboard, selection);
    }

    pub fn cut(&mut self, selection: &HashSet<NotePosition>) {
        self.state.cut(&mut self.clipboard, selection);
    }

    /// Pastes the copied block after itself; the returned positions are
    /// what the caller should select.
    pub fn paste(&mut self) -> Result<Vec<NotePosition>, PasteError> {
        self.state.paste(
            &mut self.clipboard,
            self.clip.sample_rate,
            self.clip.total_samples,
        )
    }

    pub fn take_events(&mut self) -> Vec<ChartEvent> {
        self.state.take_events()
    }
}
