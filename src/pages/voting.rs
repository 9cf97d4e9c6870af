use std::collections::BTreeSet;

use super::{Lifecycle, Notification, Transition};
use crate::{
    api::ApiState,
    config::VotingMode,
    error::{ClientError, Result},
    models::Candidate,
    routes::Route,
};

/// VotingState
///
/// `Loading → {AlreadyVoted | Selecting | LoadFailed} → Submitting → {ThankYou route | Selecting}`.
/// `AlreadyVoted` is terminal: the only way out is navigating away. `LoadFailed` offers no
/// ballot; entering the page again retries the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotingState {
    Loading,
    AlreadyVoted,
    Selecting,
    Submitting,
    LoadFailed,
}

/// VotingPage
///
/// Ballot controller. The selection set lives only here and disappears with the page.
pub struct VotingPage {
    api: ApiState,
    mode: VotingMode,
    lifecycle: Lifecycle,
    state: VotingState,
    candidates: Vec<Candidate>,
    selection: BTreeSet<i64>,
}

impl VotingPage {
    pub fn new(api: ApiState, mode: VotingMode) -> Self {
        Self {
            api,
            mode,
            lifecycle: Lifecycle::new(),
            state: VotingState::Loading,
            candidates: Vec::new(),
            selection: BTreeSet::new(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub fn state(&self) -> VotingState {
        self.state
    }

    pub fn mode(&self) -> VotingMode {
        self.mode
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn selection(&self) -> &BTreeSet<i64> {
        &self.selection
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selection.contains(&id)
    }

    /// Voting controls are never offered once the backend reports a cast ballot.
    pub fn voting_controls_visible(&self) -> bool {
        matches!(self.state, VotingState::Selecting | VotingState::Submitting)
    }

    pub fn can_submit(&self) -> bool {
        self.state == VotingState::Selecting && !self.selection.is_empty()
    }

    /// enter
    ///
    /// Fetches the vote status first; candidates are only fetched for voters who have not
    /// voted yet.
    pub async fn enter(&mut self) -> Transition {
        self.state = VotingState::Loading;
        self.candidates.clear();
        self.selection.clear();

        let status = match self.lifecycle.guard(self.api.check_vote_status()).await {
            Ok(status) => status,
            Err(e) => return self.load_failed(e),
        };

        if status.has_voted {
            self.state = VotingState::AlreadyVoted;
            return Transition::stay();
        }

        match self.lifecycle.guard(self.api.get_candidates()).await {
            Ok(candidates) => {
                self.candidates = candidates;
                self.state = VotingState::Selecting;
                Transition::stay()
            }
            Err(e) => self.load_failed(e),
        }
    }

    fn load_failed(&mut self, error: ClientError) -> Transition {
        match error {
            ClientError::Cancelled => Transition::stay(),
            e if e.requires_login() => Transition::back_to_login(&e),
            e => {
                tracing::warn!(error = %e, "failed to load voting data");
                self.state = VotingState::LoadFailed;
                Transition::Stay(Some(Notification::error(
                    "Error",
                    "Failed to fetch voting data.",
                )))
            }
        }
    }

    /// toggle
    ///
    /// Adds or removes a candidate from the selection and returns whether it is now selected.
    /// In single-vote mode selecting a candidate replaces any previous choice. Ignored outside
    /// `Selecting` and for ids that are not on the ballot.
    pub fn toggle(&mut self, id: i64) -> bool {
        if self.state != VotingState::Selecting || !self.candidates.iter().any(|c| c.id == id) {
            return false;
        }

        if self.selection.remove(&id) {
            return false;
        }

        if self.mode == VotingMode::Single {
            self.selection.clear();
        }
        self.selection.insert(id)
    }

    /// Adds a candidate without toggling: selecting an already selected id is a no-op.
    /// Returns whether the id is selected afterwards.
    pub fn select(&mut self, id: i64) -> bool {
        if self.is_selected(id) {
            return true;
        }
        self.toggle(id)
    }

    /// choose
    ///
    /// Selects a whole ballot at once. Duplicates collapse; an id that is not on the ballot, or
    /// more than one distinct id in single-vote mode, rejects the ballot and leaves the
    /// selection untouched.
    pub fn choose(&mut self, ids: &[i64]) -> Result<()> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();

        if self.mode == VotingMode::Single && wanted.len() > 1 {
            return Err(ClientError::Validation(
                "single-vote mode accepts exactly one candidate".to_string(),
            ));
        }
        if let Some(unknown) = wanted
            .iter()
            .find(|id| !self.candidates.iter().any(|c| c.id == **id))
        {
            return Err(ClientError::Validation(format!(
                "candidate {unknown} is not on the ballot"
            )));
        }

        for id in wanted {
            self.select(id);
        }
        Ok(())
    }

    /// submit
    ///
    /// Sends the selection as one ballot. On success the page hands over to the ThankYou route;
    /// on failure it returns to `Selecting` with the selection intact so the voter can retry.
    pub async fn submit(&mut self) -> Transition {
        if self.state != VotingState::Selecting {
            return Transition::stay();
        }

        if self.selection.is_empty() {
            return Transition::Stay(Some(Notification::error(
                "Error",
                "Please select at least one candidate.",
            )));
        }

        self.state = VotingState::Submitting;
        let ids: Vec<i64> = self.selection.iter().copied().collect();

        match self.lifecycle.guard(self.api.vote(&ids)).await {
            Ok(()) => {
                tracing::info!(count = ids.len(), "ballot submitted");
                Transition::Navigate(
                    Route::ThankYou,
                    Some(Notification::success(
                        "Success",
                        "Your vote has been cast successfully.",
                    )),
                )
            }
            Err(ClientError::Cancelled) => Transition::stay(),
            Err(e) if e.requires_login() => Transition::back_to_login(&e),
            Err(e) => {
                tracing::warn!(error = %e, "ballot rejected");
                self.state = VotingState::Selecting;
                Transition::Stay(Some(Notification::error(
                    "Error",
                    "Failed to cast your vote.",
                )))
            }
        }
    }

    /// The already-voted view's only action.
    pub fn return_to_login(&self) -> Route {
        Route::Login
    }
}
