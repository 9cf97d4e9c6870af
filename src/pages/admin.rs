use std::{future::Future, mem};

use super::{Lifecycle, Notification, Transition};
use crate::{
    api::ApiState,
    error::{ClientError, Result},
    models::{Candidate, CandidateRequest, Stats},
};

/// Modal
///
/// The dashboard is a list view with at most one candidate form open on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    Closed,
    Add(CandidateRequest),
    Edit { id: i64, form: CandidateRequest },
}

/// Which mutation a notification is about, with its user-facing wording.
#[derive(Debug, Clone, Copy)]
enum Mutation {
    Add,
    Edit,
    Delete,
    RemoveVotes,
}

impl Mutation {
    fn success_message(self) -> &'static str {
        match self {
            Mutation::Add => "Candidate added successfully.",
            Mutation::Edit => "Candidate updated successfully.",
            Mutation::Delete => "Candidate deleted successfully.",
            Mutation::RemoveVotes => "All votes have been removed.",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Mutation::Add => "Failed to add candidate.",
            Mutation::Edit => "Failed to update candidate.",
            Mutation::Delete => "Failed to delete candidate.",
            Mutation::RemoveVotes => "Failed to remove votes.",
        }
    }
}

/// AdminDashboard
///
/// Candidate management and tallies. Mutations never patch the local list: the modal is
/// closed up front, the call is issued, and only a successful call triggers a full refetch
/// of candidates and stats. A failed call leaves the previously fetched data on screen.
/// A successful call is always reported as such; if the refetch after it fails, that failure
/// is kept apart in `load_error` so the view can flag its data as stale.
pub struct AdminDashboard {
    api: ApiState,
    lifecycle: Lifecycle,
    candidates: Vec<Candidate>,
    stats: Stats,
    modal: Modal,
    load_error: Option<Notification>,
}

impl AdminDashboard {
    pub fn new(api: ApiState) -> Self {
        Self {
            api,
            lifecycle: Lifecycle::new(),
            candidates: Vec::new(),
            stats: Stats::default(),
            modal: Modal::Closed,
            load_error: None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    /// Why the last load did not apply, if it failed. The shown data predates it.
    pub fn load_error(&self) -> Option<&Notification> {
        self.load_error.as_ref()
    }

    /// load
    ///
    /// Fetches candidates and stats concurrently and applies them only once both have
    /// arrived, so the view never shows one without the other.
    pub async fn load(&mut self) -> Transition {
        let api = &self.api;
        let fetched = self
            .lifecycle
            .guard(async { tokio::try_join!(api.get_candidates(), api.get_candidate_stats()) })
            .await;

        let transition = match fetched {
            Ok((candidates, stats)) => {
                self.candidates = candidates;
                self.stats = stats;
                Transition::stay()
            }
            Err(ClientError::Cancelled) => return Transition::stay(),
            Err(e) if e.requires_login() => Transition::back_to_login(&e),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load dashboard");
                Transition::Stay(Some(Notification::error("Error", "Failed to fetch data.")))
            }
        };
        self.load_error = transition.notification().cloned();
        transition
    }

    // --- Modal Handling ---

    pub fn open_add(&mut self) {
        self.modal = Modal::Add(CandidateRequest::default());
    }

    /// Opens the edit form prefilled from the listed candidate. Unknown ids leave the modal closed.
    pub fn open_edit(&mut self, id: i64) -> bool {
        match self.candidates.iter().find(|c| c.id == id) {
            Some(candidate) => {
                self.modal = Modal::Edit {
                    id,
                    form: CandidateRequest::from(candidate),
                };
                true
            }
            None => false,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut CandidateRequest> {
        match &mut self.modal {
            Modal::Add(form) | Modal::Edit { form, .. } => Some(form),
            Modal::Closed => None,
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = Modal::Closed;
    }

    /// submit_modal
    ///
    /// Submits the open form. A form without a name is rejected before any request and the
    /// modal stays open; otherwise the modal closes immediately and the mutation runs.
    pub async fn submit_modal(&mut self) -> Transition {
        if let Some(form) = self.form_mut() {
            if form.name.trim().is_empty() {
                return Transition::Stay(Some(Notification::error(
                    "Error",
                    "Candidate name is required.",
                )));
            }
        }

        match mem::take(&mut self.modal) {
            Modal::Closed => Transition::stay(),
            Modal::Add(form) => {
                let api = self.api.clone();
                self.mutate(Mutation::Add, async move { api.add_candidate(&form).await })
                    .await
            }
            Modal::Edit { id, form } => {
                let api = self.api.clone();
                self.mutate(Mutation::Edit, async move {
                    api.edit_candidate(id, &form).await
                })
                .await
            }
        }
    }

    pub async fn delete_candidate(&mut self, id: i64) -> Transition {
        let api = self.api.clone();
        self.mutate(Mutation::Delete, async move { api.delete_candidate(id).await })
            .await
    }

    pub async fn remove_all_votes(&mut self) -> Transition {
        let api = self.api.clone();
        self.mutate(Mutation::RemoveVotes, async move {
            api.remove_all_votes().await
        })
        .await
    }

    async fn mutate<F>(&mut self, mutation: Mutation, call: F) -> Transition
    where
        F: Future<Output = Result<()>>,
    {
        match self.lifecycle.guard(call).await {
            Ok(()) => {
                let done = Notification::success("Success", mutation.success_message());
                match self.load().await {
                    Transition::Navigate(route, _) => Transition::Navigate(route, Some(done)),
                    Transition::Stay(_) => Transition::Stay(Some(done)),
                }
            }
            Err(ClientError::Cancelled) => Transition::stay(),
            Err(e) if e.requires_login() => Transition::back_to_login(&e),
            Err(e) => {
                tracing::warn!(error = %e, ?mutation, "admin mutation failed");
                Transition::Stay(Some(Notification::error(
                    "Error",
                    mutation.failure_message(),
                )))
            }
        }
    }
}
