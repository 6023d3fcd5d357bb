//! Request-issuing dashboard actions.
//!
//! Each action asks the rate-limit guard before touching the network and
//! tells it when the remote API pushes back. Everything else about an action
//! is a thin pass-through to [`MemtimeClient`].

use std::future::Future;

use crate::api::MemtimeClient;
use crate::entry_form::EntryForm;
use crate::error::{ActionError, ApiError};
use crate::models::{Client, PaginationParams, Project, Task, TimeEntry};
use crate::pagination::{Page, PageQuery};
use crate::rate_limit::RateLimitGuard;

#[derive(Clone)]
pub struct Dashboard {
    api: MemtimeClient,
    guard: RateLimitGuard,
}

impl Dashboard {
    pub fn new(api: MemtimeClient, guard: RateLimitGuard) -> Self {
        Self { api, guard }
    }

    pub fn guard(&self) -> &RateLimitGuard {
        &self.guard
    }

    pub fn api(&self) -> &MemtimeClient {
        &self.api
    }

    pub async fn list_clients(&self, params: &PaginationParams) -> Result<Vec<Client>, ActionError> {
        self.guarded(self.api.get_clients(params)).await
    }

    // Opening a client in the tree loads its projects
    pub async fn expand_client(&self, client_id: u64) -> Result<Vec<Project>, ActionError> {
        self.guarded(self.api.get_projects(client_id)).await
    }

    // Opening a project in the tree loads its tasks
    pub async fn expand_project(&self, project_id: u64) -> Result<Vec<Task>, ActionError> {
        self.guarded(self.api.get_tasks(project_id)).await
    }

    pub async fn time_entries_page(&self, query: PageQuery) -> Result<Page<TimeEntry>, ActionError> {
        let query = query.normalized();
        let params = PaginationParams::page(query.limit + 1, query.offset);
        let rows = self.guarded(self.api.get_time_entries(&params)).await?;
        Ok(Page::from_overfetch(query, rows))
    }

    /// Creates a new entry, or updates `id` when given.
    ///
    /// The form is validated before the guard is consulted, so an invalid form
    /// never raises the rate-limit notice.
    pub async fn submit_entry(&self, form: &EntryForm, id: Option<u64>) -> Result<TimeEntry, ActionError> {
        let input = form.validate()?;
        let entry = match id {
            Some(id) => self.guarded(self.api.update_time_entry(id, &input)).await?,
            None => self.guarded(self.api.create_time_entry(&input)).await?,
        };
        log::info!("time entry #{} saved", entry.id);
        Ok(entry)
    }

    pub async fn delete_entry(&self, id: u64) -> Result<(), ActionError> {
        self.guarded(self.api.delete_time_entry(id)).await?;
        log::info!("time entry #{} deleted", id);
        Ok(())
    }

    // check before, report after; the future is never polled while blocked
    async fn guarded<T>(&self, request: impl Future<Output = Result<T, ApiError>>) -> Result<T, ActionError> {
        if let Some(reset_at) = self.guard.blocked_until() {
            return Err(ActionError::Blocked { reset_at });
        }

        match request.await {
            Ok(value) => Ok(value),
            Err(ApiError::RateLimited) => {
                self.guard.report();
                Err(ActionError::RateLimited)
            }
            Err(e) => Err(ActionError::Fetch(e.to_string())),
        }
    }
}
