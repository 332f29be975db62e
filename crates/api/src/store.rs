use core::future::Future;
use db::{error::Result, Database};
use model::{Id, Poll};
use std::collections::BTreeMap;

/// Storage operations required by the [`PollService`](crate::PollService).
pub trait Store: Send + Sync {
    fn get_polls(&self) -> impl Future<Output = Result<Vec<Poll>>> + Send;
    fn get_poll(&self, poll: Id) -> impl Future<Output = Result<Poll>> + Send;
    fn create_poll(&self, question: &str, choices: &[&str]) -> impl Future<Output = Result<Poll>> + Send;
    fn update_poll(&self, poll: Id, question: &str, choices: &[&str]) -> impl Future<Output = Result<Poll>> + Send;
    fn delete_poll(&self, poll: Id) -> impl Future<Output = Result<()>> + Send;
    fn count_votes_by_poll(&self, poll: Id) -> impl Future<Output = Result<BTreeMap<Id, i64>>> + Send;
    fn count_votes_by_polls(&self, polls: &[Id]) -> impl Future<Output = Result<BTreeMap<Id, i64>>> + Send;
    /// Must fail with [`AlreadyExists`](db::error::Error::AlreadyExists) when the user has
    /// already voted in the poll, even under concurrent inserts.
    fn insert_vote(&self, poll: Id, choice: Id, user: Id) -> impl Future<Output = Result<()>> + Send;
}

impl Store for Database {
    async fn get_polls(&self) -> Result<Vec<Poll>> {
        Database::get_polls(self).await
    }

    async fn get_poll(&self, poll: Id) -> Result<Poll> {
        Database::get_poll(self, poll).await
    }

    async fn create_poll(&self, question: &str, choices: &[&str]) -> Result<Poll> {
        Database::create_poll(self, question, choices).await
    }

    async fn update_poll(&self, poll: Id, question: &str, choices: &[&str]) -> Result<Poll> {
        Database::update_poll(self, poll, question, choices).await
    }

    async fn delete_poll(&self, poll: Id) -> Result<()> {
        Database::delete_poll(self, poll).await
    }

    async fn count_votes_by_poll(&self, poll: Id) -> Result<BTreeMap<Id, i64>> {
        Database::count_votes_by_poll(self, poll).await
    }

    async fn count_votes_by_polls(&self, polls: &[Id]) -> Result<BTreeMap<Id, i64>> {
        Database::count_votes_by_polls(self, polls).await
    }

    async fn insert_vote(&self, poll: Id, choice: Id, user: Id) -> Result<()> {
        Database::insert_vote(self, poll, choice, user).await
    }
}
