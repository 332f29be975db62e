use crate::{
    error::{Error, Result},
    store::Store,
};
use log::{debug, info};
use model::{Id, Poll, PollRequest, PollResponse, VoteRequest};

/// Mediates between the storage layer and the HTTP layer.
pub struct PollService<S> {
    store: S,
}

impl<S> PollService<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: Store> PollService<S> {
    async fn fetch_poll(&self, id: Id) -> Result<Poll> {
        match self.store.get_poll(id).await {
            Ok(poll) => Ok(poll),
            Err(db::error::Error::NotFound) => Err(Error::PollNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists every poll along with its tally. All tallies are fetched in one query.
    pub async fn list_polls(&self) -> Result<Vec<PollResponse>> {
        let polls = self.store.get_polls().await?;
        if polls.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<_> = polls.iter().map(|poll| poll.id).collect();
        let counts = self.store.count_votes_by_polls(&ids).await?;
        Ok(polls.into_iter().map(|poll| PollResponse::new(poll, &counts)).collect())
    }

    pub async fn create_poll(&self, req: &PollRequest) -> Result<Poll> {
        req.validate().map_err(Error::BadInput)?;
        let poll = self.store.create_poll(req.question.trim(), &req.texts()).await?;
        info!("created poll {} with {} choices", poll.id, poll.choices.len());
        Ok(poll)
    }

    pub async fn get_poll(&self, id: Id) -> Result<PollResponse> {
        let poll = self.fetch_poll(id).await?;
        let counts = self.store.count_votes_by_poll(id).await?;
        Ok(PollResponse::new(poll, &counts))
    }

    /// Records the user's vote and returns the updated tally. The store's uniqueness
    /// constraint alone decides whether the user has already voted.
    pub async fn cast_vote(&self, id: Id, vote: &VoteRequest, user: Id) -> Result<PollResponse> {
        let poll = self.fetch_poll(id).await?;
        let choice = poll.choice(vote.choice_id).ok_or(Error::ChoiceNotFound(vote.choice_id))?.id;

        match self.store.insert_vote(id, choice, user).await {
            Ok(()) => debug!("user {user} voted for choice {choice} in poll {id}"),
            Err(db::error::Error::AlreadyExists) => {
                info!("user {user} has already voted in poll {id}");
                return Err(Error::DuplicateVote);
            }
            Err(db::error::Error::UnknownUser) => return Err(Error::UserNotFound(user)),
            // The choice was replaced (or the poll deleted) since we fetched it.
            Err(db::error::Error::NotFound) => return Err(Error::ChoiceNotFound(choice)),
            Err(err) => return Err(err.into()),
        }

        let counts = self.store.count_votes_by_poll(id).await?;
        Ok(PollResponse::new(poll, &counts))
    }

    /// Replaces the question and all of the choices. Votes for the replaced choices are dropped.
    pub async fn update_poll(&self, id: Id, req: &PollRequest) -> Result<Poll> {
        req.validate().map_err(Error::BadInput)?;
        match self.store.update_poll(id, req.question.trim(), &req.texts()).await {
            Ok(poll) => {
                info!("updated poll {id}");
                Ok(poll)
            }
            Err(db::error::Error::NotFound) => Err(Error::PollNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_poll(&self, id: Id) -> Result<()> {
        match self.store.delete_poll(id).await {
            Ok(()) => {
                info!("deleted poll {id}");
                Ok(())
            }
            Err(db::error::Error::NotFound) => Err(Error::PollNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PollService;
    use crate::{error::Error, store::memory::MemoryStore};
    use model::{ChoiceRequest, PollRequest, VoteRequest};

    fn request(question: &str, choices: &[&str]) -> PollRequest {
        PollRequest {
            question: question.into(),
            choices: choices.iter().map(|&text| ChoiceRequest { text: text.into() }).collect(),
        }
    }

    fn vote(choice_id: i64) -> VoteRequest {
        VoteRequest { choice_id }
    }

    fn service() -> PollService<MemoryStore> {
        PollService::new(MemoryStore::with_users(&[1, 2, 3]))
    }

    #[tokio::test(flavor = "current_thread")]
    async fn new_poll_has_no_votes_and_keeps_order() {
        let service = service();
        let poll = service.create_poll(&request("Favorite color?", &["Red", "Blue"])).await.unwrap();
        let res = service.get_poll(poll.id).await.unwrap();
        assert_eq!(res.question, "Favorite color?");
        let texts: Vec<_> = res.choices.iter().map(|choice| choice.text.as_str()).collect();
        assert_eq!(texts, ["Red", "Blue"]);
        assert!(res.choices.iter().all(|choice| choice.vote_count == 0));
        assert_eq!(res.total_votes, 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn vote_is_reflected_in_results() {
        let service = service();
        let poll = service.create_poll(&request("Favorite color?", &["Red", "Blue"])).await.unwrap();
        let red = poll.choices[0].id;

        let res = service.cast_vote(poll.id, &vote(red), 1).await.unwrap();
        assert_eq!(res.choices[0].vote_count, 1);
        assert_eq!(res.choices[1].vote_count, 0);

        let res = service.get_poll(poll.id).await.unwrap();
        assert_eq!(res.choices[0].vote_count, 1);
        assert_eq!(res.choices[1].vote_count, 0);
        assert_eq!(res.total_votes, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn second_vote_is_rejected() {
        let service = service();
        let poll = service.create_poll(&request("Favorite color?", &["Red", "Blue"])).await.unwrap();
        let red = poll.choices[0].id;
        let blue = poll.choices[1].id;

        service.cast_vote(poll.id, &vote(red), 1).await.unwrap();
        let err = service.cast_vote(poll.id, &vote(blue), 1).await.unwrap_err();
        assert_eq!(err, Error::DuplicateVote);
        assert_eq!(err.to_string(), "Sorry! You have already cast your vote in this poll");

        let res = service.get_poll(poll.id).await.unwrap();
        assert_eq!(res.total_votes, 1);
        assert_eq!(res.choices[0].vote_count, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn totals_match_number_of_votes() {
        let service = service();
        let poll = service.create_poll(&request("Favorite color?", &["Red", "Blue", "Green"])).await.unwrap();
        for (user, choice) in [(1, 0), (2, 2), (3, 2)] {
            service.cast_vote(poll.id, &vote(poll.choices[choice].id), user).await.unwrap();
        }

        let res = service.get_poll(poll.id).await.unwrap();
        let sum: i64 = res.choices.iter().map(|choice| choice.vote_count).sum();
        assert_eq!(sum, 3);
        assert_eq!(res.total_votes, 3);
        assert_eq!(res.choices[2].vote_count, 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn choice_from_another_poll_is_not_found() {
        let service = service();
        let colors = service.create_poll(&request("Favorite color?", &["Red", "Blue"])).await.unwrap();
        let planets = service.create_poll(&request("Favorite planet?", &["Earth", "Mars"])).await.unwrap();
        let mars = planets.choices[1].id;

        let err = service.cast_vote(colors.id, &vote(mars), 1).await.unwrap_err();
        assert_eq!(err, Error::ChoiceNotFound(mars));
        assert_eq!(err.to_string(), format!("Choice not found with id : '{mars}'"));
        assert_eq!(service.cast_vote(colors.id, &vote(-1), 1).await.unwrap_err(), Error::ChoiceNotFound(-1));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unknown_poll_is_not_found() {
        let service = service();
        let err = service.get_poll(42).await.unwrap_err();
        assert_eq!(err, Error::PollNotFound(42));
        assert_eq!(err.to_string(), "Poll not found with id : '42'");
        assert_eq!(service.cast_vote(42, &vote(1), 1).await.unwrap_err(), Error::PollNotFound(42));
        assert_eq!(service.delete_poll(42).await.unwrap_err(), Error::PollNotFound(42));
        let req = request("Favorite color?", &["Red", "Blue"]);
        assert_eq!(service.update_poll(42, &req).await.unwrap_err(), Error::PollNotFound(42));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn deleted_poll_is_not_found() {
        let service = service();
        let poll = service.create_poll(&request("Favorite color?", &["Red", "Blue"])).await.unwrap();
        service.delete_poll(poll.id).await.unwrap();
        assert_eq!(service.get_poll(poll.id).await.unwrap_err(), Error::PollNotFound(poll.id));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unknown_user_cannot_vote() {
        let service = service();
        let poll = service.create_poll(&request("Favorite color?", &["Red", "Blue"])).await.unwrap();
        let err = service.cast_vote(poll.id, &vote(poll.choices[0].id), 99).await.unwrap_err();
        assert_eq!(err, Error::UserNotFound(99));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn listing_keeps_tallies_separate() {
        let service = service();
        let colors = service.create_poll(&request("Favorite color?", &["Red", "Blue"])).await.unwrap();
        let planets = service.create_poll(&request("Favorite planet?", &["Earth", "Mars"])).await.unwrap();
        service.cast_vote(colors.id, &vote(colors.choices[0].id), 1).await.unwrap();
        service.cast_vote(planets.id, &vote(planets.choices[1].id), 1).await.unwrap();
        service.cast_vote(planets.id, &vote(planets.choices[1].id), 2).await.unwrap();

        let polls = service.list_polls().await.unwrap();
        assert_eq!(polls.len(), 2);
        let colors = polls.iter().find(|poll| poll.poll_id == colors.id).unwrap();
        let planets = polls.iter().find(|poll| poll.poll_id == planets.id).unwrap();
        assert_eq!(colors.total_votes, 1);
        assert_eq!(colors.choices[0].vote_count, 1);
        assert_eq!(planets.total_votes, 2);
        assert_eq!(planets.choices[0].vote_count, 0);
        assert_eq!(planets.choices[1].vote_count, 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn listing_nothing_is_empty() {
        assert!(service().list_polls().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn update_replaces_question_and_choices() {
        let service = service();
        let poll = service.create_poll(&request("Favorite color?", &["Red", "Blue"])).await.unwrap();
        service.cast_vote(poll.id, &vote(poll.choices[0].id), 1).await.unwrap();

        let updated = service.update_poll(poll.id, &request("Favorite shade?", &["Teal", "Cyan", "Lime"])).await.unwrap();
        assert_eq!(updated.id, poll.id);
        assert_eq!(updated.question, "Favorite shade?");
        assert_eq!(updated.choices.len(), 3);

        let res = service.get_poll(poll.id).await.unwrap();
        let texts: Vec<_> = res.choices.iter().map(|choice| choice.text.as_str()).collect();
        assert_eq!(texts, ["Teal", "Cyan", "Lime"]);
        assert_eq!(res.total_votes, 0);

        // Old choices no longer belong to the poll.
        let err = service.cast_vote(poll.id, &vote(poll.choices[0].id), 2).await.unwrap_err();
        assert_eq!(err, Error::ChoiceNotFound(poll.choices[0].id));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn malformed_polls_are_rejected() {
        let service = service();
        let err = service.create_poll(&request("  ", &["Red", "Blue"])).await.unwrap_err();
        assert!(matches!(err, Error::BadInput(_)));
        let err = service.create_poll(&request("Favorite color?", &["Red"])).await.unwrap_err();
        assert!(matches!(err, Error::BadInput(_)));
        assert!(service.list_polls().await.unwrap().is_empty());
    }
}
