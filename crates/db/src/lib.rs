#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;

use alloc::{borrow::ToOwned, collections::BTreeMap, string::String, vec::Vec};
use model::{Choice, Id, Poll};

pub use tokio_postgres::{tls::NoTls, Client, Config};

/// Idempotent schema definition. Safe to apply on every start-up.
pub const SCHEMA: &str = include_str!("../schema.sql");

/// Selects each poll along with its choices aggregated in display order.
macro_rules! select_polls {
    ($tail:literal) => {
        concat!(
            "SELECT poll.id, poll.question, \
             COALESCE(array_agg(choice.id ORDER BY choice.position) FILTER (WHERE choice.id IS NOT NULL), '{}') AS choice_ids, \
             COALESCE(array_agg(choice.text::TEXT ORDER BY choice.position) FILTER (WHERE choice.id IS NOT NULL), '{}') AS choice_texts \
             FROM poll LEFT JOIN choice ON choice.poll = poll.id ",
            $tail
        )
    };
}

pub struct Database(Client);

impl From<Client> for Database {
    fn from(client: Client) -> Self {
        Self(client)
    }
}

fn zip_choices(ids: Vec<Id>, texts: Vec<String>) -> error::Result<Vec<Choice>> {
    if ids.len() != texts.len() {
        return Err(error::Error::Fatal);
    }
    Ok(ids.into_iter().zip(texts).map(|(id, text)| Choice { id, text }).collect())
}

fn deserialize_poll_from_row(row: &tokio_postgres::Row) -> error::Result<Poll> {
    let id = row.try_get("id")?;
    let question = row.try_get("question")?;
    let ids = row.try_get("choice_ids")?;
    let texts = row.try_get("choice_texts")?;
    let choices = zip_choices(ids, texts)?;
    Ok(Poll { id, question, choices })
}

fn deserialize_counts_from_rows(rows: &[tokio_postgres::Row]) -> error::Result<BTreeMap<Id, i64>> {
    rows.iter()
        .map(|row| -> error::Result<(Id, i64)> {
            let choice = row.try_get("choice")?;
            let votes = row.try_get("votes")?;
            Ok((choice, votes))
        })
        .collect()
}

impl Database {
    /// Creates the tables if they do not exist yet.
    pub async fn migrate(&self) -> error::Result<()> {
        self.0.batch_execute(SCHEMA).await?;
        Ok(())
    }

    pub async fn get_polls(&self) -> error::Result<Vec<Poll>> {
        let rows = self.0.query(select_polls!("GROUP BY poll.id ORDER BY poll.id"), &[]).await?;
        rows.iter().map(deserialize_poll_from_row).collect()
    }

    pub async fn get_poll(&self, poll: Id) -> error::Result<Poll> {
        let row = self
            .0
            .query_opt(select_polls!("WHERE poll.id = $1 GROUP BY poll.id"), &[&poll])
            .await?
            .ok_or(error::Error::NotFound)?;
        deserialize_poll_from_row(&row)
    }

    /// Inserts the poll and all of its choices in a single statement.
    pub async fn create_poll(&self, question: &str, choices: &[&str]) -> error::Result<Poll> {
        let row = self
            .0
            .query_one(
                "WITH new_poll AS (INSERT INTO poll (question) VALUES ($1) RETURNING id), \
                 new_choices AS ( \
                     INSERT INTO choice (poll, position, text) \
                     SELECT new_poll.id, input.position, input.body \
                     FROM new_poll, unnest($2::TEXT[]) WITH ORDINALITY AS input(body, position) \
                     RETURNING id, position \
                 ) \
                 SELECT new_poll.id, \
                 COALESCE(array_agg(new_choices.id ORDER BY new_choices.position) FILTER (WHERE new_choices.id IS NOT NULL), '{}') AS choice_ids \
                 FROM new_poll LEFT JOIN new_choices ON TRUE \
                 GROUP BY new_poll.id",
                &[&question, &choices],
            )
            .await?;
        let id = row.try_get("id")?;
        let ids = row.try_get("choice_ids")?;
        let texts = choices.iter().copied().map(ToOwned::to_owned).collect();
        let choices = zip_choices(ids, texts)?;
        Ok(Poll { id, question: question.to_owned(), choices })
    }

    /// Replaces the question and every choice of the poll. Votes for the removed choices are
    /// deleted along with them.
    pub async fn update_poll(&self, poll: Id, question: &str, choices: &[&str]) -> error::Result<Poll> {
        let row = self
            .0
            .query_opt(
                "WITH target AS (UPDATE poll SET question = $2 WHERE id = $1 RETURNING id), \
                 stale AS (DELETE FROM choice USING target WHERE choice.poll = target.id), \
                 fresh AS ( \
                     INSERT INTO choice (poll, position, text) \
                     SELECT target.id, input.position, input.body \
                     FROM target, unnest($3::TEXT[]) WITH ORDINALITY AS input(body, position) \
                     RETURNING id, position \
                 ) \
                 SELECT COALESCE(array_agg(fresh.id ORDER BY fresh.position) FILTER (WHERE fresh.id IS NOT NULL), '{}') AS choice_ids \
                 FROM target LEFT JOIN fresh ON TRUE \
                 GROUP BY target.id",
                &[&poll, &question, &choices],
            )
            .await?
            .ok_or(error::Error::NotFound)?;
        let ids = row.try_get("choice_ids")?;
        let texts = choices.iter().copied().map(ToOwned::to_owned).collect();
        let choices = zip_choices(ids, texts)?;
        Ok(Poll { id: poll, question: question.to_owned(), choices })
    }

    /// Deletes the poll along with its choices and votes.
    pub async fn delete_poll(&self, poll: Id) -> error::Result<()> {
        match self.0.execute("DELETE FROM poll WHERE id = $1", &[&poll]).await? {
            0 => Err(error::Error::NotFound),
            _ => Ok(()),
        }
    }

    /// Tallies the votes of a single poll keyed by choice ID.
    pub async fn count_votes_by_poll(&self, poll: Id) -> error::Result<BTreeMap<Id, i64>> {
        let rows = self
            .0
            .query("SELECT choice, COUNT(*) AS votes FROM vote WHERE poll = $1 GROUP BY choice", &[&poll])
            .await?;
        deserialize_counts_from_rows(&rows)
    }

    /// Tallies the votes of many polls at once keyed by choice ID.
    pub async fn count_votes_by_polls(&self, polls: &[Id]) -> error::Result<BTreeMap<Id, i64>> {
        let rows = self
            .0
            .query("SELECT choice, COUNT(*) AS votes FROM vote WHERE poll = ANY($1) GROUP BY choice", &[&polls])
            .await?;
        deserialize_counts_from_rows(&rows)
    }

    /// Records the vote. Fails with [`AlreadyExists`](error::Error::AlreadyExists) if the user
    /// has already voted in this poll.
    pub async fn insert_vote(&self, poll: Id, choice: Id, user: Id) -> error::Result<()> {
        self.0
            .execute("INSERT INTO vote (poll, choice, author) VALUES ($1, $2, $3)", &[&poll, &choice, &user])
            .await?;
        Ok(())
    }
}
