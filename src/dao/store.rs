use super::{DaoError, DaoResult, Person};
use crate::connection::config::ClusterConfig;
use crate::connection::{PreparedStatement, Session, Statement};
use crate::core::{ClusterError, ConsistencyLevel, Row, Value};
use crate::interface::ClusterTransport;
use crate::retry::{ConsistencyAwareRetryPolicy, LoggingRetryPolicy};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

const SELECT_ALL: &str = "select * from person";
const SELECT_BY_NAME: &str = "select * from person where name = ?";
const INSERT: &str = "insert into person(name, age, interesting_dates) values (?,?,?)";

/// Read and write access to stored people.
#[async_trait]
pub trait PersonDao: Send + Sync {
    /// Returns every stored person, without interesting dates.
    async fn retrieve_people(&self) -> DaoResult<Vec<Person>>;

    /// Returns the people stored under `name`, including interesting dates.
    async fn retrieve_people_by_name(&self, name: &str) -> DaoResult<Vec<Person>>;

    async fn store_person(&self, person: &Person) -> DaoResult<()>;
}

/// `PersonDao` backed by a cluster session.
///
/// Reads that keep timing out are retried at `ONE` up to
/// `max_read_retries` times before failing with
/// [`DaoError::UnableToRetrievePeople`]. Writes are attempted once.
pub struct PersonStore {
    session: Session,
    store_statement: PreparedStatement,
    retrieve_statement: PreparedStatement,
}

impl PersonStore {
    /// Opens a session on `transport` and prepares the person statements.
    pub async fn connect(
        config: ClusterConfig,
        transport: Arc<dyn ClusterTransport>,
    ) -> DaoResult<Self> {
        let policy = LoggingRetryPolicy::new(ConsistencyAwareRetryPolicy::new(
            config.max_read_retries,
        ));
        let session = Session::connect_with_policy(config, transport, Arc::new(policy)).await?;

        let prepared = async {
            let store_statement = session.prepare(INSERT).await?;
            let retrieve_statement = session.prepare(SELECT_BY_NAME).await?;
            Ok::<_, ClusterError>((store_statement, retrieve_statement))
        }
        .await;

        match prepared {
            Ok((store_statement, retrieve_statement)) => Ok(Self {
                session,
                store_statement,
                retrieve_statement,
            }),
            Err(err) => {
                // the session is not handed out, so release it here
                if let Err(close_err) = session.close().await {
                    warn!("Failed to close session after prepare error: {}", close_err);
                }
                Err(err.into())
            }
        }
    }

    /// Closes the underlying session.
    pub async fn disconnect(self) -> DaoResult<()> {
        self.session.close().await?;
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[async_trait]
impl PersonDao for PersonStore {
    async fn retrieve_people(&self) -> DaoResult<Vec<Person>> {
        let statement =
            Statement::simple(SELECT_ALL).with_consistency(ConsistencyLevel::Quorum);
        let result = self
            .session
            .execute(&statement)
            .await
            .map_err(read_failure)?;

        let people = result
            .iter()
            .map(person_summary)
            .collect::<Result<Vec<_>, ClusterError>>()?;
        debug!("Retrieved {} people", people.len());
        Ok(people)
    }

    async fn retrieve_people_by_name(&self, name: &str) -> DaoResult<Vec<Person>> {
        let statement = self.retrieve_statement.bind(vec![Value::from(name)])?;
        let result = self
            .session
            .execute(&statement)
            .await
            .map_err(read_failure)?;

        let people = result
            .iter()
            .map(person_with_dates)
            .collect::<Result<Vec<_>, ClusterError>>()?;
        Ok(people)
    }

    async fn store_person(&self, person: &Person) -> DaoResult<()> {
        let statement = self.store_statement.bind(vec![
            Value::from(person.name.as_str()),
            Value::from(person.age),
            Value::from(person.interesting_dates.clone()),
        ])?;

        self.session
            .execute(&statement)
            .await
            .map_err(write_failure)?;
        Ok(())
    }
}

fn read_failure(err: ClusterError) -> DaoError {
    match err {
        ClusterError::ReadTimeout { .. } => {
            warn!("Read gave up after exhausting retries: {}", err);
            DaoError::UnableToRetrievePeople(err)
        }
        other => DaoError::Cluster(other),
    }
}

fn write_failure(err: ClusterError) -> DaoError {
    if err.is_connectivity_failure() {
        warn!("Write could not reach the cluster: {}", err);
        DaoError::UnableToSavePerson(err)
    } else {
        DaoError::Cluster(err)
    }
}

/// Maps a row from the unbound read; dates are never projected here.
fn person_summary(row: &Row) -> Result<Person, ClusterError> {
    let name_column = if row.contains("first_name") {
        "first_name"
    } else {
        "name"
    };
    Ok(Person::new(
        row.get_string(name_column)?.unwrap_or_default(),
        row.get_int("age")?,
        None,
    ))
}

fn person_with_dates(row: &Row) -> Result<Person, ClusterError> {
    let interesting_dates = if row.contains("interesting_dates") {
        row.get_timestamp_list("interesting_dates")?
    } else {
        None
    };
    Ok(Person::new(
        row.get_string("name")?.unwrap_or_default(),
        row.get_int("age")?,
        interesting_dates,
    ))
}
