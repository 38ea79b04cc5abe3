//! # People Service
//!
//! Maps [`Person`] reads and writes onto graph statements and submits them
//! through a [`StatementRunner`], normally a shared
//! [`BatchDispatcher`](crate::batching::BatchDispatcher) so that concurrent
//! writes from many HTTP requests coalesce into few backend round trips.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, instrument};

use super::error::{PeopleError, PeopleResult};
use super::model::{identifier_label, Identifier, Person, PersonRow};
use super::statement::Statement;
use crate::batching::BatchDispatcher;

/// Runs a group of statements atomically
#[async_trait]
pub trait StatementRunner: Send + Sync {
    async fn run(&self, statements: Vec<Statement>) -> PeopleResult<()>;
}

#[async_trait]
impl<E> StatementRunner for BatchDispatcher<Statement, E>
where
    E: fmt::Debug + fmt::Display + Send + Sync + 'static,
{
    async fn run(&self, statements: Vec<Statement>) -> PeopleResult<()> {
        Ok(self.submit(statements).await?)
    }
}

const READ_STATEMENT: &str = "MATCH (p:Person {uuid:{uuid}})
    OPTIONAL MATCH (p)<-[rel:IDENTIFIES]-(i:Identifier)
    WITH p, collect({authority:i.authority, identifierValue:i.value}) as identifiers
    RETURN p.uuid as uuid, p.name as name, identifiers, p.birthYear as birthYear,
           p.salutation as salutation, p.aliases as aliases";

const DELETE_IDENTIFIERS_STATEMENT: &str = "MATCH (t:Thing {uuid:{uuid}})
    OPTIONAL MATCH (i:Identifier)-[ir:IDENTIFIES]->(t)
    DELETE ir, i";

const MERGE_PERSON_STATEMENT: &str = "MERGE (n:Thing {uuid: {uuid}})
    SET n={props}
    SET n :Concept
    SET n :Person";

const CLEAR_PERSON_STATEMENT: &str = "MATCH (p:Thing {uuid: {uuid}})
    OPTIONAL MATCH (p)<-[ir:IDENTIFIES]-(i:Identifier)
    REMOVE p:Concept
    REMOVE p:Person
    DETACH DELETE ir, i
    SET p={props}";

const REMOVE_UNUSED_NODE_STATEMENT: &str = "MATCH (p:Thing {uuid: {uuid}})
    OPTIONAL MATCH (p)-[a]-(x)
    WITH p, count(a) AS relCount
    WHERE relCount = 0
    DELETE p";

const COUNT_STATEMENT: &str = "MATCH (n:Person) RETURN count(n) as c";

const HEALTH_STATEMENT: &str = "MATCH (n:Person) RETURN n.uuid as uuid LIMIT 1";

pub struct PeopleService<R> {
    runner: R,
}

impl<R: StatementRunner> PeopleService<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Replace the stored person and its identifiers in one batch
    #[instrument(skip(self, person), fields(uuid = %person.uuid))]
    pub async fn write(&self, person: &Person) -> PeopleResult<()> {
        let statements = write_statements(person)?;
        debug!(statements = statements.len(), "Writing person");
        self.runner.run(statements).await
    }

    #[instrument(skip(self))]
    pub async fn read(&self, uuid: &str) -> PeopleResult<Option<Person>> {
        let (statement, slot) = Statement::new(READ_STATEMENT)
            .with_param("uuid", uuid)
            .returning_rows();

        self.runner.run(vec![statement]).await?;

        let rows: Vec<PersonRow> = slot.take_rows()?;
        Ok(rows.into_iter().next().map(Person::from))
    }

    /// Strip the person labels and identifiers, dropping the node entirely
    /// when nothing else references it. Returns whether a person was removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, uuid: &str) -> PeopleResult<bool> {
        let mut props = Map::new();
        props.insert("uuid".to_string(), Value::from(uuid));

        let (clear, slot) = Statement::new(CLEAR_PERSON_STATEMENT)
            .with_param("uuid", uuid)
            .with_param("props", props)
            .including_stats();
        let remove = Statement::new(REMOVE_UNUSED_NODE_STATEMENT).with_param("uuid", uuid);

        self.runner.run(vec![clear, remove]).await?;

        let stats = slot
            .take()
            .and_then(|output| output.stats)
            .ok_or_else(|| {
                PeopleError::UnexpectedResult("delete returned no update statistics".to_string())
            })?;

        Ok(stats.contains_updates && stats.labels_removed > 0)
    }

    pub async fn count(&self) -> PeopleResult<usize> {
        #[derive(Deserialize)]
        struct CountRow {
            c: usize,
        }

        let (statement, slot) = Statement::new(COUNT_STATEMENT).returning_rows();
        self.runner.run(vec![statement]).await?;

        let rows: Vec<CountRow> = slot.take_rows()?;
        rows.first()
            .map(|row| row.c)
            .ok_or_else(|| PeopleError::UnexpectedResult("count returned no rows".to_string()))
    }

    /// Connectivity check: at least one person with a uuid must be readable
    pub async fn check(&self) -> PeopleResult<String> {
        #[derive(Deserialize)]
        struct UuidRow {
            uuid: Option<String>,
        }

        let (statement, slot) = Statement::new(HEALTH_STATEMENT).returning_rows();
        self.runner.run(vec![statement]).await?;

        let rows: Vec<UuidRow> = slot.take_rows()?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| PeopleError::Unhealthy("No Person found".to_string()))?;

        match row.uuid {
            Some(uuid) if !uuid.is_empty() => {
                Ok(format!("Found a person with a valid uuid = {uuid}"))
            }
            _ => Err(PeopleError::Unhealthy("UUID not set".to_string())),
        }
    }
}

/// Statements that replace `person` in the graph, in execution order
pub fn write_statements(person: &Person) -> PeopleResult<Vec<Statement>> {
    if person.uuid.trim().is_empty() {
        return Err(PeopleError::Validation("person uuid must not be empty".to_string()));
    }

    let mut identifier_statements = Vec::with_capacity(person.identifiers.len());
    for identifier in &person.identifiers {
        let label = identifier_label(&identifier.authority).ok_or_else(|| {
            PeopleError::Validation(format!(
                "Invalid authority: {}. Only FACTSET-PPL and FT-TME are currently supported.",
                identifier.authority
            ))
        })?;
        identifier_statements.push(identifier_statement(&person.uuid, identifier, label));
    }

    let mut props = Map::new();
    props.insert("uuid".to_string(), Value::from(person.uuid.as_str()));

    if !person.name.is_empty() {
        props.insert("name".to_string(), Value::from(person.name.as_str()));
        props.insert("prefLabel".to_string(), Value::from(person.name.as_str()));
    }
    if let Some(birth_year) = person.birth_year.filter(|year| *year != 0) {
        props.insert("birthYear".to_string(), Value::from(birth_year));
    }
    if !person.salutation.is_empty() {
        props.insert("salutation".to_string(), Value::from(person.salutation.as_str()));
    }
    if !person.aliases.is_empty() {
        props.insert("aliases".to_string(), Value::from(person.aliases.clone()));
    }

    let mut statements = vec![
        Statement::new(DELETE_IDENTIFIERS_STATEMENT).with_param("uuid", person.uuid.as_str()),
        Statement::new(MERGE_PERSON_STATEMENT)
            .with_param("uuid", person.uuid.as_str())
            .with_param("props", props),
    ];
    statements.extend(identifier_statements);

    Ok(statements)
}

fn identifier_statement(uuid: &str, identifier: &Identifier, label: &str) -> Statement {
    Statement::new(format!(
        "MERGE (o:Thing {{uuid:{{uuid}}}})
    MERGE (i:Identifier {{value:{{value}}, authority:{{authority}}}})
    MERGE (o)<-[:IDENTIFIES]-(i)
    SET i :{label}"
    ))
    .with_param("uuid", uuid)
    .with_param("value", identifier.identifier_value.as_str())
    .with_param("authority", identifier.authority.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::people::model::{FACTSET_AUTHORITY, TME_AUTHORITY};
    use crate::people::statement::{StatementOutput, UpdateStats};
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records submitted statements and answers every result slot with a
    /// canned output
    #[derive(Default)]
    struct MockRunner {
        submitted: Mutex<Vec<Vec<Statement>>>,
        output: Option<StatementOutput>,
        fail: bool,
    }

    #[async_trait]
    impl StatementRunner for MockRunner {
        async fn run(&self, statements: Vec<Statement>) -> PeopleResult<()> {
            if self.fail {
                return Err(PeopleError::Batch("backend unavailable".to_string()));
            }
            if let Some(output) = &self.output {
                for slot in statements.iter().filter_map(Statement::result_slot) {
                    slot.fill(output.clone());
                }
            }
            self.submitted.lock().push(statements);
            Ok(())
        }
    }

    fn answering(rows: Vec<Value>, stats: Option<UpdateStats>) -> MockRunner {
        MockRunner {
            output: Some(StatementOutput { rows, stats }),
            ..MockRunner::default()
        }
    }

    fn full_person() -> Person {
        Person {
            uuid: "bbc4f575-edb3-4f51-92f0-5ce6c708d1ea".to_string(),
            name: "Full Person".to_string(),
            birth_year: Some(1900),
            salutation: "Dr.".to_string(),
            aliases: vec!["Diff Name".to_string()],
            identifiers: vec![
                Identifier::new(FACTSET_AUTHORITY, "012345-E"),
                Identifier::new(TME_AUTHORITY, "tmeIdentifier"),
            ],
        }
    }

    fn person_with_unknown_authority() -> Person {
        let mut person = full_person();
        person
            .identifiers
            .push(Identifier::new("http://example.com/other", "x"));
        person
    }

    #[test]
    fn test_write_statements_for_full_person() {
        let statements = write_statements(&full_person()).unwrap();

        // delete identifiers, merge node, one per identifier
        assert_eq!(statements.len(), 4);
        assert!(statements[0].text().contains("DELETE ir, i"));

        let props = &statements[1].parameters()["props"];
        assert_eq!(
            props,
            &json!({
                "uuid": "bbc4f575-edb3-4f51-92f0-5ce6c708d1ea",
                "name": "Full Person",
                "prefLabel": "Full Person",
                "birthYear": 1900,
                "salutation": "Dr.",
                "aliases": ["Diff Name"]
            })
        );

        assert!(statements[2].text().ends_with("SET i :FactsetIdentifier"));
        assert_eq!(statements[2].parameters()["value"], json!("012345-E"));
        assert!(statements[3].text().ends_with("SET i :TMEIdentifier"));
    }

    #[test]
    fn test_write_statements_for_minimal_person() {
        let person = Person {
            uuid: "180cec41-23fa-4148-806b-0602924e6858".to_string(),
            ..Person::default()
        };
        let statements = write_statements(&person).unwrap();

        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[1].parameters()["props"],
            json!({"uuid": "180cec41-23fa-4148-806b-0602924e6858"})
        );
    }

    #[test]
    fn test_write_requires_uuid() {
        let error = write_statements(&Person::default()).unwrap_err();
        assert!(matches!(error, PeopleError::Validation(_)));
    }

    #[test]
    fn test_write_statements_rejects_unknown_authority() {
        let error = write_statements(&person_with_unknown_authority()).unwrap_err();
        match error {
            PeopleError::Validation(message) => {
                assert!(message.starts_with("Invalid authority: http://example.com/other"))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_with_unknown_authority_submits_nothing() {
        let service = PeopleService::new(MockRunner::default());

        let result = service.write(&person_with_unknown_authority()).await;
        assert!(matches!(result, Err(PeopleError::Validation(_))));
        assert!(service.runner().submitted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_write_submits_one_batch() {
        let service = PeopleService::new(MockRunner::default());
        service.write(&full_person()).await.unwrap();

        let submitted = service.runner().submitted.lock();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].len(), 4);
    }

    #[tokio::test]
    async fn test_read_found() {
        let service = PeopleService::new(answering(
            vec![json!({
                "uuid": "123",
                "name": "Test",
                "birthYear": 1970,
                "salutation": null,
                "aliases": null,
                "identifiers": [{"authority": FACTSET_AUTHORITY, "identifierValue": "FACTSET_ID"}]
            })],
            None,
        ));

        let person = service.read("123").await.unwrap().expect("person should be found");
        assert_eq!(person.name, "Test");
        assert_eq!(person.birth_year, Some(1970));
        assert_eq!(
            person.identifiers,
            vec![Identifier::new(FACTSET_AUTHORITY, "FACTSET_ID")]
        );
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let service = PeopleService::new(answering(Vec::new(), None));
        assert_eq!(service.read("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_propagates_runner_failure() {
        let service = PeopleService::new(MockRunner {
            fail: true,
            ..MockRunner::default()
        });
        assert!(matches!(
            service.read("123").await,
            Err(PeopleError::Batch(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_removed_labels() {
        let stats = UpdateStats {
            contains_updates: true,
            labels_removed: 2,
            ..UpdateStats::default()
        };
        let service = PeopleService::new(answering(Vec::new(), Some(stats)));

        assert!(service.delete("123").await.unwrap());

        let submitted = service.runner().submitted.lock();
        assert_eq!(submitted[0].len(), 2);
        assert!(submitted[0][0].include_stats());
    }

    #[tokio::test]
    async fn test_delete_of_absent_person() {
        let service = PeopleService::new(answering(Vec::new(), Some(UpdateStats::default())));
        assert!(!service.delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_count() {
        let service = PeopleService::new(answering(vec![json!({"c": 42})], None));
        assert_eq!(service.count().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_check_healthy_and_unhealthy() {
        let healthy = PeopleService::new(answering(vec![json!({"uuid": "123"})], None));
        assert_eq!(
            healthy.check().await.unwrap(),
            "Found a person with a valid uuid = 123"
        );

        let empty = PeopleService::new(answering(Vec::new(), None));
        assert!(matches!(empty.check().await, Err(PeopleError::Unhealthy(_))));

        let blank = PeopleService::new(answering(vec![json!({"uuid": ""})], None));
        assert!(matches!(blank.check().await, Err(PeopleError::Unhealthy(_))));
    }
}
