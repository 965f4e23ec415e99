//! A proposition DAO written against an in-memory connection, exercising the
//! executor, prefix flattening and placeholder composition together.

use pgdao::{
    Connection, DaoError, DaoResult, Executor, Field, FlatRow, FromFlatRow, Query, ResultSet,
    STOP_PREFIX, Value, expand_array_params, make_placeholders, renumber_placeholders,
    start_prefix,
};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: i64,
    long_name: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Proposition {
    id: i64,
    text: String,
    creator: Option<User>,
}

impl FromFlatRow for User {
    fn from_flat_row(row: &FlatRow) -> DaoResult<Self> {
        Ok(User {
            id: row.get("id")?,
            long_name: row.get("long_name")?,
        })
    }
}

impl FromFlatRow for Proposition {
    fn from_flat_row(row: &FlatRow) -> DaoResult<Self> {
        let creator = if row.has_prefixed("creator_") {
            Some(User::from_flat_row(&row.sub_row("creator_"))?)
        } else {
            None
        };
        Ok(Proposition {
            id: row.get("id")?,
            text: row.get("text")?,
            creator,
        })
    }
}

/// Answers every query with the rows whose `id` is among the bound arguments.
struct PropositionTable {
    fields: Vec<Field>,
    rows: Vec<Vec<Value>>,
    seen: Mutex<Vec<(String, String, Vec<Value>)>>,
}

impl PropositionTable {
    fn new() -> Self {
        let start = start_prefix("creator_");
        let fields = ["id", "text", start.as_str(), "id", "long_name", STOP_PREFIX]
            .map(Field::new)
            .to_vec();
        let row = |id: i64, text: &str, user: Option<(i64, &str)>| {
            let (user_id, name) = match user {
                Some((id, name)) => (Value::Int(id), Value::text(name)),
                None => (Value::Null, Value::Null),
            };
            vec![
                Value::Int(id),
                Value::text(text),
                Value::text(""),
                user_id,
                name,
                Value::text(""),
            ]
        };
        Self {
            fields,
            rows: vec![
                row(1, "Socrates is mortal", Some((7, "Plato"))),
                row(2, "All men are mortal", Some((8, "Aristotle"))),
                row(3, "Socrates is a man", None),
            ],
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<(String, String, Vec<Value>)> {
        self.seen.lock().unwrap().clone()
    }
}

impl Connection for PropositionTable {
    async fn execute(&self, name: &str, sql: &str, args: &[Value]) -> DaoResult<ResultSet> {
        self.seen
            .lock()
            .unwrap()
            .push((name.to_string(), sql.to_string(), args.to_vec()));
        if name == "broken" {
            return Err(DaoError::Connection("server closed the connection".into()));
        }
        let rows = self
            .rows
            .iter()
            .filter(|row| args.contains(&row[0]))
            .cloned()
            .collect();
        Ok(ResultSet::new(self.fields.clone(), rows))
    }
}

const SELECT_PROPOSITIONS: &str = "SELECT p.proposition_id AS id, p.text, '' AS prefix__creator_, \
     u.user_id AS id, u.long_name, '' AS _prefix__end \
     FROM propositions p LEFT JOIN users u ON u.user_id = p.creator_user_id";

struct PropositionsDao<C> {
    exec: Executor<C>,
}

impl<C: Connection> PropositionsDao<C> {
    async fn read_proposition_for_id(&self, id: i64) -> DaoResult<Option<Proposition>> {
        let sql = format!("{SELECT_PROPOSITIONS} WHERE p.proposition_id = $1");
        self.exec
            .query_one_as("readPropositionForId", &sql, &[id.into()], false)
            .await
    }

    async fn read_propositions_for_ids(&self, ids: &[i64]) -> DaoResult<Vec<Proposition>> {
        let query = Query::new(
            "readPropositionsForIds",
            format!("{SELECT_PROPOSITIONS} WHERE p.proposition_id IN ("),
        )
        .push_array(ids.iter().copied())
        .push(")");
        self.exec.fetch_many_as(&query).await
    }
}

fn dao(table: &PropositionTable) -> PropositionsDao<&PropositionTable> {
    PropositionsDao {
        exec: Executor::new(table),
    }
}

#[tokio::test]
async fn reads_proposition_with_its_creator() {
    let table = PropositionTable::new();
    let proposition = dao(&table).read_proposition_for_id(1).await.unwrap();

    assert_eq!(
        proposition,
        Some(Proposition {
            id: 1,
            text: "Socrates is mortal".to_string(),
            creator: Some(User {
                id: 7,
                long_name: "Plato".to_string()
            }),
        })
    );
}

#[tokio::test]
async fn missing_creator_flattens_to_nulls() {
    let table = PropositionTable::new();
    let proposition = dao(&table).read_proposition_for_id(3).await.unwrap().unwrap();
    assert_eq!(proposition.creator, None);
}

#[tokio::test]
async fn unknown_id_is_absent_unless_required() {
    let table = PropositionTable::new();
    let d = dao(&table);
    assert_eq!(d.read_proposition_for_id(99).await.unwrap(), None);

    let err = d
        .exec
        .query_required_as::<Proposition>(
            "readPropositionForId",
            &format!("{SELECT_PROPOSITIONS} WHERE p.proposition_id = $1"),
            &[99_i64.into()],
        )
        .await
        .unwrap_err();
    assert!(err.is_missing_required_row());
}

#[tokio::test]
async fn reads_many_with_expanded_in_list() {
    let table = PropositionTable::new();
    let propositions = dao(&table)
        .read_propositions_for_ids(&[2, 3])
        .await
        .unwrap();

    let ids: Vec<i64> = propositions.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2, 3]);

    let (name, sql, args) = table.seen().pop().unwrap();
    assert_eq!(name, "readPropositionsForIds");
    assert!(sql.ends_with("IN ($1, $2)"));
    assert_eq!(args, vec![Value::Int(2), Value::Int(3)]);
}

#[tokio::test]
async fn empty_id_list_queries_in_null() {
    let table = PropositionTable::new();
    let propositions = dao(&table).read_propositions_for_ids(&[]).await.unwrap();

    assert!(propositions.is_empty());
    let (_, sql, args) = table.seen().pop().unwrap();
    assert!(sql.ends_with("IN (NULL)"));
    assert!(args.is_empty());
}

#[tokio::test]
async fn hand_composed_fragments_bind_in_order() {
    // Base filter plus an independently numbered fragment plus an IN list
    let base_sql = format!("{SELECT_PROPOSITIONS} WHERE p.proposition_id = $1");
    let base_args = vec![Value::Int(1)];

    let fragment = renumber_placeholders(" OR p.proposition_id = $1", base_args.len());
    let mut args = base_args.clone();
    args.push(Value::Int(2));

    let expanded = expand_array_params(args.as_slice(), [Value::Int(3)]);
    let sql = format!(
        "{base_sql}{fragment} OR p.proposition_id IN ({})",
        expanded.joined()
    );

    assert!(sql.ends_with("= $1 OR p.proposition_id = $2 OR p.proposition_id IN ($3)"));
    assert_eq!(
        make_placeholders(1, args.len() + 1).unwrap(),
        expanded.placeholders
    );

    let table = PropositionTable::new();
    let exec = Executor::new(&table);
    let ids = exec
        .query_many("readPropositions", &sql, &expanded.args, |row| {
            row.get::<i64>("id")
        })
        .await
        .unwrap();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn connection_failures_surface_to_the_dao() {
    let table = PropositionTable::new();
    let exec = Executor::new(&table);
    let err = exec
        .query_many_as::<Proposition>("broken", SELECT_PROPOSITIONS, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::Connection(_)));
}
