use super::schema::clients;
use crate::swimlane::{ClientRecord, Status, UnknownStatus};
use diesel::dsl::insert_into;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = clients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClientRow {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub priority: i64,
}

impl ClientRow {
    /// Inserts client rows.
    ///
    /// Clients are provisioned outside this service; this is used by tests and local seeding.
    pub fn create(conn: &mut SqliteConnection, rows: &[ClientRow]) -> QueryResult<usize> {
        insert_into(clients::table).values(rows).execute(conn)
    }

    pub fn into_record(self) -> Result<ClientRecord, UnknownStatus> {
        Ok(ClientRecord {
            id: self.id,
            name: self.name,
            description: self.description,
            status: self.status.parse::<Status>()?,
            priority: self.priority,
        })
    }
}

impl From<&ClientRecord> for ClientRow {
    fn from(record: &ClientRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            status: record.status.as_db_str().to_string(),
            priority: record.priority,
        }
    }
}

/// The only columns the reorder path ever writes.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = clients)]
pub struct SwimlanePosition<'a> {
    pub status: &'a str,
    pub priority: i64,
}

impl<'a> From<&'a ClientRecord> for SwimlanePosition<'a> {
    fn from(record: &'a ClientRecord) -> Self {
        Self {
            status: record.status.as_db_str(),
            priority: record.priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClientRow;
    use crate::swimlane::Status;

    fn sample_row(status: &str) -> ClientRow {
        ClientRow {
            id: 7,
            name: Some("Stark, White and Abbott".to_string()),
            description: Some("Cloned Optimal Architecture".to_string()),
            status: status.to_string(),
            priority: 3,
        }
    }

    #[test]
    fn row_maps_into_record_with_parsed_status() {
        let record = sample_row("in-progress")
            .into_record()
            .expect("known status should map");

        assert_eq!(record.status, Status::InProgress);
        assert_eq!(record.priority, 3);
        assert_eq!(record.name.as_deref(), Some("Stark, White and Abbott"));
        assert_eq!(ClientRow::from(&record).status, "in-progress");
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        let err = sample_row("archived")
            .into_record()
            .expect_err("unknown status should not map");
        assert_eq!(err.0, "archived");
    }
}
