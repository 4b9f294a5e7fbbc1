//! Storage gateway over a SQLite database holding the two fixed tables.

use std::path::Path;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, ToSql};

use crate::core::{Amount, CustomerId, SaleDate, SaleId};
use crate::error::Error;
use crate::record::{Customer, JoinedRecord, Sale};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS Customer (
        id integer PRIMARY KEY,
        name text NOT NULL,
        sex text,
        age integer
    );
    CREATE TABLE IF NOT EXISTS Sales (
        id integer PRIMARY KEY,
        customerId integer,
        purchaseDate text,
        purchasedItem text,
        totalAmount text
    );
";

/// Handle on the persistent store. Single writer, single reader; both tables
/// are created on open if absent. No migrations, the schema is fixed.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::init(Connection::open(path).map_err(Error::Connection)?)
    }

    /// An in-memory store, gone on drop. Used by tests.
    pub fn open_in_memory() -> Result<Self, Error> {
        Self::init(Connection::open_in_memory().map_err(Error::Connection)?)
    }

    fn init(conn: Connection) -> Result<Self, Error> {
        conn.execute_batch(SCHEMA).map_err(Error::Connection)?;
        Ok(Self { conn })
    }

    pub fn close(self) -> Result<(), Error> {
        self.conn.close().map_err(|(_, err)| Error::Connection(err))
    }

    /// Open an explicit transaction so a whole file's inserts commit at once.
    pub fn begin(&self) -> Result<(), Error> {
        self.conn.execute_batch("BEGIN").map_err(Error::Query)
    }

    pub fn commit(&self) -> Result<(), Error> {
        self.conn.execute_batch("COMMIT").map_err(Error::Query)
    }

    /// Insert one customer row. A duplicate id trips the primary-key
    /// constraint and fails only this row.
    pub fn insert_customer(&self, customer: &Customer) -> Result<(), Error> {
        self.conn
            .execute(
                "INSERT INTO Customer (id, name, sex, age) VALUES (?1, ?2, ?3, ?4)",
                params![customer.id, customer.name, customer.sex, customer.age],
            )
            .map_err(Error::RowInsert)?;
        Ok(())
    }

    /// Insert one sale row and return its store-assigned id.
    pub fn insert_sale(&self, sale: &Sale) -> Result<SaleId, Error> {
        self.conn
            .execute(
                "INSERT INTO Sales (customerId, purchaseDate, purchasedItem, totalAmount)
                 VALUES (?1, ?2, ?3, ?4)",
                params![sale.customer, sale.date, sale.item, sale.amount],
            )
            .map_err(Error::RowInsert)?;
        Ok(SaleId(self.conn.last_insert_rowid()))
    }

    /// The denormalized view: every sale with its customer's attributes
    /// attached. Sales referencing an unknown customer id are excluded by the
    /// inner join. Ordered by sale id for deterministic output.
    pub fn join_all(&self) -> Result<Vec<JoinedRecord>, Error> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT c.id, c.name, c.sex, c.age, s.purchaseDate, s.purchasedItem, s.totalAmount
                 FROM Customer c INNER JOIN Sales s ON c.id = s.customerId
                 ORDER BY s.id",
            )
            .map_err(Error::Query)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(JoinedRecord {
                    customer: row.get(0)?,
                    name: row.get(1)?,
                    sex: row.get(2)?,
                    age: row.get(3)?,
                    date: row.get(4)?,
                    item: row.get(5)?,
                    amount: row.get(6)?,
                })
            })
            .map_err(Error::Query)?;
        rows.collect::<rusqlite::Result<_>>().map_err(Error::Query)
    }
}

impl ToSql for CustomerId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for CustomerId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Self)
    }
}

// Dates and amounts are stored as text, already normalized at ingestion.
impl ToSql for SaleDate {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for SaleDate {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use fpdec::{Dec, Decimal};

    fn ann() -> Customer {
        Customer {
            id: CustomerId(1),
            name: "Ann".to_owned(),
            sex: "F".to_owned(),
            age: 30,
        }
    }

    fn widget_sale(customer: i64) -> Sale {
        Sale {
            customer: CustomerId(customer),
            date: SaleDate(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            item: "Widget".to_owned(),
            amount: Amount(Dec!(1500)),
        }
    }

    #[test]
    fn open_is_idempotent_on_schema() {
        let store = Store::open_in_memory().unwrap();
        // A second CREATE pass must not fail.
        store.conn.execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn customer_and_sale_round_trip_through_join() {
        let store = Store::open_in_memory().unwrap();
        store.insert_customer(&ann()).unwrap();
        store.insert_sale(&widget_sale(1)).unwrap();

        let joined = store.join_all().unwrap();
        assert_eq!(
            joined,
            vec![JoinedRecord {
                customer: CustomerId(1),
                name: "Ann".to_owned(),
                sex: "F".to_owned(),
                age: 30,
                date: SaleDate(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
                item: "Widget".to_owned(),
                amount: Amount(Dec!(1500)),
            }]
        );
    }

    #[test]
    fn sale_ids_increase_monotonically() {
        let store = Store::open_in_memory().unwrap();
        store.insert_customer(&ann()).unwrap();
        let first = store.insert_sale(&widget_sale(1)).unwrap();
        let second = store.insert_sale(&widget_sale(1)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn duplicate_customer_id_fails_only_that_row() {
        let store = Store::open_in_memory().unwrap();
        store.insert_customer(&ann()).unwrap();

        let dup = Customer {
            name: "Impostor".to_owned(),
            ..ann()
        };
        assert!(matches!(
            store.insert_customer(&dup),
            Err(Error::RowInsert(_))
        ));

        // The first row is untouched and later inserts still work.
        store
            .insert_customer(&Customer {
                id: CustomerId(2),
                name: "Bob".to_owned(),
                sex: "M".to_owned(),
                age: 41,
            })
            .unwrap();
        store.insert_sale(&widget_sale(1)).unwrap();
        assert_eq!(store.join_all().unwrap()[0].name, "Ann");
    }

    #[test]
    fn join_drops_sales_with_unknown_customer() {
        let store = Store::open_in_memory().unwrap();
        store.insert_customer(&ann()).unwrap();
        store.insert_sale(&widget_sale(1)).unwrap();
        store.insert_sale(&widget_sale(99)).unwrap();

        let joined = store.join_all().unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].customer, CustomerId(1));
    }

    #[test]
    fn batched_inserts_commit_together() {
        let store = Store::open_in_memory().unwrap();
        store.insert_customer(&ann()).unwrap();
        store.begin().unwrap();
        store.insert_sale(&widget_sale(1)).unwrap();
        store.insert_sale(&widget_sale(1)).unwrap();
        store.commit().unwrap();
        assert_eq!(store.join_all().unwrap().len(), 2);
    }
}
