//! PostgreSQL implementation of the patient store
//!
//! The aggregate spans three tables (patients, patient_names,
//! given_names). Every write happens inside a transaction; updates take
//! a row lock on the patient so two merges of the same aggregate cannot
//! interleave.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::{PgConnection, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{
    db::search::BirthDateQuery,
    db::traits::PatientStore,
    models::{Gender, GivenName, NameUse, Patient, PatientName, PatientUpdate},
    Error, Result,
};

#[derive(Clone)]
pub struct PostgresPatientStore {
    pool: PgPool,
}

impl PostgresPatientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PatientStore for PostgresPatientStore {
    async fn create(&self, patient: &Patient) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM patients WHERE id = $1")
            .bind(patient.id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_some() {
            return Err(Error::already_exists(
                patient.id,
                patient.name.family.clone(),
            ));
        }

        if let Err(source) = insert_aggregate(&mut tx, patient).await {
            return Err(Error::storage(
                "add",
                patient.id,
                Some(patient.name.family.clone()),
                source,
            ));
        }

        tx.commit().await.map_err(|source| {
            Error::storage(
                "add",
                patient.id,
                Some(patient.name.family.clone()),
                source,
            )
        })?;

        Ok(patient.id)
    }

    async fn get(&self, id: Uuid) -> Result<Patient> {
        let mut conn = self.pool.acquire().await?;
        fetch_aggregate(&mut conn, id)
            .await?
            .ok_or_else(|| Error::not_found(id))
    }

    async fn find_by_birth_date(&self, query: &BirthDateQuery) -> Result<Vec<Patient>> {
        let mut binds = Vec::new();
        let clause = query.where_clause("p.birth_date", &mut binds);
        let sql =
            format!("SELECT p.id FROM patients p WHERE {clause} ORDER BY p.birth_date, p.id");

        let mut select = sqlx::query_scalar::<_, Uuid>(&sql);
        for instant in binds {
            select = select.bind(instant);
        }
        let ids = select.fetch_all(&self.pool).await?;

        let mut conn = self.pool.acquire().await?;
        let mut patients = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(patient) = fetch_aggregate(&mut conn, id).await? {
                patients.push(patient);
            }
        }
        Ok(patients)
    }

    async fn update(&self, id: Uuid, change: &PatientUpdate) -> Result<Patient> {
        let mut tx = self.pool.begin().await?;

        // Row lock: load-merge-persist must not interleave with another
        // update of the same patient.
        let locked = sqlx::query("SELECT id FROM patients WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(Error::not_found(id));
        }

        let mut patient = fetch_aggregate(&mut tx, id)
            .await?
            .ok_or_else(|| Error::not_found(id))?;

        // Validation failure drops the transaction, discarding the merge.
        patient.update(change)?;

        if let Err(source) = write_aggregate(&mut tx, &patient).await {
            return Err(Error::storage(
                "update",
                id,
                Some(patient.name.family.clone()),
                source,
            ));
        }

        tx.commit().await.map_err(|source| {
            Error::storage("update", id, Some(patient.name.family.clone()), source)
        })?;

        // Return the refreshed view from storage, not the in-memory merge.
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query("SELECT id FROM patients WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(Error::not_found(id));
        }

        // Name and given names cascade.
        if let Err(source) = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
        {
            return Err(Error::storage("delete", id, None, source));
        }

        tx.commit()
            .await
            .map_err(|source| Error::storage("delete", id, None, source))?;

        Ok(())
    }
}

/// Load the full aggregate. `conn` may be a pooled connection or an open
/// transaction.
async fn fetch_aggregate(conn: &mut PgConnection, id: Uuid) -> Result<Option<Patient>> {
    let row = sqlx::query(
        "SELECT p.id, p.gender, p.birth_date, p.active,
                n.id AS name_id, n.family, n.name_use
         FROM patients p
         JOIN patient_names n ON n.patient_id = p.id
         WHERE p.id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let name_id: Uuid = row.get("name_id");
    let given_rows = sqlx::query(
        "SELECT id, value FROM given_names WHERE patient_name_id = $1 ORDER BY ord",
    )
    .bind(name_id)
    .fetch_all(&mut *conn)
    .await?;

    let given = given_rows
        .into_iter()
        .map(|g| GivenName {
            id: g.get("id"),
            value: g.get("value"),
        })
        .collect();

    let name = PatientName {
        id: name_id,
        family: row.get("family"),
        name_use: row
            .get::<Option<String>, _>("name_use")
            .as_deref()
            .and_then(NameUse::parse),
        given,
    };

    Ok(Some(Patient {
        id: row.get("id"),
        name,
        gender: row
            .get::<Option<String>, _>("gender")
            .as_deref()
            .and_then(Gender::parse),
        birth_date: row.get("birth_date"),
        active: row.get("active"),
    }))
}

async fn insert_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    patient: &Patient,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO patients (id, gender, birth_date, active) VALUES ($1, $2, $3, $4)")
        .bind(patient.id)
        .bind(patient.gender.map(|g| g.as_str()))
        .bind(patient.birth_date)
        .bind(patient.active)
        .execute(&mut **tx)
        .await?;

    sqlx::query("INSERT INTO patient_names (id, patient_id, family, name_use) VALUES ($1, $2, $3, $4)")
        .bind(patient.name.id)
        .bind(patient.id)
        .bind(&patient.name.family)
        .bind(patient.name.name_use.map(|u| u.as_str()))
        .execute(&mut **tx)
        .await?;

    insert_given_names(tx, &patient.name).await
}

/// Persist the merged aggregate over the existing rows. Given names are
/// rewritten from the in-memory sequence, so replaced ids disappear and
/// untouched ids survive as-is.
async fn write_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    patient: &Patient,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("UPDATE patients SET gender = $2, birth_date = $3, active = $4 WHERE id = $1")
        .bind(patient.id)
        .bind(patient.gender.map(|g| g.as_str()))
        .bind(patient.birth_date)
        .bind(patient.active)
        .execute(&mut **tx)
        .await?;

    sqlx::query("UPDATE patient_names SET family = $2, name_use = $3 WHERE id = $1")
        .bind(patient.name.id)
        .bind(&patient.name.family)
        .bind(patient.name.name_use.map(|u| u.as_str()))
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM given_names WHERE patient_name_id = $1")
        .bind(patient.name.id)
        .execute(&mut **tx)
        .await?;

    insert_given_names(tx, &patient.name).await
}

async fn insert_given_names(
    tx: &mut Transaction<'_, Postgres>,
    name: &PatientName,
) -> std::result::Result<(), sqlx::Error> {
    for (ord, given) in name.given.iter().enumerate() {
        sqlx::query(
            "INSERT INTO given_names (id, patient_name_id, value, ord) VALUES ($1, $2, $3, $4)",
        )
        .bind(given.id)
        .bind(name.id)
        .bind(&given.value)
        .bind(ord as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
