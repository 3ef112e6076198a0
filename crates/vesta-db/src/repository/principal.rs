//! SurrealDB implementation of [`PrincipalRepository`].
//!
//! Principals are written by the authentication collaborator; this
//! repository only reads the mirrored table.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::principal::{Principal, Role};
use vesta_core::repository::PrincipalRepository;

use crate::error::DbError;
use crate::repository::parse_uuid;

#[derive(Debug, SurrealValue)]
struct PrincipalRow {
    record_id: String,
    username: String,
    role: String,
    active: bool,
}

pub(crate) fn parse_role(s: &str) -> Result<Role, DbError> {
    match s {
        "Admin" => Ok(Role::Admin),
        "Resident" => Ok(Role::Resident),
        "Security" => Ok(Role::Security),
        "Maintenance" => Ok(Role::Maintenance),
        other => Err(DbError::Decode(format!("unknown role: {other}"))),
    }
}

pub(crate) fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::Admin => "Admin",
        Role::Resident => "Resident",
        Role::Security => "Security",
        Role::Maintenance => "Maintenance",
    }
}

impl PrincipalRow {
    fn try_into_principal(self) -> Result<Principal, DbError> {
        Ok(Principal {
            id: parse_uuid("principal.record_id", &self.record_id)?,
            username: self.username,
            role: parse_role(&self.role)?,
            active: self.active,
        })
    }
}

const PRINCIPAL_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// Read-only SurrealDB view of the principal table.
#[derive(Clone)]
pub struct SurrealPrincipalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPrincipalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PrincipalRepository for SurrealPrincipalRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> VestaResult<Principal> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {PRINCIPAL_PROJECTION} \
                 FROM type::record('principal', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "principal".into(),
            id: id_str,
        })?;
        Ok(row.try_into_principal()?)
    }

    async fn list_active(&self) -> VestaResult<Vec<Principal>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {PRINCIPAL_PROJECTION} FROM principal \
                 WHERE active = true ORDER BY username ASC"
            ))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(PrincipalRow::try_into_principal)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_by_role(&self, role: Role) -> VestaResult<Vec<Principal>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {PRINCIPAL_PROJECTION} FROM principal \
                 WHERE active = true AND role = $role \
                 ORDER BY username ASC"
            ))
            .bind(("role", role_to_str(role)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(PrincipalRow::try_into_principal)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
