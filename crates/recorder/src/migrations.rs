use contracts::ContractError;
use rusqlite::{Connection, Transaction};

use crate::sqlite::storage;

pub(crate) const CURRENT_SCHEMA_VERSION: i32 = 2;

pub(crate) fn run_migrations(conn: &mut Connection) -> Result<(), ContractError> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(storage("read user_version"))?;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(ContractError::storage(
            "migrate",
            format!(
                "database version ({version}) is newer than supported schema ({CURRENT_SCHEMA_VERSION})"
            ),
        ));
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction().map_err(storage("begin migration"))?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)?;
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .map_err(storage("update user_version"))?;
    tx.commit().map_err(storage("commit migration"))?;

    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> Result<(), ContractError> {
    let sql = match version {
        1 => include_str!("schemas/schema_v1.sql"),
        2 => include_str!("schemas/schema_v2.sql"),
        _ => {
            return Err(ContractError::storage(
                "migrate",
                format!("unknown migration target version: {version}"),
            ))
        }
    };
    tx.execute_batch(sql)
        .map_err(|e| ContractError::storage(format!("migrate to v{version}"), e.to_string()))
}
