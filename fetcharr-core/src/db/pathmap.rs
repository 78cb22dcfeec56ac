//! §4.I path mapping storage. `PathMapping::scope` is a tagged enum
//! (`Manager(ManagerKind)` | `PlayerGroup(PlayerGroupId)`), which `sqlx`
//! cannot map onto a single column the way the flat enums elsewhere in the
//! schema are mapped, so the row shape here is deliberately wider than the
//! domain type and assembled by hand.

use fetcharr_model::{ManagerKind, MappingScope, PathMapping, PathMappingId, PlayerGroupId};
use sqlx::PgPool;

use crate::error::Result;

#[derive(sqlx::FromRow)]
struct Row {
    id: PathMappingId,
    scope_kind: String,
    scope_manager: Option<ManagerKind>,
    scope_group_id: Option<PlayerGroupId>,
    source_prefix: String,
    target_prefix: String,
}

impl Row {
    fn into_mapping(self) -> Option<PathMapping> {
        let scope = match self.scope_kind.as_str() {
            "manager" => MappingScope::Manager(self.scope_manager?),
            "player_group" => MappingScope::PlayerGroup(self.scope_group_id?),
            _ => return None,
        };
        Some(PathMapping { id: self.id, scope, source_prefix: self.source_prefix, target_prefix: self.target_prefix })
    }
}

const COLUMNS: &str = "id, scope_kind, scope_manager, scope_group_id, source_prefix, target_prefix";

pub(super) async fn for_manager(pool: &PgPool, manager: ManagerKind) -> Result<Vec<PathMapping>> {
    let rows = sqlx::query_as::<_, Row>(&format!(
        "SELECT {COLUMNS} FROM path_mappings WHERE scope_kind = 'manager' AND scope_manager = $1"
    ))
    .bind(manager)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().filter_map(Row::into_mapping).collect())
}

pub(super) async fn for_group(pool: &PgPool, group_id: PlayerGroupId) -> Result<Vec<PathMapping>> {
    let rows = sqlx::query_as::<_, Row>(&format!(
        "SELECT {COLUMNS} FROM path_mappings WHERE scope_kind = 'player_group' AND scope_group_id = $1"
    ))
    .bind(group_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().filter_map(Row::into_mapping).collect())
}
