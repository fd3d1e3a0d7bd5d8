//! Price list manager: entries attaching prices to other domain items.

use std::sync::Arc;

use shopkit_core::{AttributeDefinition, AttributeRegistry, CoreResult, SemanticType};
use shopkit_manager::{ConfigSource, ManagerContext, ManagerHandle, ManagerResult};

use crate::entity::{aliased_catalog, SqlManager};

use super::list_type;

/// Join pulling list types into a price list statement.
const TYPE_JOIN: &str =
    r#"LEFT JOIN "shop_price_list_type" AS prility ON ( prili."typeid" = prility."id" )"#;

/// The price list attribute definitions on the `prili` alias.
///
/// `join` is attached to every definition; the price manager passes the
/// parent-side join here, the list manager itself passes none.
pub(crate) fn definitions(join: Option<&str>) -> Vec<AttributeDefinition> {
    let defs = vec![
        AttributeDefinition::new(
            "price.list.id",
            r#"prili."id""#,
            SemanticType::Int,
            "Price list ID",
        )
        .hidden(),
        AttributeDefinition::new(
            "price.list.siteid",
            r#"prili."siteid""#,
            SemanticType::Str,
            "Price list site ID",
        )
        .hidden(),
        AttributeDefinition::new(
            "price.list.parentid",
            r#"prili."parentid""#,
            SemanticType::Int,
            "Price list price ID",
        )
        .hidden(),
        AttributeDefinition::new(
            "price.list.domain",
            r#"prili."domain""#,
            SemanticType::Str,
            "Price list domain",
        ),
        AttributeDefinition::new(
            "price.list.typeid",
            r#"prili."typeid""#,
            SemanticType::Int,
            "Price list type ID",
        )
        .hidden(),
        AttributeDefinition::new(
            "price.list.refid",
            r#"prili."refid""#,
            SemanticType::Str,
            "Price list reference ID",
        ),
        AttributeDefinition::new(
            "price.list.datestart",
            r#"prili."start""#,
            SemanticType::DateTime,
            "Price list start date",
        ),
        AttributeDefinition::new(
            "price.list.dateend",
            r#"prili."end""#,
            SemanticType::DateTime,
            "Price list end date",
        ),
        AttributeDefinition::new(
            "price.list.config",
            r#"prili."config""#,
            SemanticType::Str,
            "Price list config",
        ),
        AttributeDefinition::new(
            "price.list.position",
            r#"prili."pos""#,
            SemanticType::Int,
            "Price list position",
        ),
        AttributeDefinition::new(
            "price.list.status",
            r#"prili."status""#,
            SemanticType::Int,
            "Price list status",
        ),
        AttributeDefinition::new(
            "price.list.ctime",
            r#"prili."ctime""#,
            SemanticType::DateTime,
            "Price list create date/time",
        ),
        AttributeDefinition::new(
            "price.list.mtime",
            r#"prili."mtime""#,
            SemanticType::DateTime,
            "Price list modification date/time",
        ),
        AttributeDefinition::new(
            "price.list.editor",
            r#"prili."editor""#,
            SemanticType::Str,
            "Price list editor",
        ),
    ];

    match join {
        Some(clause) => defs.into_iter().map(|def| def.join(clause)).collect(),
        None => defs,
    }
}

/// The price list attribute catalog: own columns plus joined type keys.
pub fn attributes() -> CoreResult<AttributeRegistry> {
    let mut registry = AttributeRegistry::new();

    for def in definitions(None) {
        registry.register(def)?;
    }

    // Type keys searchable from the list manager, via the type join
    for def in list_type::definitions(Some(TYPE_JOIN)) {
        registry.register(def)?;
    }

    Ok(registry)
}

/// Builds the standard price list manager.
pub fn standard(ctx: &ManagerContext) -> ManagerResult<ManagerHandle> {
    let sub_domains = ctx
        .config
        .get_list("shopkit/price/manager/list/submanagers", &["type"]);

    Ok(Arc::new(SqlManager::new(
        "price/list",
        "shop_price_list",
        r#"prili."siteid""#,
        ctx,
        attributes()?,
        aliased_catalog("prili"),
        sub_domains,
    )))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shopkit_core::{CompareOp, Criteria, Filter, SortDir, Value};
    use shopkit_manager::{ConfigSource, Manager, MemoryConfig};

    fn manager() -> ManagerHandle {
        let config: Arc<dyn ConfigSource> = Arc::new(MemoryConfig::empty());
        let ctx = ManagerContext::new("site-1", "tester", "sqlite", config);
        standard(&ctx).unwrap()
    }

    #[test]
    fn test_own_keys_unjoined_type_keys_joined() {
        let manager = manager();
        let registry = manager.attributes();

        assert!(registry.resolve("price.list.refid").unwrap().join_deps.is_empty());
        let type_code = registry.resolve("price.list.type.code").unwrap();
        assert_eq!(type_code.join_deps.len(), 1);
        assert!(type_code.join_deps[0].contains("shop_price_list_type"));
    }

    #[test]
    fn test_search_by_type_code_joins_types() {
        let manager = manager();
        let registry = manager.attributes();

        let criteria = Criteria::new()
            .with_filter(
                Filter::compare(registry, CompareOp::Eq, "price.list.type.code", "default")
                    .unwrap(),
            )
            .sort_by(registry, SortDir::Asc, "price.list.position")
            .unwrap();

        let stmt = manager
            .search(&criteria, &["price.list.refid", "price.list.position"])
            .unwrap();

        assert!(stmt.sql.contains(r#"FROM "shop_price_list" AS prili"#));
        assert!(stmt.sql.contains("LEFT JOIN \"shop_price_list_type\""));
        assert!(stmt.sql.contains(r#"prili."pos" ASC"#));
        assert_eq!(
            stmt.params,
            vec![Value::from("default"), Value::Str("site-1".to_string())]
        );
    }

    #[test]
    fn test_sub_domains_default() {
        assert_eq!(manager().sub_domains(), ["type".to_string()]);
    }
}
